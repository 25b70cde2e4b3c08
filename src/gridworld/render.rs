//! Raster rendering of the gridworld.

use ndarray::{s, Array3};

use super::cell::Rgb;
use super::environment::GridWorldEnv;
use super::types::Position;

impl GridWorldEnv {
    /// Renders the current state as a `(height·cs) × (width·cs) × 3` image,
    /// `cs` being the configured cell size.
    ///
    /// Empty cells are black, walls and goals are filled with their cell
    /// colour, and the agent is an inset square. Rendering never mutates the
    /// environment.
    pub fn render(&self) -> Array3<u8> {
        let cs = self.config().render_cell_size;
        let mut image = Array3::<u8>::zeros((self.height() * cs, self.width() * cs, 3));
        let palette = self.palette();

        let wall_color = palette[self.wall_channel()].display_color();
        for wall in self.walls() {
            fill(&mut image, *wall, cs, 0, wall_color);
        }
        for (i, goal) in self.goal_positions().iter().enumerate() {
            let color = palette[self.goal_channel(i)].display_color();
            fill(&mut image, *goal, cs, 0, color);
        }
        if let Some(agent) = self.agent_pos() {
            let inset = cs / 4;
            let color = palette[super::environment::AGENT_CHANNEL].display_color();
            fill(&mut image, agent, cs, inset, color);
        }

        image
    }
}

fn fill(image: &mut Array3<u8>, pos: Position, cs: usize, inset: usize, color: Rgb) {
    let (y0, x0) = (pos.y * cs + inset, pos.x * cs + inset);
    let (y1, x1) = ((pos.y + 1) * cs - inset, (pos.x + 1) * cs - inset);
    if y0 >= y1 || x0 >= x1 {
        return;
    }
    for (c, value) in color.channels().into_iter().enumerate() {
        image.slice_mut(s![y0..y1, x0..x1, c]).fill(value);
    }
}
