//! Behavioural test suite for the gridworld.

use super::*;
use crate::distribution::Distribution;
use proptest::prelude::*;

const RIGHT: usize = 0;
const UP: usize = 1;
const LEFT: usize = 2;
const DOWN: usize = 3;

/// The 7×7 scenario: true goal 0 at (0,0), agent starting at (6,6).
fn scenario(config: GridWorldConfig) -> GridWorldEnv {
    GridWorldEnv::new(GridWorldConfig {
        true_goal: Some(Distribution::Point(0)),
        start: Some(Distribution::Point(Position::new(6, 6))),
        ..config
    })
    .unwrap()
}

fn run(env: &mut GridWorldEnv, actions: &[usize]) -> Vec<StepResult> {
    actions.iter().map(|&a| env.step(a).unwrap()).collect()
}

#[cfg(test)]
mod lifecycle {
    use super::*;

    #[test]
    fn step_before_reset_fails() {
        let mut env = GridWorldEnv::new(GridWorldConfig::default()).unwrap();
        assert_eq!(env.step(RIGHT), Err(EnvError::NotReset));
    }

    #[test]
    fn invalid_action_leaves_state_intact() {
        let mut env = scenario(GridWorldConfig::default());
        env.reset().unwrap();
        let before = (env.agent_pos(), env.step_count(), env.rng_state());
        assert_eq!(env.step(4), Err(EnvError::InvalidAction(4)));
        assert_eq!((env.agent_pos(), env.step_count(), env.rng_state()), before);
    }

    #[test]
    fn reset_zeroes_counters() {
        let mut env = scenario(GridWorldConfig::default());
        env.reset().unwrap();
        run(&mut env, &[LEFT, LEFT, UP]);
        assert_eq!(env.step_count(), 3);
        let (_, info) = env.reset().unwrap();
        assert_eq!(env.step_count(), 0);
        assert_eq!(env.last_reward(), 0.0);
        assert_eq!(info.step_count, 0);
        assert_eq!(info.agent_pos, Position::new(6, 6));
        assert_eq!(env.episode(), 2);
    }

    #[test]
    fn reset_info_reports_true_goal() {
        let mut env = scenario(GridWorldConfig::default());
        let (obs, info) = env.reset().unwrap();
        assert_eq!(info.true_goal_idx, 0);
        assert_eq!(info.true_goal.name, "right");
        assert_eq!(info.rng_state, env.rng_state());
        assert!(env.observation_space().contains(&obs));
    }

    #[test]
    fn position_observation_is_agent_position() {
        let mut env = scenario(GridWorldConfig::default());
        let (obs, _) = env.reset().unwrap();
        assert_eq!(obs.to_features(), Some(vec![6.0, 6.0]));
        let result = env.step(LEFT).unwrap();
        assert_eq!(result.observation.to_features(), Some(vec![5.0, 6.0]));
    }

    #[test]
    fn grid_observation_marks_cells() {
        let mut env = scenario(GridWorldConfig {
            observation: ObservationMode::Grid,
            walls: vec![Position::new(3, 3)],
            ..GridWorldConfig::default()
        });
        env.reset().unwrap();
        let grid = env.grid();
        assert_eq!(grid.shape(), &[7, 7]);
        assert_eq!(grid[[6, 6]], AGENT_CHANNEL as i64);
        assert_eq!(grid[[3, 3]], env.wall_channel() as i64);
        assert_eq!(grid[[0, 0]], env.goal_channel(0) as i64);
        assert_eq!(grid[[0, 6]], env.goal_channel(1) as i64);
        assert_eq!(grid[[6, 0]], env.goal_channel(2) as i64);
        assert_eq!(grid[[2, 2]], EMPTY_CHANNEL as i64);
    }
}

#[cfg(test)]
mod movement {
    use super::*;

    #[test]
    fn walls_block_movement() {
        let mut env = scenario(GridWorldConfig {
            walls: vec![Position::new(5, 6)],
            ..GridWorldConfig::default()
        });
        env.reset().unwrap();
        let result = env.step(LEFT).unwrap();
        assert_eq!(result.info.agent_pos, Position::new(6, 6));
        assert_eq!(result.info.step_count, 1);
    }

    #[test]
    fn borders_clamp_movement() {
        let mut env = scenario(GridWorldConfig::default());
        env.reset().unwrap();
        let result = env.step(RIGHT).unwrap();
        assert_eq!(result.info.agent_pos, Position::new(6, 6));
        let result = env.step(DOWN).unwrap();
        assert_eq!(result.info.agent_pos, Position::new(6, 6));
    }
}

#[cfg(test)]
mod rewards {
    use super::*;

    #[test]
    fn example_scenario_reaches_true_goal() {
        let mut env = scenario(GridWorldConfig::default());
        env.reset().unwrap();
        let mut actions = vec![LEFT; 5];
        actions.extend([UP; 6]);
        actions.push(LEFT);
        let results = run(&mut env, &actions);

        for r in &results[..results.len() - 1] {
            assert_eq!(r.reward, 0.0);
            assert!(!r.terminated);
        }
        let last = results.last().unwrap();
        assert_eq!(last.info.agent_pos, Position::new(0, 0));
        assert_eq!(last.reward, 1.0);
        assert!(last.terminated);
        assert!(!last.truncated);
        assert_eq!(env.last_reward(), 1.0);
    }

    #[test]
    fn true_goal_uses_its_cell_semantics() {
        // Start one step away from each goal and step onto it.
        let approaches = [
            (Position::new(1, 0), LEFT),
            (Position::new(1, 6), LEFT),
            (Position::new(5, 0), RIGHT),
        ];
        for (goal_idx, cell) in Cell::canonical_goals().into_iter().enumerate() {
            let (start, action) = approaches[goal_idx];
            let mut env = GridWorldEnv::new(GridWorldConfig {
                true_goal: Some(Distribution::Point(goal_idx)),
                start: Some(Distribution::Point(start)),
                ..GridWorldConfig::default()
            })
            .unwrap();
            env.reset().unwrap();
            let result = env.step(action).unwrap();
            assert_eq!(result.info.agent_pos, env.goal_positions()[goal_idx]);
            assert_eq!(result.reward, cell.reward, "goal {goal_idx}");
            assert_eq!(result.terminated, cell.terminal, "goal {goal_idx}");
        }
    }

    #[test]
    fn custom_goal_rewards_are_paid() {
        let mut env = GridWorldEnv::new(GridWorldConfig {
            width: 3,
            height: 1,
            goal_positions: vec![Position::new(2, 0)],
            goal_cells: vec![Cell::goal("bonus", Rgb::GREEN, 2.5, false)],
            start: Some(Distribution::Point(Position::new(0, 0))),
            ..GridWorldConfig::default()
        })
        .unwrap();
        env.reset().unwrap();
        let results = run(&mut env, &[RIGHT, RIGHT, RIGHT]);
        assert_eq!(results[0].reward, 0.0);
        assert_eq!(results[1].reward, 2.5);
        assert!(!results[1].terminated);
        assert_eq!(results[2].reward, 2.5);
    }

    #[test]
    fn wrong_goal_always_terminates_without_reward() {
        let mut env = scenario(GridWorldConfig {
            end_on_wrong_goal: EndOnWrongGoal::All(WrongGoalPolicy::Always),
            ..GridWorldConfig::default()
        });
        env.reset().unwrap();
        let results = run(&mut env, &[LEFT; 6]);
        let last = results.last().unwrap();
        assert_eq!(last.info.agent_pos, Position::new(0, 6));
        assert_eq!(last.reward, 0.0);
        assert!(last.terminated);
    }

    #[test]
    fn wrong_goal_never_terminates() {
        let mut env = scenario(GridWorldConfig {
            end_on_wrong_goal: EndOnWrongGoal::All(WrongGoalPolicy::Never),
            ..GridWorldConfig::default()
        });
        env.reset().unwrap();
        let results = run(&mut env, &[LEFT; 8]);
        assert!(results.iter().all(|r| !r.terminated && r.reward == 0.0));
    }

    #[test]
    fn per_goal_policies_apply_to_their_goal() {
        let mut env = scenario(GridWorldConfig {
            end_on_wrong_goal: EndOnWrongGoal::PerGoal(vec![
                WrongGoalPolicy::Always,
                WrongGoalPolicy::Never,
                WrongGoalPolicy::Always,
            ]),
            ..GridWorldConfig::default()
        });
        env.reset().unwrap();
        let at_goal_1 = run(&mut env, &[LEFT; 6]).pop().unwrap();
        assert!(!at_goal_1.terminated);

        env.reset().unwrap();
        let at_goal_2 = run(&mut env, &[UP; 6]).pop().unwrap();
        assert_eq!(at_goal_2.info.agent_pos, Position::new(6, 0));
        assert!(at_goal_2.terminated);
    }

    #[test]
    fn wrong_goal_probability_converges() {
        let p = 0.3;
        let mut env = GridWorldEnv::new(GridWorldConfig {
            width: 2,
            height: 1,
            goal_positions: vec![Position::new(0, 0), Position::new(1, 0)],
            goal_cells: Cell::canonical_goals().into_iter().take(2).collect(),
            true_goal: Some(Distribution::Point(0)),
            start: Some(Distribution::Point(Position::new(0, 0))),
            end_on_wrong_goal: EndOnWrongGoal::All(WrongGoalPolicy::Probability(p)),
            seed: 1234,
            ..GridWorldConfig::default()
        })
        .unwrap();

        let trials = 5000;
        let mut ended = 0;
        for _ in 0..trials {
            env.reset().unwrap();
            if env.step(RIGHT).unwrap().terminated {
                ended += 1;
            }
        }
        let freq = ended as f64 / trials as f64;
        assert!((freq - p).abs() < 0.03, "termination frequency {freq}");
    }
}

#[cfg(test)]
mod truncation {
    use super::*;

    #[test]
    fn truncates_exactly_at_limit() {
        let mut env = scenario(GridWorldConfig {
            max_episode_steps: 4,
            ..GridWorldConfig::default()
        });
        env.reset().unwrap();
        let results = run(&mut env, &[RIGHT; 4]);
        assert_eq!(
            results.iter().map(|r| r.truncated).collect::<Vec<_>>(),
            vec![false, false, false, true]
        );
        assert!(results.iter().all(|r| !r.terminated));
    }

    #[test]
    fn truncation_is_independent_of_termination() {
        let mut env = GridWorldEnv::new(GridWorldConfig {
            width: 2,
            height: 1,
            goal_positions: vec![Position::new(1, 0)],
            goal_cells: vec![Cell::goal("right", Rgb::GREEN, 1.0, true)],
            start: Some(Distribution::Point(Position::new(0, 0))),
            max_episode_steps: 1,
            ..GridWorldConfig::default()
        })
        .unwrap();
        env.reset().unwrap();
        let result = env.step(RIGHT).unwrap();
        assert!(result.terminated);
        assert!(result.truncated);
    }
}

#[cfg(test)]
mod determinism {
    use super::*;

    fn rollout(seed: u64, actions: &[usize]) -> Vec<(Vec<f32>, f64, bool, bool)> {
        let mut env = GridWorldEnv::new(GridWorldConfig {
            seed,
            end_on_wrong_goal: EndOnWrongGoal::All(WrongGoalPolicy::Probability(0.5)),
            ..GridWorldConfig::default()
        })
        .unwrap();
        let mut out = Vec::new();
        let (obs, _) = env.reset().unwrap();
        out.push((obs.to_features().unwrap(), 0.0, false, false));
        for &a in actions {
            let r = env.step(a).unwrap();
            out.push((r.observation.to_features().unwrap(), r.reward, r.terminated, r.truncated));
            if r.done() {
                env.reset().unwrap();
            }
        }
        out
    }

    #[test]
    fn restored_rng_replays_draws() {
        let mut env = GridWorldEnv::new(GridWorldConfig::default()).unwrap();
        env.reset().unwrap();
        let state = env.rng_state();
        let first: Vec<_> = (0..5).map(|_| env.reset().unwrap().1).collect();
        env.restore_rng(state);
        let second: Vec<_> = (0..5).map(|_| env.reset().unwrap().1).collect();
        let key = |i: &Info| (i.agent_pos, i.true_goal_idx);
        assert_eq!(
            first.iter().map(key).collect::<Vec<_>>(),
            second.iter().map(key).collect::<Vec<_>>()
        );
    }

    proptest! {
        #[test]
        fn same_seed_same_trajectory(seed in any::<u64>(), actions in prop::collection::vec(0usize..4, 0..60)) {
            prop_assert_eq!(rollout(seed, &actions), rollout(seed, &actions));
        }
    }
}

#[cfg(test)]
mod invariants {
    use super::*;

    proptest! {
        #[test]
        fn agent_stays_in_bounds_and_off_walls(
            seed in any::<u64>(),
            actions in prop::collection::vec(0usize..4, 1..80),
        ) {
            let walls = vec![Position::new(2, 2), Position::new(3, 2), Position::new(4, 4), Position::new(1, 5)];
            let mut env = GridWorldEnv::new(GridWorldConfig {
                seed,
                walls: walls.clone(),
                end_on_wrong_goal: EndOnWrongGoal::All(WrongGoalPolicy::Never),
                ..GridWorldConfig::default()
            }).unwrap();
            let (_, info) = env.reset().unwrap();
            prop_assert!(!walls.contains(&info.agent_pos));
            let mut previous = info.step_count;
            for a in actions {
                let r = env.step(a).unwrap();
                let pos = r.info.agent_pos;
                prop_assert!(pos.in_bounds(7, 7));
                prop_assert!(!walls.contains(&pos));
                prop_assert!(r.info.true_goal_idx < 3);
                prop_assert_eq!(r.info.step_count, previous + 1);
                previous = r.info.step_count;
                if r.done() {
                    let (_, info) = env.reset().unwrap();
                    previous = info.step_count;
                }
            }
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod serialization {
    use super::*;

    #[test]
    fn config_roundtrip() {
        let config = GridWorldConfig {
            walls: vec![Position::new(3, 3)],
            end_on_wrong_goal: EndOnWrongGoal::PerGoal(vec![
                WrongGoalPolicy::Always,
                WrongGoalPolicy::Never,
                WrongGoalPolicy::Probability(0.25),
            ]),
            true_goal: Some(Distribution::Weighted(vec![(0, 2.0), (1, 1.0)])),
            ..GridWorldConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let restored: GridWorldConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn info_carries_rng_state() {
        let mut env = GridWorldEnv::new(GridWorldConfig::default()).unwrap();
        let (_, info) = env.reset().unwrap();
        let json = serde_json::to_string_pretty(&info).unwrap();
        assert!(json.contains("\"rng_state\""));
        assert!(json.contains("\"word_pos\""));

        let restored: Info = serde_json::from_str(&json).unwrap();
        let mut replay = GridWorldEnv::new(GridWorldConfig::default()).unwrap();
        replay.restore_rng(restored.rng_state);
        assert_eq!(replay.reset().unwrap().1.agent_pos, env.reset().unwrap().1.agent_pos);
    }
}
