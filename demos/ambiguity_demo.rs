// Demonstration: evaluate a policy on the three-goal gridworld with and
// without goal blinding.
//
// Build/run from this repo root:
//   cargo run --example ambiguity_demo -- --policy switch --episodes 200

use std::env;

use ambigrid::gridworld::{GridWorldConfig, GridWorldEnv, ObservationMode};
use ambigrid::policy::{NetworkPolicy, Policy, RandomPolicy};
use ambigrid::space::ObservationSpace;
use ambigrid::switch::{mlp, Activation, PolicyValueNetwork, SwitchNetwork};
use ambigrid::trajectory::evaluate;
use ambigrid::wrappers::{AddSwitch, AddTrueGoalFlat, EnvFactory, OneHotColorBlind};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn main() -> ambigrid::Result<()> {
    let args: Vec<String> = env::args().collect();
    let policy_name = arg_value(&args, "--policy").unwrap_or("random");
    let episodes: usize = arg_value(&args, "--episodes")
        .and_then(|s| s.parse().ok())
        .unwrap_or(100);
    let seed: u64 = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    let config = GridWorldConfig {
        observation: ObservationMode::Grid,
        seed,
        ..GridWorldConfig::default()
    };

    for blind in [false, true] {
        let mut env = EnvFactory::new(config.clone())
            .with_stage(move || OneHotColorBlind::default().disabled(!blind))
            .with_stage(AddTrueGoalFlat::new)
            .with_stage(AddSwitch::by_true_goal)
            .build()?;
        let mut policy = make_policy(policy_name, env.observation_space(), env.env(), seed)?;
        let summary = evaluate(policy.as_mut(), &mut env, episodes, 20)?;
        println!("Policy: {} | blinding {}", policy.name(), if blind { "on" } else { "off" });
        println!("{summary}");
    }
    Ok(())
}

fn make_policy(
    name: &str,
    space: &ObservationSpace,
    env: &GridWorldEnv,
    seed: u64,
) -> ambigrid::Result<Box<dyn Policy>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let fields = match (name, space) {
        ("switch", ObservationSpace::Dict(fields)) => fields,
        ("random", _) => return Ok(Box::new(RandomPolicy::new(env.action_count(), seed))),
        (other, _) => {
            eprintln!("Unknown --policy '{}'; expected 'switch' or 'random'.", other);
            std::process::exit(2);
        }
    };

    let in_dim = fields.get("obs").and_then(ObservationSpace::flat_dim).unwrap_or(0);
    let n_switches = match fields.get("switch") {
        Some(ObservationSpace::Discrete { n }) => *n,
        _ => env.n_goals(),
    };
    // Linear, Tanh, [Linear], Tanh
    let net = SwitchNetwork::from_sequential(
        mlp(&[in_dim, 64, 64], Activation::Tanh, false, true, &mut rng),
        &[2],
        n_switches,
    )?;
    let pv = PolicyValueNetwork::new(space, Box::new(net), None, &mut rng)?;
    Ok(Box::new(NetworkPolicy::new(pv, env.action_count(), &mut rng)))
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
