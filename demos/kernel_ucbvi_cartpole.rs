use std::error::Error;

use gym_rs::utils::renderer::RenderMode;
use kbrl::{
    algo::kernel_based::{RSKernelUCBVIAgent, RSKernelUCBVIAgentConfig},
    env::{Environment, Step},
    gym::CartPole,
};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut env = CartPole::new(RenderMode::None);
    let config = RSKernelUCBVIAgentConfig {
        n_episodes: 200,
        gamma: 0.99,
        horizon: Some(100),
        scaling: Some(vec![4.8, 4.0, 0.84, 4.0]),
        bandwidth: 0.15,
        min_dist: 0.1,
        max_repr: Some(2000),
        bonus_scale_factor: 0.1,
        verbose: 4,
        ..Default::default()
    };
    let mut agent = RSKernelUCBVIAgent::new(&env, config)?;
    agent.fit(&mut env);

    let mut state = env.reset();
    let mut steps = 0;
    loop {
        let Step {
            next_state, done, ..
        } = env.step(agent.policy(&state)?);
        steps += 1;
        state = next_state;
        if done || steps >= 500 {
            break;
        }
    }
    println!("Pole balanced for {} steps", steps);

    Ok(())
}
