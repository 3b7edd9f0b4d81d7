use std::error::Error;

use kbrl::{
    algo::kernel_based::{RSKernelUCBVIAgent, RSKernelUCBVIAgentConfig},
    env::{Environment, Step},
    gym::{PBall2D, PBall2DConfig},
};

const HORIZON: usize = 25;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut env = PBall2D::new(PBall2DConfig {
        p: f64::INFINITY,
        reward_smoothness: vec![0.8],
        reward_centers: vec![[0.4, 0.4]],
        ..Default::default()
    })?;

    let config = RSKernelUCBVIAgentConfig {
        n_episodes: 500,
        gamma: 0.99,
        horizon: Some(HORIZON),
        bandwidth: 0.1,
        min_dist: 0.1,
        max_repr: Some(500),
        bonus_scale_factor: 0.01,
        verbose: 4,
        ..Default::default()
    };
    let mut agent = RSKernelUCBVIAgent::new(&env, config)?;
    let info = agent.fit(&mut env);

    let last = &info.episode_rewards[info.n_episodes.saturating_sub(50)..];
    println!(
        "Mean reward over the last {} training episodes: {:.3}",
        last.len(),
        last.iter().sum::<f64>() / last.len().max(1) as f64
    );
    println!("Representative states: {}", agent.n_representatives());

    let mut state = env.reset();
    let mut total = 0.0;
    for _ in 0..4 * HORIZON {
        let action = agent.policy(&state)?;
        let Step {
            next_state, reward, ..
        } = env.step(action);
        total += reward;
        state = next_state;
    }
    println!(
        "Recommended policy: reward {:.3} over {} steps, final position {:?}",
        total,
        4 * HORIZON,
        state
    );

    Ok(())
}
