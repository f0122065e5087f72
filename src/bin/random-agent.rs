//! Random agent playing an environment on a running server.
use anyhow::Context;
use clap::Parser;
use gym_http::{logging, Client, MakeOptions};
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(about = "Play an environment with uniformly random actions")]
struct Args {
    /// Server base URL
    #[arg(long, default_value = "http://localhost:40004")]
    url: String,

    /// Environment ID
    #[arg(long, default_value = "CartPole-v1")]
    env: String,

    /// Number of episodes to play
    #[arg(long, default_value_t = 10)]
    episodes: u64,

    /// Seed of the first reset
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(Level::INFO);

    let client = Client::from_url(&args.url);
    let env = client
        .make_env(&args.env, &MakeOptions::default())
        .with_context(|| format!("creating {} on {}", args.env, client.base_url()))?;
    info!(instance_id = env.instance_id(), env_id = env.env_id(), "created environment");
    println!("observation space: {:?}", env.observation_space());
    println!("action space: {:?}", env.action_space());

    for episode in 0..args.episodes {
        env.reset(args.seed.map(|seed| seed + episode))?;
        let mut total_reward = 0.0;
        let mut steps = 0;
        loop {
            let action = env.sample_action()?;
            let step = env.step(&action)?;
            total_reward += step.reward;
            steps += 1;
            if step.done() {
                break;
            }
        }
        println!(
            "episode {}: {} steps, total reward {}",
            episode, steps, total_reward
        );
    }

    env.close()?;
    Ok(())
}
