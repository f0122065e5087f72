//! Random agent on a rendered frozen lake.
use anyhow::{bail, Context};
use clap::Parser;
use gym_http::client::Frame;
use gym_http::{logging, Client, MakeOptions};
use serde_json::json;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(about = "Play frozen lake with random actions, printing each frame")]
struct Args {
    /// Server base URL
    #[arg(long, default_value = "http://localhost:40004")]
    url: String,

    /// Predefined map: 4x4 or 8x8
    #[arg(long, default_value = "8x8")]
    map_name: String,

    /// Whether moves may slip
    #[arg(long)]
    slippery: bool,

    /// Number of episodes to play
    #[arg(long, default_value_t = 5)]
    episodes: u64,

    /// Seed of every reset
    #[arg(long, default_value_t = 2718)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(Level::WARN);

    let client = Client::from_url(&args.url);
    println!("open environments: {:?}", client.list_envs()?);

    let kwargs = json!({
        "render_mode": "ansi",
        "map_name": args.map_name,
        "is_slippery": args.slippery,
    });
    let options = MakeOptions {
        max_episode_steps: Some(100),
        kwargs: kwargs.as_object().cloned().unwrap_or_default(),
        ..MakeOptions::default()
    };
    let env = client
        .make_env("FrozenLake-v1", &options)
        .context("creating FrozenLake-v1")?;

    println!("observation space:\n{:?}\n", env.observation_space());
    println!("action space:\n{:?}\n", env.action_space());
    let transitions = env.transitions()?;
    if let Some(from_start) = transitions.get(&0) {
        println!("transitions from the start:\n{:?}\n", from_start);
    }

    for episode in 0..args.episodes {
        env.reset(Some(args.seed))?;
        let mut total_reward = 0.0;
        loop {
            let action = env.sample_action()?;
            let step = env.step(&action)?;
            match env.render()? {
                Frame::Ansi(text) => {
                    print!("{esc}[2J{esc}[1;1H", esc = 27 as char);
                    println!("{}", text);
                }
                frame => bail!("expected a text frame, got {:?}", frame),
            }
            total_reward += step.reward;
            if step.done() {
                break;
            }
        }
        println!(
            "Finished episode {} with total reward {}",
            episode, total_reward
        );
    }

    env.close()?;
    Ok(())
}
