use anyhow::Context;
use clap::Parser;
use gym_http::cli::Options;
use gym_http::{logging, Server, ServerConfig};

fn main() -> anyhow::Result<()> {
    let opts = Options::parse();
    let config = ServerConfig::from(&opts);
    logging::init(config.log_level);

    let server = Server::bind(&config).context("starting server")?;
    println!(
        "Server starting at: http://{}. Loglevel: {}.",
        config.address(),
        config.log_level
    );
    server.run();
    Ok(())
}
