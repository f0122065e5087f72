//! Command-line options
use crate::config::{parse_log_level, ServerConfig};
use clap::Parser;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    version,
    about,
    after_help = "Environment instances live in memory and are lost when the server exits."
)]
pub struct Options {
    #[arg(short, long, default_value = "127.0.0.1")]
    /// Address to listen on
    pub listen: String,

    #[arg(short, long, default_value_t = 40004)]
    /// Port to listen on
    pub port: u16,

    #[arg(
        short = 'g',
        long,
        alias = "log_level",
        default_value = "ERROR",
        value_parser = parse_log_level
    )]
    /// Log level: DEBUG, INFO, WARNING, ERROR or CRITICAL
    pub log_level: Level,
}

impl From<&Options> for ServerConfig {
    fn from(opts: &Options) -> Self {
        Self {
            listen: opts.listen.clone(),
            port: opts.port,
            log_level: opts.log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_server_config() {
        let opts = Options::try_parse_from(["gym-http"]).unwrap();
        assert_eq!(ServerConfig::from(&opts), ServerConfig::default());
    }

    #[test]
    fn short_flags() {
        let opts =
            Options::try_parse_from(["gym-http", "-l", "0.0.0.0", "-p", "5000", "-g", "INFO"])
                .unwrap();
        let config = ServerConfig::from(&opts);
        assert_eq!(config.listen, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    fn python_style_long_flag() {
        let opts = Options::try_parse_from(["gym-http", "--log_level", "WARNING"]).unwrap();
        assert_eq!(opts.log_level, Level::WARN);
    }

    #[test]
    fn invalid_log_level() {
        assert!(Options::try_parse_from(["gym-http", "-g", "LOUD"]).is_err());
    }
}
