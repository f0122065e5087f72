//! Server configuration
use std::net::SocketAddr;
use thiserror::Error;
use tracing::Level;

/// Configuration of the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address or host name to listen on.
    pub listen: String,
    /// Port to listen on; `0` picks a free port.
    pub port: u16,
    /// Most verbose level of log messages that are emitted.
    pub log_level: Level,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1".into(),
            port: 40004,
            log_level: Level::ERROR,
        }
    }
}

impl ServerConfig {
    /// Listen on the given host and port, keeping the default log level.
    pub fn new<S: Into<String>>(listen: S, port: u16) -> Self {
        Self {
            listen: listen.into(),
            port,
            ..Self::default()
        }
    }

    /// The `host:port` address string to bind.
    pub fn address(&self) -> String {
        match self.listen.parse::<std::net::IpAddr>() {
            Ok(ip) => SocketAddr::new(ip, self.port).to_string(),
            Err(_) => format!("{}:{}", self.listen, self.port),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log level '{0}', expected one of DEBUG, INFO, WARNING, ERROR, CRITICAL")]
pub struct ParseLogLevelError(pub String);

/// Parse a log level name, case insensitive.
///
/// Accepts the Python logging names `WARNING` and `CRITICAL` as aliases of
/// `WARN` and `ERROR`.
pub fn parse_log_level(name: &str) -> Result<Level, ParseLogLevelError> {
    match name.to_ascii_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" | "WARNING" => Ok(Level::WARN),
        "ERROR" | "CRITICAL" => Ok(Level::ERROR),
        _ => Err(ParseLogLevelError(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("DEBUG", Level::DEBUG)]
    #[case("info", Level::INFO)]
    #[case("WARNING", Level::WARN)]
    #[case("warn", Level::WARN)]
    #[case("ERROR", Level::ERROR)]
    #[case("CRITICAL", Level::ERROR)]
    fn log_level_names(#[case] name: &str, #[case] level: Level) {
        assert_eq!(parse_log_level(name), Ok(level));
    }

    #[test]
    fn log_level_unknown() {
        assert!(parse_log_level("LOUD").is_err());
    }

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.address(), "127.0.0.1:40004");
        assert_eq!(config.log_level, Level::ERROR);
    }

    #[rstest]
    #[case("0.0.0.0", 80, "0.0.0.0:80")]
    #[case("::1", 8080, "[::1]:8080")]
    #[case("localhost", 1, "localhost:1")]
    fn address(#[case] listen: &str, #[case] port: u16, #[case] expected: &str) {
        assert_eq!(ServerConfig::new(listen, port).address(), expected);
    }
}
