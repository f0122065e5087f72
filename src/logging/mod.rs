//! Logging setup
use tracing::Level;

/// Install a `tracing` subscriber that writes formatted events to stderr.
///
/// Events more verbose than `level` are discarded.
/// Does nothing if a global subscriber is already installed.
pub fn init(level: Level) {
    let result = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
    if result.is_err() {
        tracing::debug!("a global tracing subscriber is already installed");
    }
}
