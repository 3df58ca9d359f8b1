use tracing_subscriber::{EnvFilter, fmt};

pub const LOG_ENV: &str = "HOSTBRIDGE_LOG";

/// Installs a global fmt subscriber filtered by `HOSTBRIDGE_LOG`.
///
/// Embedders that already installed a subscriber keep theirs.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    if fmt().with_env_filter(filter).try_init().is_err() {
        tracing::debug!(target: hostbridge::TRACE_TARGET, "global subscriber already installed");
    }
}
