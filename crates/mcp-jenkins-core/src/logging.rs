//! Log setup for hosts embedding the Jenkins tools
//!
//! Everything goes to stderr: a stdio MCP transport owns stdout.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

pub const DEFAULT_LOG_FILTER: &str = "mcp_jenkins_core=info,mcp_jenkins_rest=info";

pub const DEV_LOG_FILTER: &str = "mcp_jenkins_core=debug,mcp_jenkins_rest=debug";

pub fn init() -> Result<(), TryInitError> {
    init_with_default(DEFAULT_LOG_FILTER)
}

pub fn init_dev() -> Result<(), TryInitError> {
    init_with_default(DEV_LOG_FILTER)
}

/// Installs the global subscriber, filtered by `RUST_LOG` when it is set
/// and by `default_filter` otherwise.
///
/// Fails if a global subscriber is already installed; the existing one
/// stays in place.
pub fn init_with_default(default_filter: &str) -> Result<(), TryInitError> {
    let result = tracing_subscriber::registry()
        .with(env_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok(), default_filter))
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init();

    if let Err(e) = &result {
        tracing::debug!(error = %e, "Logging was already initialised");
    }
    result
}

/// `RUST_LOG` if it parses, else the default
fn env_filter(from_env: Option<String>, default_filter: &str) -> EnvFilter {
    from_env
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_filter))
}
