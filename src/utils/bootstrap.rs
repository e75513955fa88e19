//! Bootstrap utilities for interpose binaries.
//!
//! Shared initialization code: logging and configuration loading.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, LOG_ENV_VAR};
use crate::error::AopError;

/// Initialize tracing with the INTERPOSE_LOG environment variable.
///
/// Defaults to "info" level if INTERPOSE_LOG is not set.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Extract the value of `--config <path>` or `--config=<path>`.
pub fn parse_config_path<I, S>(args: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let arg = arg.as_ref();
        if arg == "--config" {
            return args.next().map(|path| path.as_ref().to_string());
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(path.to_string());
        }
    }
    None
}

/// Load configuration using the path given on the command line, if any.
pub fn load_config<I, S>(args: I) -> Result<Config, AopError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let path = parse_config_path(args);
    Config::load(path.as_deref())
}
