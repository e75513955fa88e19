//! Error types for discovery, invocation and configuration.
//!
//! Failures raised by targets and advice are never converted into these
//! types. They travel through the chain as [`Failure`] so callers can
//! downcast to the exact error the innermost component raised.

use crate::interfaces::Instantiation;

/// A failure raised by a target method or an advice body.
pub type Failure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A `Type.method` pointcut pattern that does not compile as a glob.
#[derive(Debug, thiserror::Error)]
#[error("Invalid pointcut pattern '{pattern}': {source}")]
pub struct PointcutError {
    pub pattern: String,
    #[source]
    pub source: glob::PatternError,
}

/// Errors raised while turning a recognised advice-source type into advisors.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Advice source type '{type_name}' has no aspect declaration")]
    UnknownType { type_name: String },

    #[error("Malformed aspect declaration on '{type_name}': {message}")]
    Malformed { type_name: String, message: String },

    #[error("Instance of advice source '{source_id}' unavailable: {message}")]
    InstanceUnavailable { source_id: String, message: String },

    #[error(transparent)]
    Pointcut(#[from] PointcutError),
}

/// Errors surfaced by [`AdviceSourceRegistry::resolve_advice`](crate::registry::AdviceSourceRegistry::resolve_advice).
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Advice source '{source_id}' is a singleton, but its instantiation model is {instantiation}")]
    Configuration {
        source_id: String,
        instantiation: Instantiation,
    },

    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

/// Errors produced by the proxy and the chain executor themselves.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("No method '{method}' on {target_type}")]
    NoSuchMethod { method: String, target_type: String },

    #[error("No overload of '{method}' on {target_type} takes {count} argument(s)")]
    ArgumentMismatch {
        method: String,
        target_type: String,
        count: usize,
    },

    #[error("No target to invoke {method}: proxy has no target and no advice produced a result")]
    NoTarget { method: String },

    #[error("Current proxy not available: enable expose_proxy to make it visible inside calls")]
    ProxyNotExposed,
}

/// Umbrella error for builders and bootstrap code.
#[derive(Debug, thiserror::Error)]
pub enum AopError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Pointcut(#[from] PointcutError),

    #[error("Invalid include pattern '{pattern}': {source}")]
    IncludePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
