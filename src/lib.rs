//! Interpose - proxy interception runtime
//!
//! Routes calls on a proxied object through an ordered chain of advice
//! (before, after-returning, after-throwing, after, around) before reaching
//! the real target. Advice sources are discovered once from a component
//! inventory and cached for the life of the process.

pub mod advice;
pub mod catalog;
pub mod chain;
pub mod config;
pub mod error;
pub mod facade;
pub mod interfaces;
pub mod invocation;
pub mod pointcut;
pub mod registry;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

pub use advice::{Advice, AdviceKind, Advisor};
pub use error::{AopError, DiscoveryError, Failure, InvocationError, MetadataError, PointcutError};
pub use facade::{Proxy, ProxyFactory};
pub use invocation::{InvocationResult, JoinPoint, Method, MethodInvocation, ParamType, Value};
pub use pointcut::{MethodPattern, Pointcut};
pub use registry::AdviceSourceRegistry;
