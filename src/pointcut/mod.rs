//! Pointcuts: deciding which calls an advisor applies to.
//!
//! Matching happens in two phases. The static phase (type and method) is
//! evaluated once when a chain is built for a method. The optional dynamic
//! phase is carried into the chain and evaluated on every call against the
//! current arguments.

use std::fmt;
use std::sync::Arc;

use glob::Pattern;

use crate::error::PointcutError;
use crate::invocation::{Method, Value};

/// Selects join points.
pub trait Pointcut: Send + Sync + fmt::Debug {
    /// Whether any method of `target_type` may match.
    fn matches_type(&self, target_type: &str) -> bool;

    /// Static method match, evaluated once per (target type, method).
    fn matches_method(&self, method: &Method, target_type: &str) -> bool;

    /// Per-call predicate, if the static match is not conclusive.
    fn dynamic_matcher(&self) -> Option<DynamicMatcher> {
        None
    }
}

type MatchFn = dyn Fn(&Method, &str, &[Value]) -> bool + Send + Sync;

/// Per-call predicate over (method, target type, arguments).
#[derive(Clone)]
pub struct DynamicMatcher {
    predicate: Arc<MatchFn>,
}

impl DynamicMatcher {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Method, &str, &[Value]) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    pub fn matches(&self, method: &Method, target_type: &str, arguments: &[Value]) -> bool {
        (self.predicate)(method, target_type, arguments)
    }
}

impl fmt::Debug for DynamicMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DynamicMatcher")
    }
}

/// `Type.method` glob pattern, e.g. `Calculate.*` or `*.add`.
///
/// Each half is a [`glob::Pattern`], so `?` and `[...]` classes work as
/// well as `*`. A pattern without a dot matches the method name on any type.
#[derive(Debug, Clone)]
pub struct MethodPattern {
    type_pattern: Option<Pattern>,
    method_pattern: Option<Pattern>,
    runtime: Option<DynamicMatcher>,
}

impl MethodPattern {
    pub fn parse(pattern: &str) -> Result<Self, PointcutError> {
        let (type_part, method_part) = pattern.rsplit_once('.').unwrap_or(("*", pattern));
        Ok(Self {
            type_pattern: compile(type_part, pattern)?,
            method_pattern: compile(method_part, pattern)?,
            runtime: None,
        })
    }

    /// Matches every method of every type.
    pub fn any() -> Self {
        Self {
            type_pattern: None,
            method_pattern: None,
            runtime: None,
        }
    }

    /// Add a per-call predicate on the arguments.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&[Value]) -> bool + Send + Sync + 'static,
    {
        self.runtime = Some(DynamicMatcher::new(move |_, _, arguments| {
            predicate(arguments)
        }));
        self
    }

    /// Add a per-call predicate seeing the full call context.
    pub fn when_call(mut self, matcher: DynamicMatcher) -> Self {
        self.runtime = Some(matcher);
        self
    }

    pub fn type_pattern(&self) -> &str {
        self.type_pattern.as_ref().map_or("*", Pattern::as_str)
    }

    pub fn method_pattern(&self) -> &str {
        self.method_pattern.as_ref().map_or("*", Pattern::as_str)
    }
}

/// `None` stands for a bare `*`.
fn compile(part: &str, pattern: &str) -> Result<Option<Pattern>, PointcutError> {
    if part == "*" {
        return Ok(None);
    }
    Pattern::new(part).map(Some).map_err(|source| PointcutError {
        pattern: pattern.to_string(),
        source,
    })
}

fn matches(pattern: &Option<Pattern>, text: &str) -> bool {
    pattern.as_ref().map_or(true, |pattern| pattern.matches(text))
}

impl Pointcut for MethodPattern {
    fn matches_type(&self, target_type: &str) -> bool {
        matches(&self.type_pattern, target_type)
    }

    fn matches_method(&self, method: &Method, target_type: &str) -> bool {
        self.matches_type(target_type) && matches(&self.method_pattern, method.name())
    }

    fn dynamic_matcher(&self) -> Option<DynamicMatcher> {
        self.runtime.clone()
    }
}
