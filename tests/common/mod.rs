//! Shared fixtures for integration and interface tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;

use interpose::advice::Advice;
use interpose::catalog::Aspect;
use interpose::interfaces::Target;
use interpose::{Advisor, InvocationResult, MetadataError, Method, MethodPattern, ParamType, Value};

#[derive(Debug, thiserror::Error)]
#[error("division by zero")]
pub struct ArithmeticError;

#[derive(Debug, thiserror::Error)]
#[error("domain error: {0}")]
pub struct DomainError(pub String);

#[derive(Debug, thiserror::Error)]
#[error("service temporarily unavailable")]
pub struct Unavailable;

/// Ordered log of labels shared between advice and targets.
#[derive(Debug, Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, label: impl Into<String>) {
        self.0.lock().push(label.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// `Calculate` target with `add`, `div` and a `flaky` method failing with
/// [`Unavailable`] for its first `flaky_failures` calls.
pub struct Calculator {
    trace: Trace,
    calls: AtomicUsize,
    flaky_failures: usize,
    flaky_calls: AtomicUsize,
}

impl Calculator {
    pub fn new(trace: Trace) -> Self {
        Self {
            trace,
            calls: AtomicUsize::new(0),
            flaky_failures: 0,
            flaky_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_flaky_failures(mut self, failures: usize) -> Self {
        self.flaky_failures = failures;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Target for Calculator {
    fn type_name(&self) -> &str {
        "Calculate"
    }

    fn methods(&self) -> Vec<Method> {
        vec![
            Method::new("Calculate", "add").with_params([ParamType::Int, ParamType::Int]),
            Method::new("Calculate", "div").with_params([ParamType::Int, ParamType::Int]),
            Method::new("Calculate", "flaky"),
        ]
    }

    fn invoke(&self, method: &Method, arguments: &[Value]) -> InvocationResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.trace.push("target");
        let a = arguments.first().and_then(Value::as_i64).unwrap_or_default();
        let b = arguments.get(1).and_then(Value::as_i64).unwrap_or_default();
        match method.name() {
            "add" => Ok(json!(a + b)),
            "div" if b == 0 => Err(Box::new(ArithmeticError)),
            "div" => Ok(json!(a / b)),
            "flaky" => {
                let call = self.flaky_calls.fetch_add(1, Ordering::SeqCst);
                if call < self.flaky_failures {
                    Err(Box::new(Unavailable))
                } else {
                    Ok(json!("ok"))
                }
            }
            other => Err(format!("unexpected method {other}").into()),
        }
    }
}

/// Aspect pushing its tag to a trace before every `Calculate` call.
pub struct TagAspect {
    pub tag: String,
    pub trace: Trace,
}

impl Aspect for TagAspect {
    fn advisors(self: Arc<Self>) -> Result<Vec<Advisor>, MetadataError> {
        Ok(vec![Advisor::new(
            MethodPattern::parse("Calculate.*")?,
            Advice::before(move |_| {
                self.trace.push(self.tag.clone());
                Ok(())
            }),
        )])
    }
}
