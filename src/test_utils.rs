//! Test utilities and in-memory targets.
//!
//! Provides a small calculator target plus helpers for building invocations
//! and recording the order in which advice bodies run.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use uuid::Uuid;

use crate::chain::{AdviceChain, AdviceEntry};
use crate::interfaces::Target;
use crate::invocation::{InvocationResult, Method, MethodInvocation, ParamType, Value};

/// Raised by [`Calculator`] for division by zero.
#[derive(Debug, thiserror::Error)]
#[error("division by zero")]
pub struct ArithmeticError;

/// Target with `add(int, int)` and `div(int, int)`.
#[derive(Default)]
pub struct Calculator {
    calls: AtomicUsize,
}

impl Calculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn add_method() -> Method {
        Method::new("Calculate", "add").with_params([ParamType::Int, ParamType::Int])
    }

    pub fn div_method() -> Method {
        Method::new("Calculate", "div").with_params([ParamType::Int, ParamType::Int])
    }
}

impl Target for Calculator {
    fn type_name(&self) -> &str {
        "Calculate"
    }

    fn methods(&self) -> Vec<Method> {
        vec![Self::add_method(), Self::div_method()]
    }

    fn invoke(&self, method: &Method, arguments: &[Value]) -> InvocationResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let a = arguments.first().and_then(Value::as_i64).unwrap_or_default();
        let b = arguments.get(1).and_then(Value::as_i64).unwrap_or_default();
        match method.name() {
            "add" => Ok(json!(a + b)),
            "div" if b == 0 => Err(Box::new(ArithmeticError)),
            "div" => Ok(json!(a / b)),
            other => Err(format!("unexpected method {other}").into()),
        }
    }
}

/// Shared log of labels pushed by advice bodies and targets.
#[derive(Clone, Default)]
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
}

/// Invocation of `Calculate.add` over `entries`.
pub fn add_invocation(
    target: Option<Arc<dyn Target>>,
    entries: Vec<AdviceEntry>,
    arguments: Vec<Value>,
) -> MethodInvocation {
    MethodInvocation::new(
        Uuid::new_v4(),
        target,
        Arc::new(Calculator::add_method()),
        Some("Calculate".to_string()),
        arguments,
        Arc::new(AdviceChain::new(entries)),
    )
}
