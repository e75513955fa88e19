//! Advice chain interface step definitions.

use std::sync::Arc;

use cucumber::{given, then, when, World};
use serde_json::json;

use interpose::advice::Advice;
use interpose::interfaces::Target;
use interpose::{Advisor, Failure, InvocationError, MethodPattern, Proxy, ProxyFactory, Value};

use crate::common::{ArithmeticError, Calculator, DomainError, Trace};

/// Test context for advice chain scenarios.
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct AdviceChainWorld {
    trace: Trace,
    advisors: Vec<Advisor>,
    target_less: bool,
    proxy: Option<Proxy>,
    last_result: Option<Value>,
    last_error: Option<String>,
}

impl AdviceChainWorld {
    fn new() -> Self {
        Self {
            trace: Trace::new(),
            advisors: Vec::new(),
            target_less: false,
            proxy: None,
            last_result: None,
            last_error: None,
        }
    }

    fn proxy(&mut self) -> &Proxy {
        if self.proxy.is_none() {
            let factory = if self.target_less {
                ProxyFactory::for_interface("Calculate", Calculator::new(Trace::new()).methods())
            } else {
                ProxyFactory::new(Arc::new(Calculator::new(self.trace.clone())))
            };
            let proxy = factory
                .with_advisors(self.advisors.clone())
                .build()
                .expect("Failed to build proxy");
            self.proxy = Some(proxy);
        }
        self.proxy.as_ref().expect("Proxy not built")
    }

    fn add_advisor(&mut self, advisor: Advisor) {
        assert!(self.proxy.is_none(), "Advice must be declared before the first call");
        self.advisors.push(advisor);
    }
}

fn failure_label(failure: &Failure) -> String {
    if failure.downcast_ref::<DomainError>().is_some() {
        return "DomainError".to_string();
    }
    if failure.downcast_ref::<ArithmeticError>().is_some() {
        return "ArithmeticError".to_string();
    }
    match failure.downcast_ref::<InvocationError>() {
        Some(InvocationError::NoSuchMethod { .. }) => "NoSuchMethod".to_string(),
        Some(InvocationError::ArgumentMismatch { .. }) => "ArgumentMismatch".to_string(),
        Some(InvocationError::NoTarget { .. }) => "NoTarget".to_string(),
        Some(InvocationError::ProxyNotExposed) => "ProxyNotExposed".to_string(),
        None => failure.to_string(),
    }
}

fn labelled_advice(kind: &str, name: String, trace: Trace) -> Advice {
    match kind {
        "before" => Advice::before(move |_| {
            trace.push(name.clone());
            Ok(())
        }),
        "after" => Advice::after(move |_| {
            trace.push(name.clone());
            Ok(())
        }),
        "after-returning" => Advice::after_returning(move |_, _| {
            trace.push(name.clone());
            Ok(())
        }),
        "after-throwing" => Advice::after_throwing(move |_, _| {
            trace.push(name.clone());
            Ok(())
        }),
        "around" => Advice::around(move |inv| {
            trace.push(format!("{name}-pre"));
            let result = inv.proceed();
            trace.push(format!("{name}-post"));
            result
        }),
        other => panic!("Unknown advice kind: {other}"),
    }
}

// --- Given steps ---

#[given("a calculator target")]
async fn given_calculator_target(world: &mut AdviceChainWorld) {
    world.target_less = false;
}

#[given("a proxy without a target")]
async fn given_proxy_without_target(world: &mut AdviceChainWorld) {
    world.target_less = true;
}

#[given(expr = "a(n) {word} advice named {string} on {string}")]
async fn given_advice(world: &mut AdviceChainWorld, kind: String, name: String, pattern: String) {
    let advice = labelled_advice(&kind, name, world.trace.clone());
    world.add_advisor(Advisor::new(MethodPattern::parse(&pattern).unwrap(), advice));
}

#[given(expr = "a before advice named {string} on {string} when the first argument is {int}")]
async fn given_dynamic_advice(world: &mut AdviceChainWorld, name: String, pattern: String, first: i64) {
    let advice = labelled_advice("before", name, world.trace.clone());
    let pointcut = MethodPattern::parse(&pattern).unwrap().when(move |args| args.first() == Some(&json!(first)));
    world.add_advisor(Advisor::new(pointcut, advice));
}

#[given(expr = "an exception translator from ArithmeticError to DomainError on {string}")]
async fn given_exception_translator(world: &mut AdviceChainWorld, pattern: String) {
    let advice = Advice::after_throwing_for::<ArithmeticError, _>(|jp, error| {
        Err(Box::new(DomainError(format!("{} in {}", error, jp.method().name()))))
    });
    world.add_advisor(Advisor::new(MethodPattern::parse(&pattern).unwrap(), advice));
}

// --- When steps ---

#[when(expr = "I call {string} with {int} and {int}")]
async fn when_call(world: &mut AdviceChainWorld, method: String, a: i64, b: i64) {
    world.trace.clear();
    let outcome = world.proxy().invoke(&method, vec![json!(a), json!(b)]);
    match outcome {
        Ok(value) => {
            world.last_result = Some(value);
            world.last_error = None;
        }
        Err(failure) => {
            world.last_result = None;
            world.last_error = Some(failure_label(&failure));
        }
    }
}

// --- Then steps ---

#[then(expr = "the result is {int}")]
async fn then_result_is(world: &mut AdviceChainWorld, expected: i64) {
    assert_eq!(
        world.last_result,
        Some(json!(expected)),
        "Call failed with {:?}",
        world.last_error
    );
}

#[then(expr = "the call fails with {string}")]
async fn then_call_fails_with(world: &mut AdviceChainWorld, expected: String) {
    assert_eq!(world.last_error.as_deref(), Some(expected.as_str()));
}

#[then(expr = "the execution order is {string}")]
async fn then_execution_order(world: &mut AdviceChainWorld, expected: String) {
    let expected: Vec<String> = expected.split(',').map(|s| s.trim().to_string()).collect();
    assert_eq!(world.trace.entries(), expected);
}
