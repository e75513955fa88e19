//! Aspect-oriented advice for cross-cutting concerns.
//!
//! Advice is one of five kinds, all sharing a single calling convention:
//! each wraps "the remainder of the chain" and decides when to call
//! [`MethodInvocation::proceed`].
//!
//! | Kind             | Runs                                   | Can change the outcome        |
//! |------------------|----------------------------------------|-------------------------------|
//! | `Before`         | before proceeding                      | by failing (call is aborted)  |
//! | `AfterReturning` | after a successful return              | by failing                    |
//! | `AfterThrowing`  | after a failure matching its type      | by raising a different error  |
//! | `After`          | always, after proceeding               | by failing                    |
//! | `Around`         | wholly in control of proceeding        | freely                        |
//!
//! # Example
//!
//! ```ignore
//! let advisor = Advisor::new(
//!     MethodPattern::parse("Calculate.*")?,
//!     Advice::before(|jp| {
//!         info!(method = jp.method().name(), "calling");
//!         Ok(())
//!     }),
//! );
//! ```

mod logging;
mod retry;

pub use logging::logging_advice;
pub use retry::{RetryAdvice, RETRY_ATTEMPT_ATTRIBUTE};

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::Failure;
use crate::invocation::{InvocationResult, JoinPoint, MethodInvocation, Value};
use crate::pointcut::Pointcut;

/// The five advice kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdviceKind {
    Before,
    AfterReturning,
    AfterThrowing,
    After,
    Around,
}

impl AdviceKind {
    /// Position among entries of equal order. Lower sits further out.
    ///
    /// After-style advice wraps everything declared alongside it, so its body
    /// runs once the rest of the chain has unwound. `After` is outermost and
    /// runs after the returning and throwing bodies of the same order. Before
    /// and Around share a rank and keep their declaration order.
    pub fn precedence(self) -> u8 {
        match self {
            AdviceKind::After => 0,
            AdviceKind::AfterReturning => 1,
            AdviceKind::AfterThrowing => 2,
            AdviceKind::Before | AdviceKind::Around => 3,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            AdviceKind::Before => "before",
            AdviceKind::AfterReturning => "after-returning",
            AdviceKind::AfterThrowing => "after-throwing",
            AdviceKind::After => "after",
            AdviceKind::Around => "around",
        }
    }
}

impl fmt::Display for AdviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Around advice: receives the invocation and decides whether and when to
/// proceed.
pub trait MethodInterceptor: Send + Sync {
    fn invoke(&self, invocation: &mut MethodInvocation) -> InvocationResult;
}

pub trait BeforeAdvice: Send + Sync {
    fn before(&self, join_point: &mut JoinPoint<'_>) -> Result<(), Failure>;
}

pub trait AfterReturningAdvice: Send + Sync {
    fn after_returning(&self, join_point: &mut JoinPoint<'_>, value: &Value)
        -> Result<(), Failure>;
}

pub trait AfterThrowingAdvice: Send + Sync {
    /// Whether this advice handles the failure. Defaults to every failure.
    fn applies_to(&self, _failure: &Failure) -> bool {
        true
    }

    /// Observe a failure. Returning `Err` replaces the original failure.
    fn after_throwing(&self, join_point: &mut JoinPoint<'_>, failure: &Failure)
        -> Result<(), Failure>;
}

pub trait AfterAdvice: Send + Sync {
    fn after(&self, join_point: &mut JoinPoint<'_>) -> Result<(), Failure>;
}

impl<F> MethodInterceptor for F
where
    F: Fn(&mut MethodInvocation) -> InvocationResult + Send + Sync,
{
    fn invoke(&self, invocation: &mut MethodInvocation) -> InvocationResult {
        self(invocation)
    }
}

impl<F> BeforeAdvice for F
where
    F: Fn(&mut JoinPoint<'_>) -> Result<(), Failure> + Send + Sync,
{
    fn before(&self, join_point: &mut JoinPoint<'_>) -> Result<(), Failure> {
        self(join_point)
    }
}

impl<F> AfterReturningAdvice for F
where
    F: Fn(&mut JoinPoint<'_>, &Value) -> Result<(), Failure> + Send + Sync,
{
    fn after_returning(
        &self,
        join_point: &mut JoinPoint<'_>,
        value: &Value,
    ) -> Result<(), Failure> {
        self(join_point, value)
    }
}

impl<F> AfterThrowingAdvice for F
where
    F: Fn(&mut JoinPoint<'_>, &Failure) -> Result<(), Failure> + Send + Sync,
{
    fn after_throwing(
        &self,
        join_point: &mut JoinPoint<'_>,
        failure: &Failure,
    ) -> Result<(), Failure> {
        self(join_point, failure)
    }
}

impl<F> AfterAdvice for F
where
    F: Fn(&mut JoinPoint<'_>) -> Result<(), Failure> + Send + Sync,
{
    fn after(&self, join_point: &mut JoinPoint<'_>) -> Result<(), Failure> {
        self(join_point)
    }
}

/// After-throwing advice bound to one concrete error type.
struct TypedAfterThrowing<E, F> {
    handler: F,
    _error: PhantomData<fn() -> E>,
}

impl<E, F> AfterThrowingAdvice for TypedAfterThrowing<E, F>
where
    E: std::error::Error + 'static,
    F: Fn(&mut JoinPoint<'_>, &E) -> Result<(), Failure> + Send + Sync,
{
    fn applies_to(&self, failure: &Failure) -> bool {
        failure.downcast_ref::<E>().is_some()
    }

    fn after_throwing(
        &self,
        join_point: &mut JoinPoint<'_>,
        failure: &Failure,
    ) -> Result<(), Failure> {
        match failure.downcast_ref::<E>() {
            Some(error) => (self.handler)(join_point, error),
            None => Ok(()),
        }
    }
}

/// A unit of cross-cutting behaviour, tagged by kind.
#[derive(Clone)]
pub enum Advice {
    Before(Arc<dyn BeforeAdvice>),
    AfterReturning(Arc<dyn AfterReturningAdvice>),
    AfterThrowing(Arc<dyn AfterThrowingAdvice>),
    After(Arc<dyn AfterAdvice>),
    Around(Arc<dyn MethodInterceptor>),
}

impl Advice {
    pub fn before<F>(advice: F) -> Self
    where
        F: Fn(&mut JoinPoint<'_>) -> Result<(), Failure> + Send + Sync + 'static,
    {
        Advice::Before(Arc::new(advice))
    }

    pub fn after_returning<F>(advice: F) -> Self
    where
        F: Fn(&mut JoinPoint<'_>, &Value) -> Result<(), Failure> + Send + Sync + 'static,
    {
        Advice::AfterReturning(Arc::new(advice))
    }

    /// After-throwing advice observing every failure.
    pub fn after_throwing<F>(advice: F) -> Self
    where
        F: Fn(&mut JoinPoint<'_>, &Failure) -> Result<(), Failure> + Send + Sync + 'static,
    {
        Advice::AfterThrowing(Arc::new(advice))
    }

    /// After-throwing advice that only runs for failures of type `E`.
    ///
    /// Returning `Err` from the handler translates the failure.
    pub fn after_throwing_for<E, F>(handler: F) -> Self
    where
        E: std::error::Error + 'static,
        F: Fn(&mut JoinPoint<'_>, &E) -> Result<(), Failure> + Send + Sync + 'static,
    {
        Advice::AfterThrowing(Arc::new(TypedAfterThrowing {
            handler,
            _error: PhantomData,
        }))
    }

    pub fn after<F>(advice: F) -> Self
    where
        F: Fn(&mut JoinPoint<'_>) -> Result<(), Failure> + Send + Sync + 'static,
    {
        Advice::After(Arc::new(advice))
    }

    pub fn around<F>(interceptor: F) -> Self
    where
        F: Fn(&mut MethodInvocation) -> InvocationResult + Send + Sync + 'static,
    {
        Advice::Around(Arc::new(interceptor))
    }

    pub fn kind(&self) -> AdviceKind {
        match self {
            Advice::Before(_) => AdviceKind::Before,
            Advice::AfterReturning(_) => AdviceKind::AfterReturning,
            Advice::AfterThrowing(_) => AdviceKind::AfterThrowing,
            Advice::After(_) => AdviceKind::After,
            Advice::Around(_) => AdviceKind::Around,
        }
    }

    /// Run this advice around the remainder of the chain.
    pub fn invoke(&self, invocation: &mut MethodInvocation) -> InvocationResult {
        match self {
            Advice::Before(advice) => {
                advice.before(&mut JoinPoint::new(invocation))?;
                invocation.proceed()
            }
            Advice::AfterReturning(advice) => {
                let value = invocation.proceed()?;
                advice.after_returning(&mut JoinPoint::new(invocation), &value)?;
                Ok(value)
            }
            Advice::AfterThrowing(advice) => match invocation.proceed() {
                Ok(value) => Ok(value),
                Err(failure) => {
                    if advice.applies_to(&failure) {
                        advice.after_throwing(&mut JoinPoint::new(invocation), &failure)?;
                    }
                    Err(failure)
                }
            },
            Advice::After(advice) => {
                let outcome = invocation.proceed();
                advice.after(&mut JoinPoint::new(invocation))?;
                outcome
            }
            Advice::Around(interceptor) => interceptor.invoke(invocation),
        }
    }
}

impl fmt::Debug for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Advice").field(&self.kind()).finish()
    }
}

/// Advice paired with the pointcut selecting where it applies.
#[derive(Clone)]
pub struct Advisor {
    pointcut: Arc<dyn Pointcut>,
    advice: Advice,
    order: i32,
    source: Option<String>,
}

impl Advisor {
    pub fn new(pointcut: impl Pointcut + 'static, advice: Advice) -> Self {
        Self {
            pointcut: Arc::new(pointcut),
            advice,
            order: 0,
            source: None,
        }
    }

    /// Lower orders wrap higher ones.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Record which advice source declared this advisor.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn pointcut(&self) -> &dyn Pointcut {
        self.pointcut.as_ref()
    }

    pub fn advice(&self) -> &Advice {
        &self.advice
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

impl fmt::Debug for Advisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Advisor")
            .field("pointcut", &self.pointcut)
            .field("kind", &self.advice.kind())
            .field("order", &self.order)
            .field("source", &self.source)
            .finish()
    }
}
