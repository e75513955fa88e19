//! Retry advice: re-drives the rest of the chain after a failure.
//!
//! Uses `backon` for exponential backoff with jitter. Each attempt runs on a
//! fresh [`MethodInvocation::resume_clone`], so the entries after this advice
//! and the target run again without re-entering the retry advice itself.

use std::sync::Arc;
use std::time::Duration;

use backon::{BlockingRetryable, ExponentialBuilder};
use tracing::warn;

use crate::advice::{Advice, MethodInterceptor};
use crate::config::RetryConfig;
use crate::error::Failure;
use crate::invocation::{InvocationResult, MethodInvocation, Value};

/// User attribute holding the 1-based number of the attempt in progress.
pub const RETRY_ATTEMPT_ATTRIBUTE: &str = "retry.attempt";

type RetryPredicate = dyn Fn(&Failure) -> bool + Send + Sync;

/// Around advice retrying failed calls with exponential backoff.
pub struct RetryAdvice {
    config: RetryConfig,
    retryable: Arc<RetryPredicate>,
}

impl RetryAdvice {
    /// Retry every failure according to `config`.
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            retryable: Arc::new(|_: &Failure| true),
        }
    }

    /// Only retry failures for which `predicate` returns true.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Failure) -> bool + Send + Sync + 'static,
    {
        self.retryable = Arc::new(predicate);
        self
    }

    pub fn into_advice(self) -> Advice {
        Advice::Around(Arc::new(self))
    }

    fn backoff(&self) -> ExponentialBuilder {
        let builder = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.config.min_delay_ms))
            .with_max_delay(Duration::from_millis(self.config.max_delay_ms))
            .with_max_times(self.config.max_times);
        if self.config.jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }
}

impl MethodInterceptor for RetryAdvice {
    fn invoke(&self, invocation: &mut MethodInvocation) -> InvocationResult {
        let attributes = invocation.user_attributes();
        let method = invocation.method().to_string();
        let mut attempt: u64 = 0;

        let run = || {
            attempt += 1;
            attributes.set(RETRY_ATTEMPT_ATTRIBUTE, Some(Value::from(attempt)));
            invocation.resume_clone().proceed()
        };

        run.retry(self.backoff())
            .sleep(std::thread::sleep)
            .when(|failure: &Failure| (self.retryable)(failure))
            .notify(|failure: &Failure, delay: Duration| {
                warn!(
                    method = %method,
                    error = %failure,
                    delay = ?delay,
                    "Call failed, retrying"
                );
            })
            .call()
    }
}
