//! Call logging advice.

use tracing::info;

use crate::advice::Advice;

/// Before advice that logs the method name and arguments of each call.
pub fn logging_advice(aspect: &'static str) -> Advice {
    Advice::before(move |jp| {
        info!(
            aspect = aspect,
            method = %jp.method().name(),
            target_type = %jp.target_type(),
            args = ?jp.arguments(),
            "Method called"
        );
        Ok(())
    })
}
