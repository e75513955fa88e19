//! The proxy currently handling a call on this thread.
//!
//! Only proxies built with `expose_proxy(true)` publish themselves here.

use std::cell::RefCell;

use uuid::Uuid;

use crate::error::InvocationError;

thread_local! {
    static CURRENT: RefCell<Vec<Uuid>> = const { RefCell::new(Vec::new()) };
}

/// Id of the innermost exposed proxy whose call is in progress.
pub fn current_proxy() -> Result<Uuid, InvocationError> {
    CURRENT
        .with(|stack| stack.borrow().last().copied())
        .ok_or(InvocationError::ProxyNotExposed)
}

/// Publishes a proxy id until dropped.
pub(crate) struct ExposedProxy {
    _private: (),
}

impl ExposedProxy {
    pub(crate) fn enter(id: Uuid) -> Self {
        CURRENT.with(|stack| stack.borrow_mut().push(id));
        Self { _private: () }
    }
}

impl Drop for ExposedProxy {
    fn drop(&mut self) {
        CURRENT.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}
