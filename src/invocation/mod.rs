//! In-flight method invocations and the `proceed` chain driver.
//!
//! A [`MethodInvocation`] represents one call travelling through an
//! [`AdviceChain`]. Advice receives the invocation as its continuation and
//! calls [`MethodInvocation::proceed`] to run the remainder of the chain:
//!
//! ```text
//! proceed() ─► entry 0 ─► proceed() ─► entry 1 ─► proceed() ─► target
//!                 ◄──────────────────────◄───────────────────◄── result
//! ```
//!
//! The cursor starts at -1 ("before the first entry"). Each `proceed` either
//! advances onto the next entry or, once every entry has been consumed,
//! invokes the real target. Entries carrying a dynamic matcher are
//! re-evaluated against the current arguments on every pass and skipped
//! when they do not match.

mod attributes;
mod method;

pub use attributes::UserAttributes;
pub use method::{Method, ParamType};

use std::fmt;
use std::sync::Arc;

use tracing::trace;
use uuid::Uuid;

use crate::chain::AdviceChain;
use crate::error::{Failure, InvocationError};
use crate::interfaces::Target;

/// Dynamic argument and return value representation.
pub type Value = serde_json::Value;

/// Outcome of a proxied call: the real return value or the failure raised.
pub type InvocationResult = Result<Value, Failure>;

/// Cursor value before any entry has been consumed.
const BEFORE_FIRST: isize = -1;

/// One call travelling through an advice chain.
///
/// Owned by a single logical call. Clones share the chain and the user
/// attribute bag but carry their own cursor and arguments.
pub struct MethodInvocation {
    proxy_id: Uuid,
    target: Option<Arc<dyn Target>>,
    method: Arc<Method>,
    target_type: Option<String>,
    arguments: Vec<Value>,
    chain: Arc<AdviceChain>,
    cursor: isize,
    attributes: Option<UserAttributes>,
}

impl MethodInvocation {
    /// Create an invocation positioned before the first chain entry.
    ///
    /// Arguments are adapted to the method signature before anything runs.
    pub fn new(
        proxy_id: Uuid,
        target: Option<Arc<dyn Target>>,
        method: Arc<Method>,
        target_type: Option<String>,
        arguments: Vec<Value>,
        chain: Arc<AdviceChain>,
    ) -> Self {
        let arguments = method.adapt_arguments(arguments);
        Self {
            proxy_id,
            target,
            method,
            target_type,
            arguments,
            chain,
            cursor: BEFORE_FIRST,
            attributes: None,
        }
    }

    pub fn proxy_id(&self) -> Uuid {
        self.proxy_id
    }

    /// The target object, or `None` for target-less proxies.
    pub fn this(&self) -> Option<&Arc<dyn Target>> {
        self.target.as_ref()
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Type used for dynamic matching: the target type if known, otherwise
    /// the declaring type of the method.
    pub fn target_type(&self) -> &str {
        self.target_type
            .as_deref()
            .unwrap_or_else(|| self.method.declaring_type())
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    pub fn arguments_mut(&mut self) -> &mut Vec<Value> {
        &mut self.arguments
    }

    pub fn set_arguments(&mut self, arguments: Vec<Value>) {
        self.arguments = arguments;
    }

    pub fn chain(&self) -> &Arc<AdviceChain> {
        &self.chain
    }

    /// Index of the entry currently running, -1 before the first.
    pub fn cursor(&self) -> isize {
        self.cursor
    }

    /// Run the remainder of the chain.
    ///
    /// Once every entry has been consumed the real target is invoked and its
    /// outcome returned verbatim. Otherwise the next entry is handed this
    /// invocation as its continuation.
    pub fn proceed(&mut self) -> InvocationResult {
        let consumed = (self.cursor + 1) as usize;
        if consumed == self.chain.len() {
            return self.invoke_joinpoint();
        }

        self.cursor += 1;
        let chain = Arc::clone(&self.chain);
        let entry = &chain.entries()[self.cursor as usize];

        if let Some(matcher) = entry.matcher() {
            if !matcher.matches(&self.method, self.target_type(), &self.arguments) {
                trace!(
                    method = %self.method,
                    index = self.cursor,
                    kind = %entry.kind(),
                    "Dynamic match failed, skipping entry"
                );
                return self.proceed();
            }
        }

        trace!(
            method = %self.method,
            index = self.cursor,
            kind = %entry.kind(),
            "Invoking advice"
        );
        entry.advice().invoke(self)
    }

    fn invoke_joinpoint(&self) -> InvocationResult {
        match &self.target {
            Some(target) => {
                trace!(method = %self.method, "Invoking target");
                target.invoke(&self.method, &self.arguments)
            }
            None => Err(Box::new(InvocationError::NoTarget {
                method: self.method.to_string(),
            })),
        }
    }

    /// Clone that re-drives the whole chain from the start.
    ///
    /// The clone gets its own cursor (reset to -1) and a copy of the current
    /// arguments, and shares the chain and user attribute bag.
    pub fn invocable_clone(&mut self) -> MethodInvocation {
        let arguments = self.arguments.clone();
        self.invocable_clone_with(arguments)
    }

    /// Like [`invocable_clone`](Self::invocable_clone), with replacement arguments.
    pub fn invocable_clone_with(&mut self, arguments: Vec<Value>) -> MethodInvocation {
        let mut clone = self.shallow_clone(arguments);
        clone.cursor = BEFORE_FIRST;
        clone
    }

    /// Clone positioned where this invocation currently is.
    ///
    /// Calling `proceed` on it runs only the entries after the current one,
    /// which is what an around advice needs to re-drive "the rest of the
    /// chain" without re-entering itself.
    pub fn resume_clone(&mut self) -> MethodInvocation {
        let arguments = self.arguments.clone();
        self.shallow_clone(arguments)
    }

    fn shallow_clone(&mut self, arguments: Vec<Value>) -> MethodInvocation {
        // Create the bag now so the clone holds the same reference.
        let attributes = self.user_attributes();
        MethodInvocation {
            proxy_id: self.proxy_id,
            target: self.target.clone(),
            method: Arc::clone(&self.method),
            target_type: self.target_type.clone(),
            arguments,
            chain: Arc::clone(&self.chain),
            cursor: self.cursor,
            attributes: Some(attributes),
        }
    }

    /// Insert an attribute, or remove it when `value` is `None`.
    pub fn set_user_attribute(&mut self, key: impl Into<String>, value: Option<Value>) {
        match value {
            Some(value) => self.user_attributes().set(key, Some(value)),
            None => {
                if let Some(attributes) = &self.attributes {
                    attributes.set(key, None);
                }
            }
        }
    }

    pub fn user_attribute(&self, key: &str) -> Option<Value> {
        self.attributes.as_ref().and_then(|attrs| attrs.get(key))
    }

    /// The attribute bag, created on first use.
    pub fn user_attributes(&mut self) -> UserAttributes {
        self.attributes
            .get_or_insert_with(UserAttributes::new)
            .clone()
    }
}

impl fmt::Debug for MethodInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInvocation")
            .field("proxy_id", &self.proxy_id)
            .field("method", &self.method.to_string())
            .field("target_type", &self.target_type())
            .field("arguments", &self.arguments)
            .field("cursor", &self.cursor)
            .field("chain_len", &self.chain.len())
            .finish()
    }
}

impl fmt::Display for MethodInvocation {
    // Never format the target itself: it may be another proxy.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodInvocation: {}; ", self.method)?;
        match &self.target {
            Some(target) => write!(f, "target is of type [{}]", target.type_name()),
            None => f.write_str("target is null"),
        }
    }
}

/// Read/write view of an invocation handed to non-around advice.
///
/// Exposes the call context but not `proceed`: the advice kind decides
/// when the rest of the chain runs.
pub struct JoinPoint<'a> {
    invocation: &'a mut MethodInvocation,
}

impl<'a> JoinPoint<'a> {
    pub(crate) fn new(invocation: &'a mut MethodInvocation) -> Self {
        Self { invocation }
    }

    pub fn proxy_id(&self) -> Uuid {
        self.invocation.proxy_id()
    }

    pub fn method(&self) -> &Method {
        self.invocation.method()
    }

    pub fn target_type(&self) -> &str {
        self.invocation.target_type()
    }

    pub fn this(&self) -> Option<&Arc<dyn Target>> {
        self.invocation.this()
    }

    pub fn arguments(&self) -> &[Value] {
        self.invocation.arguments()
    }

    pub fn arguments_mut(&mut self) -> &mut Vec<Value> {
        self.invocation.arguments_mut()
    }

    pub fn set_arguments(&mut self, arguments: Vec<Value>) {
        self.invocation.set_arguments(arguments);
    }

    pub fn user_attribute(&self, key: &str) -> Option<Value> {
        self.invocation.user_attribute(key)
    }

    pub fn set_user_attribute(&mut self, key: impl Into<String>, value: Option<Value>) {
        self.invocation.set_user_attribute(key, value);
    }

    /// Signature string, e.g. `Calculate.add(int, int)`.
    pub fn signature(&self) -> String {
        self.invocation.method().to_string()
    }
}
