//! Advice chains: the ordered entries wrapped around one proxied method.
//!
//! A chain is built once per (target type, method) from the advisors whose
//! static pointcut matches, then shared read-only by every call.

use tracing::debug;

use crate::advice::{Advice, AdviceKind, Advisor};
use crate::invocation::Method;
use crate::pointcut::DynamicMatcher;

/// One step of a chain.
#[derive(Debug, Clone)]
pub struct AdviceEntry {
    advice: Advice,
    order: i32,
    matcher: Option<DynamicMatcher>,
}

impl AdviceEntry {
    /// A statically resolved entry.
    pub fn new(advice: Advice, order: i32) -> Self {
        Self {
            advice,
            order,
            matcher: None,
        }
    }

    /// Entry that must be re-checked against each call.
    pub fn with_matcher(mut self, matcher: DynamicMatcher) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub fn kind(&self) -> AdviceKind {
        self.advice.kind()
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn advice(&self) -> &Advice {
        &self.advice
    }

    pub fn matcher(&self) -> Option<&DynamicMatcher> {
        self.matcher.as_ref()
    }

    pub fn is_dynamic(&self) -> bool {
        self.matcher.is_some()
    }
}

/// Ordered, immutable sequence of entries.
///
/// Entries are sorted once at construction by `order`, then by
/// [`AdviceKind::precedence`]; the sort is stable so declaration order
/// decides the rest. Nothing reorders them afterwards.
#[derive(Debug, Default)]
pub struct AdviceChain {
    entries: Vec<AdviceEntry>,
}

impl AdviceChain {
    pub fn new(mut entries: Vec<AdviceEntry>) -> Self {
        entries.sort_by_key(|entry| (entry.order, entry.kind().precedence()));
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[AdviceEntry] {
        &self.entries
    }

    pub fn kinds(&self) -> Vec<AdviceKind> {
        self.entries.iter().map(AdviceEntry::kind).collect()
    }

    /// Build the chain for `method` on `target_type` from candidate advisors.
    ///
    /// Advisors whose static pointcut rejects the method are dropped; those
    /// carrying a dynamic matcher keep it for per-call evaluation.
    pub fn for_method(advisors: &[Advisor], method: &Method, target_type: &str) -> Self {
        let entries: Vec<AdviceEntry> = advisors
            .iter()
            .filter(|advisor| advisor.pointcut().matches_method(method, target_type))
            .map(|advisor| {
                let entry = AdviceEntry::new(advisor.advice().clone(), advisor.order());
                match advisor.pointcut().dynamic_matcher() {
                    Some(matcher) => entry.with_matcher(matcher),
                    None => entry,
                }
            })
            .collect();

        debug!(
            method = %method,
            target_type = %target_type,
            candidates = advisors.len(),
            entries = entries.len(),
            "Built advice chain"
        );

        Self::new(entries)
    }
}
