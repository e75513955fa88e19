//! Abstract interfaces for the collaborators around the interception core.
//!
//! These traits define the contracts for:
//! - Component inventory (candidate advice sources and their lifecycles)
//! - Metadata parsing (turning a recognised source type into advisors)
//! - Aspect instance factories (obtaining the backing instance per call)
//! - Targets (the real objects behind a proxy)

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::advice::Advisor;
use crate::error::{Failure, MetadataError};
use crate::invocation::{InvocationResult, Method, Value};

/// A type-erased component instance handed out by the inventory.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Declared type of a component, as reported by the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceType {
    name: String,
    order: i32,
}

impl SourceType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: 0,
        }
    }

    /// Precedence of advice declared by this type. Lower runs outermost.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn order(&self) -> i32 {
        self.order
    }
}

/// Instantiation clause declared by an advice source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instantiation {
    /// One advice-source instance shared by every matched call.
    #[default]
    Singleton,
    /// A fresh instance per proxy (`this`).
    PerThis,
    /// A fresh instance per target object.
    PerTarget,
}

impl Instantiation {
    pub fn is_per_call(self) -> bool {
        !matches!(self, Instantiation::Singleton)
    }
}

impl fmt::Display for Instantiation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Instantiation::Singleton => "singleton",
            Instantiation::PerThis => "per-this",
            Instantiation::PerTarget => "per-target",
        };
        f.write_str(name)
    }
}

/// Source of candidate components, keyed by identity.
///
/// Implementations:
/// - `InMemoryInventory`: explicit registration, used by tests and embedders
pub trait ComponentInventory: Send + Sync {
    /// All component identities, in stable registration order.
    fn list_candidates(&self) -> Vec<String>;

    /// Declared type of a component, or `None` if it cannot be resolved.
    fn type_of(&self, id: &str) -> Option<SourceType>;

    /// Whether the inventory hands out one shared instance for this id.
    fn is_singleton(&self, id: &str) -> bool;

    /// Obtain the component instance. Non-singletons yield a fresh one per call.
    fn instance(&self, id: &str) -> Result<Instance, Failure>;
}

/// Produces the instance backing an advice source.
pub trait AspectInstanceFactory: Send + Sync {
    fn source_id(&self) -> &str;

    fn source_type(&self) -> &SourceType;

    /// Obtain the instance to bind advice bodies to.
    fn instance(&self) -> Result<Instance, MetadataError>;

    /// Order applied to every advisor extracted through this factory.
    fn order(&self) -> i32 {
        self.source_type().order()
    }
}

/// Recognises advice sources and extracts their advisors.
///
/// Implementations:
/// - `AspectCatalog`: declarations registered in code
pub trait AdviceMetadataParser: Send + Sync {
    fn is_advice_source(&self, source_type: &SourceType) -> bool;

    /// Instantiation clause declared by the source type.
    fn instantiation(&self, _source_type: &SourceType) -> Instantiation {
        Instantiation::Singleton
    }

    /// Build advisors bound to the instance the factory produces.
    fn extract_advice(
        &self,
        factory: &dyn AspectInstanceFactory,
    ) -> Result<Vec<Advisor>, MetadataError>;
}

/// The real object behind a proxy.
pub trait Target: Send + Sync {
    /// Type name used for pointcut matching.
    fn type_name(&self) -> &str;

    /// Declared method signatures.
    fn methods(&self) -> Vec<Method>;

    /// Invoke a method. Failures are propagated to the caller verbatim.
    fn invoke(&self, method: &Method, arguments: &[Value]) -> InvocationResult;
}
