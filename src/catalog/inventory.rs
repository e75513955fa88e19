//! In-memory component inventory.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::Failure;
use crate::interfaces::{ComponentInventory, Instance, SourceType};

type Constructor = dyn Fn() -> Result<Instance, Failure> + Send + Sync;

struct Component {
    id: String,
    source_type: Option<SourceType>,
    singleton: bool,
    constructor: Arc<Constructor>,
    shared: OnceLock<Instance>,
}

/// Error returned for ids the inventory does not know.
#[derive(Debug, thiserror::Error)]
#[error("No component registered under '{0}'")]
pub struct UnknownComponent(pub String);

/// Inventory of explicitly registered components.
///
/// Singleton components are constructed once, on first request. Prototype
/// components are constructed on every request. Registration order is the
/// candidate order.
#[derive(Default)]
pub struct InMemoryInventory {
    components: RwLock<Vec<Arc<Component>>>,
    list_calls: AtomicUsize,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component with one shared instance.
    pub fn register_singleton<T, F>(&self, id: impl Into<String>, source_type: SourceType, constructor: F)
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.insert(id.into(), Some(source_type), true, wrap(constructor));
    }

    /// Register a component constructed afresh on every request.
    pub fn register_prototype<T, F>(&self, id: impl Into<String>, source_type: SourceType, constructor: F)
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.insert(id.into(), Some(source_type), false, wrap(constructor));
    }

    /// Register a component whose type cannot be resolved.
    pub fn register_untyped<T, F>(&self, id: impl Into<String>, constructor: F)
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.insert(id.into(), None, true, wrap(constructor));
    }

    /// Register a component whose construction may fail.
    pub fn register_fallible<F>(
        &self,
        id: impl Into<String>,
        source_type: SourceType,
        singleton: bool,
        constructor: F,
    ) where
        F: Fn() -> Result<Instance, Failure> + Send + Sync + 'static,
    {
        self.insert(id.into(), Some(source_type), singleton, Arc::new(constructor));
    }

    /// Number of times `list_candidates` has been called.
    pub fn list_candidate_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.components.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, id: String, source_type: Option<SourceType>, singleton: bool, constructor: Arc<Constructor>) {
        debug!(id = %id, singleton, "Registering component");
        let component = Arc::new(Component {
            id: id.clone(),
            source_type,
            singleton,
            constructor,
            shared: OnceLock::new(),
        });

        let mut components = self.components.write();
        match components.iter().position(|c| c.id == id) {
            Some(index) => components[index] = component,
            None => components.push(component),
        }
    }

    fn find(&self, id: &str) -> Option<Arc<Component>> {
        self.components.read().iter().find(|c| c.id == id).cloned()
    }
}

fn wrap<T, F>(constructor: F) -> Arc<Constructor>
where
    T: Any + Send + Sync,
    F: Fn() -> T + Send + Sync + 'static,
{
    Arc::new(move || Ok(Arc::new(constructor()) as Instance))
}

impl fmt::Debug for InMemoryInventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.components.read().iter().map(|c| c.id.clone()).collect();
        f.debug_struct("InMemoryInventory")
            .field("components", &ids)
            .field("list_calls", &self.list_candidate_calls())
            .finish()
    }
}

impl ComponentInventory for InMemoryInventory {
    fn list_candidates(&self) -> Vec<String> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.components.read().iter().map(|c| c.id.clone()).collect()
    }

    fn type_of(&self, id: &str) -> Option<SourceType> {
        self.find(id).and_then(|c| c.source_type.clone())
    }

    fn is_singleton(&self, id: &str) -> bool {
        self.find(id).map(|c| c.singleton).unwrap_or(false)
    }

    fn instance(&self, id: &str) -> Result<Instance, Failure> {
        let component = self
            .find(id)
            .ok_or_else(|| Box::new(UnknownComponent(id.to_string())) as Failure)?;

        if !component.singleton {
            return (component.constructor)();
        }

        if let Some(instance) = component.shared.get() {
            return Ok(Arc::clone(instance));
        }
        let instance = (component.constructor)()?;
        Ok(Arc::clone(component.shared.get_or_init(|| instance)))
    }
}
