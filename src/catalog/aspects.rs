//! Aspect declarations registered in code.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::advice::Advisor;
use crate::error::MetadataError;
use crate::interfaces::{AdviceMetadataParser, AspectInstanceFactory, Instantiation, SourceType};

type BuildFn = dyn Fn(&dyn AspectInstanceFactory) -> Result<Vec<Advisor>, MetadataError> + Send + Sync;

/// A component type that declares advice.
///
/// Advisors are built from the shared instance, so advice bodies may hold
/// on to the aspect's state. An invalid pointcut surfaces as a metadata
/// error for the declaring source.
pub trait Aspect: Any + Send + Sync {
    fn advisors(self: Arc<Self>) -> Result<Vec<Advisor>, MetadataError>;
}

/// How one aspect type is instantiated and turned into advisors.
#[derive(Clone)]
pub struct AspectDeclaration {
    instantiation: Instantiation,
    build: Arc<BuildFn>,
}

impl AspectDeclaration {
    pub fn new<F>(instantiation: Instantiation, build: F) -> Self
    where
        F: Fn(&dyn AspectInstanceFactory) -> Result<Vec<Advisor>, MetadataError> + Send + Sync + 'static,
    {
        Self {
            instantiation,
            build: Arc::new(build),
        }
    }

    pub fn instantiation(&self) -> Instantiation {
        self.instantiation
    }
}

/// Metadata parser over explicitly declared aspect types.
///
/// Every advisor extracted through a factory is stamped with the factory's
/// order and source id.
#[derive(Clone, Default)]
pub struct AspectCatalog {
    declarations: HashMap<String, AspectDeclaration>,
}

impl AspectCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an aspect type with a custom advisor builder.
    pub fn declare(mut self, type_name: impl Into<String>, declaration: AspectDeclaration) -> Self {
        self.declarations.insert(type_name.into(), declaration);
        self
    }

    /// Declare an aspect type implemented by `A`.
    ///
    /// The component instance must be an `A`; anything else is reported as a
    /// malformed declaration.
    pub fn register<A: Aspect>(self, type_name: impl Into<String>, instantiation: Instantiation) -> Self {
        let type_name = type_name.into();
        let declared = type_name.clone();
        let declaration = AspectDeclaration::new(instantiation, move |factory| {
            let aspect = factory
                .instance()?
                .downcast::<A>()
                .map_err(|_| MetadataError::Malformed {
                    type_name: declared.clone(),
                    message: format!("instance of '{}' is not a {}", factory.source_id(), std::any::type_name::<A>()),
                })?;
            aspect.advisors()
        });
        self.declare(type_name, declaration)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

impl fmt::Debug for AspectCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.declarations
                    .iter()
                    .map(|(name, declaration)| (name, declaration.instantiation)),
            )
            .finish()
    }
}

impl AdviceMetadataParser for AspectCatalog {
    fn is_advice_source(&self, source_type: &SourceType) -> bool {
        self.declarations.contains_key(source_type.name())
    }

    fn instantiation(&self, source_type: &SourceType) -> Instantiation {
        self.declarations
            .get(source_type.name())
            .map(AspectDeclaration::instantiation)
            .unwrap_or_default()
    }

    fn extract_advice(&self, factory: &dyn AspectInstanceFactory) -> Result<Vec<Advisor>, MetadataError> {
        let type_name = factory.source_type().name();
        let declaration = self
            .declarations
            .get(type_name)
            .ok_or_else(|| MetadataError::UnknownType {
                type_name: type_name.to_string(),
            })?;

        let order = factory.order();
        let advisors: Vec<Advisor> = (declaration.build)(factory)?
            .into_iter()
            .map(|advisor| advisor.with_order(order).with_source(factory.source_id()))
            .collect();

        debug!(
            source = %factory.source_id(),
            aspect = %type_name,
            advisors = advisors.len(),
            "Extracted advisors"
        );
        Ok(advisors)
    }
}
