//! Instance factories backed by the component inventory.

use std::sync::Arc;

use crate::error::MetadataError;
use crate::interfaces::{AspectInstanceFactory, ComponentInventory, Instance, SourceType};

/// Resolves the instance of one advice source through the inventory.
///
/// Holds no instance itself. Whether repeated extractions see the same
/// object is up to the inventory's lifecycle for the component.
pub struct InventoryInstanceFactory {
    inventory: Arc<dyn ComponentInventory>,
    source_id: String,
    source_type: SourceType,
}

impl InventoryInstanceFactory {
    pub fn new(
        inventory: Arc<dyn ComponentInventory>,
        source_id: impl Into<String>,
        source_type: SourceType,
    ) -> Self {
        Self {
            inventory,
            source_id: source_id.into(),
            source_type,
        }
    }
}

impl AspectInstanceFactory for InventoryInstanceFactory {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn source_type(&self) -> &SourceType {
        &self.source_type
    }

    fn instance(&self) -> Result<Instance, MetadataError> {
        self.inventory
            .instance(&self.source_id)
            .map_err(|e| MetadataError::InstanceUnavailable {
                source_id: self.source_id.clone(),
                message: e.to_string(),
            })
    }
}
