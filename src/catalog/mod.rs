//! In-process catalogs of components and aspect declarations.
//!
//! - [`InMemoryInventory`]: explicitly registered components
//! - [`AspectCatalog`]: which component types are aspects, and how to build
//!   their advisors

mod aspects;
mod inventory;

pub use aspects::{Aspect, AspectCatalog, AspectDeclaration};
pub use inventory::{InMemoryInventory, UnknownComponent};
