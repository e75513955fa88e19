//! Pure utility functions.
//!
//! These are stateless helper functions used by binaries and embedders.

pub mod bootstrap;
