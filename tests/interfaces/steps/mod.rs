//! Cucumber step definitions for interface tests.

pub mod advice_chain;
pub mod discovery;
