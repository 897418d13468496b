//! Lineage Test Harness - Scenario validation and hierarchy fuzzing
//!
//! This crate provides:
//! - Canonical composition scenarios (inheritance, mixins, dispatch)
//! - Seeded hierarchy fuzzing with invariant checks

pub mod fuzzer;
pub mod scenarios;

pub use fuzzer::*;
pub use scenarios::*;
