//! Lineage Runtime - Realm orchestration
//!
//! This crate ties the core heap and the event hub together:
//! 1. Ancestry registry (superclass links, mixin records)
//! 2. Inheritance composer (`Realm::inherit`, fires `inherited`)
//! 3. Mixin composer (`Realm::mixin`, flattened copy + initializer + record)
//! 4. Capability query (`Realm::is`)
//! 5. Realm and logging configuration

pub mod ancestry;
pub mod config;
pub mod logging;
pub mod realm;

pub use ancestry::*;
pub use config::*;
pub use logging::*;
pub use realm::*;
