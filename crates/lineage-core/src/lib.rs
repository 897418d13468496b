//! Lineage Core - Fundamental types and the object heap
//!
//! This crate defines the primitives every other Lineage crate builds on:
//! - Identifiers (`ObjRef` heap handles, process-wide lazy `Guid`s)
//! - Runtime values and object layout
//! - The object heap with prototype chains and the copy extender
//! - Timestamps and clocks
//! - Errors

pub mod id;
pub mod time;
pub mod value;
pub mod object;
pub mod heap;
pub mod error;

pub use id::*;
pub use time::*;
pub use value::*;
pub use object::*;
pub use heap::*;
pub use error::*;
