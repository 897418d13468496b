//! Error types for Lineage

use thiserror::Error;

use crate::{ObjRef, Value};

/// Core Lineage errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LineageError {
    // Heap errors
    #[error("Unknown object: {0}")]
    UnknownObject(ObjRef),

    #[error("Heap exhausted at {0} objects")]
    HeapExhausted(usize),

    #[error("Expected an object, got {0}")]
    NotAnObject(&'static str),

    #[error("Prototype cycle: {proto} already inherits from {object}")]
    CyclicPrototype { object: ObjRef, proto: ObjRef },

    // Misuse errors
    #[error("Not a function: {0}")]
    NotAFunction(ObjRef),

    #[error("Not a constructor: {0}")]
    NotAConstructor(ObjRef),

    #[error("Property {key:?} is not callable")]
    NotCallable { key: String },

    #[error("Cyclic inheritance: {child} cannot inherit from {parent}")]
    CyclicInheritance { child: ObjRef, parent: ObjRef },

    // Raised by user code (function bodies, event handlers)
    #[error("Uncaught {0}")]
    Thrown(Value),
}

/// Result type for Lineage operations
pub type LineageResult<T> = Result<T, LineageError>;
