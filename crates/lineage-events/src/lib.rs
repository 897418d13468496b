//! Lineage Events - Per-object publish/subscribe
//!
//! Any object (constructors included) can own named events. Handlers are
//! stored in an [`EventHub`] keyed by the owner's guid and dispatched
//! synchronously, in registration order, over a snapshot of the handler list.

pub mod event;
pub mod hub;

pub use event::*;
pub use hub::*;
