//! Event instances and handlers

use std::fmt;
use std::rc::Rc;

use lineage_core::{LineageResult, ObjRef, Timestamp, Value};

/// Name of the event fired on a superclass whenever something inherits from it
pub const INHERITED: &str = "inherited";

/// One dispatch of one event type on one owner.
///
/// Built fresh by every `trigger` call and only lent to handlers.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Event type; matches the registration key
    pub event_type: String,
    /// When the dispatch started
    pub time: Timestamp,
    /// Owner the event was triggered on
    pub source: ObjRef,
}

impl Event {
    pub fn new(event_type: &str, time: Timestamp, source: ObjRef) -> Self {
        Event {
            event_type: event_type.to_string(),
            time,
            source,
        }
    }

    /// The receiver handlers run against (always the source)
    #[inline]
    pub fn this(&self) -> ObjRef {
        self.source
    }
}

/// Handler signature: dispatch context, the event, the extra trigger arguments.
///
/// Returning exactly `Value::Bool(false)` stops the dispatch pass.
pub type HandlerFn<C> = dyn Fn(&mut C, &Event, &[Value]) -> LineageResult<Value>;

/// A registered handler.
///
/// Clones share identity: `off` with a clone removes the original.
pub struct Handler<C> {
    callback: Rc<HandlerFn<C>>,
}

impl<C> Handler<C> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut C, &Event, &[Value]) -> LineageResult<Value> + 'static,
    {
        Handler {
            callback: Rc::new(f),
        }
    }

    #[inline]
    pub fn call(&self, ctx: &mut C, event: &Event, args: &[Value]) -> LineageResult<Value> {
        (self.callback)(ctx, event, args)
    }

    /// Same registration identity
    #[inline]
    pub fn same(&self, other: &Handler<C>) -> bool {
        Rc::ptr_eq(&self.callback, &other.callback)
    }
}

impl<C> Clone for Handler<C> {
    fn clone(&self) -> Self {
        Handler {
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<C> PartialEq for Handler<C> {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl<C> fmt::Debug for Handler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.callback) as *const ())
    }
}
