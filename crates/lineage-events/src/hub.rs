//! Event hub
//!
//! Registrations are keyed by the owner's guid and the event type name; they
//! are never stored on the owner object. Each (owner, type) pair holds an
//! ordered handler list: insertion order is invocation order, and the same
//! handler registered twice runs twice.
//!
//! Dispatch is driven through [`EventContext`] so that handlers receive the
//! whole context mutably (they may register, remove or trigger while running).
//! A dispatch pass iterates a snapshot taken before the first handler runs,
//! so changes made by handlers only affect later passes.

use std::collections::HashMap;

use lineage_core::{Guid, LineageResult, ObjRef, Timestamp, Value};
use tracing::{debug, trace};

use crate::{Event, Handler};

/// Per-owner registrations: event type -> handlers
type Registrations<C> = HashMap<String, Vec<Handler<C>>>;

/// Registration table for one realm
pub struct EventHub<C> {
    owners: HashMap<Guid, Registrations<C>>,
}

impl<C> EventHub<C> {
    pub fn new() -> Self {
        EventHub {
            owners: HashMap::new(),
        }
    }

    /// Append `handler` to the list for (`owner`, `event_type`)
    pub fn on(&mut self, owner: Guid, event_type: &str, handler: Handler<C>) {
        self.owners
            .entry(owner)
            .or_default()
            .entry(event_type.to_string())
            .or_default()
            .push(handler);
    }

    /// Remove every occurrence of `handler`, or the whole list when `None`.
    ///
    /// Returns how many handlers were removed. Empty lists are dropped.
    pub fn off(&mut self, owner: Guid, event_type: &str, handler: Option<&Handler<C>>) -> usize {
        let Some(registrations) = self.owners.get_mut(&owner) else {
            return 0;
        };

        let removed = match handler {
            Some(handler) => match registrations.get_mut(event_type) {
                Some(list) => {
                    let before = list.len();
                    list.retain(|h| !h.same(handler));
                    let removed = before - list.len();
                    if list.is_empty() {
                        registrations.remove(event_type);
                    }
                    removed
                }
                None => 0,
            },
            None => registrations
                .remove(event_type)
                .map(|list| list.len())
                .unwrap_or(0),
        };

        if registrations.is_empty() {
            self.owners.remove(&owner);
        }
        removed
    }

    /// Drop every registration of `owner`
    pub fn off_all(&mut self, owner: Guid) -> usize {
        self.owners
            .remove(&owner)
            .map(|registrations| registrations.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Copy of the current handler list for (`owner`, `event_type`)
    pub fn snapshot(&self, owner: Guid, event_type: &str) -> Vec<Handler<C>> {
        self.owners
            .get(&owner)
            .and_then(|registrations| registrations.get(event_type))
            .cloned()
            .unwrap_or_default()
    }

    pub fn listener_count(&self, owner: Guid, event_type: &str) -> usize {
        self.owners
            .get(&owner)
            .and_then(|registrations| registrations.get(event_type))
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn has_listeners(&self, owner: Guid, event_type: &str) -> bool {
        self.listener_count(owner, event_type) > 0
    }

    /// Event types with at least one handler on `owner`, sorted
    pub fn event_types(&self, owner: Guid) -> Vec<String> {
        let mut types: Vec<String> = self
            .owners
            .get(&owner)
            .map(|registrations| registrations.keys().cloned().collect())
            .unwrap_or_default();
        types.sort();
        types
    }

    /// Number of owners with at least one registration
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

impl<C> Default for EventHub<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Context a dispatch runs in
pub trait EventContext: Sized {
    fn event_hub(&self) -> &EventHub<Self>;

    fn event_hub_mut(&mut self) -> &mut EventHub<Self>;

    /// Guid of `owner`, assigning one if needed
    fn identify(&mut self, owner: ObjRef) -> LineageResult<Guid>;

    /// Timestamp stamped on new events
    fn now(&self) -> Timestamp;
}

/// Register `handler` for `event_type` on `owner`. Returns `owner`.
pub fn on<C: EventContext>(
    ctx: &mut C,
    owner: ObjRef,
    event_type: &str,
    handler: Handler<C>,
) -> LineageResult<ObjRef> {
    let guid = ctx.identify(owner)?;
    ctx.event_hub_mut().on(guid, event_type, handler);
    trace!(%owner, event_type, "handler registered");
    Ok(owner)
}

/// Unregister one handler (every occurrence) or, with `None`, all handlers of
/// `event_type` on `owner`. Returns `owner`; removing nothing is not an error.
pub fn off<C: EventContext>(
    ctx: &mut C,
    owner: ObjRef,
    event_type: &str,
    handler: Option<&Handler<C>>,
) -> LineageResult<ObjRef> {
    let guid = ctx.identify(owner)?;
    let removed = ctx.event_hub_mut().off(guid, event_type, handler);
    trace!(%owner, event_type, removed, "handlers removed");
    Ok(owner)
}

/// Dispatch `event_type` on `owner`.
///
/// Handlers run in registration order over a snapshot of the list. A handler
/// returning exactly `false` ends the pass and makes this return `Ok(false)`;
/// a handler error ends the pass and is returned as is.
pub fn trigger<C: EventContext>(
    ctx: &mut C,
    owner: ObjRef,
    event_type: &str,
    args: &[Value],
) -> LineageResult<bool> {
    let guid = ctx.identify(owner)?;
    let handlers = ctx.event_hub().snapshot(guid, event_type);
    let event = Event::new(event_type, ctx.now(), owner);

    debug!(%owner, event_type, handlers = handlers.len(), "trigger");

    for (index, handler) in handlers.iter().enumerate() {
        trace!(%owner, event_type, index, "invoking handler");
        if handler.call(ctx, &event, args)?.is_false() {
            debug!(%owner, event_type, index, "dispatch stopped by handler");
            return Ok(false);
        }
    }
    Ok(true)
}
