//! Object layout
//!
//! Every object carries a small header (lazy guid, prototype link) and an
//! ordered property table. Function objects additionally own a body and the
//! prototype object handed to their instances.

use crate::{Guid, ObjRef, Value};

/// A data property
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    pub value: Value,
    /// Hidden properties are skipped by `keys` and by `extend`
    pub enumerable: bool,
}

impl Property {
    pub fn enumerable(value: Value) -> Self {
        Property {
            value,
            enumerable: true,
        }
    }

    pub fn hidden(value: Value) -> Self {
        Property {
            value,
            enumerable: false,
        }
    }
}

/// Own properties in insertion order.
///
/// Objects in this model hold a handful of keys, so lookups scan linearly.
#[derive(Clone, Debug, Default)]
pub struct PropertyMap {
    entries: Vec<(String, Property)>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Property> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, p)| p)
    }

    /// Insert or overwrite. Overwriting keeps the key's original position.
    pub fn insert(&mut self, key: &str, property: Property) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = property,
            None => self.entries.push((key.to_string(), property)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Property> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Own enumerable entries, insertion order
    pub fn enumerable(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .filter(|(_, p)| p.enumerable)
            .map(|(k, p)| (k.as_str(), &p.value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Callable part of a function object
#[derive(Clone, Debug)]
pub struct FunctionData<F> {
    pub name: String,
    /// Object installed as the prototype of every instance
    pub prototype: ObjRef,
    pub body: F,
}

/// Object kind
#[derive(Clone, Debug)]
pub enum ObjectKind<F> {
    Plain,
    Function(FunctionData<F>),
}

/// A heap object
#[derive(Clone, Debug)]
pub struct Object<F> {
    /// Assigned on first request, never a property
    pub(crate) guid: Option<Guid>,
    pub(crate) proto: Option<ObjRef>,
    pub(crate) properties: PropertyMap,
    pub(crate) kind: ObjectKind<F>,
}

impl<F> Object<F> {
    pub fn plain(proto: Option<ObjRef>) -> Self {
        Object {
            guid: None,
            proto,
            properties: PropertyMap::new(),
            kind: ObjectKind::Plain,
        }
    }

    pub fn function(proto: Option<ObjRef>, data: FunctionData<F>) -> Self {
        Object {
            guid: None,
            proto,
            properties: PropertyMap::new(),
            kind: ObjectKind::Function(data),
        }
    }

    #[inline]
    pub fn guid(&self) -> Option<Guid> {
        self.guid
    }

    #[inline]
    pub fn proto(&self) -> Option<ObjRef> {
        self.proto
    }

    #[inline]
    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn as_function(&self) -> Option<&FunctionData<F>> {
        match &self.kind {
            ObjectKind::Function(data) => Some(data),
            ObjectKind::Plain => None,
        }
    }

    #[inline]
    pub fn is_function(&self) -> bool {
        self.as_function().is_some()
    }
}
