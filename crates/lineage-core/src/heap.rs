//! Object heap
//!
//! The heap owns every object of one realm and hands out `ObjRef` handles.
//! Objects are never freed; a realm's heap is dropped as a whole.
//!
//! The heap is generic over the function body type `F` so that the layer
//! which knows how to *call* a function (the realm) can pick its own
//! signature without this crate depending on it.
//!
//! Prototype links can only point at objects that already exist, and
//! [`Heap::set_prototype_of`] refuses to close a loop, so every prototype
//! chain is finite.

use tracing::trace;

use crate::{
    next_guid, FunctionData, Guid, LineageError, LineageResult, ObjRef, Object, Property, Value,
};

/// Arena of realm objects
pub struct Heap<F> {
    objects: Vec<Object<F>>,
}

impl<F> Heap<F> {
    pub fn new() -> Self {
        Heap {
            objects: Vec::new(),
        }
    }

    /// Number of allocated objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Allocate a plain object with the given prototype link
    pub fn alloc(&mut self, proto: Option<ObjRef>) -> LineageResult<ObjRef> {
        self.check_link(proto)?;
        self.push(Object::plain(proto))
    }

    /// Allocate a function object.
    ///
    /// `proto` is the function's own prototype link; `prototype` is the object
    /// its instances will delegate to.
    pub fn alloc_function(
        &mut self,
        name: &str,
        proto: Option<ObjRef>,
        prototype: ObjRef,
        body: F,
    ) -> LineageResult<ObjRef> {
        self.check_link(proto)?;
        self.object(prototype)?;
        self.push(Object::function(
            proto,
            FunctionData {
                name: name.to_string(),
                prototype,
                body,
            },
        ))
    }

    fn check_link(&self, proto: Option<ObjRef>) -> LineageResult<()> {
        match proto {
            Some(proto) => self.object(proto).map(|_| ()),
            None => Ok(()),
        }
    }

    fn push(&mut self, object: Object<F>) -> LineageResult<ObjRef> {
        let obj = handle_for(self.objects.len())?;
        self.objects.push(object);
        Ok(obj)
    }

    pub fn object(&self, obj: ObjRef) -> LineageResult<&Object<F>> {
        self.objects
            .get(obj.index())
            .ok_or(LineageError::UnknownObject(obj))
    }

    fn object_mut(&mut self, obj: ObjRef) -> LineageResult<&mut Object<F>> {
        self.objects
            .get_mut(obj.index())
            .ok_or(LineageError::UnknownObject(obj))
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    /// Guid of `obj`, assigning one on first request
    pub fn guid(&mut self, obj: ObjRef) -> LineageResult<Guid> {
        let object = self.object_mut(obj)?;
        if let Some(guid) = object.guid {
            return Ok(guid);
        }
        let guid = next_guid();
        object.guid = Some(guid);
        trace!(object = %obj, %guid, "assigned guid");
        Ok(guid)
    }

    /// Guid of `obj` if one was already assigned
    pub fn existing_guid(&self, obj: ObjRef) -> LineageResult<Option<Guid>> {
        Ok(self.object(obj)?.guid)
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Look `key` up along the prototype chain. Missing keys read as undefined.
    pub fn get(&self, obj: ObjRef, key: &str) -> LineageResult<Value> {
        let mut current = Some(obj);
        while let Some(cursor) = current {
            let object = self.object(cursor)?;
            if let Some(property) = object.properties.get(key) {
                return Ok(property.value.clone());
            }
            current = object.proto;
        }
        Ok(Value::Undefined)
    }

    pub fn get_own(&self, obj: ObjRef, key: &str) -> LineageResult<Option<&Value>> {
        Ok(self.object(obj)?.properties.get(key).map(|p| &p.value))
    }

    pub fn has_own(&self, obj: ObjRef, key: &str) -> LineageResult<bool> {
        Ok(self.object(obj)?.properties.contains(key))
    }

    /// Set an enumerable own property
    pub fn set(&mut self, obj: ObjRef, key: &str, value: Value) -> LineageResult<()> {
        self.object_mut(obj)?
            .properties
            .insert(key, Property::enumerable(value));
        Ok(())
    }

    /// Set a non-enumerable own property
    pub fn define_hidden(&mut self, obj: ObjRef, key: &str, value: Value) -> LineageResult<()> {
        self.object_mut(obj)?
            .properties
            .insert(key, Property::hidden(value));
        Ok(())
    }

    pub fn delete(&mut self, obj: ObjRef, key: &str) -> LineageResult<bool> {
        Ok(self.object_mut(obj)?.properties.remove(key).is_some())
    }

    /// Own enumerable keys in insertion order
    pub fn keys(&self, obj: ObjRef) -> LineageResult<Vec<String>> {
        Ok(self
            .object(obj)?
            .properties
            .enumerable()
            .map(|(k, _)| k.to_string())
            .collect())
    }

    /// Copy the own enumerable properties of `source` onto `target`.
    ///
    /// Shallow; keys already on `target` are overwritten. Returns `target`.
    pub fn extend(&mut self, target: ObjRef, source: ObjRef) -> LineageResult<ObjRef> {
        let entries: Vec<(String, Value)> = self
            .object(source)?
            .properties
            .enumerable()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        self.extend_from(target, entries)
    }

    /// Copy ad-hoc entries onto `target`; later entries win
    pub fn extend_from<I, K>(&mut self, target: ObjRef, entries: I) -> LineageResult<ObjRef>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let object = self.object_mut(target)?;
        for (key, value) in entries {
            object
                .properties
                .insert(key.as_ref(), Property::enumerable(value));
        }
        Ok(target)
    }

    // ------------------------------------------------------------------
    // Prototype chain
    // ------------------------------------------------------------------

    pub fn prototype_of(&self, obj: ObjRef) -> LineageResult<Option<ObjRef>> {
        Ok(self.object(obj)?.proto)
    }

    /// Re-link `obj` to `proto`. Refuses links that would make the chain loop.
    pub fn set_prototype_of(&mut self, obj: ObjRef, proto: Option<ObjRef>) -> LineageResult<()> {
        if let Some(proto) = proto {
            if proto == obj || self.prototype_chain(proto)?.contains(&obj) {
                return Err(LineageError::CyclicPrototype { object: obj, proto });
            }
        }
        self.object_mut(obj)?.proto = proto;
        Ok(())
    }

    /// Objects `obj` delegates to, nearest first (excluding `obj` itself)
    pub fn prototype_chain(&self, obj: ObjRef) -> LineageResult<Vec<ObjRef>> {
        let mut chain = Vec::new();
        let mut current = self.object(obj)?.proto;
        while let Some(cursor) = current {
            chain.push(cursor);
            current = self.object(cursor)?.proto;
        }
        Ok(chain)
    }

    // ------------------------------------------------------------------
    // Functions
    // ------------------------------------------------------------------

    pub fn is_function(&self, obj: ObjRef) -> LineageResult<bool> {
        Ok(self.object(obj)?.is_function())
    }

    pub fn function(&self, obj: ObjRef) -> LineageResult<&FunctionData<F>> {
        self.object(obj)?
            .as_function()
            .ok_or(LineageError::NotAFunction(obj))
    }

    /// True if `ctor.prototype` appears on `obj`'s prototype chain
    pub fn instance_of(&self, obj: ObjRef, ctor: ObjRef) -> LineageResult<bool> {
        let prototype = self.function(ctor)?.prototype;
        Ok(self.prototype_chain(obj)?.contains(&prototype))
    }
}

impl<F: Clone> Heap<F> {
    /// Clone out a function's body so it can be called while the heap is
    /// mutably borrowed by the caller
    pub fn body(&self, obj: ObjRef) -> LineageResult<F> {
        Ok(self.function(obj)?.body.clone())
    }
}

/// Handle for the slot at `len`; handles are `u32`, so the arena is capped
fn handle_for(len: usize) -> LineageResult<ObjRef> {
    u32::try_from(len)
        .map(ObjRef)
        .map_err(|_| LineageError::HeapExhausted(len))
}

impl<F> Default for Heap<F> {
    fn default() -> Self {
        Self::new()
    }
}
