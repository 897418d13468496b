//! Lineage Realm - object model, inheritance, mixins and events in one place
//!
//! A realm owns:
//! 1. The object heap (objects, prototype links, function objects)
//! 2. The event hub (per-object handler registrations)
//! 3. The ancestry registry (superclass links, mixin records)
//! 4. The root `Object` constructor every class chain ends at
//!
//! Composition operations are not transactional: when a step fails, the
//! steps before it stay applied.

use std::rc::Rc;

use lineage_core::{
    Clock, Guid, Heap, LineageError, LineageResult, ObjRef, SystemClock, Timestamp, Value,
};
use lineage_events::{self as events, EventContext, EventHub, Handler};
use tracing::{debug, warn};

use crate::{AncestryRegistry, ClassRef, RealmConfig};

/// Function body: realm, `this`, arguments
pub type NativeFn = Rc<dyn Fn(&mut Realm, ObjRef, &[Value]) -> LineageResult<Value>>;

/// Handler type for realm events
pub type RealmHandler = Handler<Realm>;

/// Which part of the capability check matched
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    /// The function's prototype is on the instance's prototype chain
    Native,
    /// The function was applied to the instance as a mixin
    Mixin,
}

/// Property name installed on every function prototype pointing back at the
/// function. Hidden, so the copy extender never moves it.
const CONSTRUCTOR_KEY: &str = "constructor";
const LENGTH_KEY: &str = "length";

/// Lineage realm
pub struct Realm {
    heap: Heap<NativeFn>,
    hub: EventHub<Realm>,
    ancestry: AncestryRegistry,
    clock: Box<dyn Clock>,
    config: RealmConfig,
    object_ctor: ObjRef,
    object_prototype: ObjRef,
}

impl Realm {
    /// Create a realm with default configuration
    pub fn new() -> Self {
        Self::with_config(RealmConfig::default())
    }

    /// Create a realm with custom configuration
    pub fn with_config(config: RealmConfig) -> Self {
        let mut heap: Heap<NativeFn> = Heap::new();
        let (object_ctor, object_prototype, root_guid) =
            Self::bootstrap(&mut heap, &config.root_name).expect("Empty heap rejected root");

        debug!(root = %config.root_name, %root_guid, "realm created");

        Realm {
            heap,
            hub: EventHub::new(),
            ancestry: AncestryRegistry::with_root(ClassRef::new(object_ctor, root_guid)),
            clock: Box::new(SystemClock),
            config,
            object_ctor,
            object_prototype,
        }
    }

    fn bootstrap(heap: &mut Heap<NativeFn>, name: &str) -> LineageResult<(ObjRef, ObjRef, Guid)> {
        let prototype = heap.alloc(None)?;
        let body: NativeFn =
            Rc::new(|_: &mut Realm, _: ObjRef, _: &[Value]| Ok(Value::Undefined));
        let ctor = heap.alloc_function(name, None, prototype, body)?;
        heap.define_hidden(prototype, CONSTRUCTOR_KEY, Value::Object(ctor))?;
        let guid = heap.guid(ctor)?;
        Ok((ctor, prototype, guid))
    }

    /// Replace the clock used to stamp events
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &RealmConfig {
        &self.config
    }

    pub fn heap(&self) -> &Heap<NativeFn> {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap<NativeFn> {
        &mut self.heap
    }

    pub fn ancestry(&self) -> &AncestryRegistry {
        &self.ancestry
    }

    /// The root constructor
    pub fn object_constructor(&self) -> ObjRef {
        self.object_ctor
    }

    /// Prototype shared by every plain object
    pub fn object_prototype(&self) -> ObjRef {
        self.object_prototype
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    /// Process-unique id of `obj`, assigned on first call
    pub fn guid(&mut self, obj: ObjRef) -> LineageResult<Guid> {
        self.heap.guid(obj)
    }

    // ------------------------------------------------------------------
    // Objects and properties
    // ------------------------------------------------------------------

    /// New plain object delegating to `Object.prototype`
    pub fn new_object(&mut self) -> LineageResult<ObjRef> {
        self.heap.alloc(Some(self.object_prototype))
    }

    pub fn get(&self, obj: ObjRef, key: &str) -> LineageResult<Value> {
        self.heap.get(obj, key)
    }

    pub fn set(&mut self, obj: ObjRef, key: &str, value: impl Into<Value>) -> LineageResult<()> {
        self.heap.set(obj, key, value.into())
    }

    /// Own enumerable keys
    pub fn keys(&self, obj: ObjRef) -> LineageResult<Vec<String>> {
        self.heap.keys(obj)
    }

    /// Copy extender: own enumerable properties of `source` onto `target`
    pub fn extend(&mut self, target: ObjRef, source: ObjRef) -> LineageResult<ObjRef> {
        self.heap.extend(target, source)
    }

    /// Copy extender for ad-hoc mappings
    pub fn extend_from<I, K>(&mut self, target: ObjRef, entries: I) -> LineageResult<ObjRef>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        self.heap.extend_from(target, entries)
    }

    /// New list object (index keys plus a hidden `length`)
    pub fn new_list(&mut self, items: &[Value]) -> LineageResult<ObjRef> {
        let list = self.new_object()?;
        self.heap.define_hidden(list, LENGTH_KEY, Value::Int(0))?;
        for item in items {
            self.list_push(list, item.clone())?;
        }
        Ok(list)
    }

    /// Append to a list object, returning the new length
    pub fn list_push(&mut self, list: ObjRef, value: Value) -> LineageResult<i64> {
        let len = self.heap.get(list, LENGTH_KEY)?.as_int().unwrap_or(0);
        self.heap.set(list, &len.to_string(), value)?;
        self.heap.define_hidden(list, LENGTH_KEY, Value::Int(len + 1))?;
        Ok(len + 1)
    }

    pub fn list_items(&self, list: ObjRef) -> LineageResult<Vec<Value>> {
        let len = self.heap.get(list, LENGTH_KEY)?.as_int().unwrap_or(0);
        (0..len)
            .map(|i| self.heap.get(list, &i.to_string()))
            .collect()
    }

    // ------------------------------------------------------------------
    // Functions and instantiation
    // ------------------------------------------------------------------

    /// Define a function (usable as a constructor or a mixin).
    ///
    /// Its prototype delegates to `Object.prototype` and carries a hidden
    /// `constructor` back-link.
    pub fn define_function<F>(&mut self, name: &str, body: F) -> LineageResult<ObjRef>
    where
        F: Fn(&mut Realm, ObjRef, &[Value]) -> LineageResult<Value> + 'static,
    {
        let prototype = self.heap.alloc(Some(self.object_prototype))?;
        let body: NativeFn = Rc::new(body);
        let function = self
            .heap
            .alloc_function(name, Some(self.object_prototype), prototype, body)?;
        self.heap
            .define_hidden(prototype, CONSTRUCTOR_KEY, Value::Object(function))?;
        Ok(function)
    }

    /// Define a function and make it inherit from `parent`
    pub fn define_class<F>(&mut self, name: &str, parent: ObjRef, body: F) -> LineageResult<ObjRef>
    where
        F: Fn(&mut Realm, ObjRef, &[Value]) -> LineageResult<Value> + 'static,
    {
        let class = self.define_function(name, body)?;
        self.inherit(class, parent)
    }

    /// The object instances of `function` delegate to
    pub fn prototype(&self, function: ObjRef) -> LineageResult<ObjRef> {
        Ok(self.heap.function(function)?.prototype)
    }

    pub fn function_name(&self, function: ObjRef) -> LineageResult<&str> {
        Ok(self.heap.function(function)?.name.as_str())
    }

    /// Call `function` with `this` bound to `this`
    pub fn call(&mut self, function: ObjRef, this: ObjRef, args: &[Value]) -> LineageResult<Value> {
        let body = self.heap.body(function)?;
        body(self, this, args)
    }

    /// Look `key` up on `obj` and call it with `this = obj`
    pub fn call_method(&mut self, obj: ObjRef, key: &str, args: &[Value]) -> LineageResult<Value> {
        let method = match self.heap.get(obj, key)? {
            Value::Object(f) if self.heap.is_function(f)? => f,
            _ => {
                return Err(LineageError::NotCallable {
                    key: key.to_string(),
                })
            }
        };
        self.call(method, obj, args)
    }

    /// Instantiate `ctor`: a new object delegating to `ctor.prototype`, with
    /// the body run against it
    pub fn construct(&mut self, ctor: ObjRef, args: &[Value]) -> LineageResult<ObjRef> {
        let prototype = self
            .heap
            .function(ctor)
            .map_err(|_| LineageError::NotAConstructor(ctor))?
            .prototype;
        let instance = self.heap.alloc(Some(prototype))?;
        self.call(ctor, instance, args)?;
        Ok(instance)
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Register `handler` for `event_type` on `owner`
    pub fn on(
        &mut self,
        owner: ObjRef,
        event_type: &str,
        handler: RealmHandler,
    ) -> LineageResult<ObjRef> {
        events::on(self, owner, event_type, handler)
    }

    /// Register a closure, returning the handler so it can be removed later
    pub fn on_fn<F>(&mut self, owner: ObjRef, event_type: &str, f: F) -> LineageResult<RealmHandler>
    where
        F: Fn(&mut Realm, &events::Event, &[Value]) -> LineageResult<Value> + 'static,
    {
        let handler = Handler::new(f);
        events::on(self, owner, event_type, handler.clone())?;
        Ok(handler)
    }

    /// Remove `handler` (every occurrence) or, with `None`, all handlers for
    /// `event_type` on `owner`
    pub fn off(
        &mut self,
        owner: ObjRef,
        event_type: &str,
        handler: Option<&RealmHandler>,
    ) -> LineageResult<ObjRef> {
        events::off(self, owner, event_type, handler)
    }

    /// Remove every handler registered on `owner`
    pub fn off_all(&mut self, owner: ObjRef) -> LineageResult<ObjRef> {
        let guid = self.heap.guid(owner)?;
        self.hub.off_all(guid);
        Ok(owner)
    }

    /// Dispatch `event_type` on `owner`; `false` if a handler stopped it
    pub fn trigger(&mut self, owner: ObjRef, event_type: &str, args: &[Value]) -> LineageResult<bool> {
        events::trigger(self, owner, event_type, args)
    }

    pub fn listener_count(&mut self, owner: ObjRef, event_type: &str) -> LineageResult<usize> {
        let guid = self.heap.guid(owner)?;
        Ok(self.hub.listener_count(guid, event_type))
    }

    pub fn event_types(&mut self, owner: ObjRef) -> LineageResult<Vec<String>> {
        let guid = self.heap.guid(owner)?;
        Ok(self.hub.event_types(guid))
    }

    // ------------------------------------------------------------------
    // Inheritance
    // ------------------------------------------------------------------

    fn class_ref(&mut self, class: ObjRef) -> LineageResult<ClassRef> {
        if !self.heap.is_function(class)? {
            return Err(LineageError::NotAConstructor(class));
        }
        Ok(ClassRef::new(class, self.heap.guid(class)?))
    }

    fn function_ref(&mut self, function: ObjRef) -> LineageResult<ClassRef> {
        if !self.heap.is_function(function)? {
            return Err(LineageError::NotAFunction(function));
        }
        Ok(ClassRef::new(function, self.heap.guid(function)?))
    }

    /// Make `child` inherit from `parent`.
    ///
    /// Instances of `child` delegate to `child.prototype`, which now delegates
    /// to `parent.prototype`. The link is recorded, then the inherited event is
    /// triggered on `parent` with `child` as its argument. A failing handler
    /// leaves the link in place.
    pub fn inherit(&mut self, child: ObjRef, parent: ObjRef) -> LineageResult<ObjRef> {
        let child_ref = self.class_ref(child)?;
        let parent_ref = self.class_ref(parent)?;

        if self.ancestry.would_cycle(child_ref.guid, parent_ref.guid) {
            warn!(%child, %parent, "rejected cyclic inheritance");
            return Err(LineageError::CyclicInheritance { child, parent });
        }

        let child_prototype = self.prototype(child)?;
        let parent_prototype = self.prototype(parent)?;
        self.heap
            .set_prototype_of(child_prototype, Some(parent_prototype))?;
        self.heap
            .define_hidden(child_prototype, CONSTRUCTOR_KEY, Value::Object(child))?;
        self.ancestry.record_superclass(child_ref, parent_ref)?;

        debug!(%child, %parent, "inherit");

        let event_type = self.config.inherited_event.clone();
        self.trigger(parent, &event_type, &[Value::Object(child)])?;
        Ok(child)
    }

    /// Direct superclass (the root is implicit and not reported)
    pub fn superclass(&mut self, class: ObjRef) -> LineageResult<Option<ObjRef>> {
        let class = self.class_ref(class)?;
        Ok(self.ancestry.superclass(class.guid).map(|c| c.object))
    }

    /// Superclasses nearest first, ending at the root constructor
    pub fn ancestors(&mut self, class: ObjRef) -> LineageResult<Vec<ObjRef>> {
        let class = self.class_ref(class)?;
        Ok(self
            .ancestry
            .ancestors(class.guid)
            .into_iter()
            .map(|c| c.object)
            .collect())
    }

    /// Direct subclasses in the order they inherited
    pub fn subclasses(&mut self, class: ObjRef) -> LineageResult<Vec<ObjRef>> {
        let class = self.class_ref(class)?;
        Ok(self
            .ancestry
            .subclasses(class.guid)
            .iter()
            .map(|c| c.object)
            .collect())
    }

    /// `a` is a strict ancestor of `b`
    pub fn is_superclass_of(&mut self, a: ObjRef, b: ObjRef) -> LineageResult<bool> {
        let a = self.class_ref(a)?;
        let b = self.class_ref(b)?;
        Ok(self.ancestry.is_superclass_of(a.guid, b.guid))
    }

    /// `a` strictly descends from `b`
    pub fn is_subclass_of(&mut self, a: ObjRef, b: ObjRef) -> LineageResult<bool> {
        self.is_superclass_of(b, a)
    }

    // ------------------------------------------------------------------
    // Mixins
    // ------------------------------------------------------------------

    /// Layer `mixin` onto `instance`.
    ///
    /// Copies the own enumerable members of `mixin.prototype` onto the
    /// instance, runs `mixin` as an initializer with `this = instance`, then
    /// records the application. The instance's prototype chain is untouched.
    pub fn mixin(&mut self, instance: ObjRef, mixin: ObjRef, args: &[Value]) -> LineageResult<ObjRef> {
        let mixin_ref = self.function_ref(mixin)?;
        let instance_guid = self.heap.guid(instance)?;

        let members = self.prototype(mixin)?;
        self.heap.extend(instance, members)?;
        self.call(mixin, instance, args)?;

        let recorded =
            self.ancestry
                .record_mixin(instance_guid, mixin_ref, self.config.duplicate_mixins);
        debug!(%instance, %mixin, recorded, "mixin");
        Ok(instance)
    }

    /// Mixins applied to `instance`, in application order
    pub fn mixins(&mut self, instance: ObjRef) -> LineageResult<Vec<ObjRef>> {
        let guid = self.heap.guid(instance)?;
        Ok(self
            .ancestry
            .mixins(guid)
            .iter()
            .map(|m| m.object)
            .collect())
    }

    pub fn mixes_in(&mut self, instance: ObjRef, mixin: ObjRef) -> LineageResult<bool> {
        let instance = self.heap.guid(instance)?;
        let mixin = self.heap.guid(mixin)?;
        Ok(self.ancestry.mixes_in(instance, mixin))
    }

    // ------------------------------------------------------------------
    // Capability queries
    // ------------------------------------------------------------------

    /// `instance` was created by `function` or one of its subclasses
    pub fn instance_of(&self, instance: ObjRef, function: ObjRef) -> LineageResult<bool> {
        self.heap.instance_of(instance, function)
    }

    /// Which capability ties `instance` to `function`, native chain first
    pub fn capability(&mut self, instance: ObjRef, function: ObjRef) -> LineageResult<Option<Capability>> {
        if self.heap.instance_of(instance, function)? {
            return Ok(Some(Capability::Native));
        }
        if self.mixes_in(instance, function)? {
            return Ok(Some(Capability::Mixin));
        }
        Ok(None)
    }

    /// `instance` is influenced by `function`, natively or through a mixin
    pub fn is(&mut self, instance: ObjRef, function: ObjRef) -> LineageResult<bool> {
        Ok(self.capability(instance, function)?.is_some())
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

impl EventContext for Realm {
    fn event_hub(&self) -> &EventHub<Self> {
        &self.hub
    }

    fn event_hub_mut(&mut self) -> &mut EventHub<Self> {
        &mut self.hub
    }

    fn identify(&mut self, owner: ObjRef) -> LineageResult<Guid> {
        self.heap.guid(owner)
    }

    fn now(&self) -> Timestamp {
        self.clock.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DuplicateMixins;
    use lineage_core::ManualClock;
    use lineage_events::Event;

    fn noop(_: &mut Realm, _: ObjRef, _: &[Value]) -> LineageResult<Value> {
        Ok(Value::Undefined)
    }

    fn class(realm: &mut Realm, name: &str) -> ObjRef {
        realm.define_function(name, noop).unwrap()
    }

    #[test]
    fn test_realm_creation() {
        let mut realm = Realm::new();
        let root = realm.object_constructor();
        assert_eq!(realm.function_name(root).unwrap(), "Object");
        assert_eq!(realm.prototype(root).unwrap(), realm.object_prototype());
        assert!(realm.ancestors(root).unwrap().is_empty());
    }

    #[test]
    fn test_guid_stable_and_unique_including_functions() {
        let mut realm = Realm::new();
        let a = realm.new_object().unwrap();
        let b = realm.new_object().unwrap();
        let f = class(&mut realm, "F");

        let ga = realm.guid(a).unwrap();
        assert_eq!(realm.guid(a).unwrap(), ga);
        assert_ne!(ga, realm.guid(b).unwrap());
        assert_ne!(realm.guid(f).unwrap(), ga);
        assert!(realm.keys(a).unwrap().is_empty());
    }

    #[test]
    fn test_construct_runs_body_with_args() {
        let mut realm = Realm::new();
        let point = realm
            .define_function("Point", |realm, this, args| {
                realm.set(this, "x", args.first().cloned().unwrap_or_default())?;
                Ok(Value::Undefined)
            })
            .unwrap();

        let p = realm.construct(point, &[Value::Int(3)]).unwrap();
        assert_eq!(realm.get(p, "x").unwrap(), Value::Int(3));
        assert!(realm.instance_of(p, point).unwrap());
        assert!(realm.instance_of(p, realm.object_constructor()).unwrap());
    }

    #[test]
    fn test_construct_non_function() {
        let mut realm = Realm::new();
        let obj = realm.new_object().unwrap();
        assert_eq!(
            realm.construct(obj, &[]),
            Err(LineageError::NotAConstructor(obj))
        );
    }

    #[test]
    fn test_inherit_wires_prototype_chain() {
        let mut realm = Realm::new();
        let person = class(&mut realm, "Person");
        let employee = class(&mut realm, "Employee");

        let greet = realm
            .define_function("greet", |_, _, _| Ok(Value::from("hello")))
            .unwrap();
        let person_proto = realm.prototype(person).unwrap();
        realm.set(person_proto, "greet", greet).unwrap();

        assert_eq!(realm.inherit(employee, person).unwrap(), employee);

        let e = realm.construct(employee, &[]).unwrap();
        assert!(realm.instance_of(e, employee).unwrap());
        assert!(realm.instance_of(e, person).unwrap());
        assert_eq!(realm.call_method(e, "greet", &[]).unwrap(), Value::from("hello"));

        let employee_proto = realm.prototype(employee).unwrap();
        assert_eq!(
            realm.get(employee_proto, CONSTRUCTOR_KEY).unwrap(),
            Value::Object(employee)
        );
        assert!(realm.keys(employee_proto).unwrap().is_empty());
    }

    #[test]
    fn test_inherit_keeps_existing_prototype_members() {
        let mut realm = Realm::new();
        let base = class(&mut realm, "Base");
        let derived = class(&mut realm, "Derived");
        let derived_proto = realm.prototype(derived).unwrap();
        realm.set(derived_proto, "kind", "derived").unwrap();

        realm.inherit(derived, base).unwrap();
        let d = realm.construct(derived, &[]).unwrap();
        assert_eq!(realm.get(d, "kind").unwrap(), Value::from("derived"));
    }

    #[test]
    fn test_person_employee_subclasses_scenario() {
        let mut realm = Realm::new();
        let person = class(&mut realm, "Person");
        let employee = class(&mut realm, "Employee");
        let subclasses = realm.new_list(&[]).unwrap();
        realm.set(person, "subclasses", subclasses).unwrap();

        realm
            .on_fn(person, "inherited", |realm, event, args| {
                let list = realm
                    .get(event.this(), "subclasses")?
                    .to_object()?;
                realm.list_push(list, args[0].clone())?;
                Ok(Value::Undefined)
            })
            .unwrap();

        realm.inherit(employee, person).unwrap();

        assert_eq!(
            realm.list_items(subclasses).unwrap(),
            vec![Value::Object(employee)]
        );
        assert!(realm.is_subclass_of(employee, person).unwrap());
        assert!(realm.is_superclass_of(person, employee).unwrap());
        assert!(realm.ancestors(employee).unwrap().contains(&person));
        assert_eq!(realm.subclasses(person).unwrap(), vec![employee]);
    }

    #[test]
    fn test_inherited_event_source_arg_and_time() {
        let clock = ManualClock::new(Timestamp::from_millis(5));
        let mut realm = Realm::new().with_clock(clock.clone());
        let parent = class(&mut realm, "Parent");
        let child = class(&mut realm, "Child");
        let seen = realm.new_list(&[]).unwrap();

        realm
            .on_fn(parent, "inherited", move |realm, event: &Event, args| {
                realm.list_push(seen, Value::Object(event.source))?;
                realm.list_push(seen, args[0].clone())?;
                realm.list_push(seen, Value::Int(event.time.as_millis()))?;
                Ok(Value::Undefined)
            })
            .unwrap();

        realm.inherit(child, parent).unwrap();
        assert_eq!(
            realm.list_items(seen).unwrap(),
            vec![Value::Object(parent), Value::Object(child), Value::Int(5)]
        );
    }

    #[test]
    fn test_ancestors_chain() {
        let mut realm = Realm::new();
        let a = class(&mut realm, "A");
        let b = class(&mut realm, "B");
        let c = class(&mut realm, "C");
        realm.inherit(b, a).unwrap();
        realm.inherit(c, b).unwrap();

        let root = realm.object_constructor();
        assert_eq!(realm.ancestors(c).unwrap(), vec![b, a, root]);
        assert_eq!(realm.ancestors(a).unwrap(), vec![root]);
        assert_eq!(realm.superclass(c).unwrap(), Some(b));
        assert_eq!(realm.superclass(a).unwrap(), None);
        assert!(!realm.is_subclass_of(a, a).unwrap());
        assert!(realm.is_superclass_of(root, c).unwrap());
    }

    #[test]
    fn test_inherit_rejects_cycles_without_side_effects() {
        let mut realm = Realm::new();
        let a = class(&mut realm, "A");
        let b = class(&mut realm, "B");
        realm.inherit(b, a).unwrap();
        let a_proto = realm.prototype(a).unwrap();
        let before = realm.heap().prototype_of(a_proto).unwrap();

        assert_eq!(
            realm.inherit(a, b),
            Err(LineageError::CyclicInheritance { child: a, parent: b })
        );
        assert!(realm.inherit(a, a).is_err());
        let root = realm.object_constructor();
        assert!(realm.inherit(root, a).is_err());
        assert_eq!(realm.heap().prototype_of(a_proto).unwrap(), before);
        assert_eq!(realm.superclass(a).unwrap(), None);
    }

    #[test]
    fn test_inherit_requires_constructors() {
        let mut realm = Realm::new();
        let f = class(&mut realm, "F");
        let plain = realm.new_object().unwrap();

        assert_eq!(realm.inherit(f, plain), Err(LineageError::NotAConstructor(plain)));
        assert_eq!(realm.inherit(plain, f), Err(LineageError::NotAConstructor(plain)));
    }

    #[test]
    fn test_inherit_not_transactional_on_handler_error() {
        let mut realm = Realm::new();
        let parent = class(&mut realm, "Parent");
        let child = class(&mut realm, "Child");
        realm
            .on_fn(parent, "inherited", |_, _, _| {
                Err(LineageError::Thrown(Value::from("sealed")))
            })
            .unwrap();

        assert_eq!(
            realm.inherit(child, parent),
            Err(LineageError::Thrown(Value::from("sealed")))
        );
        assert_eq!(realm.superclass(child).unwrap(), Some(parent));
        let c = realm.construct(child, &[]).unwrap();
        assert!(realm.instance_of(c, parent).unwrap());
    }

    #[test]
    fn test_reinherit_replaces_link() {
        let mut realm = Realm::new();
        let a = class(&mut realm, "A");
        let b = class(&mut realm, "B");
        let child = class(&mut realm, "Child");
        realm.inherit(child, a).unwrap();
        realm.inherit(child, b).unwrap();

        let c = realm.construct(child, &[]).unwrap();
        assert!(realm.instance_of(c, b).unwrap());
        assert!(!realm.instance_of(c, a).unwrap());
        assert!(realm.subclasses(a).unwrap().is_empty());
        assert!(!realm.is_subclass_of(child, a).unwrap());
    }

    #[test]
    fn test_custom_inherited_event_name() {
        let mut realm = Realm::with_config(RealmConfig::default().with_inherited_event("extended"));
        let parent = class(&mut realm, "Parent");
        let child = class(&mut realm, "Child");
        let hits = realm.new_list(&[]).unwrap();
        realm
            .on_fn(parent, "extended", move |realm, _, args| {
                realm.list_push(hits, args[0].clone())?;
                Ok(Value::Undefined)
            })
            .unwrap();

        realm.inherit(child, parent).unwrap();
        assert_eq!(realm.list_items(hits).unwrap().len(), 1);
    }

    #[test]
    fn test_define_class() {
        let mut realm = Realm::new();
        let animal = class(&mut realm, "Animal");
        let dog = realm.define_class("Dog", animal, noop).unwrap();
        assert!(realm.is_subclass_of(dog, animal).unwrap());
    }

    fn scrollable(realm: &mut Realm) -> ObjRef {
        let mixin = realm
            .define_function("Scrollable", |realm, this, args| {
                realm.set(this, "scroll_top", args.first().cloned().unwrap_or(Value::Int(0)))?;
                Ok(Value::Undefined)
            })
            .unwrap();
        let scroll = realm
            .define_function("scroll", |realm, this, _| {
                let top = realm.get(this, "scroll_top")?.as_int().unwrap_or(0);
                realm.set(this, "scroll_top", top + 10)?;
                Ok(Value::Int(top + 10))
            })
            .unwrap();
        let proto = realm.prototype(mixin).unwrap();
        realm.set(proto, "scroll", scroll).unwrap();
        realm.set(proto, "kind", "scrollable").unwrap();
        mixin
    }

    #[test]
    fn test_mixin_flattening() {
        let mut realm = Realm::new();
        let view_class = class(&mut realm, "View");
        let view = realm.construct(view_class, &[]).unwrap();
        let chain_before = realm.heap().prototype_chain(view).unwrap();
        let scrollable = scrollable(&mut realm);

        assert_eq!(realm.mixin(view, scrollable, &[Value::Int(5)]).unwrap(), view);

        assert!(!realm.instance_of(view, scrollable).unwrap());
        assert!(realm.is(view, scrollable).unwrap());
        assert!(realm.mixes_in(view, scrollable).unwrap());
        assert_eq!(realm.heap().prototype_chain(view).unwrap(), chain_before);

        // Members copied, initializer ran with forwarded args
        assert_eq!(realm.get(view, "scroll_top").unwrap(), Value::Int(5));
        assert_eq!(realm.call_method(view, "scroll", &[]).unwrap(), Value::Int(15));
        assert!(!realm.heap().has_own(view, CONSTRUCTOR_KEY).unwrap());
    }

    #[test]
    fn test_view_mixins_in_order() {
        let mut realm = Realm::new();
        let view = realm.new_object().unwrap();
        let scrollable = scrollable(&mut realm);
        let draggable = class(&mut realm, "Draggable");

        realm.mixin(view, scrollable, &[]).unwrap();
        realm.mixin(view, draggable, &[]).unwrap();
        assert_eq!(realm.mixins(view).unwrap(), vec![scrollable, draggable]);
    }

    #[test]
    fn test_later_mixin_overwrites_members() {
        let mut realm = Realm::new();
        let view = realm.new_object().unwrap();
        let scrollable = scrollable(&mut realm);
        let other = class(&mut realm, "Other");
        let other_proto = realm.prototype(other).unwrap();
        realm.set(other_proto, "kind", "other").unwrap();

        realm.mixin(view, scrollable, &[]).unwrap();
        realm.mixin(view, other, &[]).unwrap();
        assert_eq!(realm.get(view, "kind").unwrap(), Value::from("other"));
    }

    #[test]
    fn test_duplicate_mixin_appends_by_default() {
        let mut realm = Realm::new();
        let view = realm.new_object().unwrap();
        let m = class(&mut realm, "M");

        realm.mixin(view, m, &[]).unwrap();
        realm.mixin(view, m, &[]).unwrap();
        assert_eq!(realm.mixins(view).unwrap(), vec![m, m]);
    }

    #[test]
    fn test_duplicate_mixin_ignore_policy() {
        let mut realm =
            Realm::with_config(RealmConfig::default().with_duplicate_mixins(DuplicateMixins::Ignore));
        let view = realm.new_object().unwrap();
        let counter = realm
            .define_function("Counted", |realm, this, _| {
                let n = realm.get(this, "inits")?.as_int().unwrap_or(0);
                realm.set(this, "inits", n + 1)?;
                Ok(Value::Undefined)
            })
            .unwrap();

        realm.mixin(view, counter, &[]).unwrap();
        realm.mixin(view, counter, &[]).unwrap();
        assert_eq!(realm.mixins(view).unwrap(), vec![counter]);
        assert_eq!(realm.get(view, "inits").unwrap(), Value::Int(2));
    }

    #[test]
    fn test_mixin_requires_function() {
        let mut realm = Realm::new();
        let view = realm.new_object().unwrap();
        let plain = realm.new_object().unwrap();
        assert_eq!(
            realm.mixin(view, plain, &[]),
            Err(LineageError::NotAFunction(plain))
        );
        assert!(realm.mixins(view).unwrap().is_empty());
    }

    #[test]
    fn test_failing_initializer_not_recorded() {
        let mut realm = Realm::new();
        let view = realm.new_object().unwrap();
        let broken = realm
            .define_function("Broken", |_, _, _| Err(LineageError::Thrown(Value::from("nope"))))
            .unwrap();
        let proto = realm.prototype(broken).unwrap();
        realm.set(proto, "copied", true).unwrap();

        assert!(realm.mixin(view, broken, &[]).is_err());
        assert!(!realm.mixes_in(view, broken).unwrap());
        assert_eq!(realm.get(view, "copied").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_capability_native_vs_mixin() {
        let mut realm = Realm::new();
        let widget = class(&mut realm, "Widget");
        let m = class(&mut realm, "M");
        let unrelated = class(&mut realm, "Unrelated");
        let w = realm.construct(widget, &[]).unwrap();
        realm.mixin(w, m, &[]).unwrap();

        assert_eq!(realm.capability(w, widget).unwrap(), Some(Capability::Native));
        assert_eq!(realm.capability(w, m).unwrap(), Some(Capability::Mixin));
        assert_eq!(realm.capability(w, unrelated).unwrap(), None);
        assert!(!realm.is(w, unrelated).unwrap());
        assert!(realm.is(w, realm.object_constructor()).unwrap());
    }

    #[test]
    fn test_is_requires_function() {
        let mut realm = Realm::new();
        let a = realm.new_object().unwrap();
        let b = realm.new_object().unwrap();
        assert_eq!(realm.is(a, b), Err(LineageError::NotAFunction(b)));
    }

    #[test]
    fn test_mixin_records_not_visible_as_properties() {
        let mut realm = Realm::new();
        let view = realm.new_object().unwrap();
        let m = class(&mut realm, "M");
        realm.mixin(view, m, &[]).unwrap();
        realm
            .on_fn(view, "changed", |_, _, _| Ok(Value::Undefined))
            .unwrap();
        assert!(realm.keys(view).unwrap().is_empty());
    }

    #[test]
    fn test_realm_event_helpers() {
        let mut realm = Realm::new();
        let owner = realm.new_object().unwrap();
        let h = realm
            .on_fn(owner, "a", |_, _, _| Ok(Value::Bool(false)))
            .unwrap();
        realm.on(owner, "b", h.clone()).unwrap();

        assert_eq!(realm.listener_count(owner, "a").unwrap(), 1);
        assert_eq!(realm.event_types(owner).unwrap(), vec!["a", "b"]);
        assert!(!realm.trigger(owner, "a", &[]).unwrap());

        realm.off(owner, "a", Some(&h)).unwrap();
        assert_eq!(realm.listener_count(owner, "a").unwrap(), 0);
        realm.off_all(owner).unwrap();
        assert!(realm.event_types(owner).unwrap().is_empty());
        assert!(realm.trigger(owner, "b", &[]).unwrap());
    }

    #[test]
    fn test_call_method_not_callable() {
        let mut realm = Realm::new();
        let obj = realm.new_object().unwrap();
        realm.set(obj, "x", 1i64).unwrap();
        assert_eq!(
            realm.call_method(obj, "x", &[]),
            Err(LineageError::NotCallable { key: "x".into() })
        );
        assert!(realm.call_method(obj, "missing", &[]).is_err());
    }

    #[test]
    fn test_extend_from_and_lists() {
        let mut realm = Realm::new();
        let target = realm.new_object().unwrap();
        realm
            .extend_from(target, [("a", Value::Int(1)), ("b", Value::Int(2))])
            .unwrap();
        assert_eq!(realm.keys(target).unwrap(), vec!["a", "b"]);

        let list = realm.new_list(&[Value::Int(1)]).unwrap();
        assert_eq!(realm.list_push(list, Value::Int(2)).unwrap(), 2);
        assert_eq!(realm.list_items(list).unwrap(), vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(realm.keys(list).unwrap(), vec!["0", "1"]);
    }
}
