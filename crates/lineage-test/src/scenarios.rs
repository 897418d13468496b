//! Composition scenarios
//!
//! Each scenario builds a fresh realm, runs one well-known composition flow
//! and reports what it observed:
//! - Subclass tracking through the inherited event
//! - Mixin layering and capability checks
//! - Early stop of an event dispatch

use lineage_core::{LineageResult, ObjRef, Value};
use lineage_events::INHERITED;
use lineage_runtime::Realm;

fn noop(_: &mut Realm, _: ObjRef, _: &[Value]) -> LineageResult<Value> {
    Ok(Value::Undefined)
}

fn append(realm: &mut Realm, list: ObjRef, value: Value) -> LineageResult<Value> {
    realm.list_push(list, value)?;
    Ok(Value::Undefined)
}

// ============================================================================
// INHERITANCE
// ============================================================================

/// Outcome of the Person/Employee scenario
#[derive(Debug, Clone)]
pub struct InheritanceReport {
    pub person: ObjRef,
    pub employee: ObjRef,
    /// Contents of `Person.subclasses` after the inherit
    pub subclasses: Vec<Value>,
    /// Ancestors of Employee, nearest first
    pub ancestors: Vec<ObjRef>,
    pub is_subclass: bool,
    pub instance_of_person: bool,
    pub instance_of_employee: bool,
}

impl InheritanceReport {
    pub fn passed(&self) -> bool {
        self.subclasses == vec![Value::Object(self.employee)]
            && self.ancestors.first() == Some(&self.person)
            && self.is_subclass
            && self.instance_of_person
            && self.instance_of_employee
    }
}

/// A `Person` class keeps a `subclasses` list that its inherited handler
/// fills; `Employee` then inherits from it.
pub fn person_employee() -> LineageResult<InheritanceReport> {
    let mut realm = Realm::new();
    let person = realm.define_function("Person", noop)?;
    let employee = realm.define_function("Employee", noop)?;

    let subclasses = realm.new_list(&[])?;
    realm.set(person, "subclasses", subclasses)?;
    realm.on_fn(person, INHERITED, |realm, event, args| {
        let list = realm
            .get(event.this(), "subclasses")?
            .to_object()?;
        append(realm, list, args.first().cloned().unwrap_or_default())
    })?;

    realm.inherit(employee, person)?;
    let instance = realm.construct(employee, &[])?;

    Ok(InheritanceReport {
        person,
        employee,
        subclasses: realm.list_items(subclasses)?,
        ancestors: realm.ancestors(employee)?,
        is_subclass: realm.is_subclass_of(employee, person)?,
        instance_of_person: realm.instance_of(instance, person)?,
        instance_of_employee: realm.instance_of(instance, employee)?,
    })
}

// ============================================================================
// MIXINS
// ============================================================================

/// Outcome of the View/Scrollable/Draggable scenario
#[derive(Debug, Clone)]
pub struct MixinReport {
    pub scrollable: ObjRef,
    pub draggable: ObjRef,
    pub mixins: Vec<ObjRef>,
    /// `is` holds for both mixins
    pub is_both: bool,
    /// Native `instance_of` holds for either mixin
    pub native_for_any: bool,
    /// Result of calling the copied `scroll` member
    pub scrolled_to: Value,
    /// Value the Draggable initializer stored
    pub drag_handle: Value,
}

impl MixinReport {
    pub fn passed(&self) -> bool {
        self.mixins == vec![self.scrollable, self.draggable]
            && self.is_both
            && !self.native_for_any
            && self.scrolled_to == Value::Int(10)
            && self.drag_handle == Value::from("title")
    }
}

/// A plain view gets Scrollable then Draggable layered on
pub fn view_mixins() -> LineageResult<MixinReport> {
    let mut realm = Realm::new();

    let scrollable = realm.define_function("Scrollable", |realm, this, _| {
        realm.set(this, "offset", 0i64)?;
        Ok(Value::Undefined)
    })?;
    let scroll = realm.define_function("scroll", |realm, this, args| {
        let offset = realm.get(this, "offset")?.as_int().unwrap_or(0);
        let by = args.first().and_then(Value::as_int).unwrap_or(0);
        realm.set(this, "offset", offset + by)?;
        Ok(Value::Int(offset + by))
    })?;
    let members = realm.prototype(scrollable)?;
    realm.set(members, "scroll", scroll)?;

    let draggable = realm.define_function("Draggable", |realm, this, args| {
        realm.set(this, "handle", args.first().cloned().unwrap_or_default())?;
        Ok(Value::Undefined)
    })?;

    let view = realm.new_object()?;
    realm.mixin(view, scrollable, &[])?;
    realm.mixin(view, draggable, &[Value::from("title")])?;

    Ok(MixinReport {
        scrollable,
        draggable,
        mixins: realm.mixins(view)?,
        is_both: realm.is(view, scrollable)? && realm.is(view, draggable)?,
        native_for_any: realm.instance_of(view, scrollable)?
            || realm.instance_of(view, draggable)?,
        scrolled_to: realm.call_method(view, "scroll", &[Value::Int(10)])?,
        drag_handle: realm.get(view, "handle")?,
    })
}

// ============================================================================
// DISPATCH
// ============================================================================

/// Outcome of the early-stop scenario
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// Names of the handlers that ran, in order
    pub ran: Vec<Value>,
    /// What `trigger` returned
    pub completed: bool,
}

impl DispatchReport {
    pub fn passed(&self) -> bool {
        self.ran == vec![Value::from("first"), Value::from("second")] && !self.completed
    }
}

/// Three handlers on one event; the second returns `false`
pub fn stop_propagation() -> LineageResult<DispatchReport> {
    let mut realm = Realm::new();
    let owner = realm.new_object()?;
    let ran = realm.new_list(&[])?;

    realm.on_fn(owner, "change", move |realm, _, _| {
        append(realm, ran, Value::from("first"))
    })?;
    realm.on_fn(owner, "change", move |realm, _, _| {
        append(realm, ran, Value::from("second"))?;
        Ok(Value::Bool(false))
    })?;
    realm.on_fn(owner, "change", move |realm, _, _| {
        append(realm, ran, Value::from("third"))
    })?;

    let completed = realm.trigger(owner, "change", &[])?;
    Ok(DispatchReport {
        ran: realm.list_items(ran)?,
        completed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_employee() {
        let report = person_employee().unwrap();
        assert!(report.passed(), "{:?}", report);
        assert_eq!(report.ancestors.len(), 2);
    }

    #[test]
    fn test_view_mixins() {
        let report = view_mixins().unwrap();
        assert!(report.passed(), "{:?}", report);
    }

    #[test]
    fn test_stop_propagation() {
        let report = stop_propagation().unwrap();
        assert!(report.passed(), "{:?}", report);
    }
}
