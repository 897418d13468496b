//! Arbitrary composition sequences against a single realm

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use lineage_core::{LineageResult, ObjRef, Value};
use lineage_runtime::{Realm, RealmHandler};

#[derive(Arbitrary, Debug)]
enum Op {
    Define,
    Inherit { child: u8, parent: u8 },
    Construct { class: u8 },
    Mixin { instance: u8, mixin: u8, arg: i64 },
    On { class: u8, stop: bool },
    Off { class: u8 },
    Trigger { class: u8 },
}

fn noop(_: &mut Realm, _: ObjRef, _: &[Value]) -> LineageResult<Value> {
    Ok(Value::Undefined)
}

fn pick<T: Copy>(items: &[T], index: u8) -> Option<T> {
    if items.is_empty() {
        None
    } else {
        Some(items[index as usize % items.len()])
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let mut realm = Realm::new();
    let mut classes: Vec<ObjRef> = Vec::new();
    let mut instances: Vec<ObjRef> = Vec::new();
    let mut handlers: Vec<(ObjRef, RealmHandler)> = Vec::new();

    for op in ops.into_iter().take(256) {
        match op {
            Op::Define => {
                let name = format!("C{}", classes.len());
                if let Ok(class) = realm.define_function(&name, noop) {
                    classes.push(class);
                }
            }
            Op::Inherit { child, parent } => {
                if let (Some(child), Some(parent)) = (pick(&classes, child), pick(&classes, parent)) {
                    let _ = realm.inherit(child, parent);
                    let ancestors = realm.ancestors(child).unwrap();
                    assert!(!ancestors.contains(&child));
                    assert_eq!(ancestors.last(), Some(&realm.object_constructor()));
                }
            }
            Op::Construct { class } => {
                if let Some(class) = pick(&classes, class) {
                    if let Ok(instance) = realm.construct(class, &[]) {
                        instances.push(instance);
                    }
                }
            }
            Op::Mixin { instance, mixin, arg } => {
                if let (Some(instance), Some(mixin)) = (pick(&instances, instance), pick(&classes, mixin)) {
                    if realm.mixin(instance, mixin, &[Value::Int(arg)]).is_ok() {
                        assert_eq!(realm.mixins(instance).unwrap().last(), Some(&mixin));
                        assert!(realm.is(instance, mixin).unwrap());
                    }
                }
            }
            Op::On { class, stop } => {
                if let Some(owner) = pick(&classes, class) {
                    let result = if stop { Value::Bool(false) } else { Value::Undefined };
                    if let Ok(handler) = realm.on_fn(owner, "change", move |_, _, _| Ok(result.clone())) {
                        handlers.push((owner, handler));
                    }
                }
            }
            Op::Off { class } => {
                if !handlers.is_empty() {
                    let (owner, handler) = handlers.remove(class as usize % handlers.len());
                    let _ = realm.off(owner, "change", Some(&handler));
                }
            }
            Op::Trigger { class } => {
                if let Some(owner) = pick(&classes, class) {
                    let _ = realm.trigger(owner, "change", &[]);
                }
            }
        }
    }
});
