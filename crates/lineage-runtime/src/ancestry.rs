//! Ancestry registry
//!
//! Tracks, per constructor, its superclass link and, per instance, the mixins
//! applied to it. Everything is keyed by guid and lives outside the objects.
//!
//! Ancestors are derived by walking superclass links, so re-parenting a class
//! is immediately visible to all of its subclasses. The root constructor ends
//! every chain without needing a link of its own.

use std::collections::HashMap;

use lineage_core::{Guid, LineageError, LineageResult, ObjRef};

use crate::DuplicateMixins;

/// A constructor together with its guid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClassRef {
    pub object: ObjRef,
    pub guid: Guid,
}

impl ClassRef {
    pub fn new(object: ObjRef, guid: Guid) -> Self {
        ClassRef { object, guid }
    }
}

/// Superclass links, reverse subclass index and mixin records
#[derive(Debug, Default)]
pub struct AncestryRegistry {
    /// Implicit end of every chain
    root: Option<ClassRef>,
    /// child -> parent
    superclass: HashMap<Guid, ClassRef>,
    /// parent -> direct children, registration order
    subclasses: HashMap<Guid, Vec<ClassRef>>,
    /// instance -> applied mixins, application order
    mixins: HashMap<Guid, Vec<ClassRef>>,
}

impl AncestryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose chains all end at `root`
    pub fn with_root(root: ClassRef) -> Self {
        AncestryRegistry {
            root: Some(root),
            ..Self::default()
        }
    }

    pub fn root(&self) -> Option<ClassRef> {
        self.root
    }

    // ------------------------------------------------------------------
    // Superclass links
    // ------------------------------------------------------------------

    /// Would linking `child` under `parent` make `child` its own ancestor?
    pub fn would_cycle(&self, child: Guid, parent: Guid) -> bool {
        child == parent || self.ancestors(parent).iter().any(|c| c.guid == child)
    }

    /// Link `child` under `parent`, replacing any previous link
    pub fn record_superclass(&mut self, child: ClassRef, parent: ClassRef) -> LineageResult<()> {
        if self.would_cycle(child.guid, parent.guid) {
            return Err(LineageError::CyclicInheritance {
                child: child.object,
                parent: parent.object,
            });
        }

        if let Some(previous) = self.superclass.insert(child.guid, parent) {
            if let Some(siblings) = self.subclasses.get_mut(&previous.guid) {
                siblings.retain(|c| c.guid != child.guid);
            }
        }
        self.subclasses.entry(parent.guid).or_default().push(child);
        Ok(())
    }

    /// Explicit superclass link; the root is not reported here
    pub fn superclass(&self, child: Guid) -> Option<ClassRef> {
        self.superclass.get(&child).copied()
    }

    /// Superclasses nearest first, ending at the root (empty for the root)
    pub fn ancestors(&self, class: Guid) -> Vec<ClassRef> {
        let mut chain = Vec::new();
        let mut cursor = class;
        while let Some(parent) = self.superclass.get(&cursor) {
            chain.push(*parent);
            cursor = parent.guid;
        }

        if let Some(root) = self.root {
            let ends_at_root = chain.last().map(|c| c.guid == root.guid).unwrap_or(false);
            if class != root.guid && !ends_at_root {
                chain.push(root);
            }
        }
        chain
    }

    /// `a` is a strict ancestor of `b`
    pub fn is_superclass_of(&self, a: Guid, b: Guid) -> bool {
        self.ancestors(b).iter().any(|c| c.guid == a)
    }

    /// `a` strictly descends from `b`
    pub fn is_subclass_of(&self, a: Guid, b: Guid) -> bool {
        self.is_superclass_of(b, a)
    }

    /// Direct subclasses, in the order they were linked
    pub fn subclasses(&self, parent: Guid) -> &[ClassRef] {
        self.subclasses
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // ------------------------------------------------------------------
    // Mixin records
    // ------------------------------------------------------------------

    /// Append `mixin` to `instance`'s record. Returns whether it was recorded.
    pub fn record_mixin(
        &mut self,
        instance: Guid,
        mixin: ClassRef,
        policy: DuplicateMixins,
    ) -> bool {
        let applied = self.mixins.entry(instance).or_default();
        if policy == DuplicateMixins::Ignore && applied.iter().any(|m| m.guid == mixin.guid) {
            return false;
        }
        applied.push(mixin);
        true
    }

    /// Mixins applied to `instance`, in order (empty if none)
    pub fn mixins(&self, instance: Guid) -> &[ClassRef] {
        self.mixins
            .get(&instance)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn mixes_in(&self, instance: Guid, mixin: Guid) -> bool {
        self.mixins(instance).iter().any(|m| m.guid == mixin)
    }
}
