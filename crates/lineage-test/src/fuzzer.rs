//! Hierarchy Fuzzer - Randomized composition against a shadow model
//!
//! Drives a realm with random inherit, construct, mixin and event operations
//! while keeping a plain model of what each should do, then checks:
//! - Ancestor chains are acyclic, end at the root and match the model
//! - Instances stay `instance_of` every ancestor of their class
//! - Mixin records keep application order
//! - The inherited event fired once per successful inherit
//! - Dispatch reaches exactly the registered handlers
//! - Guids are unique

use std::collections::{HashMap, HashSet};

use lineage_core::{Guid, LineageError, LineageResult, ObjRef, Value};
use lineage_events::INHERITED;
use lineage_runtime::{init_logging, LogConfig, Realm, RealmHandler};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

const INHERITED_COUNT: &str = "inherited_count";
const PING: &str = "ping";
const PING_COUNT: &str = "ping_count";

/// Fuzzer configuration
#[derive(Clone, Debug)]
pub struct FuzzerConfig {
    /// Number of classes
    pub class_count: usize,
    /// Number of operations to run
    pub op_count: usize,
    /// Probability an operation is a mixin
    pub mixin_prob: f64,
    /// Probability an operation touches events (on, off or trigger)
    pub event_prob: f64,
    /// Probability an operation constructs an instance
    pub construct_prob: f64,
    /// Random seed
    pub seed: u64,
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        FuzzerConfig {
            class_count: 8,
            op_count: 500,
            mixin_prob: 0.2,
            event_prob: 0.2,
            construct_prob: 0.2,
            seed: 42,
        }
    }
}

impl FuzzerConfig {
    /// Light fuzzing for quick tests
    pub fn light() -> Self {
        FuzzerConfig {
            class_count: 4,
            op_count: 100,
            ..Self::default()
        }
    }

    /// Heavy fuzzing for thorough testing
    pub fn heavy() -> Self {
        FuzzerConfig {
            class_count: 32,
            op_count: 10_000,
            mixin_prob: 0.25,
            event_prob: 0.25,
            construct_prob: 0.15,
            seed: 42,
        }
    }
}

/// A broken invariant
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("{class} appears in its own ancestors")]
    CyclicAncestry { class: ObjRef },

    #[error("ancestors of {class}: expected {expected:?}, got {actual:?}")]
    AncestryMismatch {
        class: ObjRef,
        expected: Vec<ObjRef>,
        actual: Vec<ObjRef>,
    },

    #[error("{instance} is not an instance of ancestor {class}")]
    MissingInstanceOf { instance: ObjRef, class: ObjRef },

    #[error("mixins of {instance}: expected {expected:?}, got {actual:?}")]
    MixinOrder {
        instance: ObjRef,
        expected: Vec<ObjRef>,
        actual: Vec<ObjRef>,
    },

    #[error("inherited fired {actual} times on {class}, expected {expected}")]
    InheritedCount {
        class: ObjRef,
        expected: i64,
        actual: i64,
    },

    #[error("ping on {owner} reached {actual} handlers, expected {expected}")]
    DispatchCount {
        owner: ObjRef,
        expected: i64,
        actual: i64,
    },

    #[error("inherit {child} -> {parent}: cycle expected {expected_cycle}, got {outcome}")]
    InheritOutcome {
        child: ObjRef,
        parent: ObjRef,
        expected_cycle: bool,
        outcome: String,
    },

    #[error("duplicate guid {0}")]
    DuplicateGuid(Guid),
}

/// Operation counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuzzStats {
    pub inherits: usize,
    pub rejected_cycles: usize,
    pub constructs: usize,
    pub mixins: usize,
    pub registrations: usize,
    pub removals: usize,
    pub dispatches: usize,
}

/// Fuzzing result
#[derive(Debug)]
pub struct FuzzResult {
    pub stats: FuzzStats,
    pub violations: Vec<InvariantViolation>,
}

impl FuzzResult {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Clone, Copy)]
struct FuzzInstance {
    object: ObjRef,
    class: usize,
}

/// Hierarchy fuzzer
pub struct HierarchyFuzzer {
    config: FuzzerConfig,
    realm: Realm,
    rng: StdRng,
    classes: Vec<ObjRef>,
    instances: Vec<FuzzInstance>,
    /// Model: class index -> parent class index
    parents: Vec<Option<usize>>,
    /// Model: successful inherits per parent class
    inherited: Vec<i64>,
    /// Model: ping handlers per class
    pings: Vec<Vec<RealmHandler>>,
    /// Model: mixins per instance index
    mixins: HashMap<usize, Vec<ObjRef>>,
    stats: FuzzStats,
    violations: Vec<InvariantViolation>,
}

fn bump(realm: &mut Realm, obj: ObjRef, key: &str) -> LineageResult<Value> {
    let count = realm.get(obj, key)?.as_int().unwrap_or(0);
    realm.set(obj, key, count + 1)?;
    Ok(Value::Undefined)
}

impl HierarchyFuzzer {
    /// Create a new fuzzer with its classes defined.
    ///
    /// Installs the `LINEAGE_LOG` subscriber on first use.
    pub fn new(config: FuzzerConfig) -> LineageResult<Self> {
        init_logging(&LogConfig::from_env());
        let rng = StdRng::seed_from_u64(config.seed);
        let mut realm = Realm::new();

        let mut classes = Vec::with_capacity(config.class_count);
        for i in 0..config.class_count {
            let class = realm.define_function(&format!("C{}", i), |realm, this, _| {
                bump(realm, this, "initialized")
            })?;
            let members = realm.prototype(class)?;
            realm.set(members, &format!("member_{}", i), i as i64)?;
            realm.on_fn(class, INHERITED, |realm, event, _| {
                bump(realm, event.this(), INHERITED_COUNT)
            })?;
            classes.push(class);
        }

        Ok(HierarchyFuzzer {
            parents: vec![None; config.class_count],
            inherited: vec![0; config.class_count],
            pings: vec![Vec::new(); config.class_count],
            config,
            realm,
            rng,
            classes,
            instances: Vec::new(),
            mixins: HashMap::new(),
            stats: FuzzStats::default(),
            violations: Vec::new(),
        })
    }

    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    /// Run the fuzzer
    pub fn run(&mut self) -> LineageResult<FuzzResult> {
        if !self.classes.is_empty() {
            for _ in 0..self.config.op_count {
                self.step()?;
            }
        }

        self.check_invariants()?;
        Ok(FuzzResult {
            stats: self.stats.clone(),
            violations: std::mem::take(&mut self.violations),
        })
    }

    fn step(&mut self) -> LineageResult<()> {
        let roll: f64 = self.rng.gen();
        let mixin = self.config.mixin_prob;
        let event = mixin + self.config.event_prob;
        let construct = event + self.config.construct_prob;

        if roll < mixin {
            if self.instances.is_empty() {
                self.fuzz_construct()
            } else {
                self.fuzz_mixin()
            }
        } else if roll < event {
            self.fuzz_event()
        } else if roll < construct {
            self.fuzz_construct()
        } else {
            self.fuzz_inherit()
        }
    }

    fn random_class(&mut self) -> usize {
        self.rng.gen_range(0..self.classes.len())
    }

    /// Model cycle check: linking `child` under `parent`
    fn model_would_cycle(&self, child: usize, parent: usize) -> bool {
        let mut cursor = Some(parent);
        while let Some(c) = cursor {
            if c == child {
                return true;
            }
            cursor = self.parents[c];
        }
        false
    }

    /// Model ancestors, nearest first, without the root
    fn model_ancestors(&self, class: usize) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut cursor = self.parents[class];
        while let Some(c) = cursor {
            chain.push(c);
            cursor = self.parents[c];
        }
        chain
    }

    fn fuzz_inherit(&mut self) -> LineageResult<()> {
        let child = self.random_class();
        let parent = self.random_class();
        let expected_cycle = self.model_would_cycle(child, parent);
        let (child_obj, parent_obj) = (self.classes[child], self.classes[parent]);

        match self.realm.inherit(child_obj, parent_obj) {
            Ok(_) if !expected_cycle => {
                self.parents[child] = Some(parent);
                self.inherited[parent] += 1;
                self.stats.inherits += 1;
            }
            Err(LineageError::CyclicInheritance { .. }) if expected_cycle => {
                self.stats.rejected_cycles += 1;
            }
            other => self.violations.push(InvariantViolation::InheritOutcome {
                child: child_obj,
                parent: parent_obj,
                expected_cycle,
                outcome: format!("{:?}", other),
            }),
        }
        Ok(())
    }

    fn fuzz_construct(&mut self) -> LineageResult<()> {
        let class = self.random_class();
        let object = self.realm.construct(self.classes[class], &[])?;
        self.instances.push(FuzzInstance { object, class });
        self.stats.constructs += 1;
        Ok(())
    }

    fn fuzz_mixin(&mut self) -> LineageResult<()> {
        let index = self.rng.gen_range(0..self.instances.len());
        let pick = self.random_class();
        let mixin = self.classes[pick];
        self.realm.mixin(self.instances[index].object, mixin, &[])?;
        self.mixins.entry(index).or_default().push(mixin);
        self.stats.mixins += 1;
        Ok(())
    }

    fn fuzz_event(&mut self) -> LineageResult<()> {
        let class = self.random_class();
        let owner = self.classes[class];

        match self.rng.gen_range(0..3) {
            0 => {
                let handler = self
                    .realm
                    .on_fn(owner, PING, |realm, event, _| bump(realm, event.this(), PING_COUNT))?;
                self.pings[class].push(handler);
                self.stats.registrations += 1;
            }
            1 => {
                if let Some(handler) = self.pings[class].pop() {
                    self.realm.off(owner, PING, Some(&handler))?;
                    self.stats.removals += 1;
                }
            }
            _ => {
                let before = self.realm.get(owner, PING_COUNT)?.as_int().unwrap_or(0);
                self.realm.trigger(owner, PING, &[])?;
                let after = self.realm.get(owner, PING_COUNT)?.as_int().unwrap_or(0);

                let expected = self.pings[class].len() as i64;
                if after - before != expected {
                    self.violations.push(InvariantViolation::DispatchCount {
                        owner,
                        expected,
                        actual: after - before,
                    });
                }
                self.stats.dispatches += 1;
            }
        }
        Ok(())
    }

    /// Check all invariants
    fn check_invariants(&mut self) -> LineageResult<()> {
        let root = self.realm.object_constructor();

        for class in 0..self.classes.len() {
            let object = self.classes[class];
            let actual = self.realm.ancestors(object)?;

            if actual.contains(&object) {
                self.violations
                    .push(InvariantViolation::CyclicAncestry { class: object });
            }

            let mut expected: Vec<ObjRef> = self
                .model_ancestors(class)
                .into_iter()
                .map(|c| self.classes[c])
                .collect();
            expected.push(root);
            if actual != expected {
                self.violations.push(InvariantViolation::AncestryMismatch {
                    class: object,
                    expected,
                    actual,
                });
            }

            let fired = self.realm.get(object, INHERITED_COUNT)?.as_int().unwrap_or(0);
            if fired != self.inherited[class] {
                self.violations.push(InvariantViolation::InheritedCount {
                    class: object,
                    expected: self.inherited[class],
                    actual: fired,
                });
            }
        }

        for index in 0..self.instances.len() {
            let FuzzInstance { object, class } = self.instances[index];
            let mut lineage = vec![class];
            lineage.extend(self.model_ancestors(class));
            for ancestor in lineage {
                let ancestor = self.classes[ancestor];
                if !self.realm.instance_of(object, ancestor)? {
                    self.violations.push(InvariantViolation::MissingInstanceOf {
                        instance: object,
                        class: ancestor,
                    });
                }
            }

            let expected = self.mixins.get(&index).cloned().unwrap_or_default();
            let actual = self.realm.mixins(object)?;
            if actual != expected {
                self.violations.push(InvariantViolation::MixinOrder {
                    instance: object,
                    expected,
                    actual,
                });
            }
        }

        let objects: Vec<ObjRef> = self
            .classes
            .iter()
            .copied()
            .chain(self.instances.iter().map(|i| i.object))
            .collect();
        let mut seen = HashSet::new();
        for object in objects {
            let guid = self.realm.guid(object)?;
            if !seen.insert(guid) {
                self.violations.push(InvariantViolation::DuplicateGuid(guid));
            }
        }
        Ok(())
    }
}
