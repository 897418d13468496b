//! Identity types for Lineage
//!
//! Two kinds of identity live side by side:
//! - `ObjRef` is a handle into one realm's heap (cheap, copyable, realm-local)
//! - `Guid` is the process-wide identity assigned lazily to an object the first
//!   time anything asks for it. Event and ancestry registries are keyed by it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique object identity
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Guid(pub u64);

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({})", self.0)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to an object slot in a realm heap
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjRef(pub u32);

impl ObjRef {
    #[inline]
    pub fn new(index: u32) -> Self {
        ObjRef(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Obj(#{})", self.0)
    }
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic guid source.
///
/// Values are strictly increasing and never recycled, even after the object
/// that held one is gone.
pub struct GuidAllocator {
    next: AtomicU64,
}

impl GuidAllocator {
    /// Create an allocator whose first guid is `start`
    pub const fn new(start: u64) -> Self {
        GuidAllocator {
            next: AtomicU64::new(start),
        }
    }

    /// Issue the next guid
    #[inline]
    pub fn allocate(&self) -> Guid {
        Guid(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Peek at the guid the next `allocate` call will return
    pub fn peek(&self) -> Guid {
        Guid(self.next.load(Ordering::Relaxed))
    }
}

/// Process-wide allocator shared by every realm.
static GLOBAL_GUIDS: GuidAllocator = GuidAllocator::new(1);

/// Issue a fresh process-wide guid
#[inline]
pub fn next_guid() -> Guid {
    GLOBAL_GUIDS.allocate()
}
