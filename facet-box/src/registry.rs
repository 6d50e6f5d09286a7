//! The descriptor registry observed by the inline erased path.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::any::TypeId;
use core::cell::UnsafeCell;
use core::fmt::{self, Debug, Formatter};
use core::sync::atomic::{AtomicBool, Ordering};

use crate::Descriptor;
use crate::debug;

static GLOBAL: DescriptorRegistry = DescriptorRegistry::new();

/// A set of [`Descriptor`]s, one per described type.
///
/// Every value boxed through the inline erased path registers its descriptor here. The set
/// only grows; decoding a value never reads it. Entries are keyed by `TypeId` because the
/// same descriptor may be materialized at more than one address.
///
/// A single spin flag guards insertion, so the registry can live in a `static` without lazy
/// initialization.
pub struct DescriptorRegistry {
    lock: AtomicBool,
    entries: UnsafeCell<BTreeMap<TypeId, &'static Descriptor>>,
}

// Safety: `entries` is only touched while `lock` is held.
unsafe impl Sync for DescriptorRegistry {}

struct Guard<'r> {
    registry: &'r DescriptorRegistry,
}

impl Guard<'_> {
    #[allow(clippy::mut_from_ref)]
    fn entries(&self) -> &mut BTreeMap<TypeId, &'static Descriptor> {
        // Safety: the guard holds the lock for as long as it lives.
        unsafe { &mut *self.registry.entries.get() }
    }
}

impl Drop for Guard<'_> {
    fn drop(&mut self) {
        self.registry.lock.store(false, Ordering::Release);
    }
}

impl DescriptorRegistry {
    /// Creates an empty registry.
    pub const fn new() -> Self {
        Self {
            lock: AtomicBool::new(false),
            entries: UnsafeCell::new(BTreeMap::new()),
        }
    }

    /// The process-wide registry used by [`Value::erased`](crate::Value::erased).
    pub fn global() -> &'static DescriptorRegistry {
        &GLOBAL
    }

    fn acquire(&self) -> Guard<'_> {
        while self
            .lock
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            while self.lock.load(Ordering::Relaxed) {
                core::hint::spin_loop();
                std::thread::yield_now();
            }
        }
        Guard { registry: self }
    }

    /// Records `descriptor`. Returns `true` if it was not already present.
    pub fn register(&self, descriptor: &'static Descriptor) -> bool {
        let key = descriptor.type_id();
        let guard = self.acquire();
        let entries = guard.entries();
        if entries.contains_key(&key) {
            return false;
        }
        entries.insert(key, descriptor);
        debug!(
            type_name = descriptor.type_name(),
            total = entries.len(),
            "registered descriptor"
        );
        true
    }

    /// Returns `true` if `descriptor` has been registered.
    pub fn contains(&self, descriptor: &'static Descriptor) -> bool {
        let key = descriptor.type_id();
        self.acquire().entries().contains_key(&key)
    }

    /// Number of registered descriptors.
    pub fn len(&self) -> usize {
        self.acquire().entries().len()
    }

    /// Returns `true` if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the registered descriptors.
    pub fn descriptors(&self) -> Vec<&'static Descriptor> {
        self.acquire().entries().values().copied().collect()
    }
}

impl Default for DescriptorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for DescriptorRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.descriptors()).finish()
    }
}
