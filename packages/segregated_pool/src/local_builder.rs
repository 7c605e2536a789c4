use std::alloc::Layout;
use std::any::TypeId;
use std::cell::{Cell, RefCell};
use std::marker::PhantomData;
use std::num::NonZero;
use std::rc::Rc;

use foldhash::{HashMap, HashMapExt};
use slab_pool::GrowthPolicy;

use crate::ladder::DEFAULT_CAPACITIES;
use crate::raw::{DEFAULT_ALIGNMENT, DEFAULT_TARGET_SLAB_BYTES};
use crate::{RawSegregatedPool, SegregatedPool, StorageStrategy};

/// Everything that distinguishes one shared storage from another: the element type plus
/// the full pool configuration. Handles built with equal keys attach to the same storage.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct SharedStorageKey {
    element_type: TypeId,
    min_alignment: usize,
    target_slab_bytes: NonZero<usize>,
    growth_policy: GrowthPolicy,
    capacities: Vec<usize>,
}

thread_local! {
    /// Registry of shared storages, one per thread. Entries live for the rest of the
    /// thread once created; the registry itself holds a strong reference.
    static SHARED_STORAGES: RefCell<HashMap<SharedStorageKey, Rc<RefCell<RawSegregatedPool>>>> =
        RefCell::new(HashMap::new());
}

/// Builder for creating a [`SegregatedPool<T>`] with custom configuration.
///
/// Created via [`SegregatedPool::builder()`].
///
/// The element layout comes from `T`; the remaining knobs mirror
/// [`RawSegregatedPoolBuilder`][crate::RawSegregatedPoolBuilder], plus the
/// [storage strategy][StorageStrategy] deciding whether the built handle owns its storage
/// or attaches to the thread's shared one.
///
/// # Example
///
/// ```
/// use segregated_pool::{SegregatedPool, StorageStrategy};
/// use slab_pool::GrowthPolicy;
///
/// let pool: SegregatedPool<u64> = SegregatedPool::builder()
///     .growth_policy(GrowthPolicy::Growable)
///     .storage(StorageStrategy::Shared)
///     .build();
/// ```
#[derive(Debug)]
#[must_use]
pub struct SegregatedPoolBuilder<T: 'static> {
    min_alignment: usize,
    target_slab_bytes: NonZero<usize>,
    growth_policy: GrowthPolicy,
    capacities: Vec<usize>,
    storage: StorageStrategy,

    /// Thread-mobile regardless of `T`, not thread-safe, and no `T` is ever stored here.
    _element: PhantomData<(fn() -> T, Cell<()>)>,
}

impl<T: 'static> SegregatedPoolBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            min_alignment: DEFAULT_ALIGNMENT,
            target_slab_bytes: DEFAULT_TARGET_SLAB_BYTES,
            growth_policy: GrowthPolicy::default(),
            capacities: DEFAULT_CAPACITIES.to_vec(),
            storage: StorageStrategy::default(),
            _element: PhantomData,
        }
    }

    /// Sets the minimum alignment of returned regions.
    ///
    /// The effective alignment is the larger of this and `align_of::<T>()`. Must be a
    /// power of two, checked at `build()` time.
    pub fn alignment(mut self, min_alignment: usize) -> Self {
        self.min_alignment = min_alignment;
        self
    }

    /// Sets the approximate byte size each size class aims at when reserving a slab.
    pub fn target_slab_bytes(mut self, target_slab_bytes: NonZero<usize>) -> Self {
        self.target_slab_bytes = target_slab_bytes;
        self
    }

    /// Sets what each class pool does when an allocation finds its free list empty.
    pub fn growth_policy(mut self, growth_policy: GrowthPolicy) -> Self {
        self.growth_policy = growth_policy;
        self
    }

    /// Replaces the default capacity ladder with a custom one.
    ///
    /// Capacities are element counts and must be strictly ascending and non-zero, checked
    /// at `build()` time.
    pub fn capacities(mut self, capacities: &[usize]) -> Self {
        self.capacities = capacities.to_vec();
        self
    }

    /// Sets where the built pool's backing storage lives.
    pub fn storage(mut self, storage: StorageStrategy) -> Self {
        self.storage = storage;
        self
    }

    /// Builds the [`SegregatedPool<T>`] with the configured options.
    ///
    /// Under [`StorageStrategy::Shared`], an existing storage with the same element type
    /// and configuration is reused when present; otherwise one is created and registered
    /// for the rest of the thread.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized, if the minimum alignment is not a power of two, or if
    /// the capacity ladder is empty, not strictly ascending, or contains a zero.
    #[must_use]
    pub fn build(self) -> SegregatedPool<T> {
        let inner = match self.storage {
            StorageStrategy::PerInstance => Rc::new(RefCell::new(self.build_raw())),
            StorageStrategy::Shared => {
                let key = SharedStorageKey {
                    element_type: TypeId::of::<T>(),
                    min_alignment: self.min_alignment,
                    target_slab_bytes: self.target_slab_bytes,
                    growth_policy: self.growth_policy,
                    capacities: self.capacities.clone(),
                };

                SHARED_STORAGES.with_borrow_mut(|storages| {
                    Rc::clone(
                        storages
                            .entry(key)
                            .or_insert_with(|| Rc::new(RefCell::new(self.build_raw()))),
                    )
                })
            }
        };

        SegregatedPool::from_inner(inner)
    }

    fn build_raw(&self) -> RawSegregatedPool {
        RawSegregatedPool::new_inner(
            Layout::new::<T>(),
            self.min_alignment,
            self.target_slab_bytes,
            self.growth_policy,
            &self.capacities,
        )
    }
}

#[cfg(test)]
mod tests {
    use new_zealand::nz;
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(SegregatedPoolBuilder<u64>: Send);
    assert_not_impl_any!(SegregatedPoolBuilder<u64>: Sync);

    // The builder stays Send even for single-threaded element types.
    assert_impl_all!(SegregatedPoolBuilder<std::rc::Rc<u64>>: Send);

    #[test]
    fn defaults_apply() {
        let pool: SegregatedPool<u64> = SegregatedPool::builder().build();

        assert_eq!(pool.alignment(), DEFAULT_ALIGNMENT);
        assert_eq!(pool.max_element_count(), 33_554_432);
    }

    #[test]
    fn configured_values_apply() {
        let pool: SegregatedPool<u32> = SegregatedPool::builder()
            .alignment(256)
            .target_slab_bytes(nz!(4096))
            .capacities(&[8, 64])
            .build();

        assert_eq!(pool.alignment(), 256);
        assert_eq!(pool.max_element_count(), 64);
    }

    #[test]
    #[should_panic]
    fn zero_sized_element_panics() {
        drop(SegregatedPool::<()>::new());
    }
}
