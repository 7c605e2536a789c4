use std::cell::RefCell;
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::rc::Rc;

use slab_pool::SlabId;

use crate::{RawSegregatedPool, SegregatedPoolBuilder};

/// A single-threaded, cloneable handle to a segregated pool of `T` regions.
///
/// This type wraps [`RawSegregatedPool`] in shared ownership: clones are cheap and all
/// refer to the same backing storage, which stays alive as long as at least one handle
/// does (or for the rest of the thread under
/// [`StorageStrategy::Shared`][crate::StorageStrategy::Shared]).
///
/// The element type is fixed at the type level, so allocations come back as `NonNull<T>`
/// and counts are element counts of `T`. The memory is still raw - the pool never
/// constructs or drops `T` values, it only reserves room for them.
///
/// # Single-threaded Design
///
/// This type is designed for single-threaded use and is neither [`Send`] nor [`Sync`].
/// For cross-thread workloads, give each thread its own pool.
///
/// # Example
///
/// ```
/// use segregated_pool::SegregatedPool;
///
/// let pool: SegregatedPool<u64> = SegregatedPool::new();
///
/// // Room for 100 u64 values; the size class rounds up to 128.
/// let region = pool.allocate(100);
/// assert_eq!(pool.class_capacity(100), 128);
///
/// // SAFETY: The region has room for at least 100 elements and they are ours to write.
/// for index in 0..100 {
///     unsafe { region.add(index).write(index as u64) };
/// }
///
/// // SAFETY: region came from this pool's allocate(100) and is not yet deallocated.
/// unsafe { pool.deallocate(region, 100) };
/// ```
#[derive(Debug)]
pub struct SegregatedPool<T: 'static> {
    /// The shared pool instance, behind a `RefCell` for single-threaded interior mutability.
    inner: Rc<RefCell<RawSegregatedPool>>,

    _element: PhantomData<T>,
}

impl<T: 'static> SegregatedPool<T> {
    /// Creates a new per-instance pool with default configuration.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Returns a builder for creating a [`SegregatedPool`] with custom configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use new_zealand::nz;
    /// use segregated_pool::SegregatedPool;
    ///
    /// let pool: SegregatedPool<u32> = SegregatedPool::builder()
    ///     .alignment(4096)
    ///     .target_slab_bytes(nz!(1_048_576))
    ///     .build();
    /// ```
    pub fn builder() -> SegregatedPoolBuilder<T> {
        SegregatedPoolBuilder::new()
    }

    pub(crate) fn from_inner(inner: Rc<RefCell<RawSegregatedPool>>) -> Self {
        Self {
            inner,
            _element: PhantomData,
        }
    }

    /// Allocates a region with room for at least `count` elements of `T`.
    ///
    /// The region is sized for the full capacity of the request's size class (see
    /// [`class_capacity()`][Self::class_capacity]) and honors the pool's alignment.
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds the largest size class capacity, or if the class pool is
    /// fixed and exhausted.
    #[must_use]
    pub fn allocate(&self, count: usize) -> NonNull<T> {
        self.inner.borrow_mut().allocate(count).cast()
    }

    /// Returns a region to its size class, making it available for reuse.
    ///
    /// # Safety
    ///
    /// `region` must have been returned by this pool's [`allocate()`][Self::allocate]
    /// (through any handle to the same storage) with a `count` that classifies to the same
    /// size class, and must not have been deallocated since.
    pub unsafe fn deallocate(&self, region: NonNull<T>, count: usize) {
        // SAFETY: Forwarding the caller's guarantee.
        unsafe {
            self.inner.borrow_mut().deallocate(region.cast(), count);
        }
    }

    /// Maps an allocation back to the slab backing it.
    ///
    /// `count` must classify to the same size class the region was allocated from. Returns
    /// `None` for addresses this pool's storage does not own.
    #[must_use]
    pub fn locate_owner(&self, region: NonNull<T>, count: usize) -> Option<SlabId> {
        self.inner.borrow().locate_owner(region.cast(), count)
    }

    /// The element capacity of the size class serving requests for `count` elements.
    #[must_use]
    pub fn class_capacity(&self, count: usize) -> usize {
        self.inner.borrow().class_capacity(count)
    }

    /// The largest element count this pool can serve in one allocation.
    #[must_use]
    pub fn max_element_count(&self) -> usize {
        self.inner.borrow().max_element_count()
    }

    /// The alignment every returned region honors.
    #[must_use]
    pub fn alignment(&self) -> usize {
        self.inner.borrow().alignment()
    }

    /// The total number of live allocations across all size classes of this storage.
    ///
    /// Handles sharing storage observe each other's allocations here.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Whether the storage has no live allocations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl<T: 'static> Clone for SegregatedPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            _element: PhantomData,
        }
    }
}

impl<T: 'static> Default for SegregatedPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
mod tests {
    use static_assertions::assert_not_impl_any;

    use super::*;
    use crate::StorageStrategy;

    assert_not_impl_any!(SegregatedPool<u64>: Send, Sync);

    #[test]
    fn typed_round_trip() {
        let pool: SegregatedPool<u64> = SegregatedPool::new();

        let region = pool.allocate(10);
        assert_eq!(pool.len(), 1);

        unsafe {
            region.write(42);
            assert_eq!(region.read(), 42);
            pool.deallocate(region, 10);
        }

        assert!(pool.is_empty());
    }

    #[test]
    fn clones_share_storage() {
        let pool: SegregatedPool<u64> = SegregatedPool::new();
        let pool_clone = pool.clone();

        let region = pool.allocate(5);

        assert_eq!(pool_clone.len(), 1);
        assert!(pool_clone.locate_owner(region, 5).is_some());

        unsafe { pool_clone.deallocate(region, 5) };
        assert!(pool.is_empty());
    }

    #[test]
    fn per_instance_pools_are_independent() {
        let first: SegregatedPool<u64> = SegregatedPool::new();
        let second: SegregatedPool<u64> = SegregatedPool::new();

        let region = first.allocate(5);

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 0);
        assert_eq!(second.locate_owner(region, 5), None);

        unsafe { first.deallocate(region, 5) };
    }

    #[test]
    fn shared_pools_of_one_type_and_config_share_storage() {
        let first: SegregatedPool<u64> = SegregatedPool::builder()
            .storage(StorageStrategy::Shared)
            .build();
        let second: SegregatedPool<u64> = SegregatedPool::builder()
            .storage(StorageStrategy::Shared)
            .build();

        let region = first.allocate(5);

        assert_eq!(second.len(), 1);
        assert!(second.locate_owner(region, 5).is_some());

        unsafe { second.deallocate(region, 5) };
        assert!(first.is_empty());
    }

    #[test]
    fn shared_pools_of_different_types_do_not_share() {
        let ints: SegregatedPool<u64> = SegregatedPool::builder()
            .storage(StorageStrategy::Shared)
            .build();
        let floats: SegregatedPool<f32> = SegregatedPool::builder()
            .storage(StorageStrategy::Shared)
            .build();

        let region = ints.allocate(5);

        assert_eq!(ints.len(), 1);
        assert_eq!(floats.len(), 0);

        unsafe { ints.deallocate(region, 5) };
    }

    #[test]
    fn shared_pools_of_different_configs_do_not_share() {
        let coarse: SegregatedPool<u64> = SegregatedPool::builder()
            .storage(StorageStrategy::Shared)
            .build();
        let fine: SegregatedPool<u64> = SegregatedPool::builder()
            .storage(StorageStrategy::Shared)
            .alignment(128)
            .build();

        let region = coarse.allocate(5);

        assert_eq!(coarse.len(), 1);
        assert_eq!(fine.len(), 0);

        unsafe { coarse.deallocate(region, 5) };
    }

    #[test]
    fn typed_regions_are_aligned_for_the_element() {
        #[repr(align(32))]
        struct Wide([u8; 32]);

        let pool: SegregatedPool<Wide> = SegregatedPool::new();

        let region = pool.allocate(3);
        assert_eq!(region.addr().get() % 32, 0);

        unsafe { pool.deallocate(region, 3) };
    }
}
