use std::alloc::Layout;
use std::num::NonZero;
use std::ptr::NonNull;

use new_zealand::nz;
use slab_pool::{GrowthPolicy, SlabId, SlabPool};

use crate::{RawSegregatedPoolBuilder, ladder::SizeClassLadder};

/// The minimum slot alignment applied when the builder is not told otherwise.
///
/// One cache line on mainstream hardware, so distinct allocations never share a line by
/// default. Raise it for page-aligned or SIMD-heavy workloads, lower it to pack tiny
/// elements more densely.
pub const DEFAULT_ALIGNMENT: usize = 64;

/// The per-slab byte target applied when the builder is not told otherwise.
pub const DEFAULT_TARGET_SLAB_BYTES: NonZero<usize> = nz!(65_536);

/// A segregated-size memory pool: one [`SlabPool`] per size class, with requests routed to
/// the smallest class that fits.
///
/// The pool is configured with an element layout and a ladder of element capacities.
/// [`allocate()`][Self::allocate] takes an element count, rounds it up to the capacity of
/// its size class and returns a region sized for the whole class - the caller may use up
/// to the class capacity, not just the requested count. The same count must accompany the
/// matching [`deallocate()`][Self::deallocate] so the request routes back to the same
/// class.
///
/// This is the raw, layout-driven surface in the spirit of the underlying slab pools:
/// `&mut self` everywhere, raw memory only, misuse documented as undefined behavior rather
/// than checked. The typed, cloneable surface is [`SegregatedPool<T>`][crate::SegregatedPool].
///
/// # Example
///
/// ```
/// use segregated_pool::RawSegregatedPool;
///
/// let mut pool = RawSegregatedPool::builder().layout_of::<u64>().build();
///
/// // Room for 100 elements; the class rounds this up to 128.
/// let region = pool.allocate(100);
/// assert_eq!(pool.class_capacity(100), 128);
///
/// // SAFETY: region came from this pool's allocate(100) and is not yet deallocated.
/// unsafe { pool.deallocate(region, 100) };
/// ```
#[derive(Debug)]
pub struct RawSegregatedPool {
    /// The layout of one element. Slot sizes are multiples of this layout's padded size.
    element_layout: Layout,

    /// The alignment every returned region honors: the element alignment raised to at
    /// least the configured minimum.
    slot_alignment: usize,

    /// Approximate byte size each class aims at when sizing its slabs.
    target_slab_bytes: NonZero<usize>,

    /// Growth policy shared by every class pool.
    growth_policy: GrowthPolicy,

    /// The size-class ladder, ascending. Immutable after construction.
    ladder: SizeClassLadder,

    /// One pool per ladder rung, in the same order. Built eagerly; growable pools reserve
    /// their first slab lazily, so idle classes cost only their bookkeeping struct.
    pools: Vec<SlabPool>,
}

impl RawSegregatedPool {
    /// Creates a builder for configuring and constructing a [`RawSegregatedPool`].
    ///
    /// You must specify an element layout using either `.layout()` or `.layout_of::<T>()`
    /// before calling `.build()`.
    #[inline]
    pub fn builder() -> RawSegregatedPoolBuilder {
        RawSegregatedPoolBuilder::new()
    }

    /// Creates a new [`RawSegregatedPool`] with the specified configuration.
    ///
    /// This method is used internally by the builder to construct the actual pool.
    ///
    /// # Panics
    ///
    /// Panics if the element layout has zero size, if `min_alignment` is not a power of
    /// two, if the capacity ladder is invalid, or if the smallest class's slot would be
    /// smaller than one machine word.
    #[must_use]
    pub(crate) fn new_inner(
        element_layout: Layout,
        min_alignment: usize,
        target_slab_bytes: NonZero<usize>,
        growth_policy: GrowthPolicy,
        capacities: &[usize],
    ) -> Self {
        assert!(
            element_layout.size() > 0,
            "RawSegregatedPool must have non-zero element size"
        );
        assert!(
            min_alignment.is_power_of_two(),
            "minimum alignment must be a power of two"
        );

        // Elements are laid out back to back inside a slot, so the per-element stride is
        // the padded element size - same rule as arrays.
        let element_stride =
            NonZero::new(element_layout.pad_to_align().size()).unwrap_or(NonZero::<usize>::MIN);

        let slot_alignment = element_layout.align().max(min_alignment);

        let ladder = SizeClassLadder::new(element_stride, target_slab_bytes, capacities);

        let pools = ladder
            .classes()
            .iter()
            .map(|class| {
                let slot_bytes = element_stride
                    .get()
                    .checked_mul(class.capacity())
                    .expect("size-class slot byte size cannot overflow for usable capacities");

                let slot_layout = Layout::from_size_align(slot_bytes, slot_alignment)
                    .expect("slot layout calculation cannot fail for valid element layouts");

                SlabPool::builder()
                    .slot_layout(slot_layout)
                    .slots_per_slab(class.slots_per_slab())
                    .growth_policy(growth_policy)
                    .build()
            })
            .collect::<Vec<_>>();

        Self {
            element_layout,
            slot_alignment,
            target_slab_bytes,
            growth_policy,
            ladder,
            pools,
        }
    }

    /// The layout of one element, as configured.
    #[must_use]
    #[inline]
    pub fn element_layout(&self) -> Layout {
        self.element_layout
    }

    /// The alignment every returned region honors.
    #[must_use]
    #[inline]
    pub fn alignment(&self) -> usize {
        self.slot_alignment
    }

    /// The per-slab byte target each class sizes its slabs toward.
    #[must_use]
    #[inline]
    pub fn target_slab_bytes(&self) -> NonZero<usize> {
        self.target_slab_bytes
    }

    /// The growth policy shared by every class pool.
    #[must_use]
    #[inline]
    pub fn growth_policy(&self) -> GrowthPolicy {
        self.growth_policy
    }

    /// The largest element count this pool can serve in one allocation.
    #[must_use]
    #[inline]
    pub fn max_element_count(&self) -> usize {
        self.ladder.max_capacity()
    }

    /// The number of size classes in the ladder.
    #[must_use]
    #[inline]
    pub fn class_count(&self) -> usize {
        self.pools.len()
    }

    /// The element capacity of the class that serves requests for `count` elements.
    ///
    /// Regions returned by [`allocate(count)`][Self::allocate] are sized for this many
    /// elements, not just `count`.
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds the largest class capacity.
    #[must_use]
    pub fn class_capacity(&self, count: usize) -> usize {
        let class = self.ladder.classify(count);

        self.ladder
            .classes()
            .get(class)
            .expect("classify() returns indexes into the ladder it was asked about")
            .capacity()
    }

    /// The total number of live allocations across all size classes.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Can be mutated to misreport utilization in uninteresting ways.
    pub fn len(&self) -> usize {
        self.pools.iter().map(SlabPool::len).sum()
    }

    /// Whether the pool has no live allocations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.iter().all(SlabPool::is_empty)
    }

    /// Allocates a region with room for at least `count` elements.
    ///
    /// The request routes to the smallest size class whose capacity covers `count`; the
    /// returned region is sized for the full class capacity and aligned to
    /// [`alignment()`][Self::alignment].
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds the largest class capacity, or if the class pool is
    /// [`Fixed`][GrowthPolicy::Fixed] and exhausted.
    #[must_use]
    pub fn allocate(&mut self, count: usize) -> NonNull<u8> {
        let class = self.ladder.classify(count);

        self.class_pool_mut(class).allocate()
    }

    /// Returns a region to its size class, making it available for reuse.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by this pool's [`allocate()`][Self::allocate] with a
    /// `count` that classifies to the same size class, and must not have been deallocated
    /// since. A foreign pointer, a double free, or a count from a different class corrupts
    /// the class pool's free list and is undefined behavior.
    pub unsafe fn deallocate(&mut self, ptr: NonNull<u8>, count: usize) {
        let class = self.ladder.classify(count);

        // SAFETY: Forwarding the caller's guarantee that ptr is a live allocation of this
        // class's pool.
        unsafe {
            self.class_pool_mut(class).deallocate(ptr);
        }
    }

    /// Maps an allocation back to the slab backing it.
    ///
    /// `count` must classify to the same size class the region was allocated from; the
    /// lookup is scoped to that class's slab chain. Returns `None` for addresses the class
    /// does not own.
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds the largest class capacity.
    #[must_use]
    pub fn locate_owner(&self, ptr: NonNull<u8>, count: usize) -> Option<SlabId> {
        let class = self.ladder.classify(count);

        self.pools
            .get(class)
            .expect("ladder and class pools are built in lockstep")
            .locate_owner(ptr)
    }

    fn class_pool_mut(&mut self, class: usize) -> &mut SlabPool {
        self.pools
            .get_mut(class)
            .expect("ladder and class pools are built in lockstep")
    }
}

#[cfg(test)]
#[allow(
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
mod tests {
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(RawSegregatedPool: Send);
    assert_not_impl_any!(RawSegregatedPool: Sync);

    fn small_pool() -> RawSegregatedPool {
        RawSegregatedPool::builder()
            .layout_of::<u64>()
            .capacities(&[4, 16, 64])
            .build()
    }

    #[test]
    fn smoke_test() {
        let mut pool = small_pool();

        assert!(pool.is_empty());

        let a = pool.allocate(3);
        let b = pool.allocate(10);

        assert_eq!(pool.len(), 2);

        unsafe {
            pool.deallocate(a, 3);
            pool.deallocate(b, 10);
        }

        assert!(pool.is_empty());
    }

    #[test]
    fn requests_round_up_to_their_class() {
        let pool = small_pool();

        assert_eq!(pool.class_capacity(1), 4);
        assert_eq!(pool.class_capacity(4), 4);
        assert_eq!(pool.class_capacity(5), 16);
        assert_eq!(pool.class_capacity(64), 64);
    }

    #[test]
    fn different_classes_use_different_slabs() {
        let mut pool = small_pool();

        let small = pool.allocate(2);
        let large = pool.allocate(60);

        let small_slab = pool.locate_owner(small, 2).unwrap();
        let large_slab = pool.locate_owner(large, 60).unwrap();

        assert_ne!(small_slab, large_slab);

        // Scoped to the wrong class, the lookup finds nothing.
        assert_eq!(pool.locate_owner(small, 60), None);
    }

    #[test]
    fn same_class_reuses_memory_lifo() {
        let mut pool = small_pool();

        let first = pool.allocate(4);
        unsafe { pool.deallocate(first, 4) };

        // Counts 1 and 4 classify identically, so the freed region comes straight back.
        assert_eq!(pool.allocate(1), first);
    }

    #[test]
    fn returned_regions_honor_the_default_alignment() {
        let mut pool = RawSegregatedPool::builder()
            .layout_of::<u64>()
            .capacities(&[4, 16])
            .build();

        assert_eq!(pool.alignment(), DEFAULT_ALIGNMENT);

        for count in [1, 4, 5, 16] {
            let region = pool.allocate(count);
            assert_eq!(region.addr().get() % DEFAULT_ALIGNMENT, 0);
        }
    }

    #[test]
    fn element_alignment_wins_when_larger_than_the_minimum() {
        #[repr(align(128))]
        struct Wide([u8; 128]);

        let pool = RawSegregatedPool::builder()
            .layout_of::<Wide>()
            .capacities(&[4])
            .build();

        assert_eq!(pool.alignment(), 128);
    }

    #[test]
    #[should_panic]
    fn oversized_request_panics() {
        let mut pool = small_pool();

        _ = pool.allocate(65);
    }

    #[test]
    #[should_panic]
    fn fixed_pool_class_exhaustion_panics() {
        let mut pool = RawSegregatedPool::builder()
            .layout_of::<u64>()
            .capacities(&[4])
            .target_slab_bytes(NonZero::new(4 * size_of::<u64>() * 2).unwrap())
            .growth_policy(GrowthPolicy::Fixed)
            .build();

        // The single class holds two slots per slab; the third allocation must panic.
        _ = pool.allocate(4);
        _ = pool.allocate(4);
        _ = pool.allocate(4);
    }

    #[test]
    fn huge_class_still_serves_at_least_one_slot_per_slab() {
        // The class's slot (1024 elements of 8 bytes) dwarfs the 1 KiB slab target.
        let mut pool = RawSegregatedPool::builder()
            .layout_of::<u64>()
            .capacities(&[1024])
            .target_slab_bytes(nz!(1024))
            .build();

        let region = pool.allocate(1000);
        assert!(pool.locate_owner(region, 1000).is_some());
    }

    #[test]
    fn max_element_count_reports_the_top_class() {
        let pool = small_pool();

        assert_eq!(pool.max_element_count(), 64);
        assert_eq!(pool.class_count(), 3);
    }
}
