use std::alloc::Layout;
use std::num::NonZero;
use std::ptr::NonNull;

use new_zealand::nz;

use crate::{GrowthPolicy, SlabId, SlabPoolBuilder, slab, slab::Slab};

/// A single-size-class memory pool handing out fixed-size slots from a chain of slabs.
///
/// `SlabPool` reserves large aligned regions ("slabs") from the system allocator and carves
/// each into equally sized slots. Unused slots form an intrusive free list overlaid on the
/// slot memory itself, so allocation and deallocation are a pointer swap each - no
/// per-request trip to the system allocator and no external bookkeeping.
///
/// # Key characteristics
///
/// - **Fixed slot size**: every allocation returns one slot of the layout given at
///   construction time; callers needing multiple sizes layer a
///   size-class dispatch on top (see the `segregated_pool` package).
/// - **LIFO reuse**: the most recently deallocated slot is the next one returned,
///   keeping hot memory hot.
/// - **Growth policy**: a [`Growable`][GrowthPolicy::Growable] pool transparently reserves
///   another slab on exhaustion; a [`Fixed`][GrowthPolicy::Fixed] pool panics instead.
/// - **Ownership lookup**: [`locate_owner()`][Self::locate_owner] maps a live address back
///   to the [`SlabId`] of the slab backing it, for diagnostics and bulk-release schemes.
/// - **No content access**: the pool never reads or writes a live slot; the returned
///   memory is the caller's alone until deallocated.
///
/// # Example
///
/// ```
/// use std::alloc::Layout;
///
/// use new_zealand::nz;
/// use slab_pool::SlabPool;
///
/// let mut pool = SlabPool::builder()
///     .slot_layout(Layout::new::<u64>())
///     .slots_per_slab(nz!(64))
///     .build();
///
/// let slot = pool.allocate();
/// assert_eq!(pool.len(), 1);
///
/// // The slot is ours to use until we hand it back.
/// // SAFETY: slot was returned by this pool's allocate() and is not yet deallocated.
/// unsafe { pool.deallocate(slot) };
/// assert_eq!(pool.len(), 0);
/// ```
///
/// # Thread safety
///
/// The pool is thread-mobile ([`Send`]) but not thread-safe ([`Sync`]). There is no internal
/// locking anywhere; concurrent use requires an external mutual-exclusion boundary or
/// per-thread pools.
#[derive(Debug)]
pub struct SlabPool {
    /// Slot layout, padded to its alignment so consecutive slots stay aligned. All slabs of
    /// this pool share it.
    slot_layout: Layout,

    /// Number of slots each reserved slab holds.
    slots_per_slab: NonZero<usize>,

    /// What to do when an allocation finds the free list empty.
    growth_policy: GrowthPolicy,

    /// The slab chain in creation order. The last element is the newest slab and plays the
    /// role of the chain head: growth appends here and address lookups walk newest to oldest.
    slabs: Vec<Slab>,

    /// Head of the intrusive free list threaded through the leading words of unused slots.
    /// `None` means the free list is empty, which is not the same as the pool being full -
    /// a growable pool simply has not reserved its next slab yet.
    free_head: Option<NonNull<u8>>,

    /// Number of live (allocated, not yet deallocated) slots. Tracked explicitly so callers
    /// can observe utilization without walking the free list.
    length: usize,
}

/// How many slots a slab holds when the builder is not told otherwise.
///
/// Sized so that slabs are reserved rarely while a mostly-idle pool does not pin
/// an unreasonable amount of memory.
#[cfg(not(miri))]
pub(crate) const DEFAULT_SLOTS_PER_SLAB: NonZero<usize> = nz!(128);

// Under Miri, we use a smaller slab size because Miri test runtime scales by memory usage.
#[cfg(miri)]
pub(crate) const DEFAULT_SLOTS_PER_SLAB: NonZero<usize> = nz!(16);

impl SlabPool {
    /// Creates a builder for configuring and constructing a [`SlabPool`].
    ///
    /// You must specify a slot layout using either `.slot_layout()` or
    /// `.slot_layout_of::<T>()` before calling `.build()`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::alloc::Layout;
    ///
    /// use slab_pool::SlabPool;
    ///
    /// let pool = SlabPool::builder()
    ///     .slot_layout(Layout::new::<[u8; 256]>())
    ///     .build();
    ///
    /// assert_eq!(pool.len(), 0);
    /// ```
    #[inline]
    pub fn builder() -> SlabPoolBuilder {
        SlabPoolBuilder::new()
    }

    /// Creates a new [`SlabPool`] with the specified configuration.
    ///
    /// This method is used internally by the builder to construct the actual pool.
    ///
    /// # Panics
    ///
    /// Panics if the slot layout has zero size or pads to less than one machine word.
    #[must_use]
    pub(crate) fn new_inner(
        slot_layout: Layout,
        slots_per_slab: NonZero<usize>,
        growth_policy: GrowthPolicy,
    ) -> Self {
        assert!(
            slot_layout.size() > 0,
            "SlabPool must have non-zero slot size"
        );

        // Padding the layout up front fixes the stride so every slab of the pool carves
        // its region identically.
        let slot_layout = slot_layout.pad_to_align();

        assert!(
            slot_layout.size() >= size_of::<*mut u8>(),
            "SlabPool slot size must be at least one machine word so free slots can carry their list link"
        );

        let mut pool = Self {
            slot_layout,
            slots_per_slab,
            growth_policy,
            slabs: Vec::new(),
            free_head: None,
            length: 0,
        };

        // A fixed pool is fully populated at construction; a growable pool reserves its
        // first slab lazily, on the first allocation.
        if pool.growth_policy == GrowthPolicy::Fixed {
            _ = pool.grow();
        }

        pool
    }

    /// The slot layout served by this pool, padded to its alignment.
    #[must_use]
    #[inline]
    pub fn slot_layout(&self) -> Layout {
        self.slot_layout
    }

    /// How many slots each slab of this pool holds.
    #[must_use]
    #[inline]
    pub fn slots_per_slab(&self) -> NonZero<usize> {
        self.slots_per_slab
    }

    /// The growth policy this pool was constructed with.
    #[must_use]
    #[inline]
    pub fn growth_policy(&self) -> GrowthPolicy {
        self.growth_policy
    }

    /// The number of live slots - allocated and not yet deallocated.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Can be mutated to infinitely growing memory use and/or infinite loop.
    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether the pool has no live slots.
    ///
    /// An empty pool may still be holding reserved slabs - emptiness never triggers
    /// reclamation.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The number of slots the pool can serve without reserving another slab.
    ///
    /// This is the total across all slabs, including slots currently live.
    #[must_use]
    #[inline]
    pub fn capacity(&self) -> usize {
        // Overflow here would imply capacity is greater than virtual memory - impossible.
        self.slabs.len().wrapping_mul(self.slots_per_slab.get())
    }

    /// The number of slots currently on the free list.
    #[must_use]
    #[inline]
    pub fn free_slots(&self) -> usize {
        // Cannot wrap: length never exceeds capacity.
        self.capacity().wrapping_sub(self.length)
    }

    /// The number of slabs currently in the chain.
    #[must_use]
    #[inline]
    pub fn slab_count(&self) -> usize {
        self.slabs.len()
    }

    /// Returns one slot's address, growing the pool first if the free list is empty.
    ///
    /// The returned region is `slot_layout().size()` bytes, aligned to
    /// `slot_layout().align()`. The pool never touches it again until it is passed back to
    /// [`deallocate()`][Self::deallocate].
    ///
    /// # Example
    ///
    /// ```
    /// use std::alloc::Layout;
    ///
    /// use slab_pool::SlabPool;
    ///
    /// let mut pool = SlabPool::builder()
    ///     .slot_layout(Layout::from_size_align(64, 64).unwrap())
    ///     .build();
    ///
    /// let slot = pool.allocate();
    ///
    /// // Slots come back aligned to the slot layout.
    /// assert_eq!(slot.addr().get() % 64, 0);
    ///
    /// // SAFETY: slot was returned by this pool's allocate() and is not yet deallocated.
    /// unsafe { pool.deallocate(slot) };
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the pool is [`Fixed`][GrowthPolicy::Fixed] and exhausted, or if a needed
    /// slab reservation fails in the system allocator. Neither condition is recoverable.
    #[must_use]
    pub fn allocate(&mut self) -> NonNull<u8> {
        let slot = match self.free_head {
            Some(slot) => slot,
            None => match self.growth_policy {
                GrowthPolicy::Growable => self.grow(),
                GrowthPolicy::Fixed => panic!(
                    "fixed pool of {} slots is exhausted - no further growth is attempted",
                    self.capacity()
                ),
            },
        };

        // Pop the head: the popped slot's leading word holds the next free slot.
        // SAFETY: slot is on the free list, so its leading word is a link we wrote earlier.
        self.free_head = unsafe { slab::read_free_link(slot) };

        // Cannot overflow: that would imply more live slots than virtual memory.
        self.length = self.length.wrapping_add(1);

        #[cfg(debug_assertions)]
        self.integrity_check();

        slot
    }

    /// Returns a slot to the pool, making it the next one [`allocate()`][Self::allocate]
    /// hands out.
    ///
    /// No validation that `slot` actually belongs to this pool is performed - the check
    /// would cost a chain walk on the hot path. Callers that want to pay for validation can
    /// assert [`locate_owner()`][Self::locate_owner] returns `Some` first.
    ///
    /// # Safety
    ///
    /// `slot` must have been returned by this pool's [`allocate()`][Self::allocate] and must
    /// not have been deallocated since. Double-freeing a slot or passing a foreign address
    /// corrupts the free list and is undefined behavior.
    pub unsafe fn deallocate(&mut self, slot: NonNull<u8>) {
        // Push onto the free-list head: LIFO, so this slot is the next one returned.
        // SAFETY: The caller guarantees the slot came from this pool and is no longer live,
        // so its leading word is free to hold the link.
        unsafe {
            slab::write_free_link(slot, self.free_head);
        }

        self.free_head = Some(slot);

        // Cannot wrap: the caller guarantees a matching allocate() preceded this call.
        self.length = self.length.wrapping_sub(1);
    }

    /// Maps an address to the slab backing it, walking the chain newest to oldest.
    ///
    /// Returns `None` for addresses this pool does not own. Cost is linear in the number of
    /// slabs; this is a diagnostics operation, not an allocation hot path.
    ///
    /// # Example
    ///
    /// ```
    /// use std::alloc::Layout;
    ///
    /// use slab_pool::SlabPool;
    ///
    /// let mut pool = SlabPool::builder()
    ///     .slot_layout(Layout::new::<u64>())
    ///     .build();
    ///
    /// let slot = pool.allocate();
    /// assert!(pool.locate_owner(slot).is_some());
    ///
    /// let unrelated = 0_u64;
    /// assert!(pool.locate_owner(std::ptr::NonNull::from(&unrelated).cast()).is_none());
    ///
    /// // SAFETY: slot was returned by this pool's allocate() and is not yet deallocated.
    /// unsafe { pool.deallocate(slot) };
    /// ```
    #[must_use]
    pub fn locate_owner(&self, ptr: NonNull<u8>) -> Option<SlabId> {
        self.slabs
            .iter()
            .rev()
            .find(|slab| slab.contains(ptr))
            .map(Slab::id)
    }

    /// Removes one named slab from the chain and releases its region.
    ///
    /// This is the manual counterpart to dropping the whole pool: emptiness never reclaims
    /// a slab automatically, but a caller that knows a slab has drained can hand its ID
    /// (obtained from [`locate_owner()`][Self::locate_owner]) back here. Every free-list
    /// node inside the removed slab is unlinked first, and removing the newest slab simply
    /// makes the previous one the chain head again.
    ///
    /// # Panics
    ///
    /// Panics if no slab with `id` is in this pool, or if the slab still has live slots -
    /// releasing memory out from under a live allocation is never acceptable.
    pub fn remove_slab(&mut self, id: SlabId) {
        let index = self
            .slabs
            .iter()
            .position(|slab| slab.id() == id)
            .unwrap_or_else(|| panic!("no slab with {id:?} in this pool"));

        #[expect(
            clippy::indexing_slicing,
            reason = "index was just produced by position() on the same Vec"
        )]
        let doomed = &self.slabs[index];

        // Unlink every free-list node inside the doomed slab. Counting the unlinked nodes
        // doubles as the liveness check: anything short of the full slot count means some
        // slot is still allocated.
        let mut unlinked = 0_usize;

        while let Some(head) = self.free_head {
            if !doomed.contains(head) {
                break;
            }

            // Cannot overflow: bounded by the pool's slot capacity.
            unlinked = unlinked.wrapping_add(1);

            // SAFETY: head is on the free list, so its leading word is a valid link.
            self.free_head = unsafe { slab::read_free_link(head) };
        }

        if let Some(mut prev) = self.free_head {
            // SAFETY: prev is on the free list, so its leading word is a valid link.
            let mut cursor = unsafe { slab::read_free_link(prev) };

            while let Some(slot) = cursor {
                // SAFETY: slot is on the free list, so its leading word is a valid link.
                let next = unsafe { slab::read_free_link(slot) };

                if doomed.contains(slot) {
                    // Cannot overflow: bounded by the pool's slot capacity.
                    unlinked = unlinked.wrapping_add(1);

                    // SAFETY: prev is a free slot we own; next is a link value read above.
                    unsafe {
                        slab::write_free_link(prev, next);
                    }
                } else {
                    prev = slot;
                }

                cursor = next;
            }
        }

        // Cannot wrap: a slab never has more free-list nodes than slots.
        let live = doomed.slot_count().get().wrapping_sub(unlinked);
        assert!(
            live == 0,
            "cannot remove slab {id:?} while it still has {live} live slots"
        );

        drop(self.slabs.remove(index));

        #[cfg(debug_assertions)]
        self.integrity_check();
    }

    /// Reserves a new slab, threads its slots onto the free list and links it in as the new
    /// chain head. Returns the new free-list head (the slab's first slot).
    #[must_use]
    fn grow(&mut self) -> NonNull<u8> {
        debug_assert!(
            self.free_head.is_none(),
            "growing while free slots remain would orphan the existing free list"
        );

        let mut new_slab = Slab::reserve(self.slot_layout, self.slots_per_slab);
        let first_slot = new_slab.thread_onto_free_list();

        self.slabs.push(new_slab);
        self.free_head = Some(first_slot);

        first_slot
    }

    /// Walks the free list and validates it against the slab chain.
    ///
    /// Only compiled in debug builds; allocation-path callers invoke it after every state
    /// change so corruption surfaces close to its cause.
    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(debug_assertions)]
    #[allow(
        clippy::arithmetic_side_effects,
        reason = "integrity check arithmetic is bounded by pool capacity"
    )]
    pub(crate) fn integrity_check(&self) {
        let mut observed = 0_usize;
        let mut cursor = self.free_head;

        while let Some(slot) = cursor {
            observed += 1;
            assert!(
                observed <= self.capacity(),
                "free list is longer than pool capacity - cycle suspected"
            );

            let owners = self.slabs.iter().filter(|slab| slab.contains(slot)).count();
            assert!(
                owners == 1,
                "free slot {slot:?} is contained in {owners} slabs instead of exactly one"
            );

            // SAFETY: slot is on the free list, so its leading word is a valid link.
            cursor = unsafe { slab::read_free_link(slot) };
        }

        assert!(
            observed == self.free_slots(),
            "free list enumerates {observed} slots but the pool accounts for {}",
            self.free_slots()
        );
    }
}

// Teardown: dropping the pool drops every Slab, each of which releases its own region.
// Slabs hold no pointers into each other's memory, so release order does not matter.

// SAFETY: SlabPool owns all the memory its pointers refer to and shares nothing
// thread-local. All mutation goes through &mut self.
unsafe impl Send for SlabPool {}

#[cfg(test)]
#[allow(
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
mod tests {
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(SlabPool: Send);
    assert_not_impl_any!(SlabPool: Sync);

    fn u64_pool(slots_per_slab: usize, growth_policy: GrowthPolicy) -> SlabPool {
        SlabPool::builder()
            .slot_layout(Layout::new::<u64>())
            .slots_per_slab(NonZero::new(slots_per_slab).unwrap())
            .growth_policy(growth_policy)
            .build()
    }

    #[test]
    fn smoke_test() {
        let mut pool = u64_pool(4, GrowthPolicy::Growable);

        assert_eq!(pool.len(), 0);
        assert!(pool.is_empty());

        let a = pool.allocate();
        let b = pool.allocate();

        assert_eq!(pool.len(), 2);
        assert_ne!(a, b);

        unsafe {
            pool.deallocate(a);
            pool.deallocate(b);
        }

        assert!(pool.is_empty());
        assert_eq!(pool.capacity(), 4);
    }

    #[test]
    fn growable_pool_reserves_first_slab_lazily() {
        let mut pool = u64_pool(4, GrowthPolicy::Growable);

        assert_eq!(pool.slab_count(), 0);
        assert_eq!(pool.capacity(), 0);

        _ = pool.allocate();

        assert_eq!(pool.slab_count(), 1);
        assert_eq!(pool.capacity(), 4);
    }

    #[test]
    fn fixed_pool_is_populated_at_construction() {
        let pool = u64_pool(4, GrowthPolicy::Fixed);

        assert_eq!(pool.slab_count(), 1);
        assert_eq!(pool.capacity(), 4);
        assert_eq!(pool.free_slots(), 4);
    }

    #[test]
    fn round_trip_restores_free_slot_count() {
        let mut pool = u64_pool(4, GrowthPolicy::Growable);

        // Materialize the first slab so the count is meaningful before the allocation.
        let warmup = pool.allocate();
        unsafe { pool.deallocate(warmup) };

        let free_before = pool.free_slots();

        let slot = pool.allocate();
        unsafe { pool.deallocate(slot) };

        assert_eq!(pool.free_slots(), free_before);
    }

    #[test]
    fn reuse_is_lifo() {
        let mut pool = u64_pool(4, GrowthPolicy::Growable);

        let a = pool.allocate();
        let _b = pool.allocate();

        unsafe { pool.deallocate(a) };

        // The most recently freed slot is the next one returned.
        assert_eq!(pool.allocate(), a);
    }

    #[test]
    fn growth_triggers_on_fifth_allocation() {
        let mut pool = u64_pool(4, GrowthPolicy::Growable);

        let first_four: Vec<_> = (0..4).map(|_| pool.allocate()).collect();
        assert_eq!(pool.slab_count(), 1);

        let original_slab = pool.locate_owner(first_four[0]).unwrap();

        // The fifth allocation transparently reserves a second slab.
        let fifth = pool.allocate();
        assert_eq!(pool.slab_count(), 2);

        let new_slab = pool.locate_owner(fifth).unwrap();
        assert_ne!(original_slab, new_slab);

        // Earlier allocations still resolve to the original slab.
        for slot in &first_four {
            assert_eq!(pool.locate_owner(*slot), Some(original_slab));
        }
    }

    #[test]
    fn fixed_pool_serves_its_whole_capacity() {
        let mut pool = u64_pool(4, GrowthPolicy::Fixed);

        for _ in 0..4 {
            _ = pool.allocate();
        }

        assert_eq!(pool.len(), 4);
        assert_eq!(pool.slab_count(), 1);
    }

    #[test]
    #[should_panic]
    fn fixed_pool_exhaustion_panics() {
        let mut pool = u64_pool(4, GrowthPolicy::Fixed);

        for _ in 0..4 {
            _ = pool.allocate();
        }

        // The fifth allocation must terminate rather than grow.
        _ = pool.allocate();
    }

    #[test]
    fn locate_owner_rejects_foreign_addresses() {
        let mut pool = u64_pool(4, GrowthPolicy::Growable);
        let mut other_pool = u64_pool(4, GrowthPolicy::Growable);

        let ours = pool.allocate();
        let theirs = other_pool.allocate();

        assert!(pool.locate_owner(ours).is_some());
        assert_eq!(pool.locate_owner(theirs), None);

        let stack_value = 42_u64;
        assert_eq!(
            pool.locate_owner(NonNull::from(&stack_value).cast()),
            None
        );
    }

    #[test]
    fn every_allocation_resolves_to_a_slab() {
        let mut pool = u64_pool(3, GrowthPolicy::Growable);

        let slots: Vec<_> = (0..10).map(|_| pool.allocate()).collect();

        for slot in slots {
            assert!(pool.locate_owner(slot).is_some());
        }
    }

    #[test]
    fn remove_slab_releases_the_newest_slab() {
        let mut pool = u64_pool(2, GrowthPolicy::Growable);

        // Two slabs: slots a, b in the first, c, d in the second.
        let a = pool.allocate();
        let b = pool.allocate();
        let c = pool.allocate();
        let d = pool.allocate();

        let old_slab = pool.locate_owner(a).unwrap();
        let new_slab = pool.locate_owner(c).unwrap();
        assert_ne!(old_slab, new_slab);

        unsafe {
            pool.deallocate(c);
            pool.deallocate(d);
        }

        // Removing the newest slab (the chain head) must leave the pool coherent.
        pool.remove_slab(new_slab);

        assert_eq!(pool.slab_count(), 1);
        assert_eq!(pool.capacity(), 2);
        assert_eq!(pool.locate_owner(a), Some(old_slab));

        // Further growth still works after the head was replaced.
        unsafe {
            pool.deallocate(a);
            pool.deallocate(b);
        }
        let e = pool.allocate();
        assert!(pool.locate_owner(e).is_some());
    }

    #[test]
    fn remove_slab_unlinks_interleaved_free_nodes() {
        let mut pool = u64_pool(2, GrowthPolicy::Growable);

        let a = pool.allocate();
        let b = pool.allocate();
        let c = pool.allocate();
        let d = pool.allocate();

        let old_slab = pool.locate_owner(a).unwrap();

        // Free in an order that interleaves the two slabs' nodes on the free list.
        unsafe {
            pool.deallocate(a);
            pool.deallocate(c);
            pool.deallocate(b);
            pool.deallocate(d);
        }

        pool.remove_slab(old_slab);

        assert_eq!(pool.slab_count(), 1);
        assert_eq!(pool.free_slots(), 2);

        // The survivors are exactly the second slab's slots.
        let x = pool.allocate();
        let y = pool.allocate();
        assert!([c, d].contains(&x));
        assert!([c, d].contains(&y));
        assert_ne!(x, y);
    }

    #[test]
    #[should_panic]
    fn remove_slab_with_live_slots_panics() {
        let mut pool = u64_pool(2, GrowthPolicy::Growable);

        let slot = pool.allocate();
        let id = pool.locate_owner(slot).unwrap();

        pool.remove_slab(id);
    }

    #[test]
    #[should_panic]
    fn remove_unknown_slab_panics() {
        let mut pool = u64_pool(2, GrowthPolicy::Growable);
        let mut other_pool = u64_pool(2, GrowthPolicy::Growable);

        let foreign_slot = other_pool.allocate();
        let foreign_id = other_pool.locate_owner(foreign_slot).unwrap();

        pool.remove_slab(foreign_id);
    }

    #[test]
    fn slots_honor_requested_alignment() {
        let mut pool = SlabPool::builder()
            .slot_layout(Layout::from_size_align(32, 64).unwrap())
            .slots_per_slab(nz!(8))
            .build();

        for _ in 0..8 {
            let slot = pool.allocate();
            assert_eq!(slot.addr().get() % 64, 0);
        }
    }

    #[test]
    fn slot_layout_is_padded_to_alignment() {
        let pool = SlabPool::builder()
            .slot_layout(Layout::from_size_align(33, 16).unwrap())
            .build();

        assert_eq!(pool.slot_layout().size(), 48);
    }

    #[test]
    #[should_panic]
    fn sub_word_slot_size_panics() {
        drop(
            SlabPool::builder()
                .slot_layout(Layout::from_size_align(2, 2).unwrap())
                .build(),
        );
    }

    #[test]
    fn byte_buffer_slots_work_without_natural_alignment() {
        // [u8; N] layouts have alignment 1; the free list copes via unaligned link words.
        let mut pool = SlabPool::builder()
            .slot_layout(Layout::new::<[u8; 24]>())
            .slots_per_slab(nz!(4))
            .build();

        let a = pool.allocate();
        let b = pool.allocate();
        assert_ne!(a, b);

        unsafe {
            pool.deallocate(b);
            pool.deallocate(a);
        }

        assert_eq!(pool.free_slots(), 4);
    }

    #[test]
    #[should_panic]
    fn zero_size_slot_layout_panics() {
        drop(
            SlabPool::builder()
                .slot_layout(Layout::from_size_align(0, 8).unwrap())
                .build(),
        );
    }

    #[test]
    fn dropping_a_full_pool_releases_everything() {
        let mut pool = u64_pool(2, GrowthPolicy::Growable);

        // Leave live slots behind on purpose; teardown releases slabs regardless. The slots
        // hold raw memory only, so nothing needs dropping beyond the regions themselves.
        _ = pool.allocate();
        _ = pool.allocate();
        _ = pool.allocate();

        drop(pool);
    }
}
