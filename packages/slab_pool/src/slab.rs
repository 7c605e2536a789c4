use std::alloc::{Layout, alloc, dealloc};
use std::num::NonZero;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for generating unique slab IDs.
static SLAB_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generates a unique slab ID.
fn generate_slab_id() -> SlabId {
    SlabId(SLAB_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Identifies one slab owned by a [`SlabPool`][crate::SlabPool], unique within the process.
///
/// Returned by [`SlabPool::locate_owner()`][crate::SlabPool::locate_owner] and consumed by
/// [`SlabPool::remove_slab()`][crate::SlabPool::remove_slab]. The ID stays valid for as long
/// as the slab remains in its pool; it is never reused, so a stale ID simply stops matching.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SlabId(u64);

/// One contiguously reserved, aligned memory region holding a fixed number of equal-size slots.
///
/// The region starts with a small in-band header (one alignment quantum, carrying the slab ID)
/// so that no slot address ever equals the region's base address. Slots follow the header
/// back to back at `slot_stride` intervals.
///
/// # Out of band access
///
/// The slab never creates or keeps references to slot memory. All slot access happens through
/// raw pointers, so callers may freely hand out slot addresses to code the slab knows nothing
/// about. The only words the slab itself ever touches are the leading words of slots that the
/// owning pool has declared free.
#[derive(Debug)]
pub(crate) struct Slab {
    /// Process-unique identity of this slab, used for ownership diagnostics.
    id: SlabId,

    /// Base pointer of the reserved region. The in-band header lives here; the first slot
    /// starts `header_size` bytes in.
    region: NonNull<u8>,

    /// Layout the region was reserved with, required again at release time.
    region_layout: Layout,

    /// Byte offset from the region base to the first slot. Always a multiple of the slot
    /// alignment so every slot stays aligned.
    header_size: usize,

    /// Distance in bytes between consecutive slot start addresses.
    slot_stride: usize,

    /// Number of slots in this slab.
    slot_count: NonZero<usize>,
}

/// Writes the free-list link stored in the leading word of a free slot.
///
/// The link is stored as a raw pointer so that provenance survives the round-trip through
/// slot memory; a null pointer is the list terminator.
///
/// # Safety
///
/// `slot` must be the start address of a slot that is not live (no caller data in it), and the
/// slot must be at least pointer-sized. The owning pool guarantees both. Slots are not
/// necessarily pointer-aligned, so the link is written unaligned.
pub(crate) unsafe fn write_free_link(slot: NonNull<u8>, next: Option<NonNull<u8>>) {
    let raw = next.map_or(std::ptr::null_mut(), NonNull::as_ptr);

    // SAFETY: The caller guarantees the slot is free and at least pointer-sized, so its
    // leading word is ours to use as the link field.
    unsafe {
        slot.cast::<*mut u8>().write_unaligned(raw);
    }
}

/// Reads the free-list link stored in the leading word of a free slot.
///
/// # Safety
///
/// `slot` must be the start address of a free slot whose leading word was previously written
/// by [`write_free_link`].
pub(crate) unsafe fn read_free_link(slot: NonNull<u8>) -> Option<NonNull<u8>> {
    // SAFETY: The caller guarantees the leading word holds a link written by
    // `write_free_link`, so it is a valid (possibly null) pointer value.
    let raw = unsafe { slot.cast::<*mut u8>().read_unaligned() };

    NonNull::new(raw)
}

impl Slab {
    /// Reserves one aligned region from the system allocator, sized to hold the header plus
    /// `slot_count` slots of `slot_layout` each.
    ///
    /// `slot_layout` must already be padded to its alignment; the pool does this once at
    /// construction so every slab of the pool shares the same stride.
    ///
    /// # Panics
    ///
    /// Panics if the system allocator cannot satisfy the reservation - running out of backing
    /// memory is not a condition we recover from or retry.
    #[must_use]
    pub(crate) fn reserve(slot_layout: Layout, slot_count: NonZero<usize>) -> Self {
        debug_assert_eq!(
            slot_layout.size() % slot_layout.align(),
            0,
            "slot layout must be padded to its alignment"
        );

        let slot_stride = slot_layout.size();

        // One alignment quantum, widened to hold the slab ID. A multiple of the slot
        // alignment either way, so the first slot lands aligned.
        let header_size = size_of::<u64>().max(slot_layout.align());

        let slots_size = slot_stride
            .checked_mul(slot_count.get())
            .expect("total slot size calculation cannot overflow for reasonable slot counts");

        let total_size = header_size
            .checked_add(slots_size)
            .expect("region size calculation cannot overflow for reasonable slot counts");

        let region_layout = Layout::from_size_align(total_size, slot_layout.align())
            .expect("region layout calculation cannot fail for valid slot layouts");

        // SAFETY: region_layout has non-zero size because slot_layout has non-zero size and
        // slot_count is non-zero.
        let region = NonNull::new(unsafe { alloc(region_layout) }).expect(
            "we do not intend to handle allocation failure as a real possibility - OOM results in panic",
        );

        let id = generate_slab_id();

        // Stamp the slab ID into the header for post-mortem diagnostics. Unaligned write
        // because the region alignment may be below that of u64 on some targets.
        // SAFETY: The header is at least size_of::<u64>() bytes and we own the fresh region.
        unsafe {
            region.cast::<u64>().write_unaligned(id.0);
        }

        Self {
            id,
            region,
            region_layout,
            header_size,
            slot_stride,
            slot_count,
        }
    }

    /// Returns the process-unique identity of this slab.
    #[must_use]
    pub(crate) fn id(&self) -> SlabId {
        self.id
    }

    #[must_use]
    pub(crate) fn slot_count(&self) -> NonZero<usize> {
        self.slot_count
    }

    /// Whether `ptr` falls within this slab's region.
    ///
    /// Strict inequality at both ends: the base address itself is the header, never a slot,
    /// and the one-past-the-end address belongs to whatever neighbors the region.
    #[must_use]
    pub(crate) fn contains(&self, ptr: NonNull<u8>) -> bool {
        let base = self.region.addr().get();
        let addr = ptr.addr().get();

        // Cannot overflow: the region was successfully reserved, so it fits in memory.
        let end = base.wrapping_add(self.region_layout.size());

        base < addr && addr < end
    }

    /// Returns the start address of the slot at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    fn slot_ptr(&self, index: usize) -> NonNull<u8> {
        assert!(
            index < self.slot_count.get(),
            "slot index {index} out of bounds in slab of {} slots",
            self.slot_count.get()
        );

        // Guarded by the bounds check above; cannot overflow because the region fits in memory.
        let offset = self
            .header_size
            .wrapping_add(index.wrapping_mul(self.slot_stride));

        // SAFETY: offset stays within the reserved region per the bounds check above.
        unsafe { self.region.byte_add(offset) }
    }

    /// Walks the slots of a freshly reserved slab in order, writing each slot's leading word
    /// to point at the next slot, with the last slot's word set to null. Returns the first
    /// slot's address, which becomes the pool's new free-list head.
    ///
    /// This costs time linear in the slot count - an accepted trade-off that keeps the slab
    /// free of any per-slot bookkeeping outside the slots themselves.
    #[must_use]
    pub(crate) fn thread_onto_free_list(&mut self) -> NonNull<u8> {
        for index in 0..self.slot_count.get() {
            let slot = self.slot_ptr(index);

            // Cannot overflow: index is bounded by the slot count.
            let next_index = index.wrapping_add(1);

            let next = if next_index < self.slot_count.get() {
                Some(self.slot_ptr(next_index))
            } else {
                None
            };

            // SAFETY: The slab is freshly reserved, so every slot is free; slots are at
            // least pointer-sized per the pool's construction checks.
            unsafe {
                write_free_link(slot, next);
            }
        }

        self.slot_ptr(0)
    }
}

impl Drop for Slab {
    fn drop(&mut self) {
        // SAFETY: We reserved the region with region_layout in reserve() and release it
        // exactly once with the same layout.
        unsafe {
            dealloc(self.region.as_ptr(), self.region_layout);
        }
    }
}

// SAFETY: Slab contains raw pointers but uses them purely to manage its own reserved region.
// It shares no thread-local state and all mutation goes through &mut self.
unsafe impl Send for Slab {}

#[cfg(test)]
#[allow(
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    reason = "test code doesn't need the same safety rigor as production code"
)]
mod tests {
    use std::collections::HashSet;

    use new_zealand::nz;

    use super::*;

    fn word_slots() -> Layout {
        Layout::from_size_align(size_of::<usize>(), align_of::<usize>())
            .unwrap()
            .pad_to_align()
    }

    #[test]
    fn contains_is_strict_at_both_ends() {
        let slab = Slab::reserve(word_slots(), nz!(4));

        let base = slab.region;
        assert!(!slab.contains(base));

        let first_slot = slab.slot_ptr(0);
        assert!(slab.contains(first_slot));

        let last_slot = slab.slot_ptr(3);
        assert!(slab.contains(last_slot));

        let end = unsafe { base.byte_add(slab.region_layout.size()) };
        assert!(!slab.contains(end));
    }

    #[test]
    fn threading_links_every_slot_in_order() {
        let mut slab = Slab::reserve(word_slots(), nz!(4));

        let head = slab.thread_onto_free_list();
        assert_eq!(head, slab.slot_ptr(0));

        let mut cursor = Some(head);
        let mut visited = Vec::new();

        while let Some(slot) = cursor {
            visited.push(slot);
            cursor = unsafe { read_free_link(slot) };
        }

        let expected: Vec<_> = (0..4).map(|index| slab.slot_ptr(index)).collect();
        assert_eq!(visited, expected);
    }

    #[test]
    fn slot_addresses_respect_stride_and_alignment() {
        let slot_layout = Layout::from_size_align(48, 16).unwrap().pad_to_align();
        let slab = Slab::reserve(slot_layout, nz!(3));

        for index in 0..3 {
            let slot = slab.slot_ptr(index);
            assert_eq!(slot.addr().get() % 16, 0);
        }

        let gap = slab.slot_ptr(1).addr().get() - slab.slot_ptr(0).addr().get();
        assert_eq!(gap, 48);
    }

    #[test]
    fn ids_are_unique() {
        let slabs: Vec<_> = (0..8).map(|_| Slab::reserve(word_slots(), nz!(1))).collect();

        let ids: HashSet<_> = slabs.iter().map(Slab::id).collect();
        assert_eq!(ids.len(), slabs.len());
    }

    #[test]
    #[should_panic]
    fn slot_index_out_of_bounds_panics() {
        let slab = Slab::reserve(word_slots(), nz!(2));
        _ = slab.slot_ptr(2);
    }
}
