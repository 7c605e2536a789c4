use std::alloc::Layout;
use std::cell::Cell;
use std::marker::PhantomData;
use std::num::NonZero;

use crate::{GrowthPolicy, SlabPool, pool::DEFAULT_SLOTS_PER_SLAB};

/// Builder for creating a [`SlabPool`] with custom configuration.
///
/// Created via [`SlabPool::builder()`].
///
/// A slot layout is mandatory; everything else has a sensible default.
///
/// # Example
///
/// ```
/// use std::alloc::Layout;
///
/// use new_zealand::nz;
/// use slab_pool::{GrowthPolicy, SlabPool};
///
/// let pool = SlabPool::builder()
///     .slot_layout(Layout::new::<[u8; 128]>())
///     .slots_per_slab(nz!(32))
///     .growth_policy(GrowthPolicy::Fixed)
///     .build();
///
/// assert_eq!(pool.capacity(), 32);
/// ```
#[derive(Debug)]
#[must_use]
pub struct SlabPoolBuilder {
    slot_layout: Option<Layout>,
    slots_per_slab: NonZero<usize>,
    growth_policy: GrowthPolicy,

    /// The pool this builds is single-threaded in spirit but thread-mobile; the builder
    /// itself stays Send and !Sync.
    _not_sync: PhantomData<Cell<()>>,
}

impl SlabPoolBuilder {
    pub(crate) fn new() -> Self {
        Self {
            slot_layout: None,
            slots_per_slab: DEFAULT_SLOTS_PER_SLAB,
            growth_policy: GrowthPolicy::default(),
            _not_sync: PhantomData,
        }
    }

    /// Sets the layout each slot is reserved with.
    ///
    /// The layout is padded to its alignment at construction; sizes that are not multiples
    /// of the alignment simply get stride padding. The padded size must be at least one
    /// machine word (free slots carry their list link in-band), checked at `build()` time.
    pub fn slot_layout(mut self, layout: Layout) -> Self {
        self.slot_layout = Some(layout);
        self
    }

    /// Sets the slot layout to that of `T`.
    ///
    /// Shorthand for `.slot_layout(Layout::new::<T>())`.
    ///
    /// # Example
    ///
    /// ```
    /// use slab_pool::SlabPool;
    ///
    /// let pool = SlabPool::builder().slot_layout_of::<u64>().build();
    ///
    /// assert_eq!(pool.slot_layout().size(), size_of::<u64>());
    /// ```
    pub fn slot_layout_of<T>(self) -> Self {
        self.slot_layout(Layout::new::<T>())
    }

    /// Sets how many slots each reserved slab holds.
    ///
    /// Larger slabs amortize reservation cost over more allocations; smaller slabs keep a
    /// mostly-idle pool's footprint down.
    pub fn slots_per_slab(mut self, slots_per_slab: NonZero<usize>) -> Self {
        self.slots_per_slab = slots_per_slab;
        self
    }

    /// Sets what the pool does when an allocation finds the free list empty.
    pub fn growth_policy(mut self, growth_policy: GrowthPolicy) -> Self {
        self.growth_policy = growth_policy;
        self
    }

    /// Builds the [`SlabPool`] with the configured options.
    ///
    /// # Panics
    ///
    /// Panics if no slot layout was specified, or if the layout has zero size or pads to
    /// less than one machine word.
    #[must_use]
    pub fn build(self) -> SlabPool {
        let slot_layout = self
            .slot_layout
            .expect("a slot layout is required - call slot_layout() or slot_layout_of()");

        SlabPool::new_inner(slot_layout, self.slots_per_slab, self.growth_policy)
    }
}

#[cfg(test)]
mod tests {
    use new_zealand::nz;
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(SlabPoolBuilder: Send);
    assert_not_impl_any!(SlabPoolBuilder: Sync);

    #[test]
    fn defaults_apply() {
        let pool = SlabPool::builder().slot_layout_of::<u64>().build();

        assert_eq!(pool.slots_per_slab(), DEFAULT_SLOTS_PER_SLAB);
        assert_eq!(pool.growth_policy(), GrowthPolicy::Growable);
    }

    #[test]
    fn configured_values_apply() {
        let pool = SlabPool::builder()
            .slot_layout(Layout::new::<[u8; 64]>())
            .slots_per_slab(nz!(7))
            .growth_policy(GrowthPolicy::Fixed)
            .build();

        assert_eq!(pool.slots_per_slab(), nz!(7));
        assert_eq!(pool.growth_policy(), GrowthPolicy::Fixed);
        assert_eq!(pool.capacity(), 7);
    }

    #[test]
    #[should_panic]
    fn build_without_layout_panics() {
        drop(SlabPool::builder().build());
    }
}
