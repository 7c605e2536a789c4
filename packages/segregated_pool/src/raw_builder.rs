use std::alloc::Layout;
use std::cell::Cell;
use std::marker::PhantomData;
use std::num::NonZero;

use slab_pool::GrowthPolicy;

use crate::ladder::DEFAULT_CAPACITIES;
use crate::raw::{DEFAULT_ALIGNMENT, DEFAULT_TARGET_SLAB_BYTES};
use crate::RawSegregatedPool;

/// Builder for creating a [`RawSegregatedPool`] with custom configuration.
///
/// Created via [`RawSegregatedPool::builder()`].
///
/// An element layout is mandatory; everything else has a sensible default: a minimum
/// alignment of one cache line, 64 KiB slab targets, growable pools and the
/// [default capacity ladder][DEFAULT_CAPACITIES].
///
/// # Example
///
/// ```
/// use new_zealand::nz;
/// use segregated_pool::RawSegregatedPool;
/// use slab_pool::GrowthPolicy;
///
/// let pool = RawSegregatedPool::builder()
///     .layout_of::<u32>()
///     .alignment(4096)
///     .target_slab_bytes(nz!(1_048_576))
///     .growth_policy(GrowthPolicy::Growable)
///     .build();
///
/// assert_eq!(pool.alignment(), 4096);
/// ```
#[derive(Debug)]
#[must_use]
pub struct RawSegregatedPoolBuilder {
    element_layout: Option<Layout>,
    min_alignment: usize,
    target_slab_bytes: NonZero<usize>,
    growth_policy: GrowthPolicy,
    capacities: Vec<usize>,

    /// Builders stay thread-mobile but not thread-safe, matching the pools they build.
    _not_sync: PhantomData<Cell<()>>,
}

impl RawSegregatedPoolBuilder {
    pub(crate) fn new() -> Self {
        Self {
            element_layout: None,
            min_alignment: DEFAULT_ALIGNMENT,
            target_slab_bytes: DEFAULT_TARGET_SLAB_BYTES,
            growth_policy: GrowthPolicy::default(),
            capacities: DEFAULT_CAPACITIES.to_vec(),
            _not_sync: PhantomData,
        }
    }

    /// Sets the layout of one element.
    ///
    /// Regions hold whole numbers of elements at array stride, so only the padded size and
    /// alignment of the layout matter.
    pub fn layout(mut self, layout: Layout) -> Self {
        self.element_layout = Some(layout);
        self
    }

    /// Sets the element layout to that of `T`.
    ///
    /// Shorthand for `.layout(Layout::new::<T>())`.
    pub fn layout_of<T>(self) -> Self {
        self.layout(Layout::new::<T>())
    }

    /// Sets the minimum alignment of returned regions.
    ///
    /// The effective alignment is the larger of this and the element alignment. Must be a
    /// power of two, checked at `build()` time.
    pub fn alignment(mut self, min_alignment: usize) -> Self {
        self.min_alignment = min_alignment;
        self
    }

    /// Sets the approximate byte size each size class aims at when reserving a slab.
    ///
    /// Classes whose single slot exceeds this target degrade to one slot per slab.
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
    /// at `build()` time. Requests above the largest capacity panic at allocation time.
    pub fn capacities(mut self, capacities: &[usize]) -> Self {
        self.capacities = capacities.to_vec();
        self
    }

    /// Builds the [`RawSegregatedPool`] with the configured options.
    ///
    /// # Panics
    ///
    /// Panics if no element layout was specified, if the layout has zero size, if the
    /// minimum alignment is not a power of two, or if the capacity ladder is empty, not
    /// strictly ascending, or contains a zero.
    #[must_use]
    pub fn build(self) -> RawSegregatedPool {
        let element_layout = self
            .element_layout
            .expect("an element layout is required - call layout() or layout_of()");

        RawSegregatedPool::new_inner(
            element_layout,
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

    assert_impl_all!(RawSegregatedPoolBuilder: Send);
    assert_not_impl_any!(RawSegregatedPoolBuilder: Sync);

    #[test]
    fn defaults_apply() {
        let pool = RawSegregatedPool::builder().layout_of::<u64>().build();

        assert_eq!(pool.alignment(), DEFAULT_ALIGNMENT);
        assert_eq!(pool.target_slab_bytes(), DEFAULT_TARGET_SLAB_BYTES);
        assert_eq!(pool.growth_policy(), GrowthPolicy::Growable);
        assert_eq!(pool.class_count(), DEFAULT_CAPACITIES.len());
        assert_eq!(pool.max_element_count(), 33_554_432);
    }

    #[test]
    fn configured_values_apply() {
        let pool = RawSegregatedPool::builder()
            .layout_of::<u32>()
            .alignment(256)
            .target_slab_bytes(nz!(4096))
            .growth_policy(GrowthPolicy::Fixed)
            .capacities(&[8, 64])
            .build();

        assert_eq!(pool.alignment(), 256);
        assert_eq!(pool.target_slab_bytes(), nz!(4096));
        assert_eq!(pool.growth_policy(), GrowthPolicy::Fixed);
        assert_eq!(pool.class_count(), 2);
    }

    #[test]
    #[should_panic]
    fn build_without_layout_panics() {
        drop(RawSegregatedPool::builder().build());
    }

    #[test]
    #[should_panic]
    fn non_power_of_two_alignment_panics() {
        drop(
            RawSegregatedPool::builder()
                .layout_of::<u64>()
                .alignment(48)
                .build(),
        );
    }
}
