/// Determines what a pool does when an allocation finds the free list empty.
///
/// By default, pools grow by reserving another slab.
///
/// # Examples
///
/// ```
/// use std::alloc::Layout;
///
/// use new_zealand::nz;
/// use slab_pool::{GrowthPolicy, SlabPool};
///
/// // The growth policy is set at pool creation time.
/// let pool = SlabPool::builder()
///     .slot_layout(Layout::new::<u64>())
///     .slots_per_slab(nz!(4))
///     .growth_policy(GrowthPolicy::Fixed)
///     .build();
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum GrowthPolicy {
    /// The pool transparently reserves a new slab whenever the free list runs dry.
    /// This is the default. The first slab is reserved lazily, on the first allocation.
    #[default]
    Growable,

    /// The pool reserves exactly one slab at construction time and never grows.
    ///
    /// Exhausting a fixed pool is fatal: the caller has over-subscribed a deliberately
    /// bounded pool, and the allocation call panics rather than degrade into hidden growth.
    Fixed,
}
