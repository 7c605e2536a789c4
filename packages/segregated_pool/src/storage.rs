/// Determines where a typed pool's backing storage lives.
///
/// Pool behavior is identical either way; the strategy only decides which pool instance a
/// new handle attaches to.
///
/// # Examples
///
/// ```
/// use segregated_pool::{SegregatedPool, StorageStrategy};
///
/// // Two shared handles of the same element type and configuration use one pool.
/// let first: SegregatedPool<u64> = SegregatedPool::builder()
///     .storage(StorageStrategy::Shared)
///     .build();
/// let second: SegregatedPool<u64> = SegregatedPool::builder()
///     .storage(StorageStrategy::Shared)
///     .build();
///
/// let region = first.allocate(10);
/// assert_eq!(second.len(), 1);
///
/// // SAFETY: region came from the shared pool's allocate(10) and is not yet deallocated.
/// unsafe { first.deallocate(region, 10) };
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum StorageStrategy {
    /// Every built pool value owns an independent set of class pools. This is the default.
    ///
    /// The storage is released when the last cloned handle is dropped.
    #[default]
    PerInstance,

    /// All pool values of one element type and configuration on the same thread attach to
    /// a single set of class pools, looked up in a thread-local registry.
    ///
    /// The registry keeps the storage alive for the remainder of the thread, so drained
    /// slabs of a shared pool are reused by later handles rather than released.
    Shared,
}
