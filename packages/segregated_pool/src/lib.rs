//! A segregated-size memory pool: slab-backed size classes with requests routed to the
//! smallest class that fits.
//!
//! This crate layers size-class dispatch on top of the single-size-class pools from the
//! `slab_pool` crate. A pool is configured with an element layout and a ladder of element
//! capacities (by default 22 classes doubling from 16 to 33,554,432 elements); each class
//! is backed by its own slab pool and requests for `count` elements route to the smallest
//! class whose capacity covers the count.
//!
//! # Key Features
//!
//! - **Bounded internal fragmentation**: requests round up to the next class capacity,
//!   never further
//! - **Cache-line alignment by default**: returned regions honor a configurable minimum
//!   alignment, 64 bytes unless overridden
//! - **Raw memory only**: the pools deal in addresses; callers place and drop their own
//!   values
//! - **Two surfaces**: [`RawSegregatedPool`] is the layout-driven `&mut self` core;
//!   [`SegregatedPool<T>`] is a typed, cloneable single-threaded handle over it
//! - **Storage strategies**: typed handles either own their storage or attach to a
//!   per-thread shared one, selected per [`StorageStrategy`]
//!
//! # Example
//!
//! ```rust
//! use segregated_pool::SegregatedPool;
//!
//! let pool: SegregatedPool<u64> = SegregatedPool::new();
//!
//! // Asking for 100 elements lands in the 128-element class.
//! let region = pool.allocate(100);
//! assert_eq!(pool.class_capacity(100), 128);
//!
//! // SAFETY: region came from this pool's allocate(100) and is not yet deallocated.
//! unsafe { pool.deallocate(region, 100) };
//! ```

mod ladder;
mod local;
mod local_builder;
mod raw;
mod raw_builder;
mod storage;

pub use ladder::DEFAULT_CAPACITIES;
pub use local::*;
pub use local_builder::SegregatedPoolBuilder;
pub use raw::*;
pub use raw_builder::*;
pub use storage::*;
