//! A single-size-class memory pool serving fixed-size slots from slab-backed intrusive
//! free lists.
//!
//! This crate provides [`SlabPool`], a pool that reserves large aligned regions ("slabs")
//! from the system allocator, carves each into equally sized slots, and hands slots out
//! one at a time. Unused slots form an intrusive free list overlaid on the slot memory
//! itself, so the steady-state allocate/deallocate paths are a pointer swap each.
//!
//! # Key Features
//!
//! - **Raw memory only**: the pool deals in addresses, never in values - callers place
//!   and drop their own data
//! - **Intrusive free list**: zero external bookkeeping per slot; free slots store the
//!   list link in their own leading word
//! - **LIFO reuse**: the most recently freed slot is the next one returned
//! - **Configurable growth**: pools either grow slab by slab on demand or hold a fixed
//!   one-slab budget that panics on exhaustion
//! - **Ownership diagnostics**: any address can be mapped back to the [`SlabId`] of the
//!   slab backing it, and drained slabs can be removed individually
//! - **Thread mobility**: a pool can move between threads but has no internal locking
//!
//! Callers that need more than one allocation size should layer size-class dispatch on
//! top; the `segregated_pool` crate in this workspace does exactly that.
//!
//! # Example
//!
//! ```rust
//! use std::alloc::Layout;
//!
//! use new_zealand::nz;
//! use slab_pool::SlabPool;
//!
//! // One pool, one slot size, chosen at construction.
//! let mut pool = SlabPool::builder()
//!     .slot_layout(Layout::new::<[u64; 4]>())
//!     .slots_per_slab(nz!(64))
//!     .build();
//!
//! let slot = pool.allocate();
//!
//! // The slot is raw memory; write whatever fits the layout.
//! // SAFETY: The slot is ours, properly sized and aligned for [u64; 4].
//! unsafe { slot.cast::<[u64; 4]>().write([1, 2, 3, 4]) };
//!
//! // SAFETY: slot came from this pool's allocate() and is not yet deallocated.
//! unsafe { pool.deallocate(slot) };
//! ```

mod builder;
mod growth;
mod pool;
mod slab;

pub use builder::*;
pub use growth::*;
pub use pool::SlabPool;
pub use slab::SlabId;
