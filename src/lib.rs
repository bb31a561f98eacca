//! # shardalloc
//!
//! Sharded buddy-tree memory allocation for multi-threaded Rust workloads.
//!
//! ## Design
//!
//! - 64 independent arenas, each a mutex over an unordered list of 5-page slabs
//! - Every slab is carved into power-of-two blocks by an in-place buddy tree,
//!   with splitting on allocation and coalescing on free
//! - Threads steer toward uncontended arenas with bounded trylock probing and
//!   a sticky per-thread preference
//! - A single global page pool caches multi-page regions forever and services
//!   allocations too large for any slab
//!
//! Allocation never fails for contention or exhaustion of the pool; the only
//! fatal condition is the OS refusing to back a fresh mapping.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shardalloc::ShardAlloc;
//!
//! let alloc = ShardAlloc::new();
//!
//! let p = alloc.allocate(256);
//! // ... use up to 256 bytes at p ...
//! unsafe { alloc.free(p) };
//! ```

// Internal modules (not directly exported)
mod allocators;
mod core;
mod sync;
#[allow(dead_code)]
mod util;

pub mod api;

pub use api::alloc::ShardAlloc;
pub use api::stats::PoolStats;
