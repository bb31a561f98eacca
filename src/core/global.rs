//! Process-wide allocator state.

use crate::allocators::buddy::Arena;
use crate::allocators::pool::PagePool;
use crate::allocators::NUM_ARENAS;
use crate::api::stats::PoolStats;

/// State shared by every handle to one allocator: the arenas and the
/// global page pool.
///
/// Wrapped in an `Arc` by `ShardAlloc` for thread-safe sharing.
pub struct Heap {
    arenas: [Arena; NUM_ARENAS],
    pool: PagePool,
}

impl Heap {
    /// Create a heap with empty arenas and an empty pool.
    pub fn new() -> Self {
        Self {
            arenas: std::array::from_fn(|_| Arena::new()),
            pool: PagePool::new(),
        }
    }

    /// The arena array.
    pub fn arenas(&self) -> &[Arena; NUM_ARENAS] {
        &self.arenas
    }

    /// The global page pool.
    pub fn pool(&self) -> &PagePool {
        &self.pool
    }

    /// Snapshot the pool's diagnostic counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            slab_requests: self.pool.slab_requests(),
            large_requests: self.pool.large_requests(),
            regions_freed: self.pool.regions_freed(),
        }
    }
}
