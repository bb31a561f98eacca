//! The main allocator type.

use std::sync::Arc;

use crate::allocators::block::{self, BlockHeader, HEADER_SIZE};
use crate::allocators::buddy;
use crate::allocators::{MAX_REGION_PAGES, SLAB_ROOT_CLASS};
use crate::api::stats::PoolStats;
use crate::core::global::Heap;
use crate::core::tls;
use crate::util::size::pages_for;

/// The main sharded allocator.
///
/// Cheap to clone (internally an `Arc`) and thread-safe. Small requests are
/// served from per-arena buddy trees; requests too large for a slab go
/// straight to the global page pool, bypassing the arena locks.
///
/// # Example
///
/// ```rust,no_run
/// use shardalloc::ShardAlloc;
///
/// let alloc = ShardAlloc::new();
/// let p = alloc.allocate(64);
/// unsafe { alloc.free(p) };
/// ```
#[derive(Clone)]
pub struct ShardAlloc {
    heap: Arc<Heap>,
}

impl ShardAlloc {
    /// Create an allocator with its own arenas and page pool.
    pub fn new() -> Self {
        Self {
            heap: Arc::new(Heap::new()),
        }
    }

    /// Allocate at least `size` bytes.
    ///
    /// The returned pointer is 16-byte aligned and valid until passed to
    /// [`free`](Self::free). Allocation never fails for contention; it
    /// aborts only if the OS refuses to back a fresh mapping.
    pub fn allocate(&self, size: usize) -> *mut u8 {
        let class = block::class_for(size);
        if class > SLAB_ROOT_CLASS {
            return self.allocate_large(size);
        }

        let (index, mut guard) = tls::lock_arena(self.heap.arenas());
        // SAFETY: we hold arena `index`'s lock until the guard drops.
        unsafe {
            let found = buddy::get(&mut guard, index as u8, class, self.heap.pool());
            drop(guard);
            BlockHeader::payload(found)
        }
    }

    /// Service a request too large for any slab straight from the pool.
    fn allocate_large(&self, size: usize) -> *mut u8 {
        let pages = pages_for(size + HEADER_SIZE);
        assert!(
            pages <= MAX_REGION_PAGES,
            "allocation of {} bytes needs {} pages, past the representable {}",
            size,
            pages,
            MAX_REGION_PAGES,
        );

        let (base, actual_pages) = self.heap.pool().request_large(pages);

        #[cfg(feature = "log")]
        log::trace!("large region of {} pages at {:p}", actual_pages, base);

        // SAFETY: the region is exclusively ours and spans `actual_pages`
        // writable pages.
        unsafe {
            let header = base as *mut BlockHeader;
            (*header).bsize = -(actual_pages as i8);
            (*header).bucket = tls::preferred() as u8;
            (*header).used = true;
            (*header).left = true;
            (*header).offset = 0;
            BlockHeader::payload(header)
        }
    }

    /// Release a block previously returned by [`allocate`](Self::allocate).
    ///
    /// A buddy block goes back to the arena recorded in its header; a large
    /// region goes straight back to the pool.
    ///
    /// # Safety
    /// `ptr` must have come from `allocate` on this allocator and must not
    /// have been freed already. Passing null aborts.
    pub unsafe fn free(&self, ptr: *mut u8) {
        assert!(!ptr.is_null(), "free of a null pointer");

        let header = BlockHeader::from_payload(ptr);
        let bsize = (*header).bsize;
        if bsize < 0 {
            self.heap
                .pool()
                .return_region(header as *mut u8, bsize.unsigned_abs() as usize);
            return;
        }

        let bucket = (*header).bucket as usize;
        let mut guard = self.heap.arenas()[bucket].lock();
        buddy::put(&mut guard, header, self.heap.pool());
    }

    /// Allocate memory for a value of type `T`.
    ///
    /// Only types whose alignment fits the block alignment are supported.
    pub fn alloc_typed<T>(&self) -> *mut T {
        debug_assert!(std::mem::align_of::<T>() <= 16);
        self.allocate(std::mem::size_of::<T>()) as *mut T
    }

    /// Release a pointer from [`alloc_typed`](Self::alloc_typed).
    ///
    /// # Safety
    /// Same contract as [`free`](Self::free).
    pub unsafe fn free_typed<T>(&self, ptr: *mut T) {
        self.free(ptr as *mut u8);
    }

    /// Snapshot the page pool's counters.
    pub fn stats(&self) -> PoolStats {
        self.heap.stats()
    }
}

impl Default for ShardAlloc {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_block_aligned() {
        let alloc = ShardAlloc::new();
        for size in [0, 1, 16, 100, 4096, 100_000] {
            let p = alloc.allocate(size);
            assert_eq!(p as usize % 16, 0);
            unsafe { alloc.free(p) };
        }
    }

    #[test]
    fn typed_round_trip() {
        let alloc = ShardAlloc::new();
        let p = alloc.alloc_typed::<u64>();
        unsafe {
            *p = 0xDEAD_BEEF;
            assert_eq!(*p, 0xDEAD_BEEF);
            alloc.free_typed(p);
        }
    }

    #[test]
    #[should_panic(expected = "free of a null pointer")]
    fn null_free_panics() {
        let alloc = ShardAlloc::new();
        unsafe { alloc.free(std::ptr::null_mut()) };
    }

    #[test]
    #[should_panic(expected = "past the representable")]
    fn oversized_request_panics() {
        let alloc = ShardAlloc::new();
        let _ = alloc.allocate(128 * 4096);
    }
}
