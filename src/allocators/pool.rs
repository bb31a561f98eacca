//! The global page pool.
//!
//! A single process-wide free list of multi-page regions. Arenas draw their
//! slabs from here, and allocations too large for any slab are serviced here
//! directly. Regions are recycled forever; the pool never unmaps.
//!
//! Lock ordering: the pool mutex may be taken with no lock held or with
//! exactly one arena lock held, never the other way around.

use std::ptr;

use crate::allocators::buddy::Slab;
use crate::allocators::source;
use crate::allocators::{PAGE_SIZE, SLAB_PAGES};
use crate::sync::atomics::AtomicCounter;
use crate::sync::mutex::Mutex;

/// Free-region header, overlaid on the first bytes of a pooled region.
#[repr(C)]
struct FreeRegion {
    next: *mut FreeRegion,
    prev: *mut FreeRegion,
    pages: usize,
}

/// Head of the pool's doubly-linked region list.
struct FreeList {
    head: *mut FreeRegion,
}

// SAFETY: the raw region pointers are only dereferenced while the pool
// mutex is held.
unsafe impl Send for FreeList {}

/// Process-wide cache of released multi-page regions.
pub struct PagePool {
    list: Mutex<FreeList>,
    slab_requests: AtomicCounter,
    large_requests: AtomicCounter,
    regions_freed: AtomicCounter,
}

impl PagePool {
    /// Create an empty pool.
    pub const fn new() -> Self {
        Self {
            list: Mutex::new(FreeList {
                head: ptr::null_mut(),
            }),
            slab_requests: AtomicCounter::new(),
            large_requests: AtomicCounter::new(),
            regions_freed: AtomicCounter::new(),
        }
    }

    /// Produce a fresh slab: a [`SLAB_PAGES`]-page region with null links
    /// and a free root block spanning the whole tree.
    pub fn request_slab(&self) -> *mut Slab {
        let region = {
            let mut list = self.list.lock();
            // SAFETY: list links are valid while the pool lock is held.
            unsafe { take_region(&mut list, SLAB_PAGES, true) }
        };
        let base = match region {
            Some(region) => region as *mut u8,
            None => source::map_pages(SLAB_PAGES),
        };
        self.slab_requests.increment();

        #[cfg(feature = "log")]
        log::trace!("slab prepared at {:p}", base);

        // Initializing after the unlock is fine: the region is exclusively
        // owned by this caller from here on.
        // SAFETY: `base` spans SLAB_PAGES writable pages.
        unsafe {
            let slab = base as *mut Slab;
            Slab::init(slab);
            slab
        }
    }

    /// Produce a region of at least `pages` contiguous pages.
    ///
    /// Returns the region base and its true page count, which can exceed
    /// the request when a pooled region carries a little slack.
    pub fn request_large(&self, pages: usize) -> (*mut u8, usize) {
        let found = {
            let mut list = self.list.lock();
            // SAFETY: list links are valid while the pool lock is held.
            unsafe { take_region(&mut list, pages, false) }
        };
        self.large_requests.increment();

        match found {
            // SAFETY: the region is unlinked and ours; its header still
            // records the handed-out page count.
            Some(region) => unsafe { (region as *mut u8, (*region).pages) },
            None => (source::map_pages(pages), pages),
        }
    }

    /// Return a region of `pages` pages to the pool.
    pub fn return_region(&self, base: *mut u8, pages: usize) {
        debug_assert!(pages >= SLAB_PAGES);

        let mut list = self.list.lock();
        // SAFETY: the caller hands over exclusive ownership of the region;
        // list links are valid while the pool lock is held.
        unsafe {
            let region = base as *mut FreeRegion;
            (*region).pages = pages;
            (*region).prev = ptr::null_mut();
            (*region).next = list.head;
            if !list.head.is_null() {
                (*list.head).prev = region;
            }
            list.head = region;
        }
        drop(list);
        self.regions_freed.increment();

        #[cfg(feature = "log")]
        log::trace!("region of {} pages returned at {:p}", pages, base);
    }

    /// Slabs handed to arenas since startup.
    pub fn slab_requests(&self) -> u64 {
        self.slab_requests.get()
    }

    /// Large regions handed out past the arenas.
    pub fn large_requests(&self) -> u64 {
        self.large_requests.get()
    }

    /// Regions returned to the pool, slabs and large regions alike.
    pub fn regions_freed(&self) -> u64 {
        self.regions_freed.get()
    }
}

/// Unlink and return the first region that can service `want` pages.
///
/// A larger region is shaved down to `want` when the remainder still holds
/// at least a slab's worth of pages; the list never carries smaller crumbs.
/// With `exact` set, a region whose slack cannot be shaved is skipped.
/// Without it, such a region is handed out whole with its true page count
/// left in the header.
unsafe fn take_region(list: &mut FreeList, want: usize, exact: bool) -> Option<*mut FreeRegion> {
    let mut cur = list.head;
    while !cur.is_null() {
        debug_assert!((*cur).pages >= SLAB_PAGES);
        let pages = (*cur).pages;

        if pages == want || pages >= want + SLAB_PAGES {
            if pages > want {
                shave(cur, want);
            }
            unlink(list, cur);
            return Some(cur);
        }
        if !exact && pages > want {
            // Slack too small to shave; hand the whole region out.
            unlink(list, cur);
            return Some(cur);
        }

        cur = (*cur).next;
    }
    None
}

/// Split the leading `pages` pages off `region`, leaving the remainder in
/// place as a smaller region at the next list position.
unsafe fn shave(region: *mut FreeRegion, pages: usize) {
    let rest = (region as *mut u8).add(pages * PAGE_SIZE) as *mut FreeRegion;
    (*rest).pages = (*region).pages - pages;
    (*rest).prev = region;
    (*rest).next = (*region).next;
    if !(*region).next.is_null() {
        (*(*region).next).prev = rest;
    }
    (*region).next = rest;
    (*region).pages = pages;
}

unsafe fn unlink(list: &mut FreeList, region: *mut FreeRegion) {
    if (*region).prev.is_null() {
        debug_assert_eq!(list.head, region);
        list.head = (*region).next;
    } else {
        (*(*region).prev).next = (*region).next;
    }
    if !(*region).next.is_null() {
        (*(*region).next).prev = (*region).prev;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_requests_map_new_regions() {
        let pool = PagePool::new();

        let (a, a_pages) = pool.request_large(6);
        let (b, b_pages) = pool.request_large(6);
        assert!(!a.is_null() && !b.is_null());
        assert_ne!(a, b);
        assert_eq!((a_pages, b_pages), (6, 6));
        assert_eq!(pool.large_requests(), 2);
    }

    #[test]
    fn returned_region_is_reused_exactly() {
        let pool = PagePool::new();

        let (region, pages) = pool.request_large(10);
        pool.return_region(region, pages);

        let (again, again_pages) = pool.request_large(10);
        assert_eq!(again, region);
        assert_eq!(again_pages, 10);
        assert_eq!(pool.regions_freed(), 1);
    }

    #[test]
    fn slab_requests_shave_large_regions() {
        let pool = PagePool::new();

        let (region, pages) = pool.request_large(10);
        pool.return_region(region, pages);

        // The first slab shaves the head off the 10-page region, the second
        // takes the remainder, the third has to map afresh.
        let first = pool.request_slab() as *mut u8;
        let second = pool.request_slab() as *mut u8;
        let third = pool.request_slab() as *mut u8;
        assert_eq!(first, region);
        assert_eq!(second as usize, region as usize + SLAB_PAGES * PAGE_SIZE);
        assert_ne!(third, region);
    }

    #[test]
    fn unshaveable_slack_goes_out_whole() {
        let pool = PagePool::new();

        let (region, pages) = pool.request_large(7);
        pool.return_region(region, pages);

        // A 7-page region cannot yield a slab without leaving a 2-page
        // crumb, so the slab maps fresh pages instead.
        let slab = pool.request_slab() as *mut u8;
        assert_ne!(slab, region);

        // A 6-page request swallows the region whole, slack included.
        let (again, again_pages) = pool.request_large(6);
        assert_eq!(again, region);
        assert_eq!(again_pages, 7);
    }

    #[test]
    fn first_fit_walks_past_small_regions() {
        let pool = PagePool::new();

        let (small, small_pages) = pool.request_large(5);
        let (big, big_pages) = pool.request_large(20);
        // Return the big region first so the small one heads the list.
        pool.return_region(big, big_pages);
        pool.return_region(small, small_pages);

        let (found, found_pages) = pool.request_large(15);
        assert_eq!(found, big);
        assert_eq!(found_pages, 15);

        // The shaved 5-page tail is still pooled behind the small region.
        let (tail, tail_pages) = pool.request_large(5);
        assert_eq!(tail, small);
        assert_eq!(tail_pages, 5);
        let (shaved, shaved_pages) = pool.request_large(5);
        assert_eq!(shaved as usize, big as usize + 15 * PAGE_SIZE);
        assert_eq!(shaved_pages, 5);
    }
}
