//! The page source: anonymous mappings from the OS.

use crate::allocators::PAGE_SIZE;

/// Map `pages` fresh zeroed, writable pages on a page boundary.
///
/// The allocator has no recovery path for address-space exhaustion; a
/// refused mapping aborts the process.
pub fn map_pages(pages: usize) -> *mut u8 {
    debug_assert!(pages > 0);

    // SAFETY: anonymous mapping with no backing fd; the kernel picks the
    // address.
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            pages * PAGE_SIZE,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        )
    };
    if ptr == libc::MAP_FAILED {
        panic!("failed to map {} pages", pages);
    }

    #[cfg(feature = "log")]
    log::trace!("mapped {} fresh pages at {:p}", pages, ptr);

    ptr as *mut u8
}
