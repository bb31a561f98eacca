//! In-place block headers and size-class math.
//!
//! Every block handed out by the allocator is described by a [`BlockHeader`]
//! living at the head of the memory it describes. Buddy blocks record their
//! size class; large regions that bypass the arenas record a negated page
//! count instead, which is how `free` tells the two apart.

use std::mem;

/// Header prepended to every block.
///
/// The alignment rounds the header up to 16 bytes, so payloads start on a
/// 16-byte boundary.
#[repr(C, align(16))]
pub struct BlockHeader {
    /// Size class: the block spans `2^bsize` bytes, header included.
    /// Negative for a large region, where `-bsize` is its page count.
    pub bsize: i8,
    /// Index of the arena that owns this block.
    pub bucket: u8,
    /// Whether the block is currently handed out.
    pub used: bool,
    /// Whether the block sits at an even multiple of its own size within
    /// its tree, i.e. is the left child of its parent split.
    pub left: bool,
    /// Byte offset of the block from its tree root. Large regions leave
    /// this zero.
    pub offset: u16,
}

/// Bytes occupied by the header at the head of each block.
pub const HEADER_SIZE: usize = mem::size_of::<BlockHeader>();

impl BlockHeader {
    /// Recompute `left` after a size-class change.
    ///
    /// Merging two buddies can flip the combined block's parity at its new
    /// class, so the flag is rederived from the recorded offset.
    pub fn fix_left(&mut self) {
        self.left = (self.offset >> self.bsize) & 1 == 0;
    }

    /// Payload pointer for a block.
    ///
    /// # Safety
    /// `this` must point at a live header.
    pub unsafe fn payload(this: *mut BlockHeader) -> *mut u8 {
        (this as *mut u8).add(HEADER_SIZE)
    }

    /// Recover the header from a payload pointer.
    ///
    /// # Safety
    /// `payload` must have come from [`BlockHeader::payload`].
    pub unsafe fn from_payload(payload: *mut u8) -> *mut BlockHeader {
        payload.sub(HEADER_SIZE) as *mut BlockHeader
    }

    /// The buddy `2^bsize` bytes ahead. Only meaningful when `left` is set.
    ///
    /// # Safety
    /// `this` must point at a live buddy-tree header whose `left` flag is
    /// set; the sibling subtree then starts with a header.
    pub unsafe fn right_buddy(this: *mut BlockHeader) -> *mut BlockHeader {
        (this as *mut u8).add(1usize << (*this).bsize) as *mut BlockHeader
    }

    /// The buddy `2^bsize` bytes behind. Only meaningful when `left` is
    /// clear.
    ///
    /// # Safety
    /// `this` must point at a live buddy-tree header whose `left` flag is
    /// clear; the sibling subtree then starts with a header.
    pub unsafe fn left_buddy(this: *mut BlockHeader) -> *mut BlockHeader {
        (this as *mut u8).sub(1usize << (*this).bsize) as *mut BlockHeader
    }
}

/// Smallest size class whose block holds `size` payload bytes plus the
/// header.
pub fn class_for(size: usize) -> i8 {
    let total = size
        .checked_add(HEADER_SIZE)
        .expect("allocation size overflow");
    (usize::BITS - (total - 1).leading_zeros()) as i8
}
