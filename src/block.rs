//! In-place free-region header (`spec.md` §3.1, §4.1).
//!
//! A `BlockHeader` is written directly into the first bytes of a free
//! region; there is no separate bookkeeping allocation for it (`spec.md`
//! §9, "Intrusive list vs. external index"). Its bytes are overwritten by
//! user data the moment the region is handed out by
//! [`crate::allocator::FreeListAllocator::allocate`], so a `BlockHeader`
//! must never be read through once its region is allocated.

use std::mem;
use std::ptr;

use crate::align::{self, MAX_ALIGN};

/// Header describing one free region of the heap.
///
/// `payload_size` is signed (`spec.md` §3.1: "a signed integer wide enough
/// for any plausible single allocation") even though it is never negative in
/// practice, because the arithmetic that produces it (subtracting an
/// allocation's `amount` from a region's current size) is easiest to reason
/// about, and to assert over, in signed terms.
#[repr(C, align(16))]
pub(crate) struct BlockHeader {
  payload_size: isize,
  prev: *mut BlockHeader,
  next: *mut BlockHeader,
}

const _: () = assert!(mem::size_of::<BlockHeader>() % MAX_ALIGN == 0);
const _: () = assert!(mem::size_of::<BlockHeader>() >= MAX_ALIGN);
const _: () = assert!(mem::align_of::<BlockHeader>() == MAX_ALIGN);

impl BlockHeader {
  /// `sizeof(BlockHeader)`, `H` in `spec.md`.
  pub(crate) const SIZE: usize = mem::size_of::<BlockHeader>();

  /// Constructs a header in place at `at`, describing a region whose total
  /// footprint (header + payload) is `span` bytes.
  ///
  /// Returns the null sentinel, per `spec.md` §4.1, when `span` is too small
  /// to hold a header at all — the caller must treat `at..at+span` as
  /// unusable slack rather than try to wrap it.
  ///
  /// # Safety
  /// `at` must be valid for `span` writable bytes, `A`-aligned, and not
  /// currently observed through any other reference.
  pub(crate) unsafe fn construct(at: *mut u8, span: usize) -> *mut BlockHeader {
    debug_assert!(
      align::is_max_aligned(at as usize),
      "header address must be A-aligned"
    );
    debug_assert!(align::is_max_aligned(span), "span must be A-aligned");

    if span <= Self::SIZE {
      return ptr::null_mut();
    }

    let header = at as *mut BlockHeader;
    unsafe {
      ptr::write(
        header,
        BlockHeader {
          payload_size: (span - Self::SIZE) as isize,
          prev: ptr::null_mut(),
          next: ptr::null_mut(),
        },
      );
    }
    header
  }

  /// Reduces `h` by `amount` payload bytes, carving the remainder off into
  /// a fresh remainder header when there is enough slack to hold one
  /// (`spec.md` §4.1).
  ///
  /// Returns `h` itself, unchanged in size, when the remainder would be too
  /// small to track — the caller over-allocates by up to `H` bytes rather
  /// than orphan memory that can never be found again.
  ///
  /// # Safety
  /// `h` must be a valid, currently-unlinked free header with
  /// `payload_size >= amount`.
  pub(crate) unsafe fn split(h: *mut BlockHeader, amount: usize) -> *mut BlockHeader {
    debug_assert!(!h.is_null());
    debug_assert!(align::is_max_aligned(amount));

    unsafe {
      debug_assert!((*h).payload_size >= amount as isize);

      let remainder_span = (*h).payload_size as usize - amount;
      let remainder_at = (h.add(1) as *mut u8).add(amount);
      let remainder = BlockHeader::construct(remainder_at, remainder_span);

      if remainder.is_null() {
        h
      } else {
        (*h).payload_size = amount as isize;
        remainder
      }
    }
  }

  /// The payload size this header currently describes.
  pub(crate) fn payload_size(h: *const BlockHeader) -> isize {
    unsafe { (*h).payload_size }
  }

  pub(crate) fn prev(h: *const BlockHeader) -> *mut BlockHeader {
    unsafe { (*h).prev }
  }

  pub(crate) fn next(h: *const BlockHeader) -> *mut BlockHeader {
    unsafe { (*h).next }
  }

  pub(crate) fn set_prev(h: *mut BlockHeader, prev: *mut BlockHeader) {
    unsafe { (*h).prev = prev };
  }

  pub(crate) fn set_next(h: *mut BlockHeader, next: *mut BlockHeader) {
    unsafe { (*h).next = next };
  }

  /// Widens `h`'s payload size in place. Used only by [`crate::list::try_coalesce`]
  /// when absorbing a neighbour; never shrinks a header and never relocates it.
  pub(crate) fn grow_payload_to(h: *mut BlockHeader, new_payload_size: isize) {
    unsafe { (*h).payload_size = new_payload_size };
  }

  /// The user-visible pointer for this header's region: `header + H`.
  pub(crate) fn user_ptr(h: *mut BlockHeader) -> *mut u8 {
    unsafe { h.add(1) as *mut u8 }
  }

  /// Recovers the header for a pointer previously returned by
  /// [`BlockHeader::user_ptr`].
  ///
  /// # Safety
  /// `ptr` must have been returned by `user_ptr` on a header constructed by
  /// this module, and must not have been released already.
  pub(crate) unsafe fn from_user_ptr(ptr: *mut u8) -> *mut BlockHeader {
    unsafe { (ptr as *mut BlockHeader).sub(1) }
  }

  /// Byte address one past the end of this header's region.
  pub(crate) fn region_end(h: *const BlockHeader) -> usize {
    unsafe { (h.add(1) as usize) + (*h).payload_size as usize }
  }
}
