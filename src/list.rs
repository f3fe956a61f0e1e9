//! The address-ordered free list (`spec.md` §3.2, §4.2) and coalescing
//! (`spec.md` §4.3).
//!
//! The list is intrusive: each free region's [`BlockHeader`] doubles as its
//! own list node (`spec.md` §9, "Intrusive list vs. external index"), so a
//! header pointer already acts as the cursor `spec.md` §4.2/§4.4 talk about
//! — "erase the node at cursor" is just erasing the header itself, and
//! "`before = cursor - 1`"/"`after = cursor + 1`" are just its `prev`/`next`
//! links.

use std::ptr;

use crate::block::BlockHeader;

/// Doubly-linked, strictly address-ordered sequence of free headers.
///
/// Holds only a `head` pointer; `prev`/`next` links live inside each header
/// (see [`BlockHeader`]), so there is no separate node allocation and no
/// bound on list length beyond available memory.
pub(crate) struct FreeList {
  head: *mut BlockHeader,
}

impl FreeList {
  pub(crate) const fn new() -> Self {
    Self {
      head: ptr::null_mut(),
    }
  }

  /// Linear scan from the head for the first header whose `payload_size` is
  /// **strictly greater than** `amount`.
  ///
  /// Strict `>` rather than `>=` is deliberate (`spec.md` §4.2): it
  /// guarantees that after a same-size hit is split, the split always
  /// declines cleanly rather than producing a zero-size remainder that
  /// would need special-casing.
  ///
  /// # Safety
  /// Every header reachable from `self.head` must be a valid, linked free
  /// header.
  pub(crate) unsafe fn find_first_fit(&self, amount: usize) -> *mut BlockHeader {
    unsafe {
      let mut current = self.head;
      while !current.is_null() {
        if BlockHeader::payload_size(current) > amount as isize {
          return current;
        }
        current = BlockHeader::next(current);
      }
      ptr::null_mut()
    }
  }

  /// Inserts `h` at the unique position preserving strict ascending address
  /// order, and returns `h` back as the cursor to the inserted node.
  ///
  /// # Safety
  /// `h`'s address range must not overlap any header already in the list.
  pub(crate) unsafe fn insert_sorted(&mut self, h: *mut BlockHeader) -> *mut BlockHeader {
    unsafe {
      let mut current = self.head;
      let mut before: *mut BlockHeader = ptr::null_mut();

      while !current.is_null() && (current as usize) < (h as usize) {
        before = current;
        current = BlockHeader::next(current);
      }

      BlockHeader::set_prev(h, before);
      BlockHeader::set_next(h, current);

      if !current.is_null() {
        BlockHeader::set_prev(current, h);
      }

      if before.is_null() {
        self.head = h;
      } else {
        BlockHeader::set_next(before, h);
      }

      h
    }
  }

  /// Unlinks the header at `cursor` in O(1).
  ///
  /// # Safety
  /// `cursor` must currently be linked into this list.
  pub(crate) unsafe fn erase(&mut self, cursor: *mut BlockHeader) {
    unsafe {
      let before = BlockHeader::prev(cursor);
      let after = BlockHeader::next(cursor);

      if before.is_null() {
        self.head = after;
      } else {
        BlockHeader::set_next(before, after);
      }

      if !after.is_null() {
        BlockHeader::set_prev(after, before);
      }

      BlockHeader::set_prev(cursor, ptr::null_mut());
      BlockHeader::set_next(cursor, ptr::null_mut());
    }
  }

  #[cfg(test)]
  pub(crate) fn head(&self) -> *mut BlockHeader {
    self.head
  }
}

/// Attempts to merge two free headers into one.
///
/// Returns the null sentinel when the regions are not byte-exact adjacent.
/// On success, the lower-addressed header absorbs the higher-addressed one
/// and is returned; the higher-addressed header is destroyed as a side
/// effect (its bytes become part of the merged payload) and must not be
/// used again by the caller.
///
/// # Safety
/// `a` and `b` must both be valid, currently-unlinked free headers.
pub(crate) unsafe fn try_coalesce(
  a: *mut BlockHeader,
  b: *mut BlockHeader,
) -> *mut BlockHeader {
  let (lo, hi) = if (a as usize) <= (b as usize) {
    (a, b)
  } else {
    (b, a)
  };

  if lo == hi {
    return lo;
  }

  unsafe {
    if BlockHeader::region_end(lo) == hi as usize {
      let merged = BlockHeader::payload_size(lo)
        + BlockHeader::SIZE as isize
        + BlockHeader::payload_size(hi);
      BlockHeader::grow_payload_to(lo, merged);
      lo
    } else {
      ptr::null_mut()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::alloc::{self, Layout};

  use crate::align::MAX_ALIGN;

  fn chunk(span: usize) -> *mut u8 {
    unsafe { alloc::alloc(Layout::from_size_align(span, MAX_ALIGN).unwrap()) }
  }

  fn free_chunk(ptr: *mut u8, span: usize) {
    unsafe { alloc::dealloc(ptr, Layout::from_size_align(span, MAX_ALIGN).unwrap()) };
  }

  fn header_of(span_payload: usize) -> (*mut u8, usize, *mut BlockHeader) {
    let span = BlockHeader::SIZE + span_payload;
    let base = chunk(span);
    let h = unsafe { BlockHeader::construct(base, span) };
    (base, span, h)
  }

  #[test]
  fn insert_sorted_maintains_strict_address_order() {
    let mut list = FreeList::new();
    let (b1, s1, h1) = header_of(MAX_ALIGN * 2);
    let (b2, s2, h2) = header_of(MAX_ALIGN * 2);
    let (b3, s3, h3) = header_of(MAX_ALIGN * 2);

    // Insert out of address order; list must still be ordered afterward.
    let mut headers = [h1, h2, h3];
    headers.sort_by_key(|h| *h as usize);

    unsafe {
      list.insert_sorted(headers[1]);
      list.insert_sorted(headers[0]);
      list.insert_sorted(headers[2]);

      let mut current = list.head();
      let mut last_addr: Option<usize> = None;
      let mut count = 0;
      while !current.is_null() {
        if let Some(prev) = last_addr {
          assert!(prev < current as usize);
        }
        last_addr = Some(current as usize);
        current = BlockHeader::next(current);
        count += 1;
      }
      assert_eq!(count, 3);
    }

    free_chunk(b1, s1);
    free_chunk(b2, s2);
    free_chunk(b3, s3);
  }

  #[test]
  fn erase_unlinks_a_middle_node_without_disturbing_neighbours() {
    let mut list = FreeList::new();
    let (b1, s1, h1) = header_of(MAX_ALIGN * 2);
    let (b2, s2, h2) = header_of(MAX_ALIGN * 2);
    let (b3, s3, h3) = header_of(MAX_ALIGN * 2);
    let mut headers = [h1, h2, h3];
    headers.sort_by_key(|h| *h as usize);

    unsafe {
      for h in headers {
        list.insert_sorted(h);
      }
      let middle = headers[1];
      list.erase(middle);

      assert_eq!(BlockHeader::next(headers[0]), headers[2]);
      assert_eq!(BlockHeader::prev(headers[2]), headers[0]);
      assert!(BlockHeader::prev(middle).is_null());
      assert!(BlockHeader::next(middle).is_null());
    }

    free_chunk(b1, s1);
    free_chunk(b2, s2);
    free_chunk(b3, s3);
  }

  #[test]
  fn find_first_fit_uses_strict_greater_than() {
    let mut list = FreeList::new();
    let (base, span, h) = header_of(MAX_ALIGN * 4);
    unsafe {
      list.insert_sorted(h);
      assert!(list
        .find_first_fit(BlockHeader::payload_size(h) as usize)
        .is_null());
      assert_eq!(
        list.find_first_fit(BlockHeader::payload_size(h) as usize - 1),
        h
      );
    }
    free_chunk(base, span);
  }

  #[test]
  fn try_coalesce_merges_byte_adjacent_regions() {
    // Allocate one contiguous span and carve two adjacent headers out of it
    // by hand, mirroring how `split` would have produced them.
    let payload_each = MAX_ALIGN * 3;
    let span = 2 * (BlockHeader::SIZE + payload_each);
    let base = chunk(span);

    unsafe {
      let first = BlockHeader::construct(base, BlockHeader::SIZE + payload_each);
      let second_at = base.add(BlockHeader::SIZE + payload_each);
      let second = BlockHeader::construct(second_at, BlockHeader::SIZE + payload_each);

      let merged = try_coalesce(first, second);
      assert_eq!(merged, first);
      assert_eq!(
        BlockHeader::payload_size(merged),
        (2 * payload_each + BlockHeader::SIZE) as isize
      );
      assert_eq!(BlockHeader::region_end(merged), base as usize + span);
    }

    free_chunk(base, span);
  }

  #[test]
  fn try_coalesce_refuses_non_adjacent_regions() {
    let (b1, s1, h1) = header_of(MAX_ALIGN * 2);
    let (b2, s2, h2) = header_of(MAX_ALIGN * 2);

    unsafe {
      assert!(try_coalesce(h1, h2).is_null());
    }

    free_chunk(b1, s1);
    free_chunk(b2, s2);
  }
}
