//! Allocator front-end (`spec.md` §4.4, component C3): `allocate`/`release`.
//!
//! This replaces the teacher's `bump.rs`. The teacher's `BumpAllocator` kept
//! a singly-linked list of every block it ever handed out and only ever grew
//! the heap; this type keeps the same "own a small struct, take a `Layout`,
//! hand back a raw pointer" shape but backs it with the free-list engine
//! from `block.rs`/`list.rs` so freed memory is actually reused.

use std::alloc::Layout;
use std::ptr::NonNull;

use log::trace;

use crate::align::{self, MAX_ALIGN};
use crate::block::BlockHeader;
use crate::error::AllocError;
use crate::list::{self, FreeList};
use crate::os::{MmapAdapter, OsAdapter};

/// A first-fit, address-ordered free-list allocator.
///
/// Not thread-safe (`spec.md` §1 Non-goals, §5): every method takes `&mut
/// self`, so concurrent use requires the caller to serialize externally —
/// see [`crate::sync::Locked`] for a ready-made wrapper when that is wanted.
pub struct FreeListAllocator<O: OsAdapter = MmapAdapter> {
  list: FreeList,
  os: O,
}

// SAFETY: `FreeList` holds raw `*mut BlockHeader` pointers into memory this
// allocator exclusively owns (obtained from `os` and never shared outside
// calls that take `&mut self`). Moving a `FreeListAllocator` to another
// thread is sound; using it *concurrently* from two threads is not, which is
// exactly why every method above still requires `&mut self` rather than
// relying on this impl for safety. This exists solely so `Mutex<
// FreeListAllocator<O>>` (see `crate::sync::Locked`) can be `Sync`.
unsafe impl<O: OsAdapter + Send> Send for FreeListAllocator<O> {}

impl FreeListAllocator<MmapAdapter> {
  /// Creates an empty allocator that grows its heap via `mmap`.
  pub fn new() -> Self {
    Self::with_adapter(MmapAdapter::new())
  }
}

impl Default for FreeListAllocator<MmapAdapter> {
  fn default() -> Self {
    Self::new()
  }
}

impl<O: OsAdapter> FreeListAllocator<O> {
  /// Creates an empty allocator that grows its heap through `os`.
  ///
  /// This is the seam test code uses to swap in a
  /// [`crate::os::tests_support::FakeOsAdapter`] instead of real `mmap`.
  pub fn with_adapter(os: O) -> Self {
    Self {
      list: FreeList::new(),
      os,
    }
  }

  /// Allocates memory satisfying `layout` (`spec.md` §4.4).
  ///
  /// `layout.size()` is the spec's `amount`, rounded up to [`MAX_ALIGN`]
  /// before the search. `layout.align()` must not exceed `MAX_ALIGN`:
  /// extended alignment is explicitly out of scope (`spec.md` §1).
  ///
  /// Returns [`AllocError::OutOfMemory`] if every attempt to extend the
  /// heap fails; the free list is left exactly as it was before the call.
  ///
  /// # Safety
  /// The allocator must not be used concurrently from multiple threads
  /// without external synchronization.
  pub unsafe fn allocate(&mut self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
    assert!(
      layout.align() <= MAX_ALIGN,
      "extended alignment ({}) beyond the system maximum ({MAX_ALIGN}) is not supported",
      layout.align()
    );

    let amount = align::round_up_to_max_alignment(layout.size());

    unsafe {
      let found = self.list.find_first_fit(amount);

      let found = if !found.is_null() {
        self.list.erase(found);
        found
      } else {
        // Miss: ask the OS adapter for a fresh chunk and split it directly
        // rather than looping back through `find_first_fit`. A freshly
        // granted chunk's payload only has to satisfy `payload >= amount`
        // (`spec.md` §4.5), not the strict `payload > amount` that
        // `find_first_fit` demands — going back through the search could
        // spin forever re-requesting identically-sized chunks on a system
        // whose page size happens to make `amount + H` exactly one page.
        // `spec.md` §4.4 calls this out as equivalent: "insert_sorted it
        // and repeat step 2 ... ; equivalently, split it directly".
        let requested = amount + BlockHeader::SIZE;
        let (base, granted) = self
          .os
          .extend_heap(requested)
          .map_err(|source| AllocError::OutOfMemory {
            requested: amount,
            source,
          })?;

        let header = BlockHeader::construct(base, granted);
        debug_assert!(!header.is_null(), "a whole OS chunk is never too small for a header");
        debug_assert!(BlockHeader::payload_size(header) >= amount as isize);
        header
      };

      let remainder = BlockHeader::split(found, amount);
      if remainder != found {
        self.list.insert_sorted(remainder);
      }

      let user = BlockHeader::user_ptr(found);
      trace!("allocate: amount={amount} header={found:p} user={user:p}");
      Ok(NonNull::new_unchecked(user))
    }
  }

  /// Returns a previously allocated block to the free list (`spec.md`
  /// §4.4), attempting to coalesce it with both neighbours.
  ///
  /// `after` is captured before the predecessor merge runs and is not
  /// re-derived afterward (`spec.md` §9, "Double-coalesce orientation"):
  /// the predecessor merge only ever touches nodes at or below `cursor`'s
  /// original address, so the node `after` pointed to is never the one that
  /// gets unlinked or relocated by that merge.
  ///
  /// # Safety
  /// `ptr` must have been returned by a prior call to `allocate` on this
  /// same allocator and must not already have been released.
  pub unsafe fn release(&mut self, ptr: NonNull<u8>) {
    unsafe {
      let h = BlockHeader::from_user_ptr(ptr.as_ptr());
      let mut cursor = self.list.insert_sorted(h);

      let before = BlockHeader::prev(cursor);
      let after = BlockHeader::next(cursor);

      if !before.is_null() {
        let merged = list::try_coalesce(before, cursor);
        if !merged.is_null() {
          self.list.erase(cursor);
          self.list.erase(before);
          cursor = self.list.insert_sorted(merged);
        }
      }

      if !after.is_null() {
        let merged = list::try_coalesce(after, cursor);
        if !merged.is_null() {
          self.list.erase(cursor);
          self.list.erase(after);
          self.list.insert_sorted(merged);
        }
      }

      trace!("release: user={ptr:p} header={h:p}");
    }
  }
}
