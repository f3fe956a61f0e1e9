//! A `GlobalAlloc`-compatible wrapper around [`FreeListAllocator`].
//!
//! `spec.md` §9 is explicit that the free list's sequential contract must
//! not be weakened by adding locking *inside* the core: "if thread safety is
//! desired, wrap with a mutex at the public interface, not internally". This
//! module is that wrapper — it adds nothing to the allocation algorithm, it
//! only serializes access to it, so it lives outside `allocator.rs` rather
//! than inside it.

use std::alloc::{GlobalAlloc, Layout};
use std::sync::Mutex;

use crate::allocator::FreeListAllocator;
use crate::os::{MmapAdapter, OsAdapter};

/// Serializes access to an inner allocator so it can be used as a process's
/// `#[global_allocator]`.
///
/// Unlike the no-std kernels in this corpus that reach for an `UnsafeCell`
/// wrapper and rely on there only ever being one core active at a time, this
/// crate targets `std` and uses a real `std::sync::Mutex`: a `GlobalAlloc`
/// installed via `#[global_allocator]` is reachable from any thread in the
/// process, so skipping real synchronization here would be unsound rather
/// than merely conservative.
pub struct Locked<O: OsAdapter = MmapAdapter> {
  inner: Mutex<FreeListAllocator<O>>,
}

impl Locked<MmapAdapter> {
  pub fn new() -> Self {
    Self::with_adapter(MmapAdapter::new())
  }
}

impl Default for Locked<MmapAdapter> {
  fn default() -> Self {
    Self::new()
  }
}

impl<O: OsAdapter> Locked<O> {
  pub fn with_adapter(os: O) -> Self {
    Self {
      inner: Mutex::new(FreeListAllocator::with_adapter(os)),
    }
  }
}

// SAFETY: `GlobalAlloc` requires the implementation to be thread-safe; the
// `Mutex` above is the entirety of how that's provided. `FreeListAllocator`
// itself makes no thread-safety claim on its own (`spec.md` §5) and is never
// touched without the lock held.
unsafe impl<O: OsAdapter + Send> GlobalAlloc for Locked<O> {
  unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
    let mut guard = self.inner.lock().unwrap_or_else(|p| p.into_inner());
    unsafe {
      match guard.allocate(layout) {
        Ok(ptr) => ptr.as_ptr(),
        Err(_) => std::ptr::null_mut(),
      }
    }
  }

  unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
    let Some(ptr) = std::ptr::NonNull::new(ptr) else {
      return;
    };
    let mut guard = self.inner.lock().unwrap_or_else(|p| p.into_inner());
    unsafe { guard.release(ptr) };
  }
}
