//! # falloc — a first-fit, address-ordered free-list allocator
//!
//! This crate provides a general-purpose dynamic memory allocator: a pair of
//! operations, `allocate`/`release`, that bypass the language runtime's
//! default allocator. It manages a heap built from page-granularity chunks
//! obtained directly from the operating system, carves those chunks into
//! arbitrarily sized user blocks on demand, and reclaims released blocks
//! back into a pool for reuse — coalescing adjacent reclaimed regions so the
//! heap does not fragment monotonically.
//!
//! ## Overview
//!
//! Unlike a bump allocator, which only ever grows a pointer forward and can
//! at best shrink from the tail, this allocator keeps an **address-ordered
//! free list** of every reclaimed region and performs **first-fit** search
//! on allocation:
//!
//! ```text
//!   Free-list allocator concept:
//!
//!   ┌───────────────────────────────────────────────────────────────────┐
//!   │                          HEAP MEMORY                               │
//!   │                                                                   │
//!   │   ┌─────┬────────┬─────┬────────────┬─────┬──────────────────┐   │
//!   │   │ A1  │  free  │ A2  │    free     │ A3  │       free       │   │
//!   │   └─────┴────────┴─────┴────────────┴─────┴──────────────────┘   │
//!   │           ▲                 ▲                      ▲             │
//!   │           └─────────────────┴──────────────────────┘             │
//!   │                 free list, ordered by address                    │
//!   └───────────────────────────────────────────────────────────────────┘
//!
//!   allocate(n): scan the free list for the first region big enough,
//!                split it, hand back the front.
//!   release(p):  insert the region back in address order, merge with
//!                whichever neighbours are byte-adjacent.
//! ```
//!
//! ## Crate structure
//!
//! ```text
//!   falloc
//!   ├── align       - MAX_ALIGN and rounding helpers
//!   ├── block       - BlockHeader: the in-place free-region record
//!   ├── list        - FreeList: address-ordered doubly-linked free list,
//!   │                 plus try_coalesce
//!   ├── os          - OsAdapter trait and the mmap-backed MmapAdapter
//!   ├── allocator   - FreeListAllocator: allocate/release
//!   ├── error       - AllocError, OsError
//!   └── sync        - Locked<A>: a GlobalAlloc-compatible wrapper
//! ```
//!
//! ## Quick start
//!
//! ```
//! use std::alloc::Layout;
//! use falloc::FreeListAllocator;
//!
//! let mut allocator = FreeListAllocator::new();
//!
//! unsafe {
//!     let layout = Layout::new::<u64>();
//!     let ptr = allocator.allocate(layout).unwrap().as_ptr() as *mut u64;
//!
//!     ptr.write(42);
//!     assert_eq!(ptr.read(), 42);
//!
//!     allocator.release(std::ptr::NonNull::new(ptr as *mut u8).unwrap());
//! }
//! ```
//!
//! ## Safety
//!
//! This crate is inherently unsafe: it performs raw pointer arithmetic over
//! memory it owns only by convention, not by the type system. All
//! allocation and deallocation entry points require `unsafe`, and the usual
//! allocator obligations apply — the pointer passed to `release` must have
//! come from a prior `allocate` on the same allocator and must not already
//! have been released.
//!
//! ## Thread safety
//!
//! Single-threaded only; see [`sync::Locked`] for a mutex-guarded wrapper
//! suitable for installing as a `#[global_allocator]`.

pub mod align;
mod block;
pub mod error;
mod list;
pub mod os;

mod allocator;
pub mod sync;

pub use allocator::FreeListAllocator;
pub use error::{AllocError, OsError};
pub use os::{MmapAdapter, OsAdapter};
