//! Error taxonomy (`spec.md` §7).
//!
//! Only the two rows of §7's table that are genuine runtime failures get a
//! type here ("Out of memory"). "Contract violation" is handled by
//! `assert!`/`debug_assert!` at the point of violation, per §7's own policy
//! ("Assertion; process abort") — it is never converted into a `Result`.
//! "Split refused" and "Coalesce refused" are not errors at all; they are
//! ordinary control-flow values (`spec.md` §7) and have no representation
//! here.

use thiserror::Error;

/// Failure to obtain more memory from the operating system.
#[derive(Debug, Error)]
pub enum OsError {
  /// The `mmap(2)` call backing [`crate::os::MmapAdapter::extend_heap`]
  /// failed.
  #[error("mmap failed while requesting {requested} bytes: {source}")]
  MmapFailed {
    requested: usize,
    #[source]
    source: std::io::Error,
  },
}

/// Failure of [`crate::allocator::FreeListAllocator::allocate`].
///
/// The only failure mode the core surfaces to its caller (`spec.md` §7): the
/// free list is left in its prior consistent state when this is returned.
#[derive(Debug, Error)]
pub enum AllocError {
  /// Every attempt to extend the heap failed; `requested` is the rounded
  /// payload size (`amount` in `spec.md`'s vocabulary) that could not be
  /// satisfied.
  #[error("out of memory: could not satisfy an allocation of {requested} bytes ({source})")]
  OutOfMemory {
    requested: usize,
    #[source]
    source: OsError,
  },
}
