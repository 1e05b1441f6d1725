//! Coarse-grained locked list sets.
//!
//! Both sets own a [`SortedChain`](super::internal::SortedChain) through a single
//! lock and differ only in the lock they use:
//!
//! - [`ExclusiveLockSet`] - `Mutex`, full serialization
//! - [`ReaderWriterLockSet`] - `RwLock`, concurrent `contains`, exclusive writers

pub mod exclusive_lock_set;
pub mod reader_writer_lock_set;

pub use exclusive_lock_set::ExclusiveLockSet;
pub use reader_writer_lock_set::ReaderWriterLockSet;

use tracing::{debug, warn};

use super::LockKind;
use super::internal::SortedChain;
use crate::error::SetError;

// Maps a `PoisonError` to `SetError::Poisoned`. The guard inside the
// PoisonError is dropped with it, so the lock is released before the error
// reaches the caller.
//
fn poisoned(lock: LockKind) -> SetError {
    warn!(%lock, "lock poisoned by a panicking holder");
    SetError::Poisoned { lock }
}

// Shared by both `clear_poison` implementations. Runs with the lock held.
//
fn validate_recovered(lock: LockKind, chain: &SortedChain) -> Result<(), SetError> {
    match chain.validate() {
        Ok(()) => {
            debug!(%lock, len = chain.len(), "poisoned chain validated");
            Ok(())
        }
        Err(reason) => {
            warn!(%lock, %reason, "poisoned chain failed validation");
            Err(SetError::Corrupted { lock, reason })
        }
    }
}
