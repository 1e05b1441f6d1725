//! Error types shared by the locked sets and the workload driver.

use thiserror::Error;

use crate::data_structures::LockKind;

/// Failures a set operation can report.
///
/// Presence and absence of a key are never errors; they are the `bool` carried
/// in `Ok`.
///
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetError {
    /// A thread panicked while holding the lock. The lock itself is free again,
    /// but operations are refused until the owner calls `clear_poison`.
    #[error("{lock} lock was poisoned by a panicking holder")]
    Poisoned { lock: LockKind },

    /// The key collides with a sentinel (`i32::MIN` or `i32::MAX`).
    #[error("key {key} is reserved for a list sentinel")]
    ReservedKey { key: i32 },

    /// Structural validation failed while recovering a poisoned set.
    #[error("{lock} set failed validation: {reason}")]
    Corrupted { lock: LockKind, reason: String },

    #[error("invalid workload configuration: {0}")]
    InvalidConfig(String),
}

pub type SetResult<T> = Result<T, SetError>;

/// Rejects the two sentinel keys.
pub(crate) fn check_key(key: i32) -> SetResult<i32> {
    if crate::data_structures::internal::is_reserved(key) {
        Err(SetError::ReservedKey { key })
    } else {
        Ok(key)
    }
}
