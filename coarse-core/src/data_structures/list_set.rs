use std::fmt;

use crate::error::{SetResult, check_key};

/// Locking discipline a set applies around its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockKind {
    /// One mutex serializes every operation.
    Exclusive,
    /// Queries share the read lock, mutations take the write lock.
    ReaderWriter,
}

impl LockKind {
    pub fn name(&self) -> &'static str {
        match self {
            LockKind::Exclusive => "exclusive",
            LockKind::ReaderWriter => "reader-writer",
        }
    }
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of `i32` keys kept in a sorted linked list behind a coarse-grained lock.
///
/// # Keys
///
/// `i32::MIN` and `i32::MAX` belong to the head and tail sentinels. Every
/// operation rejects them with [`SetError::ReservedKey`](crate::SetError::ReservedKey)
/// before touching the lock.
///
/// # Locking
///
/// Each call acquires the set's lock exactly once and releases it when the guard
/// drops, on every exit path including unwinding:
///
/// ```text
/// ExclusiveLockSet      add / remove / contains / queries  ─► Mutex
/// ReaderWriterLockSet   add / remove / add_all            ─► RwLock (write)
///                       contains / len / to_vec            ─► RwLock (read)
/// ```
///
/// # Failures
///
/// The only failure besides reserved keys is a poisoned lock: some thread
/// panicked inside a critical section. The error is returned with the lock
/// already released; see [`ListSet::clear_poison`].
///
pub trait ListSet: Send + Sync {
    /// Insert a key.
    ///
    /// Returns `true` if the key was inserted, `false` if it already exists.
    ///
    fn add(&self, key: i32) -> SetResult<bool>;

    /// Remove a key.
    ///
    /// Returns `true` if the key was removed, `false` if not found.
    ///
    fn remove(&self, key: i32) -> SetResult<bool>;

    /// Check if a key exists in the set.
    ///
    fn contains(&self, key: i32) -> SetResult<bool>;

    /// Number of keys, sentinels excluded.
    fn len(&self) -> SetResult<usize>;

    fn is_empty(&self) -> SetResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Ascending snapshot taken under a single acquisition.
    fn to_vec(&self) -> SetResult<Vec<i32>>;

    /// Insert multiple keys.
    ///
    /// All keys are checked before any is inserted, so a reserved key leaves the
    /// set untouched. Returns the number of keys actually inserted.
    ///
    /// The default acquires the lock once per key; both set types override it to
    /// insert the whole batch under one write acquisition.
    ///
    fn add_all<I>(&self, keys: I) -> SetResult<usize>
    where
        I: IntoIterator<Item = i32>,
        Self: Sized,
    {
        let keys = checked_keys(keys)?;
        let mut count = 0;
        for key in keys {
            if self.add(key)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Whether a panic inside a critical section poisoned the lock.
    fn is_poisoned(&self) -> bool;

    /// Re-validates the chain of a poisoned set and clears the poison flag.
    ///
    /// Returns [`SetError::Corrupted`](crate::SetError::Corrupted) and leaves the
    /// flag set if the structural invariant no longer holds. A no-op on a healthy
    /// set.
    ///
    fn clear_poison(&self) -> SetResult<()>;

    fn lock_kind(&self) -> LockKind;
}

pub(crate) fn checked_keys<I>(keys: I) -> SetResult<Vec<i32>>
where
    I: IntoIterator<Item = i32>,
{
    keys.into_iter().map(check_key).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SetError;

    #[test]
    fn test_lock_kind_display() {
        assert_eq!(LockKind::Exclusive.to_string(), "exclusive");
        assert_eq!(LockKind::ReaderWriter.to_string(), "reader-writer");
    }

    #[test]
    fn test_checked_keys_rejects_sentinels() {
        assert_eq!(checked_keys([3, 1, 2]), Ok(vec![3, 1, 2]));
        assert_eq!(
            checked_keys([1, i32::MAX, 2]),
            Err(SetError::ReservedKey { key: i32::MAX })
        );
    }
}
