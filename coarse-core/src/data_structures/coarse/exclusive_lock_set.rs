use std::fmt;
use std::sync::{Mutex, MutexGuard, TryLockError};

use super::{poisoned, validate_recovered};
use crate::data_structures::internal::{SortedChain, is_reserved};
use crate::data_structures::list_set::checked_keys;
use crate::data_structures::{ListSet, LockKind};
use crate::error::{SetResult, check_key};

///
/// Sorted list set where every operation, reads included, holds one mutex.
///
/// Operations on one instance are totally ordered by lock acquisition; no two
/// traversals ever overlap.
///
pub struct ExclusiveLockSet {
    chain: Mutex<SortedChain>,
}

impl ExclusiveLockSet {
    pub fn new() -> Self {
        ExclusiveLockSet {
            chain: Mutex::new(SortedChain::new()),
        }
    }

    // The guard is the only way to reach the chain; dropping it unlocks.
    //
    fn acquire(&self) -> SetResult<MutexGuard<'_, SortedChain>> {
        self.chain
            .lock()
            .map_err(|_| poisoned(LockKind::Exclusive))
    }
}

impl Default for ExclusiveLockSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ListSet for ExclusiveLockSet {
    fn add(&self, key: i32) -> SetResult<bool> {
        let key = check_key(key)?;
        let mut chain = self.acquire()?;
        Ok(chain.insert(key))
    }

    fn remove(&self, key: i32) -> SetResult<bool> {
        let key = check_key(key)?;
        let mut chain = self.acquire()?;
        Ok(chain.remove(key))
    }

    fn contains(&self, key: i32) -> SetResult<bool> {
        let key = check_key(key)?;
        let chain = self.acquire()?;
        Ok(chain.contains(key))
    }

    fn len(&self) -> SetResult<usize> {
        Ok(self.acquire()?.len())
    }

    fn to_vec(&self) -> SetResult<Vec<i32>> {
        Ok(self.acquire()?.keys().collect())
    }

    fn add_all<I>(&self, keys: I) -> SetResult<usize>
    where
        I: IntoIterator<Item = i32>,
    {
        let keys = checked_keys(keys)?;
        let mut chain = self.acquire()?;
        Ok(chain.insert_batch(keys))
    }

    fn is_poisoned(&self) -> bool {
        self.chain.is_poisoned()
    }

    fn clear_poison(&self) -> SetResult<()> {
        let chain = match self.chain.lock() {
            Ok(_) => return Ok(()),
            Err(poison) => poison.into_inner(),
        };
        validate_recovered(LockKind::Exclusive, &chain)?;
        self.chain.clear_poison();
        Ok(())
    }

    fn lock_kind(&self) -> LockKind {
        LockKind::Exclusive
    }
}

impl FromIterator<i32> for ExclusiveLockSet {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        let mut chain = SortedChain::new();
        chain.insert_batch(iter.into_iter().filter(|key| !is_reserved(*key)).collect());
        ExclusiveLockSet {
            chain: Mutex::new(chain),
        }
    }
}

impl fmt::Debug for ExclusiveLockSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("ExclusiveLockSet");
        match self.chain.try_lock() {
            Ok(chain) => d.field("keys", &*chain),
            Err(TryLockError::Poisoned(_)) => d.field("keys", &format_args!("<poisoned>")),
            Err(TryLockError::WouldBlock) => d.field("keys", &format_args!("<locked>")),
        };
        d.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SetError;
    use std::sync::Arc;
    use std::thread;

    fn poison(set: &Arc<ExclusiveLockSet>) {
        let set = Arc::clone(set);
        let result = thread::spawn(move || {
            let _chain = set.chain.lock().unwrap();
            panic!("panic while holding the set lock");
        })
        .join();
        assert!(result.is_err());
    }

    #[test]
    fn test_panic_poisons_and_releases_lock() {
        let set = Arc::new(ExclusiveLockSet::new());
        set.add(1).unwrap();
        poison(&set);

        assert!(set.is_poisoned());
        assert_eq!(
            set.add(2),
            Err(SetError::Poisoned {
                lock: LockKind::Exclusive
            })
        );
        assert_eq!(
            set.contains(1),
            Err(SetError::Poisoned {
                lock: LockKind::Exclusive
            })
        );

        // Poisoned, but nobody holds it.
        assert!(matches!(
            set.chain.try_lock(),
            Err(TryLockError::Poisoned(_))
        ));
    }

    #[test]
    fn test_clear_poison_restores_operations() {
        let set = Arc::new(ExclusiveLockSet::new());
        set.add_all([1, 2, 3]).unwrap();
        poison(&set);

        set.clear_poison().unwrap();
        assert!(!set.is_poisoned());
        assert_eq!(set.to_vec(), Ok(vec![1, 2, 3]));
        assert_eq!(set.add(4), Ok(true));
    }

    #[test]
    fn test_clear_poison_on_healthy_set() {
        let set = ExclusiveLockSet::new();
        assert_eq!(set.clear_poison(), Ok(()));
    }

    #[test]
    fn test_reserved_key_does_not_take_lock() {
        let set = ExclusiveLockSet::new();
        let _held = set.chain.lock().unwrap();
        // Would deadlock if the key check ran after acquisition.
        assert_eq!(set.add(i32::MIN), Err(SetError::ReservedKey { key: i32::MIN }));
        assert_eq!(
            set.remove(i32::MAX),
            Err(SetError::ReservedKey { key: i32::MAX })
        );
    }

    #[test]
    fn test_from_iter_skips_reserved() {
        let set: ExclusiveLockSet = [7, i32::MIN, 3, 7, i32::MAX].into_iter().collect();
        assert_eq!(set.to_vec(), Ok(vec![3, 7]));
        assert_eq!(format!("{:?}", set), "ExclusiveLockSet { keys: [3, 7] }");
    }

    #[test]
    fn test_debug_while_locked() {
        let set = ExclusiveLockSet::new();
        let _held = set.chain.lock().unwrap();
        assert_eq!(format!("{:?}", set), "ExclusiveLockSet { keys: <locked> }");
    }
}
