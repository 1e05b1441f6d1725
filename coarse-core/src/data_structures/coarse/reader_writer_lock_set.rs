use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

use super::{poisoned, validate_recovered};
use crate::data_structures::internal::{SortedChain, is_reserved};
use crate::data_structures::list_set::checked_keys;
use crate::data_structures::{ListSet, LockKind};
use crate::error::{SetResult, check_key};

///
/// Sorted list set guarded by a reader-writer lock.
///
/// `add`, `remove` and `add_all` hold the write lock and exclude everyone else.
/// `contains` and the other queries share the read lock, so any number of them
/// traverse the chain at the same time. A reader always sees the chain as left by
/// some prefix of completed writes; a node is never visible half-linked.
///
/// Whether a waiting writer blocks new readers is up to the platform `RwLock`.
///
pub struct ReaderWriterLockSet {
    chain: RwLock<SortedChain>,
}

impl ReaderWriterLockSet {
    pub fn new() -> Self {
        ReaderWriterLockSet {
            chain: RwLock::new(SortedChain::new()),
        }
    }

    fn read(&self) -> SetResult<RwLockReadGuard<'_, SortedChain>> {
        self.chain
            .read()
            .map_err(|_| poisoned(LockKind::ReaderWriter))
    }

    fn write(&self) -> SetResult<RwLockWriteGuard<'_, SortedChain>> {
        self.chain
            .write()
            .map_err(|_| poisoned(LockKind::ReaderWriter))
    }
}

impl Default for ReaderWriterLockSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ListSet for ReaderWriterLockSet {
    fn add(&self, key: i32) -> SetResult<bool> {
        let key = check_key(key)?;
        let mut chain = self.write()?;
        Ok(chain.insert(key))
    }

    fn remove(&self, key: i32) -> SetResult<bool> {
        let key = check_key(key)?;
        let mut chain = self.write()?;
        Ok(chain.remove(key))
    }

    fn contains(&self, key: i32) -> SetResult<bool> {
        let key = check_key(key)?;
        let chain = self.read()?;
        Ok(chain.contains(key))
    }

    fn len(&self) -> SetResult<usize> {
        Ok(self.read()?.len())
    }

    fn to_vec(&self) -> SetResult<Vec<i32>> {
        Ok(self.read()?.keys().collect())
    }

    fn add_all<I>(&self, keys: I) -> SetResult<usize>
    where
        I: IntoIterator<Item = i32>,
    {
        let keys = checked_keys(keys)?;
        let mut chain = self.write()?;
        Ok(chain.insert_batch(keys))
    }

    fn is_poisoned(&self) -> bool {
        self.chain.is_poisoned()
    }

    // Only writers can poison: a panicking reader leaves the flag alone.
    //
    fn clear_poison(&self) -> SetResult<()> {
        let chain = match self.chain.write() {
            Ok(_) => return Ok(()),
            Err(poison) => poison.into_inner(),
        };
        validate_recovered(LockKind::ReaderWriter, &chain)?;
        self.chain.clear_poison();
        Ok(())
    }

    fn lock_kind(&self) -> LockKind {
        LockKind::ReaderWriter
    }
}

impl FromIterator<i32> for ReaderWriterLockSet {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        let mut chain = SortedChain::new();
        chain.insert_batch(iter.into_iter().filter(|key| !is_reserved(*key)).collect());
        ReaderWriterLockSet {
            chain: RwLock::new(chain),
        }
    }
}

impl fmt::Debug for ReaderWriterLockSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("ReaderWriterLockSet");
        match self.chain.try_read() {
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
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_readers_share_the_lock() {
        let set = Arc::new(ReaderWriterLockSet::new());
        set.add_all(0..100).unwrap();

        let num_readers = 4;
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));
        let start = Arc::new(Barrier::new(num_readers));

        let handles: Vec<_> = (0..num_readers)
            .map(|_| {
                let set = Arc::clone(&set);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                let start = Arc::clone(&start);
                thread::spawn(move || {
                    start.wait();
                    let chain = set.chain.read().unwrap();
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);

                    // Stay in the read section until everyone arrived (or give up).
                    let deadline = Instant::now() + Duration::from_secs(5);
                    while inside.load(Ordering::SeqCst) < num_readers && Instant::now() < deadline {
                        thread::yield_now();
                    }
                    max_inside.fetch_max(inside.load(Ordering::SeqCst), Ordering::SeqCst);
                    assert!(chain.contains(42));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), num_readers);
    }

    #[test]
    fn test_writer_excludes_readers() {
        let set = Arc::new(ReaderWriterLockSet::new());
        let chain = set.chain.write().unwrap();
        assert!(matches!(
            set.chain.try_read(),
            Err(TryLockError::WouldBlock)
        ));
        drop(chain);
        assert_eq!(set.contains(1), Ok(false));
    }

    #[test]
    fn test_panicking_writer_poisons() {
        let set = Arc::new(ReaderWriterLockSet::new());
        set.add_all([10, 20]).unwrap();

        let writer = Arc::clone(&set);
        let result = thread::spawn(move || {
            let _chain = writer.chain.write().unwrap();
            panic!("panic while holding the write lock");
        })
        .join();
        assert!(result.is_err());

        let expected = Err(SetError::Poisoned {
            lock: LockKind::ReaderWriter,
        });
        assert_eq!(set.contains(10), expected);
        assert_eq!(set.remove(10), expected);

        // Released: a writer on another thread gets through try_write.
        let probe = Arc::clone(&set);
        let released = thread::spawn(move || {
            matches!(probe.chain.try_write(), Err(TryLockError::Poisoned(_)))
        })
        .join()
        .unwrap();
        assert!(released);

        set.clear_poison().unwrap();
        assert_eq!(set.to_vec(), Ok(vec![10, 20]));
    }

    #[test]
    fn test_panicking_reader_does_not_poison() {
        let set = Arc::new(ReaderWriterLockSet::new());
        let reader = Arc::clone(&set);
        let result = thread::spawn(move || {
            let _chain = reader.chain.read().unwrap();
            panic!("panic while holding the read lock");
        })
        .join();
        assert!(result.is_err());

        assert!(!set.is_poisoned());
        assert_eq!(set.add(1), Ok(true));
    }

    #[test]
    fn test_clear_poison_rejects_corrupted_chain() {
        let set = Arc::new(ReaderWriterLockSet::new());
        set.add_all([1, 2, 3]).unwrap();

        let writer = Arc::clone(&set);
        let _ = thread::spawn(move || {
            let mut chain = writer.chain.write().unwrap();
            // Simulates a writer dying between the link update and the count update.
            chain.insert_batch(vec![4]);
            chain.corrupt_len_for_test();
            panic!("panic mid-update");
        })
        .join();

        assert!(matches!(
            set.clear_poison(),
            Err(SetError::Corrupted {
                lock: LockKind::ReaderWriter,
                ..
            })
        ));
        assert!(set.is_poisoned());
    }

    #[test]
    fn test_debug_formats() {
        let set: ReaderWriterLockSet = [2, 1].into_iter().collect();
        assert_eq!(format!("{:?}", set), "ReaderWriterLockSet { keys: [1, 2] }");

        let _held = set.chain.write().unwrap();
        assert_eq!(format!("{:?}", set), "ReaderWriterLockSet { keys: <locked> }");
    }
}
