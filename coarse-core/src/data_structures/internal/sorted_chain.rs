use std::fmt;

/// Key stored in the head sentinel (logical minus-infinity).
pub const HEAD_KEY: i32 = i32::MIN;

/// Key stored in the tail sentinel (logical plus-infinity).
pub const TAIL_KEY: i32 = i32::MAX;

type Link = Option<Box<ChainNode>>;

///
/// Sentinel-bounded sorted singly-linked list shared by every locked set.
///
/// The chain carries no synchronization of its own. Callers own it through a lock
/// and hand out `&SortedChain` for queries and `&mut SortedChain` for mutations, so
/// the borrow checker enforces that nothing touches it outside the lock.
///
// Layout (sorted ascending, sentinels are permanent):
// ┌──────┐    ┌──────┐    ┌──────┐    ┌──────┐
// │ HEAD │───►│  3   │───►│  5   │───►│ TAIL │───► None
// │ MIN  │    │      │    │      │    │ MAX  │
// └──────┘    └──────┘    └──────┘    └──────┘
//
// Every link is a `Box`: the predecessor is the single owner of its successor.
// Unlinking a node moves it out of its predecessor and drops it, nothing else
// can still reference it.
//
// Traversal for key k stops at the first node with key >= k. TAIL.key is i32::MAX
// and legal keys are strictly smaller, so the walk never runs past TAIL.
//
pub struct SortedChain {
    head: Box<ChainNode>,
    len: usize,
}

#[derive(Debug)]
struct ChainNode {
    key: i32,
    next: Link,
}

/// Returns `true` for the two keys owned by the sentinels.
#[inline]
pub fn is_reserved(key: i32) -> bool {
    key == HEAD_KEY || key == TAIL_KEY
}

// Advances `link` while the node it owns has a key below `key`.
// The returned link owns the first node with key >= `key` (`curr`); the caller
// sits at `pred.next`, which is exactly where insert and unlink happen.
//
fn seek_mut(mut link: &mut Link, key: i32) -> &mut Link {
    while link.as_ref().is_some_and(|curr| curr.key < key) {
        // Cannot fail: the loop condition just saw `Some`.
        link = &mut link
            .as_mut()
            .expect("loop condition observed an occupied link")
            .next;
    }
    link
}

impl SortedChain {
    pub fn new() -> Self {
        let tail = Box::new(ChainNode {
            key: TAIL_KEY,
            next: None,
        });
        SortedChain {
            head: Box::new(ChainNode {
                key: HEAD_KEY,
                next: Some(tail),
            }),
            len: 0,
        }
    }

    /// Read-only traversal: first node with key >= `key`.
    fn find(&self, key: i32) -> Option<&ChainNode> {
        let mut curr = self.head.next.as_deref();
        while let Some(node) = curr {
            if node.key >= key {
                break;
            }
            curr = node.next.as_deref();
        }
        curr
    }

    pub fn contains(&self, key: i32) -> bool {
        self.find(key).is_some_and(|curr| curr.key == key)
    }

    /// Links a new node for `key` between `pred` and `curr`.
    ///
    /// Returns `false` without touching the chain if the key is already present.
    ///
    pub fn insert(&mut self, key: i32) -> bool {
        let link = seek_mut(&mut self.head.next, key);
        if link.as_ref().is_some_and(|curr| curr.key == key) {
            return false;
        }

        let next = link.take();
        *link = Some(Box::new(ChainNode { key, next }));
        self.len += 1;
        true
    }

    /// Unlinks the node holding `key`, dropping it.
    ///
    pub fn remove(&mut self, key: i32) -> bool {
        let link = seek_mut(&mut self.head.next, key);
        match link.take() {
            Some(mut curr) if curr.key == key => {
                *link = curr.next.take();
                self.len -= 1;
                true
            }
            curr => {
                *link = curr;
                false
            }
        }
    }

    /// Inserts every key in one forward pass.
    ///
    /// Keys are sorted first so each insert resumes from the previous insertion
    /// point instead of restarting at HEAD. Returns the number of new keys.
    ///
    pub fn insert_batch(&mut self, mut keys: Vec<i32>) -> usize {
        keys.sort_unstable();
        keys.dedup();

        let mut inserted = 0;
        let mut link = &mut self.head.next;
        for key in keys {
            link = seek_mut(link, key);
            if link.as_ref().is_some_and(|curr| curr.key == key) {
                continue;
            }
            let next = link.take();
            *link = Some(Box::new(ChainNode { key, next }));
            inserted += 1;
        }

        self.len += inserted;
        inserted
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Data keys in ascending order, sentinels excluded.
    pub fn keys(&self) -> Keys<'_> {
        Keys {
            next: self.head.next.as_deref(),
        }
    }

    /// Walks the whole chain and checks the structural invariant.
    ///
    /// Used after a panic poisoned the owning lock, to decide whether the chain
    /// can be trusted again.
    ///
    pub fn validate(&self) -> Result<(), String> {
        if self.head.key != HEAD_KEY {
            return Err(format!("head sentinel holds {}", self.head.key));
        }

        let mut count = 0;
        let mut prev = self.head.key;
        let mut curr = self.head.next.as_deref();
        while let Some(node) = curr {
            if node.key <= prev {
                return Err(format!("key {} follows key {}", node.key, prev));
            }
            if node.next.is_none() {
                if node.key != TAIL_KEY {
                    return Err(format!("chain ends at key {} instead of tail", node.key));
                }
                return if count == self.len {
                    Ok(())
                } else {
                    Err(format!("counted {} keys, recorded {}", count, self.len))
                };
            }
            count += 1;
            prev = node.key;
            curr = node.next.as_deref();
        }

        Err("tail sentinel is unreachable".to_string())
    }

    #[cfg(test)]
    pub(crate) fn corrupt_len_for_test(&mut self) {
        self.len += 1;
    }
}

impl Default for SortedChain {
    fn default() -> Self {
        Self::new()
    }
}

// Dropping the head recursively would recurse once per node.
//
impl Drop for SortedChain {
    fn drop(&mut self) {
        let mut link = self.head.next.take();
        while let Some(mut node) = link {
            link = node.next.take();
        }
    }
}

impl fmt::Debug for SortedChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

/// Iterator over the data keys of a [`SortedChain`].
pub struct Keys<'a> {
    next: Option<&'a ChainNode>,
}

impl Iterator for Keys<'_> {
    type Item = i32;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        // Tail is the only node without a successor.
        if node.next.is_none() {
            return None;
        }
        self.next = node.next.as_deref();
        Some(node.key)
    }
}
