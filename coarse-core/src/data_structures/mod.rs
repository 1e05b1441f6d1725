//! Data structures for the locked list sets.
//!
//! # Organization
//!
//! - [`coarse`] - Lock-guarded sets (ExclusiveLockSet, ReaderWriterLockSet)
//! - [`list_set`] - The `ListSet` contract both sets implement
//! - [`internal`] - The sentinel-bounded sorted chain the locks protect

pub mod coarse;
pub mod internal;
pub mod list_set;

pub use coarse::{ExclusiveLockSet, ReaderWriterLockSet};
pub use internal::{HEAD_KEY, TAIL_KEY};
pub use list_set::{ListSet, LockKind};
