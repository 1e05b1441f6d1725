pub mod common_tests;
pub mod data_structures;
pub mod error;
pub mod workload;

// Re-export the set types for convenience
pub use data_structures::{ExclusiveLockSet, ListSet, LockKind, ReaderWriterLockSet};
pub use error::{SetError, SetResult};
pub use workload::{WorkloadConfig, WorkloadReport, run_workload};

/*

cargo bench --package coarse-core --bench coarse_set_benchmark

cargo llvm-cov --html

*/
