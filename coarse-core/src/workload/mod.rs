//! Throughput driver for [`ListSet`](crate::ListSet) implementations.
//!
//! Runs the same seeded mix of `contains` / `add` / `remove` against any set so
//! the exclusive and reader-writer locks can be compared on identical work.

pub mod config;
pub mod runner;

pub use config::WorkloadConfig;
pub use runner::{WorkloadReport, run_workload};
