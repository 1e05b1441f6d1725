use std::fmt;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::queue::SegQueue;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::WorkloadConfig;
use crate::data_structures::{ListSet, LockKind};
use crate::error::SetResult;

/// Outcome of one [`run_workload`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadReport {
    pub lock: LockKind,
    pub threads: usize,
    pub contains_ops: usize,
    /// `contains` calls that found their key.
    pub contains_hits: usize,
    pub add_ops: usize,
    /// `add` calls that returned `true`.
    pub inserted: usize,
    pub remove_ops: usize,
    /// `remove` calls that returned `true`.
    pub removed: usize,
    /// Set size after prefill, before the timed section.
    pub initial_len: usize,
    pub final_len: usize,
    pub elapsed: Duration,
}

impl WorkloadReport {
    pub fn total_ops(&self) -> usize {
        self.contains_ops + self.add_ops + self.remove_ops
    }

    /// Operations per second over the timed section.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.total_ops() as f64 / secs
    }

    /// No update was lost: every successful add and remove shows up in the final size.
    pub fn is_consistent(&self) -> bool {
        self.initial_len + self.inserted == self.final_len + self.removed
    }
}

impl fmt::Display for WorkloadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x{}: {} ops in {:?} ({:.0} ops/s), contains {}/{} hit, add {}/{}, remove {}/{}, len {} -> {}",
            self.lock,
            self.threads,
            self.total_ops(),
            self.elapsed,
            self.throughput(),
            self.contains_hits,
            self.contains_ops,
            self.inserted,
            self.add_ops,
            self.removed,
            self.remove_ops,
            self.initial_len,
            self.final_len
        )
    }
}

// Per-worker counters, merged after all workers joined.
//
#[derive(Debug, Default, Clone, Copy)]
struct WorkerTally {
    contains_ops: usize,
    contains_hits: usize,
    add_ops: usize,
    inserted: usize,
    remove_ops: usize,
    removed: usize,
}

impl WorkerTally {
    fn merge(&mut self, other: WorkerTally) {
        self.contains_ops += other.contains_ops;
        self.contains_hits += other.contains_hits;
        self.add_ops += other.add_ops;
        self.inserted += other.inserted;
        self.remove_ops += other.remove_ops;
        self.removed += other.removed;
    }
}

fn run_worker<S>(set: &S, config: &WorkloadConfig, seed: u64) -> SetResult<WorkerTally>
where
    S: ListSet + ?Sized,
{
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tally = WorkerTally::default();
    let max_key = config.key_range as i32;

    for _ in 0..config.ops_per_thread {
        let key = rng.random_range(1..=max_key);
        let roll = rng.random_range(0..100u8);

        if roll < config.read_percent {
            tally.contains_ops += 1;
            if set.contains(key)? {
                tally.contains_hits += 1;
            }
        } else if (roll - config.read_percent) % 2 == 0 {
            tally.add_ops += 1;
            if set.add(key)? {
                tally.inserted += 1;
            }
        } else {
            tally.remove_ops += 1;
            if set.remove(key)? {
                tally.removed += 1;
            }
        }
    }

    Ok(tally)
}

// `prefill` distinct keys out of 1..=key_range, in O(prefill) memory.
// `validate` guarantees prefill <= key_range < i32::MAX.
//
fn prefill_keys(config: &WorkloadConfig) -> Vec<i32> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    index::sample(&mut rng, config.key_range, config.prefill)
        .into_iter()
        .map(|i| i as i32 + 1)
        .collect()
}

/// Prefills `set`, then runs `config.threads` workers against it concurrently.
///
/// Workers start together behind a barrier; only the section between the barrier
/// and the last join is timed. The first error any worker hit is returned. If a
/// worker panics, the remaining workers are still joined and the first panic is
/// then re-raised on the calling thread.
///
pub fn run_workload<S>(set: Arc<S>, config: &WorkloadConfig) -> SetResult<WorkloadReport>
where
    S: ListSet + 'static,
{
    config.validate()?;

    set.add_all(prefill_keys(config))?;
    let initial_len = set.len()?;
    debug!(lock = %set.lock_kind(), initial_len, "workload prefilled");

    let start_gate = Arc::new(Barrier::new(config.threads + 1));
    let tallies = Arc::new(SegQueue::new());

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let set = Arc::clone(&set);
            let start_gate = Arc::clone(&start_gate);
            let tallies = Arc::clone(&tallies);
            let config = config.clone();
            thread::spawn(move || {
                start_gate.wait();
                let seed = config.seed.wrapping_add(t as u64 + 1);
                tallies.push(run_worker(&*set, &config, seed));
            })
        })
        .collect();

    start_gate.wait();
    let started = Instant::now();
    let mut first_panic = None;
    for handle in handles {
        if let Err(payload) = handle.join() {
            first_panic.get_or_insert(payload);
        }
    }
    let elapsed = started.elapsed();
    if let Some(payload) = first_panic {
        std::panic::resume_unwind(payload);
    }

    let mut total = WorkerTally::default();
    while let Some(tally) = tallies.pop() {
        total.merge(tally?);
    }

    let report = WorkloadReport {
        lock: set.lock_kind(),
        threads: config.threads,
        contains_ops: total.contains_ops,
        contains_hits: total.contains_hits,
        add_ops: total.add_ops,
        inserted: total.inserted,
        remove_ops: total.remove_ops,
        removed: total.removed,
        initial_len,
        final_len: set.len()?,
        elapsed,
    };
    info!(
        lock = %report.lock,
        threads = report.threads,
        ops = report.total_ops(),
        elapsed_us = report.elapsed.as_micros() as u64,
        throughput = report.throughput(),
        "workload finished"
    );

    Ok(report)
}
