use crate::error::{SetError, SetResult};

/// Shape of a throughput run against a [`ListSet`](crate::ListSet).
///
/// Keys are drawn from `1..=key_range`, which never reaches a sentinel as long as
/// [`validate`](Self::validate) passes.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadConfig {
    /// Worker threads released together through a barrier.
    pub threads: usize,
    /// Operations each worker performs.
    pub ops_per_thread: usize,
    /// Upper bound of the key space.
    pub key_range: usize,
    /// Share of `contains` calls, 0-100. The rest is split evenly between add and remove.
    pub read_percent: u8,
    /// Distinct keys inserted before the timed section.
    pub prefill: usize,
    /// Base seed; worker `t` uses `seed + t`.
    pub seed: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        WorkloadConfig {
            threads: 4,
            ops_per_thread: 10_000,
            key_range: 1_000,
            read_percent: 80,
            prefill: 500,
            seed: 0x5eed,
        }
    }
}

impl WorkloadConfig {
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_ops_per_thread(mut self, ops_per_thread: usize) -> Self {
        self.ops_per_thread = ops_per_thread;
        self
    }

    pub fn with_key_range(mut self, key_range: usize) -> Self {
        self.key_range = key_range;
        self
    }

    pub fn with_read_percent(mut self, read_percent: u8) -> Self {
        self.read_percent = read_percent;
        self
    }

    pub fn with_prefill(mut self, prefill: usize) -> Self {
        self.prefill = prefill;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn total_ops(&self) -> usize {
        self.threads * self.ops_per_thread
    }

    pub fn validate(&self) -> SetResult<()> {
        if self.threads == 0 {
            return Err(SetError::InvalidConfig("threads must be at least 1".into()));
        }
        if self.key_range == 0 {
            return Err(SetError::InvalidConfig("key_range must be at least 1".into()));
        }
        // 1..=key_range has to stay below the tail sentinel.
        if self.key_range >= i32::MAX as usize {
            return Err(SetError::InvalidConfig(format!(
                "key_range {} overlaps the tail sentinel",
                self.key_range
            )));
        }
        if self.read_percent > 100 {
            return Err(SetError::InvalidConfig(format!(
                "read_percent {} exceeds 100",
                self.read_percent
            )));
        }
        if self.prefill > self.key_range {
            return Err(SetError::InvalidConfig(format!(
                "prefill {} exceeds key_range {}",
                self.prefill, self.key_range
            )));
        }
        Ok(())
    }
}
