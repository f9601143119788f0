use std::collections::VecDeque;
use std::time::Instant;

use serde::Serialize;

const WINDOW_SIZE: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimingStats {
    pub last_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub min_us: u64,
    pub max_us: u64,
    pub count: usize,
}

/// Rolling window of query recomputation times.
#[derive(Debug, Default)]
pub struct QueryTimer {
    samples: VecDeque<u64>,
}

impl QueryTimer {
    pub fn new() -> Self {
        Self { samples: VecDeque::with_capacity(WINDOW_SIZE) }
    }

    /// Runs `f`, records how long it took, and returns its result.
    pub fn time<T>(&mut self, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.record(start.elapsed().as_micros() as u64);
        out
    }

    pub fn record(&mut self, us: u64) {
        if self.samples.len() >= WINDOW_SIZE {
            self.samples.pop_front();
        }
        self.samples.push_back(us);
    }

    pub fn stats(&self) -> TimingStats {
        if self.samples.is_empty() {
            return TimingStats::default();
        }
        let last_us = self.samples.back().copied().unwrap_or(0);
        let mut sorted: Vec<u64> = self.samples.iter().copied().collect();
        sorted.sort_unstable();
        let n = sorted.len();
        TimingStats {
            last_us,
            p50_us: sorted[n * 50 / 100],
            p95_us: sorted[n * 95 / 100],
            p99_us: sorted[(n * 99 / 100).min(n - 1)],
            min_us: sorted[0],
            max_us: sorted[n - 1],
            count: n,
        }
    }
}
