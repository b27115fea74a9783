//! Random traces.

use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{Trace, TraceBuilder};

/// Generates a random trace of `operations` operations, requesting up to `max_size` bytes at a time.
///
/// The same `seed` always generates the same trace.
pub fn random_trace(seed: u64, operations: usize, max_size: usize) -> Trace {
    RandomTraceBuilder::new(seed).operations(operations).max_size(max_size).build()
}

/// Builder of random traces.
///
/// All blocks still live after `operations` operations are released at the end of the trace, hence the trace holds
/// more operations than requested.
#[derive(Clone, Debug)]
pub struct RandomTraceBuilder {
    seed: u64,
    operations: usize,
    max_size: usize,
    release_ratio: f64,
    reallocate_ratio: f64,
}

impl RandomTraceBuilder {
    /// Creates a builder, for 1000 operations of up to 4096 bytes.
    pub fn new(seed: u64) -> Self {
        Self { seed, operations: 1_000, max_size: 4_096, release_ratio: 0.3, reallocate_ratio: 0.2 }
    }

    /// Sets the number of operations.
    pub fn operations(&mut self, operations: usize) -> &mut Self {
        self.operations = operations;
        self
    }

    /// Sets the maximum number of bytes requested by a single operation.
    ///
    /// #   Panics
    ///
    /// If `max_size` is 0.
    pub fn max_size(&mut self, max_size: usize) -> &mut Self {
        assert!(max_size > 0, "Cannot generate requests of 0 bytes at most");

        self.max_size = max_size;
        self
    }

    /// Sets the probability of each operation to be a release, and a reallocation, respectively.
    ///
    /// #   Panics
    ///
    /// If either is negative, or their sum exceeds 1.
    pub fn ratios(&mut self, release: f64, reallocate: f64) -> &mut Self {
        assert!(release >= 0.0 && reallocate >= 0.0 && release + reallocate <= 1.0,
            "Invalid ratios: {} and {}", release, reallocate);

        self.release_ratio = release;
        self.reallocate_ratio = reallocate;
        self
    }

    /// Generates the trace.
    pub fn build(&self) -> Trace {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut builder = TraceBuilder::new();

        let mut live: Vec<usize> = Vec::new();
        let mut next_id = 0;

        for _ in 0..self.operations {
            let size = rng.random_range(1..=self.max_size);
            let dice: f64 = rng.random();

            if live.is_empty() || dice >= self.release_ratio + self.reallocate_ratio {
                builder.allocate(next_id, size);
                live.push(next_id);
                next_id += 1;
            } else if dice < self.release_ratio {
                let index = rng.random_range(0..live.len());
                builder.release(live.swap_remove(index));
            } else {
                let index = rng.random_range(0..live.len());
                builder.reallocate(live[index], size);
            }
        }

        for id in live {
            builder.release(id);
        }

        builder.build()
    }
}
