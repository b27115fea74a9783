#![deny(missing_docs)]

//! Test utilities for nfmalloc.
//!
//! -   `Trace`, a sequence of allocation requests, either built by hand with a `TraceBuilder`, parsed from the
//!     classic malloc-lab format, or generated at random.
//! -   `replay`, which runs a `Trace` against a `Heap`, verifying the payloads and the consistency of the heap after
//!     each step.
//! -   `init_tracing`, to see the heap's traces in tests, filtered by `RUST_LOG`.

mod random;
mod replay;
mod trace;

pub use random::{random_trace, RandomTraceBuilder};
pub use replay::{replay, Replay, ReplayError};
pub use trace::{Operation, ParseError, Trace, TraceBuilder};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a subscriber printing the traces to the test output, filtered by `RUST_LOG`.
///
/// May be called any number of times; only the first call has any effect.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .with(EnvFilter::from_default_env())
        .try_init();
}
