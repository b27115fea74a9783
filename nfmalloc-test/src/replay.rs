//! Replay of a `Trace` against a `Heap`.
//!
//! Each live block is filled with a pattern unique to its id; the pattern is verified whenever the block is
//! reallocated or released, and for all live blocks at the end. This catches overlapping blocks, as well as
//! reallocations failing to preserve their content. The heap is checked after each operation.

use std::{cmp, error, fmt};

use nfmalloc_core::{BlockRef, Configuration, Heap, ReallocOutcome, Region, Statistics};

use super::{Operation, Trace};

/// Summary of a successful replay.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Replay {
    /// Number of operations replayed.
    pub operations: usize,
    /// Largest total of bytes requested by live blocks, at any point.
    pub peak_requested: usize,
    /// Statistics of the heap, once all operations are replayed.
    pub statistics: Statistics,
}

impl Replay {
    /// Returns the ratio of the peak of bytes requested to the size of the region.
    pub fn utilization(&self) -> f64 {
        if self.statistics.region_bytes == 0 {
            return 0.0;
        }

        self.peak_requested as f64 / self.statistics.region_bytes as f64
    }
}

/// Failure of a replay.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReplayError {
    /// The heap could not satisfy an allocation or reallocation.
    OutOfMemory {
        /// Index of the operation.
        step: usize,
    },
    /// The operation referred to an id which is not live.
    UnknownId {
        /// Index of the operation.
        step: usize,
        /// Id referred to.
        id: usize,
    },
    /// The payload of a live block was overwritten.
    Corrupted {
        /// Index of the operation.
        step: usize,
        /// Id of the block whose payload was overwritten.
        id: usize,
    },
    /// The heap failed its consistency check.
    Inconsistent {
        /// Index of the operation.
        step: usize,
    },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ReplayError::OutOfMemory { step } => write!(f, "out of memory at step {}", step),
            ReplayError::UnknownId { step, id } => write!(f, "unknown id {} at step {}", id, step),
            ReplayError::Corrupted { step, id } => write!(f, "payload of {} corrupted at step {}", id, step),
            ReplayError::Inconsistent { step } => write!(f, "heap inconsistent after step {}", step),
        }
    }
}

impl error::Error for ReplayError {}

/// Replays `trace` against `heap`.
///
/// Allocating an id which is already live first releases it, as does a reallocation to 0 bytes. Reallocating an id
/// which is not live allocates it.
pub fn replay<C, R>(heap: &mut Heap<C, R>, trace: &Trace) -> Result<Replay, ReplayError>
    where
        C: Configuration,
        R: Region,
{
    let mut live: Vec<Option<Live>> = vec![None; trace.ids()];
    let mut requested = 0;
    let mut peak_requested = 0;

    for (step, operation) in trace.operations().iter().enumerate() {
        tracing::trace!(step, %operation, "replay");

        match *operation {
            Operation::Allocate { id, size } => {
                if let Some(previous) = live[id].take() {
                    previous.verify(heap, id, step)?;
                    heap.release(previous.block);
                    requested -= previous.size;
                }

                if size > 0 {
                    let block = heap.allocate(size).ok_or(ReplayError::OutOfMemory { step })?;
                    let allocated = Live { block, size };

                    allocated.fill(heap, id);
                    live[id] = Some(allocated);
                    requested += size;
                }
            },
            Operation::Release { id } => {
                let previous = live[id].take().ok_or(ReplayError::UnknownId { step, id })?;

                previous.verify(heap, id, step)?;
                heap.release(previous.block);
                requested -= previous.size;
            },
            Operation::Reallocate { id, size } => {
                let previous = live[id].take();

                if let Some(previous) = previous {
                    previous.verify(heap, id, step)?;
                }

                match heap.reallocate(previous.map(|p| p.block), size) {
                    ReallocOutcome::NewRef(block) => {
                        let preserved = previous.map_or(0, |p| cmp::min(p.size, size));
                        let reallocated = Live { block, size };

                        if !reallocated.is_filled(heap, id, preserved) {
                            return Err(ReplayError::Corrupted { step, id });
                        }

                        reallocated.fill(heap, id);
                        live[id] = Some(reallocated);
                        requested += size;
                    },
                    ReallocOutcome::Unusable => (),
                    //  Zero-sized reallocation of a block which is not live.
                    ReallocOutcome::Failed if size == 0 && previous.is_none() => (),
                    ReallocOutcome::Failed => {
                        live[id] = previous;
                        return Err(ReplayError::OutOfMemory { step });
                    },
                }

                requested -= previous.map_or(0, |p| p.size);
            },
        }

        peak_requested = cmp::max(peak_requested, requested);

        if !heap.check() {
            return Err(ReplayError::Inconsistent { step });
        }
    }

    let operations = trace.len();

    for (id, block) in live.iter().enumerate() {
        if let Some(block) = block {
            block.verify(heap, id, operations)?;
        }
    }

    Ok(Replay { operations, peak_requested, statistics: heap.statistics() })
}

//
//  Implementation
//

#[derive(Clone, Copy, Debug)]
struct Live {
    block: BlockRef,
    size: usize,
}

impl Live {
    fn fill<C, R>(&self, heap: &mut Heap<C, R>, id: usize)
        where
            C: Configuration,
            R: Region,
    {
        for (index, byte) in heap.payload_mut(self.block)[..self.size].iter_mut().enumerate() {
            *byte = pattern(id, index);
        }
    }

    fn is_filled<C, R>(&self, heap: &Heap<C, R>, id: usize, length: usize) -> bool
        where
            C: Configuration,
            R: Region,
    {
        heap.payload(self.block)[..length].iter().enumerate().all(|(index, byte)| *byte == pattern(id, index))
    }

    fn verify<C, R>(&self, heap: &Heap<C, R>, id: usize, step: usize) -> Result<(), ReplayError>
        where
            C: Configuration,
            R: Region,
    {
        if self.is_filled(heap, id, self.size) { Ok(()) } else { Err(ReplayError::Corrupted { step, id }) }
    }
}

fn pattern(id: usize, index: usize) -> u8 { (id.wrapping_mul(0x9E) ^ index.wrapping_mul(7)) as u8 }
