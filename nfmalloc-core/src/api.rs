//! The API of nfmalloc-core.

mod configuration;
mod description;
mod heap;
mod region;

pub use configuration::{Configuration, DefaultConfiguration, Properties};
pub use description::{BlockInfo, BlockRef, OutOfMemory, PowerOf2, ReallocOutcome, Statistics};
pub use description::{ALIGNMENT, MAXIMUM_BLOCK_SIZE, MAXIMUM_HEAP_SIZE, MINIMUM_BLOCK_SIZE, OVERHEAD};
pub use description::WORD_SIZE;
pub use heap::Heap;
pub use region::{Region, VecRegion};
