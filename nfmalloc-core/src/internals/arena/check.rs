//! Consistency checks.
//!
//! Diagnostic only: never invoked by the allocation, release, or reallocation paths.

use crate::{Configuration, Region, ALIGNMENT, MINIMUM_BLOCK_SIZE};

use super::{super::tag::Tag, Arena};

impl<C, R> Arena<C, R>
    where
        C: Configuration,
        R: Region,
{
    /// Walks all blocks, from the prologue to the epilogue, and returns whether the heap is consistent.
    ///
    /// The first inconsistency found, if any, is reported as a warning.
    pub(crate) fn check(&self) -> bool {
        match self.find_inconsistency() {
            None => true,
            Some(inconsistency) => {
                tracing::warn!(%inconsistency, "heap inconsistency");
                false
            },
        }
    }

    //  Returns the first inconsistency, if any.
    fn find_inconsistency(&self) -> Option<Inconsistency> {
        let (start, prologue, first) = match (self.start, self.prologue(), self.first()) {
            (Some(start), Some(prologue), Some(first)) => (start, prologue, first),
            _ => return Some(Inconsistency::Uninitialized),
        };

        let memory = self.region.memory();
        let hi = self.region.hi();

        if memory.len() != hi || first.offset() > hi {
            return Some(Inconsistency::Truncated { hi });
        }

        let prologue_tag = prologue.tag(memory);

        if prologue_tag != Tag::new(ALIGNMENT.value(), true) || prologue.footer_tag(memory) != prologue_tag {
            return Some(Inconsistency::Prologue);
        }

        let mut block = first;
        let mut previous_free = false;
        let mut cursor_found = false;

        loop {
            if block.header() < start || block.offset() > hi {
                return Some(Inconsistency::OutOfBounds { block: block.offset() });
            }

            cursor_found |= block == self.cursor;

            let tag = block.tag(memory);

            if tag.size() == 0 {
                break;
            }

            if tag.has_stray_bits() {
                return Some(Inconsistency::Misaligned { block: block.offset() });
            }

            if tag.size() < MINIMUM_BLOCK_SIZE {
                return Some(Inconsistency::Undersized { block: block.offset(), size: tag.size() });
            }

            //  The successor's header must lie within the region, and therefore so does the footer.
            if block.offset() + tag.size() > hi {
                return Some(Inconsistency::OutOfBounds { block: block.offset() + tag.size() });
            }

            if block.footer_tag(memory) != tag {
                return Some(Inconsistency::MismatchedFooter { block: block.offset() });
            }

            //  Both free: coalescing was missed.
            if previous_free && tag.is_free() {
                return Some(Inconsistency::AdjacentFree { block: block.offset() });
            }

            previous_free = tag.is_free();

            let next = block.next(memory);

            if next <= block {
                return Some(Inconsistency::Overlap { block: block.offset() });
            }

            block = next;
        }

        if !block.is_allocated(memory) || block.offset() != hi {
            return Some(Inconsistency::Epilogue { block: block.offset(), hi });
        }

        if !cursor_found {
            return Some(Inconsistency::Cursor { cursor: self.cursor.offset() });
        }

        None
    }
}

//  An inconsistency, as detected by `check`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Inconsistency {
    Uninitialized,
    Truncated { hi: usize },
    Prologue,
    OutOfBounds { block: usize },
    Misaligned { block: usize },
    Undersized { block: usize, size: usize },
    MismatchedFooter { block: usize },
    AdjacentFree { block: usize },
    Overlap { block: usize },
    Epilogue { block: usize, hi: usize },
    Cursor { cursor: usize },
}

impl core::fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use Inconsistency::*;

        match *self {
            Uninitialized => write!(f, "heap is not initialized"),
            Truncated { hi } => write!(f, "region truncated at {}", hi),
            Prologue => write!(f, "prologue overwritten"),
            OutOfBounds { block } => write!(f, "block {} lies outside the region", block),
            Misaligned { block } =>
                write!(f, "block {} has a size which is not a multiple of {}", block, ALIGNMENT.value()),
            Undersized { block, size } =>
                write!(f, "block {} has size {}, less than {}", block, size, MINIMUM_BLOCK_SIZE),
            MismatchedFooter { block } => write!(f, "block {} has mismatched header and footer", block),
            AdjacentFree { block } => write!(f, "block {} is free, and so is its predecessor", block),
            Overlap { block } => write!(f, "block {} does not advance", block),
            Epilogue { block, hi } => write!(f, "epilogue found at {}, expected at {}", block, hi),
            Cursor { cursor } => write!(f, "cursor {} is not on a block boundary", cursor),
        }
    }
}
