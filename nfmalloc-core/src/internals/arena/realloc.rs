//! Reallocation.
//!
//! Copying the payload is the dominant cost of growing a large block, hence the reallocation attempts, in order:
//!
//! 1.  To absorb a free successor, if together they are large enough; the excess is split off again.
//! 2.  To shrink in place, if the block is the last one, splitting off the excess.
//! 3.  To grow the region, if the block is the last one, or only followed by a free block which is the last one.
//! 4.  And only then, to allocate a new block, copy the payload, and release the original block.
//!
//! A block followed by an allocated block is moved even when shrinking.

use core::cmp;

use crate::{Configuration, Properties, ReallocOutcome, Region, WORD_SIZE};

use super::{Arena, Block};

impl<C, R> Arena<C, R>
    where
        C: Configuration,
        R: Region,
{
    /// Resizes `block` to hold `requested` bytes, preserving the payload up to the smaller of the two capacities.
    ///
    /// -   If `block` is None, equivalent to `allocate`.
    /// -   If `requested` is 0, equivalent to `release`, and the outcome is `Unusable`.
    ///
    /// On failure, `block` is left untouched, and still allocated.
    pub(crate) fn reallocate(&mut self, block: Option<Block>, requested: usize) -> ReallocOutcome {
        let block = match block {
            Some(block) => block,
            None => return Self::outcome(self.allocate(requested)),
        };

        if requested == 0 {
            self.release(block);
            return ReallocOutcome::Unusable;
        }

        let size = match Properties::<C>::adjust_size(requested) {
            Some(size) => size,
            None => return ReallocOutcome::Failed,
        };

        let memory = self.region.memory();

        debug_assert!(block.is_allocated(memory), "Reallocating free {:?}", block);

        let current = block.size(memory);
        let next = block.next(memory);
        let next_size = next.size(memory);
        let next_free = !next.is_allocated(memory);
        let combined = current + next_size;

        if next_free && combined >= size {
            tracing::debug!(block = block.offset(), current, size, "reallocate: merging with successor");

            block.mark(self.region.memory_mut(), combined, true);
            self.repair_cursor(block, combined);
            self.place(block, size);

            return ReallocOutcome::NewRef(block.into_ref());
        }

        let last = next.is_epilogue(memory);

        if last && size <= current {
            tracing::debug!(block = block.offset(), current, size, "reallocate: shrinking");

            self.place(block, size);

            return ReallocOutcome::NewRef(block.into_ref());
        }

        let grown = if next_free && next.next(memory).is_epilogue(memory) {
            self.grow_in_place(block, size - combined)
        } else if last {
            self.grow_in_place(block, size - current)
        } else {
            None
        };

        if let Some(block) = grown {
            return ReallocOutcome::NewRef(block.into_ref());
        }

        self.move_to_new_block(block, size, requested)
    }

    //  Grows the region by `shortfall` bytes, and folds the new bytes, and the free successor if any, into `block`.
    //
    //  The new bytes are exactly those missing, hence there is never any excess to split off.
    fn grow_in_place(&mut self, block: Block, shortfall: usize) -> Option<Block> {
        tracing::debug!(block = block.offset(), shortfall, "reallocate: growing region");

        let grown = self.extend(shortfall / WORD_SIZE)?;

        let memory = self.region.memory_mut();

        debug_assert_eq!(block.next(memory), grown, "Extension not adjacent to {:?}", block);

        let size = block.size(memory) + grown.size(memory);
        block.mark(memory, size, true);

        self.repair_cursor(block, size);

        Some(block)
    }

    //  Allocates a new block for `size` bytes, copies the payload of `block` up to `requested` bytes, and releases
    //  `block`.
    //
    //  `size` is adjusted once more by `allocate`.
    fn move_to_new_block(&mut self, block: Block, size: usize, requested: usize) -> ReallocOutcome {
        let capacity = block.capacity(self.region.memory());

        let moved = match self.allocate(size) {
            Some(moved) => moved,
            None => return ReallocOutcome::Failed,
        };

        tracing::debug!(from = block.offset(), to = moved.offset(), "reallocate: moving");

        let count = cmp::min(requested, capacity);
        let source = block.offset();

        self.region.memory_mut().copy_within(source..source + count, moved.offset());
        self.release(block);

        ReallocOutcome::NewRef(moved.into_ref())
    }

    fn outcome(block: Option<Block>) -> ReallocOutcome {
        block.map_or(ReallocOutcome::Failed, |block| ReallocOutcome::NewRef(block.into_ref()))
    }
}

#[cfg(test)]
mod tests {

use crate::VecRegion;

use super::super::test::*;
use super::*;

fn reallocate(arena: &mut TestArena, block: Option<Block>, requested: usize) -> ReallocOutcome {
    arena.reallocate(block, requested)
}

fn new_ref(block: Block) -> ReallocOutcome { ReallocOutcome::NewRef(block.into_ref()) }

#[test]
fn reallocate_absent() {
    let mut arena = create_arena();

    assert_eq!(new_ref(Block::new(16)), reallocate(&mut arena, None, 24));
    assert_eq!(ReallocOutcome::Failed, reallocate(&mut arena, None, 0));
}

#[test]
fn reallocate_to_zero() {
    let mut arena = create_arena();

    let a = arena.allocate(24).expect("Allocated");
    let _ = arena.allocate(24).expect("Allocated");

    assert_eq!(ReallocOutcome::Unusable, reallocate(&mut arena, Some(a), 0));
    assert!(arena.check());

    //  The space is reused.
    assert_eq!(Some(a), arena.allocate(24));
}

#[test]
fn reallocate_merge_with_successor() {
    let mut arena = create_arena();

    let a = arena.allocate(24).expect("Allocated");
    let b = arena.allocate(24).expect("Allocated");
    let c = arena.allocate(24).expect("Allocated");

    arena.release(b);
    fill(&mut arena, a, 0x11);

    assert_eq!(new_ref(a), reallocate(&mut arena, Some(a), 40));
    assert_eq!(vec!((16, 48, true), (64, 16, false), (c.offset(), 32, true)), layout(&arena)[..3].to_vec());
    assert!(is_filled(&arena, a, 0x11, 24));
    assert!(arena.check());
}

#[test]
fn reallocate_merge_repairs_cursor() {
    let mut arena = create_arena();

    let a = arena.allocate(24).expect("Allocated");
    let b = arena.allocate(24).expect("Allocated");
    let _ = arena.allocate(24).expect("Allocated");

    //  Move the cursor to `b`, then free `b`.
    arena.release(a);
    assert_eq!(Some(a), arena.allocate(24));
    assert_eq!(b, arena.cursor());

    arena.release(b);

    assert_eq!(new_ref(a), reallocate(&mut arena, Some(a), 40));
    assert_eq!(a, arena.cursor());
    assert!(arena.check());
}

#[test]
fn reallocate_shrink_at_epilogue() {
    let mut arena = create_arena();

    let a = arena.allocate(TEST_CHUNK_SIZE - 8).expect("Allocated");
    fill(&mut arena, a, 0x22);

    assert_eq!(new_ref(a), reallocate(&mut arena, Some(a), 24));
    assert_eq!(vec!((16, 32, true), (48, TEST_CHUNK_SIZE - 32, false)), layout(&arena));
    assert!(is_filled(&arena, a, 0x22, 24));
    assert!(arena.check());
}

#[test]
fn reallocate_shrink_unsplittable() {
    let mut arena = create_arena();

    let a = arena.allocate(TEST_CHUNK_SIZE - 8).expect("Allocated");

    assert_eq!(new_ref(a), reallocate(&mut arena, Some(a), TEST_CHUNK_SIZE - 16));
    assert_eq!(vec!((16, TEST_CHUNK_SIZE, true)), layout(&arena));
    assert!(arena.check());
}

#[test]
fn reallocate_shrink_before_allocated() {
    let mut arena = create_arena();

    let a = arena.allocate(100).expect("Allocated");
    let b = arena.allocate(24).expect("Allocated");

    fill(&mut arena, a, 0x23);

    let moved = match reallocate(&mut arena, Some(a), 24) {
        ReallocOutcome::NewRef(moved) => Block::from_ref(moved),
        outcome => panic!("Unexpected {:?}", outcome),
    };

    //  Moved to a block of `allocate(32)`, past `b`.
    assert_eq!(Block::new(160), moved);
    assert_eq!(vec!((16, 112, false), (b.offset(), 32, true), (160, 40, true), (200, TEST_CHUNK_SIZE - 184, false)),
        layout(&arena));
    assert!(is_filled(&arena, moved, 0x23, 24));
    assert!(arena.check());
}

#[test]
fn reallocate_grow_through_free_successor() {
    let mut arena = create_arena();

    let a = arena.allocate(24).expect("Allocated");
    fill(&mut arena, a, 0x33);

    assert_eq!(new_ref(a), reallocate(&mut arena, Some(a), 600));
    assert_eq!(vec!((16, 608, true)), layout(&arena));
    assert_eq!(624, arena.region().hi());
    assert!(is_filled(&arena, a, 0x33, 24));
    assert!(arena.check());
}

#[test]
fn reallocate_grow_at_epilogue() {
    let mut arena = create_arena();

    let a = arena.allocate(TEST_CHUNK_SIZE - 8).expect("Allocated");
    fill(&mut arena, a, 0x44);

    assert_eq!(new_ref(a), reallocate(&mut arena, Some(a), 600));
    assert_eq!(vec!((16, 608, true)), layout(&arena));
    assert!(is_filled(&arena, a, 0x44, TEST_CHUNK_SIZE - 8));
    assert!(arena.check());
}

#[test]
fn reallocate_move() {
    let mut arena = create_arena();

    let a = arena.allocate(24).expect("Allocated");
    let b = arena.allocate(24).expect("Allocated");

    fill(&mut arena, a, 0x55);
    fill(&mut arena, b, 0x66);

    let moved = match reallocate(&mut arena, Some(a), 100) {
        ReallocOutcome::NewRef(moved) => Block::from_ref(moved),
        outcome => panic!("Unexpected {:?}", outcome),
    };

    //  A block of `allocate(112)`, adjusted once more.
    assert_eq!(Block::new(80), moved);
    assert_eq!(vec!((16, 32, false), (48, 32, true), (80, 120, true)), layout(&arena)[..3].to_vec());
    assert!(is_filled(&arena, moved, 0x55, 24));
    assert!(is_filled(&arena, b, 0x66, 24));
    assert!(arena.check());
}

#[test]
fn reallocate_move_after_refused_growth() {
    let mut arena = TestArena::new(VecRegion::with_limit(16 + TEST_CHUNK_SIZE));
    arena.initialize().expect("Initialized");

    let x = arena.allocate(300).expect("Allocated");
    let a = arena.allocate(192).expect("Allocated");

    assert_eq!(Block::new(328), a);

    arena.release(x);
    fill(&mut arena, a, 0x77);

    assert_eq!(new_ref(x), reallocate(&mut arena, Some(a), 250));
    assert_eq!(vec!((16, 272, true), (288, 240, false)), layout(&arena));
    assert!(is_filled(&arena, x, 0x77, 192));
    assert!(arena.check());
}

#[test]
fn reallocate_failure() {
    let mut arena = TestArena::new(VecRegion::with_limit(16 + TEST_CHUNK_SIZE));
    arena.initialize().expect("Initialized");

    let a = arena.allocate(24).expect("Allocated");
    let _ = arena.allocate(24).expect("Allocated");
    let _ = arena.allocate(TEST_CHUNK_SIZE - 72).expect("Allocated");

    fill(&mut arena, a, 0x88);

    let before = arena.region().memory().to_vec();

    assert_eq!(ReallocOutcome::Failed, reallocate(&mut arena, Some(a), 100));
    assert_eq!(&before[..], arena.region().memory());
    assert!(is_filled(&arena, a, 0x88, 24));
    assert!(arena.check());
}

#[test]
fn reallocate_failure_at_epilogue() {
    let mut arena = TestArena::new(VecRegion::with_limit(16 + TEST_CHUNK_SIZE));
    arena.initialize().expect("Initialized");

    let a = arena.allocate(TEST_CHUNK_SIZE - 8).expect("Allocated");
    let before = arena.region().memory().to_vec();

    assert_eq!(ReallocOutcome::Failed, reallocate(&mut arena, Some(a), TEST_CHUNK_SIZE));
    assert_eq!(&before[..], arena.region().memory());
    assert_eq!(vec!((16, TEST_CHUNK_SIZE, true)), layout(&arena));
}

#[test]
fn reallocate_oversized() {
    let mut arena = create_arena();

    let a = arena.allocate(24).expect("Allocated");

    assert_eq!(ReallocOutcome::Failed, reallocate(&mut arena, Some(a), usize::MAX));
    assert_eq!((16, 32, true), layout(&arena)[0]);
}

}
