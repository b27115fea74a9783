//! Next-fit search.
//!
//! The search resumes from the cursor, left just past the previous fit, and wraps around to the first block once the
//! epilogue is reached. The wrapped-around pass stops at the original cursor, so that no block is examined twice.

use crate::{Configuration, Region};

use super::{Arena, Block};

impl<C, R> Arena<C, R>
    where
        C: Configuration,
        R: Region,
{
    /// Returns the first free block of at least `size` bytes, starting from the cursor, if any.
    ///
    /// On success, the cursor is moved to the successor of the block found.
    pub(crate) fn find(&mut self, size: usize) -> Option<Block> {
        let first = self.first()?;
        let origin = self.cursor;
        let memory = self.region.memory();

        let found = Self::scan(memory, origin, None, size)
            .or_else(|| Self::scan(memory, first, Some(origin), size))?;

        self.cursor = found.next(memory);

        Some(found)
    }

    //  Returns the first free block of at least `size` bytes, from `block` onwards, stopping at `until` or the
    //  epilogue, whichever comes first.
    fn scan(memory: &[u8], mut block: Block, until: Option<Block>, size: usize) -> Option<Block> {
        while !block.is_epilogue(memory) && until.map_or(true, |until| block < until) {
            let tag = block.tag(memory);

            if tag.is_free() && tag.size() >= size {
                return Some(block);
            }

            block = block.next(memory);
        }

        None
    }
}

#[cfg(test)]
mod tests {

use super::super::test::*;
use super::*;

#[test]
fn find_empty() {
    let mut arena = create_arena();

    assert_eq!(Some(Block::new(16)), arena.find(16));
    assert_eq!(Block::new(16 + TEST_CHUNK_SIZE), arena.cursor());
}

#[test]
fn find_too_large() {
    let mut arena = create_arena();
    let cursor = arena.cursor();

    assert_eq!(None, arena.find(TEST_CHUNK_SIZE + 8));
    assert_eq!(cursor, arena.cursor());
}

#[test]
fn find_exact() {
    let mut arena = create_arena();

    assert_eq!(Some(Block::new(16)), arena.find(TEST_CHUNK_SIZE));
}

#[test]
fn find_next_fit() {
    //  Layout: [a: 32, free: 64, c: 32, free: 64, e: 32, trailing].
    let mut arena = create_arena();

    let _a = arena.allocate(24).expect("Allocated");
    let b = arena.allocate(56).expect("Allocated");
    let c = arena.allocate(24).expect("Allocated");
    let d = arena.allocate(56).expect("Allocated");
    let e = arena.allocate(24).expect("Allocated");

    arena.release(b);
    arena.release(d);

    //  Move the cursor to `c`, by reallocating `b` (first free block) ...
    assert_eq!(Some(b), arena.allocate(56));
    assert_eq!(c, arena.cursor());

    arena.release(b);

    //  ... from which the next fit is `d`, not `b`.
    assert_eq!(Some(d), arena.find(64));
    assert_eq!(e, arena.cursor());
}

#[test]
fn find_wraps_around() {
    let mut arena = create_arena();

    let a = arena.allocate(24).expect("Allocated");
    let b = arena.allocate(TEST_CHUNK_SIZE - 40).expect("Allocated");

    //  The cursor is at the epilogue, past everything.
    assert_eq!(Block::new(16 + TEST_CHUNK_SIZE), arena.cursor());

    arena.release(a);

    assert_eq!(Some(a), arena.find(32));
    assert_eq!(b, arena.cursor());
}

#[test]
fn find_wrap_stops_at_origin() {
    let mut arena = create_arena();

    let a = arena.allocate(24).expect("Allocated");
    let b = arena.allocate(24).expect("Allocated");
    let _ = arena.allocate(TEST_CHUNK_SIZE - 72).expect("Allocated");

    arena.release(a);

    //  Cursor at `b`: the forward pass finds nothing, the wrapped-around pass only examines `a`.
    assert_eq!(Some(a), arena.find(32));
    assert_eq!(b, arena.cursor());

    //  Cursor at `b`; nothing fits 64 bytes, whichever the pass.
    assert_eq!(None, arena.find(64));
    assert_eq!(b, arena.cursor());
}

#[test]
fn find_uninitialized() {
    let mut arena = TestArena::new(crate::VecRegion::new());

    assert_eq!(None, arena.find(16));
}

}
