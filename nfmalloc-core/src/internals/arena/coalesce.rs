//! Coalescing of adjacent free blocks.

use crate::{Configuration, Region};

use super::{Arena, Block};

impl<C, R> Arena<C, R>
    where
        C: Configuration,
        R: Region,
{
    /// Merges the free `block` with its free neighbours, if any.
    ///
    /// Returns the merged block, which starts either at `block` or at its predecessor.
    ///
    /// If the cursor pointed within the merged block, it is moved to its start.
    pub(crate) fn coalesce(&mut self, block: Block) -> Block {
        let memory = self.region.memory_mut();

        debug_assert!(!block.is_allocated(memory), "Coalescing allocated {:?}", block);

        let previous_allocated = block.previous_tag(memory).is_allocated();
        let next = block.next(memory);
        let next_allocated = next.is_allocated(memory);

        let (merged, size) = match (previous_allocated, next_allocated) {
            (true, true) => return block,
            (true, false) => (block, block.size(memory) + next.size(memory)),
            (false, true) => {
                let previous = block.previous(memory);
                (previous, previous.size(memory) + block.size(memory))
            },
            (false, false) => {
                let previous = block.previous(memory);
                (previous, previous.size(memory) + block.size(memory) + next.size(memory))
            },
        };

        merged.mark(memory, size, false);

        self.repair_cursor(merged, size);

        merged
    }
}

#[cfg(test)]
mod tests {

use super::super::test::*;
use super::*;

//  Creates an arena with 4 allocated blocks of 32 bytes, at 16, 48, 80, and 112, followed by a free block.
fn create_quartet() -> (TestArena, [Block; 4]) {
    let mut arena = create_arena();

    let a = arena.allocate(24).expect("Allocated");
    let b = arena.allocate(24).expect("Allocated");
    let c = arena.allocate(24).expect("Allocated");
    let d = arena.allocate(24).expect("Allocated");

    (arena, [a, b, c, d])
}

//  Frees the block without coalescing it.
fn mark_free(arena: &mut TestArena, block: Block) {
    let memory = arena.memory_mut();
    let size = block.size(memory);
    block.mark(memory, size, false);
}

#[test]
fn coalesce_none() {
    let (mut arena, [_, b, _, _]) = create_quartet();

    mark_free(&mut arena, b);

    assert_eq!(b, arena.coalesce(b));
    assert_eq!((48, 32, false), layout(&arena)[1]);
}

#[test]
fn coalesce_next() {
    let (mut arena, [_, b, c, _]) = create_quartet();

    mark_free(&mut arena, c);
    mark_free(&mut arena, b);

    assert_eq!(b, arena.coalesce(b));
    assert_eq!(vec!((16, 32, true), (48, 64, false), (112, 32, true)), layout(&arena)[..3].to_vec());
    assert_eq!(b.footer(arena.region().memory()), 104);
}

#[test]
fn coalesce_previous() {
    let (mut arena, [_, b, c, _]) = create_quartet();

    mark_free(&mut arena, b);
    mark_free(&mut arena, c);

    assert_eq!(b, arena.coalesce(c));
    assert_eq!(vec!((16, 32, true), (48, 64, false), (112, 32, true)), layout(&arena)[..3].to_vec());
}

#[test]
fn coalesce_both() {
    let (mut arena, [a, b, c, d]) = create_quartet();

    mark_free(&mut arena, a);
    mark_free(&mut arena, c);
    mark_free(&mut arena, b);

    assert_eq!(a, arena.coalesce(b));
    assert_eq!(vec!((16, 96, false), (112, 32, true)), layout(&arena)[..2].to_vec());

    let memory = arena.region().memory();
    assert_eq!(a.tag(memory), a.footer_tag(memory));
    assert_eq!(d, a.next(memory));
    assert!(arena.check());
}

#[test]
fn coalesce_with_trailing() {
    let (mut arena, [_, _, _, d]) = create_quartet();

    mark_free(&mut arena, d);

    assert_eq!(d, arena.coalesce(d));
    assert_eq!(vec!((112, TEST_CHUNK_SIZE - 96, false)), layout(&arena)[3..].to_vec());
}

#[test]
fn coalesce_repairs_cursor() {
    let (mut arena, [_, b, c, _]) = create_quartet();

    //  Allocating `b` again moves the cursor to `c`.
    arena.release(b);
    assert_eq!(Some(b), arena.allocate(24));
    assert_eq!(c, arena.cursor());

    mark_free(&mut arena, c);
    mark_free(&mut arena, b);

    assert_eq!(b, arena.coalesce(b));
    assert_eq!(b, arena.cursor());
    assert!(arena.check());
}

#[test]
fn coalesce_keeps_cursor_at_start() {
    let (mut arena, [a, b, c, _]) = create_quartet();

    //  Allocating `a` again moves the cursor to `b`.
    arena.release(a);
    assert_eq!(Some(a), arena.allocate(24));
    assert_eq!(b, arena.cursor());

    mark_free(&mut arena, b);
    mark_free(&mut arena, c);

    assert_eq!(b, arena.coalesce(c));
    assert_eq!(b, arena.cursor());
    assert!(arena.check());
}

}
