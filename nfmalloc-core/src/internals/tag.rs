//! Boundary tags.
//!
//! A tag packs the size of a block, a multiple of `ALIGNMENT`, with its allocated flag in the lowest bit. Each block
//! carries the same tag twice: in its header word, and in its footer word.

use core::fmt;

use crate::{ALIGNMENT, MAXIMUM_BLOCK_SIZE, WORD_SIZE};

/// Tag.
#[derive(Clone, Copy, Default, Eq, PartialEq, Hash)]
pub(crate) struct Tag(u32);

impl Tag {
    const ALLOCATED: u32 = 0b001;
    const SIZE_MASK: u32 = !0b111;

    /// The tag of the padding word.
    pub(crate) const PADDING: Tag = Tag(0);

    /// The tag of the epilogue header.
    pub(crate) const EPILOGUE: Tag = Tag(Self::ALLOCATED);

    /// Creates a tag.
    pub(crate) fn new(size: usize, allocated: bool) -> Tag {
        debug_assert!(size % ALIGNMENT == 0, "Misaligned size: {}", size);
        debug_assert!(size <= MAXIMUM_BLOCK_SIZE, "Oversized block: {}", size);

        Tag((size as u32 & Self::SIZE_MASK) | if allocated { Self::ALLOCATED } else { 0 })
    }

    /// Returns the size of the block.
    pub(crate) fn size(&self) -> usize { (self.0 & Self::SIZE_MASK) as usize }

    /// Returns whether the block is allocated.
    pub(crate) fn is_allocated(&self) -> bool { self.0 & Self::ALLOCATED != 0 }

    /// Returns whether the block is free.
    pub(crate) fn is_free(&self) -> bool { !self.is_allocated() }

    /// Returns whether any of the reserved bits, between the flag and the size, is set.
    ///
    /// A well-formed tag never sets them, as sizes are multiples of `ALIGNMENT`.
    pub(crate) fn has_stray_bits(&self) -> bool { self.0 & !(Self::SIZE_MASK | Self::ALLOCATED) != 0 }

    /// Returns the raw word.
    #[cfg(test)]
    pub(crate) fn word(&self) -> u32 { self.0 }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({}{})", self.size(), if self.is_allocated() { ", allocated" } else { "" })
    }
}

/// Reads the tag word at offset `at`.
///
/// #   Panics
///
/// If the word lies outside `memory`.
pub(crate) fn read(memory: &[u8], at: usize) -> Tag {
    let mut word = [0u8; WORD_SIZE];
    word.copy_from_slice(&memory[at..at + WORD_SIZE]);

    Tag(u32::from_ne_bytes(word))
}

/// Writes the tag word at offset `at`.
///
/// #   Panics
///
/// If the word lies outside `memory`.
pub(crate) fn write(memory: &mut [u8], at: usize, tag: Tag) {
    memory[at..at + WORD_SIZE].copy_from_slice(&tag.0.to_ne_bytes());
}

#[cfg(test)]
mod tests {

use super::*;

#[test]
fn tag_pack() {
    assert_eq!(0, Tag::PADDING.word());
    assert_eq!(1, Tag::EPILOGUE.word());

    assert_eq!(9, Tag::new(8, true).word());
    assert_eq!(16, Tag::new(16, false).word());
    assert_eq!(4097, Tag::new(4096, true).word());
    assert_eq!(0xFFFF_FFF9, Tag::new(MAXIMUM_BLOCK_SIZE, true).word());
}

#[test]
fn tag_unpack() {
    let tag = Tag::new(112, true);

    assert_eq!(112, tag.size());
    assert!(tag.is_allocated());
    assert!(!tag.is_free());

    let tag = Tag::new(3984, false);

    assert_eq!(3984, tag.size());
    assert!(!tag.is_allocated());
    assert!(tag.is_free());

    assert_eq!(0, Tag::EPILOGUE.size());
    assert!(Tag::EPILOGUE.is_allocated());
}

#[test]
fn tag_stray_bits() {
    assert!(!Tag::EPILOGUE.has_stray_bits());
    assert!(!Tag::new(24, true).has_stray_bits());

    assert!(Tag(0b010).has_stray_bits());
    assert!(Tag(24 | 0b101).has_stray_bits());
}

#[test]
fn tag_read_write() {
    let mut memory = [0u8; 16];

    write(&mut memory, 4, Tag::new(8, true));
    write(&mut memory, 12, Tag::EPILOGUE);

    assert_eq!(Tag::PADDING, read(&memory, 0));
    assert_eq!(Tag::new(8, true), read(&memory, 4));
    assert_eq!(Tag::PADDING, read(&memory, 8));
    assert_eq!(Tag::EPILOGUE, read(&memory, 12));

    assert_eq!(9u32.to_ne_bytes(), memory[4..8]);
}

#[test]
#[should_panic]
fn tag_read_out_of_bounds() {
    let memory = [0u8; 8];

    read(&memory, 6);
}

}
