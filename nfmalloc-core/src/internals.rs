//! Internals of nfmalloc-core.

pub(crate) mod arena;
pub(crate) mod blocks;
pub(crate) mod tag;
