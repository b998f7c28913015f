use serde::{Deserialize, Serialize};

use crate::type_aliases::{FileIndex, PieceIndex};

/// A half-open `[begin, end)` range of indices or byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IndexSpan<T> {
    pub begin: T,
    pub end: T,
}

pub type ByteSpan = IndexSpan<u64>;
pub type PieceSpan = IndexSpan<PieceIndex>;
pub type FileSpan = IndexSpan<FileIndex>;

impl<T: Copy + PartialOrd> IndexSpan<T> {
    pub const fn new(begin: T, end: T) -> Self {
        Self { begin, end }
    }

    /// `begin <= scalar < end`.
    pub fn contains(&self, scalar: T) -> bool {
        self.begin <= scalar && scalar < self.end
    }

    /// The scalar sorts before the whole span, i.e. `scalar < begin`.
    pub fn scalar_before(&self, scalar: T) -> bool {
        scalar < self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }

    pub fn range(&self) -> std::ops::Range<T> {
        self.begin..self.end
    }
}

impl ByteSpan {
    pub const fn len(&self) -> u64 {
        self.end - self.begin
    }
}

impl PieceSpan {
    pub const fn len(&self) -> u32 {
        self.end - self.begin
    }
}

impl FileSpan {
    pub const fn len(&self) -> usize {
        self.end - self.begin
    }
}

/// A position inside one file: the file's index and the byte offset within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOffset {
    pub index: FileIndex,
    pub offset: u64,
}
