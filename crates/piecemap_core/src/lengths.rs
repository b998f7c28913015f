use serde::Serialize;

use crate::{error::Error, span::ByteSpan, type_aliases::PieceIndex};

pub const fn ceil_div_u64(a: u64, b: u64) -> u64 {
    a.div_ceil(b)
}

pub const fn last_element_size_u64(total: u64, chunk_size: u64) -> u64 {
    let rem = total % chunk_size;
    if rem == 0 {
        return chunk_size;
    }
    rem
}

/// Total content size and piece size of a torrent.
///
/// Every piece is `piece_size` bytes long except the last one, which holds
/// whatever remains. A layout with `total_size == 0` is valid and has no pieces.
///
/// `piece_count` always stays below `u32::MAX`, so "one past the last piece" is
/// itself a valid `PieceIndex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PieceLayout {
    total_size: u64,
    piece_size: u32,
    piece_count: u32,
}

impl PieceLayout {
    pub fn new(total_size: u64, piece_size: u32) -> Result<Self, Error> {
        if piece_size == 0 {
            return Err(Error::ZeroPieceSize);
        }
        let piece_count = ceil_div_u64(total_size, piece_size as u64);
        let piece_count = match u32::try_from(piece_count) {
            Ok(count) if count < u32::MAX => count,
            _ => {
                return Err(Error::TooManyPieces {
                    total_size,
                    piece_size,
                });
            }
        };
        Ok(Self {
            total_size,
            piece_size,
            piece_count,
        })
    }

    pub const fn total_size(&self) -> u64 {
        self.total_size
    }

    pub const fn piece_size(&self) -> u32 {
        self.piece_size
    }

    pub const fn piece_count(&self) -> u32 {
        self.piece_count
    }

    /// The piece containing `offset`. Only meaningful for `offset < total_size()`.
    pub fn piece_of(&self, offset: u64) -> PieceIndex {
        debug_assert!(
            offset < self.total_size,
            "offset {offset} out of range, total size {}",
            self.total_size
        );
        (offset / self.piece_size as u64) as PieceIndex
    }

    pub const fn last_piece_size(&self) -> u32 {
        if self.total_size == 0 {
            return 0;
        }
        last_element_size_u64(self.total_size, self.piece_size as u64) as u32
    }

    pub const fn piece_length(&self, index: PieceIndex) -> u32 {
        if index + 1 == self.piece_count {
            return self.last_piece_size();
        }
        self.piece_size
    }

    pub const fn piece_offset(&self, index: PieceIndex) -> u64 {
        index as u64 * self.piece_size as u64
    }

    /// Global bytes covered by `index`, or None if the torrent has no such piece.
    pub const fn piece_byte_span(&self, index: PieceIndex) -> Option<ByteSpan> {
        if index >= self.piece_count {
            return None;
        }
        let begin = self.piece_offset(index);
        Some(ByteSpan {
            begin,
            end: begin + self.piece_length(index) as u64,
        })
    }
}
