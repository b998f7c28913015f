//! Translation between global byte offsets, piece indices and files.
//!
//! Torrent content is a flat byte sequence cut into fixed-size pieces, while the
//! files laid over it have arbitrary lengths. Piece boundaries generally do not
//! line up with file boundaries, so:
//!
//! - a byte offset always belongs to exactly one file;
//! - a piece may belong to several files (the tail of one file and the head of the
//!   next share it), so piece -> files lookups return a range.
//!
//! Both per-file arrays are sorted by construction (files are laid out in order
//! and offsets only grow), which is what makes the binary searches below valid
//! even though neighbouring piece spans overlap.
//!
//! Zero-length files have an empty byte span but still claim exactly one piece
//! slot, `[p, p + 1)`, where `p` is the piece their (collapsed) offset falls into,
//! or one past the last piece for trailing empty files. This keeps them visible to
//! piece -> files lookups, which priority and wanted aggregation rely on.

use serde::Serialize;
use tracing::{debug, trace};

use crate::{
    error::Error,
    lengths::PieceLayout,
    span::{ByteSpan, FileOffset, FileSpan, PieceSpan},
    type_aliases::{FileIndex, PieceIndex},
};

/// One file's position in the torrent, in bytes and in pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub index: FileIndex,
    pub bytes: ByteSpan,
    pub pieces: PieceSpan,
}

#[derive(Debug, Clone)]
pub struct FilePieceMap {
    layout: PieceLayout,
    file_bytes: Vec<ByteSpan>,
    file_pieces: Vec<PieceSpan>,
}

impl FilePieceMap {
    pub fn new(file_sizes: impl IntoIterator<Item = u64>, layout: PieceLayout) -> Self {
        let mut map = Self {
            layout,
            file_bytes: Vec::new(),
            file_pieces: Vec::new(),
        };
        map.reset(file_sizes, layout);
        map
    }

    /// Builds the layout from the file sizes themselves, so the total always matches.
    pub fn from_file_sizes(file_sizes: &[u64], piece_size: u32) -> Result<Self, Error> {
        let total_size = file_sizes
            .iter()
            .try_fold(0u64, |acc, s| acc.checked_add(*s))
            .ok_or(Error::TotalSizeOverflow)?;
        let layout = PieceLayout::new(total_size, piece_size)?;
        Ok(Self::new(file_sizes.iter().copied(), layout))
    }

    /// Recompute all spans from scratch.
    ///
    /// Panics if the file sizes don't add up to exactly `layout.total_size()`, in
    /// debug and release builds alike: spans built from inconsistent metadata would
    /// send downloaded data to the wrong place.
    pub fn reset(&mut self, file_sizes: impl IntoIterator<Item = u64>, layout: PieceLayout) {
        let file_sizes = file_sizes.into_iter();
        let (size_hint, _) = file_sizes.size_hint();
        let total_size = layout.total_size();

        self.layout = layout;
        self.file_bytes.clear();
        self.file_pieces.clear();
        self.file_bytes.reserve_exact(size_hint);
        self.file_pieces.reserve_exact(size_hint);

        let mut offset = 0u64;
        for (idx, file_size) in file_sizes.enumerate() {
            let begin_byte = offset;
            let end_byte = match begin_byte.checked_add(file_size) {
                Some(end) if end <= total_size => end,
                _ => panic!(
                    "file {idx} of size {file_size} at offset {begin_byte} overruns total size {total_size}"
                ),
            };

            let begin_piece = if begin_byte == total_size {
                layout.piece_count()
            } else {
                layout.piece_of(begin_byte)
            };
            let end_piece = if file_size != 0 {
                layout.piece_of(end_byte - 1) + 1
            } else {
                begin_piece + 1
            };

            let bytes = ByteSpan::new(begin_byte, end_byte);
            let pieces = PieceSpan::new(begin_piece, end_piece);
            trace!(file = idx, ?bytes, ?pieces, "file spans");
            self.file_bytes.push(bytes);
            self.file_pieces.push(pieces);
            offset = end_byte;
        }

        assert!(
            offset == total_size,
            "file sizes add up to {offset}, total size is {total_size}"
        );

        self.file_bytes.shrink_to_fit();
        self.file_pieces.shrink_to_fit();

        debug!(
            files = self.size(),
            total_size,
            piece_size = layout.piece_size(),
            pieces = layout.piece_count(),
            "rebuilt file/piece map"
        );
    }

    pub fn layout(&self) -> &PieceLayout {
        &self.layout
    }

    /// Number of files.
    pub fn size(&self) -> usize {
        self.file_pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_pieces.is_empty()
    }

    /// Pieces overlapped by `file`. Panics if `file` is out of range.
    pub fn piece_span(&self, file: FileIndex) -> PieceSpan {
        self.file_pieces[file]
    }

    /// Global bytes occupied by `file`. Panics if `file` is out of range.
    pub fn byte_span(&self, file: FileIndex) -> ByteSpan {
        self.file_bytes[file]
    }

    /// Files whose piece span contains `piece`.
    ///
    /// Empty when no file touches the piece, e.g. past the end of the torrent.
    pub fn file_span(&self, piece: PieceIndex) -> FileSpan {
        // Files entirely before the piece form a prefix, files entirely after it a
        // suffix; whatever is in between contains it.
        let begin = self
            .file_pieces
            .partition_point(|span| !span.contains(piece) && !span.scalar_before(piece));
        let end = begin
            + self.file_pieces[begin..].partition_point(|span| !span.scalar_before(piece));
        FileSpan::new(begin, end)
    }

    /// The file owning the byte at global `offset`, and the offset within that file.
    ///
    /// Panics if `offset` is not below the total size: a wrong answer here would
    /// place downloaded data into the wrong file.
    pub fn byte_offset(&self, offset: u64) -> FileOffset {
        match self.checked_byte_offset(offset) {
            Some(fo) => fo,
            None => panic!(
                "byte offset {offset} out of range, total size {}",
                self.layout.total_size()
            ),
        }
    }

    pub fn checked_byte_offset(&self, offset: u64) -> Option<FileOffset> {
        if offset >= self.layout.total_size() {
            return None;
        }
        // Zero-length files never contain anything, so they always land in the
        // skipped prefix and are never returned.
        let index = self
            .file_bytes
            .partition_point(|span| !span.contains(offset) && !span.scalar_before(offset));
        let span = self.file_bytes.get(index)?;
        Some(FileOffset {
            index,
            offset: offset - span.begin,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = FileEntry> + '_ {
        self.file_bytes
            .iter()
            .zip(self.file_pieces.iter())
            .enumerate()
            .map(|(index, (bytes, pieces))| FileEntry {
                index,
                bytes: *bytes,
                pieces: *pieces,
            })
    }

    /// Pieces of `file` in the order worth fetching them for streaming: first, last,
    /// then everything in between. Players often look at the end of a file early.
    ///
    /// Empty for zero-length files, they have no data to fetch.
    pub fn iter_piece_order(&self, file: FileIndex) -> impl Iterator<Item = PieceIndex> + use<> {
        let pieces = if self.byte_span(file).is_empty() {
            PieceSpan::default()
        } else {
            self.piece_span(file)
        };
        iter_piece_order(pieces)
    }
}

fn iter_piece_order(span: PieceSpan) -> impl Iterator<Item = PieceIndex> {
    use std::iter::once;

    let len = span.len() as usize;
    let first = once(span.begin);
    // it's ok if it repeats the first one, take(len) below drops it
    let last = once(span.end.saturating_sub(1).max(span.begin));
    let mid = span.range().skip(1).take(len.saturating_sub(2));

    first.chain(last).chain(mid).take(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_map(sizes: &[u64], piece_size: u32) -> FilePieceMap {
        FilePieceMap::from_file_sizes(sizes, piece_size).unwrap()
    }

    fn byte_spans(map: &FilePieceMap) -> Vec<(u64, u64)> {
        map.iter().map(|e| (e.bytes.begin, e.bytes.end)).collect()
    }

    fn piece_spans(map: &FilePieceMap) -> Vec<(u32, u32)> {
        map.iter().map(|e| (e.pieces.begin, e.pieces.end)).collect()
    }

    #[test]
    fn test_zero_length_file_between_two_files() {
        let map = make_map(&[100, 0, 250], 100);
        assert_eq!(map.size(), 3);
        assert_eq!(byte_spans(&map), vec![(0, 100), (100, 100), (100, 350)]);
        assert_eq!(piece_spans(&map), vec![(0, 1), (1, 2), (1, 4)]);

        assert_eq!(map.file_span(0), FileSpan::new(0, 1));
        assert_eq!(map.file_span(1), FileSpan::new(1, 3));
        assert_eq!(map.file_span(2), FileSpan::new(2, 3));
        assert_eq!(map.file_span(3), FileSpan::new(2, 3));
        assert!(map.file_span(4).is_empty());
    }

    #[test]
    fn test_single_zero_length_file() {
        let map = make_map(&[0], 100);
        assert_eq!(map.layout().total_size(), 0);
        assert_eq!(byte_spans(&map), vec![(0, 0)]);
        assert_eq!(piece_spans(&map), vec![(0, 1)]);
        assert_eq!(map.file_span(0), FileSpan::new(0, 1));
        assert_eq!(map.checked_byte_offset(0), None);
    }

    #[test]
    fn test_no_files() {
        let map = make_map(&[], 100);
        assert!(map.is_empty());
        assert_eq!(map.iter().count(), 0);
        assert!(map.file_span(0).is_empty());
        assert_eq!(map.checked_byte_offset(0), None);
    }

    #[test]
    fn test_single_file_spanning_many_pieces() {
        let map = make_map(&[1174243328], 262144);
        assert_eq!(piece_spans(&map), vec![(0, 4480)]);
        assert_eq!(map.file_span(0), FileSpan::new(0, 1));
        assert_eq!(map.file_span(4479), FileSpan::new(0, 1));
        assert!(map.file_span(4480).is_empty());
        assert_eq!(
            map.byte_offset(1174243327),
            FileOffset {
                index: 0,
                offset: 1174243327
            }
        );
    }

    #[test]
    fn test_many_files_in_one_piece() {
        let map = make_map(&[10, 20, 30, 40], 1000);
        assert_eq!(piece_spans(&map), vec![(0, 1); 4]);
        assert_eq!(map.file_span(0), FileSpan::new(0, 4));
        assert_eq!(
            map.byte_offset(35),
            FileOffset {
                index: 2,
                offset: 5
            }
        );
    }

    #[test]
    fn test_file_boundary_inside_piece() {
        let map = make_map(&[150, 150], 100);
        assert_eq!(piece_spans(&map), vec![(0, 2), (1, 3)]);
        assert_eq!(map.file_span(0), FileSpan::new(0, 1));
        assert_eq!(map.file_span(1), FileSpan::new(0, 2));
        assert_eq!(map.file_span(2), FileSpan::new(1, 2));
    }

    #[test]
    fn test_file_boundary_on_piece_boundary() {
        let map = make_map(&[200, 100], 100);
        assert_eq!(piece_spans(&map), vec![(0, 2), (2, 3)]);
        assert_eq!(map.file_span(1), FileSpan::new(0, 1));
        assert_eq!(map.file_span(2), FileSpan::new(1, 2));
    }

    #[test]
    fn test_leading_and_trailing_zero_length_files() {
        let map = make_map(&[0, 0, 300, 0, 0], 100);
        assert_eq!(
            byte_spans(&map),
            vec![(0, 0), (0, 0), (0, 300), (300, 300), (300, 300)]
        );
        assert_eq!(piece_spans(&map), vec![(0, 1), (0, 1), (0, 3), (3, 4), (3, 4)]);
        assert_eq!(map.file_span(0), FileSpan::new(0, 3));
        // The trailing empty files claim a slot one past the last real piece.
        assert_eq!(map.file_span(3), FileSpan::new(3, 5));
        assert_eq!(
            map.byte_offset(0),
            FileOffset {
                index: 2,
                offset: 0
            }
        );
        assert_eq!(
            map.byte_offset(299),
            FileOffset {
                index: 2,
                offset: 299
            }
        );
    }

    #[test]
    fn test_byte_offset_skips_zero_length_files() {
        let map = make_map(&[100, 0, 250], 100);
        assert_eq!(
            map.byte_offset(99),
            FileOffset {
                index: 0,
                offset: 99
            }
        );
        assert_eq!(
            map.byte_offset(100),
            FileOffset {
                index: 2,
                offset: 0
            }
        );
        assert_eq!(
            map.byte_offset(349),
            FileOffset {
                index: 2,
                offset: 249
            }
        );
        assert_eq!(map.checked_byte_offset(350), None);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_byte_offset_out_of_range_panics() {
        let map = make_map(&[100, 0, 250], 100);
        map.byte_offset(350);
    }

    #[test]
    #[should_panic]
    fn test_piece_span_out_of_range_panics() {
        let map = make_map(&[100], 100);
        map.piece_span(1);
    }

    #[test]
    fn test_reset_replaces_everything() {
        let mut map = make_map(&[100, 0, 250], 100);
        let layout = PieceLayout::new(64, 16).unwrap();
        map.reset([32, 32], layout);
        assert_eq!(map.size(), 2);
        assert_eq!(map.layout(), &layout);
        assert_eq!(piece_spans(&map), vec![(0, 2), (2, 4)]);
        assert_eq!(byte_spans(&map), vec![(0, 32), (32, 64)]);
    }

    #[test]
    #[should_panic(expected = "overruns total size 150")]
    fn test_reset_panics_when_files_overrun_total() {
        FilePieceMap::new([100, 100], PieceLayout::new(150, 100).unwrap());
    }

    #[test]
    #[should_panic(expected = "overruns total size 100")]
    fn test_reset_panics_on_offset_overflow() {
        FilePieceMap::new([50, u64::MAX], PieceLayout::new(100, 100).unwrap());
    }

    #[test]
    #[should_panic(expected = "file sizes add up to 100, total size is 150")]
    fn test_reset_panics_when_files_fall_short_of_total() {
        FilePieceMap::new([100], PieceLayout::new(150, 100).unwrap());
    }

    #[test]
    fn test_trailing_empty_file_at_max_piece_count() {
        let total = u32::MAX as u64 - 1;
        let map = make_map(&[total, 0], 1);
        assert_eq!(map.layout().piece_count(), u32::MAX - 1);
        assert_eq!(map.piece_span(1), PieceSpan::new(u32::MAX - 1, u32::MAX));
        assert_eq!(map.file_span(u32::MAX - 2), FileSpan::new(0, 1));
        assert_eq!(map.file_span(u32::MAX - 1), FileSpan::new(1, 2));
        assert!(map.file_span(u32::MAX).is_empty());

        assert!(matches!(
            FilePieceMap::from_file_sizes(&[u32::MAX as u64, 0], 1),
            Err(Error::TooManyPieces { .. })
        ));
    }

    #[test]
    fn test_from_file_sizes_errors() {
        assert!(matches!(
            FilePieceMap::from_file_sizes(&[u64::MAX, 1], 100),
            Err(Error::TotalSizeOverflow)
        ));
        assert!(matches!(
            FilePieceMap::from_file_sizes(&[100], 0),
            Err(Error::ZeroPieceSize)
        ));
    }

    #[test]
    fn test_iter_piece_order() {
        let it = |begin, end| -> Vec<u32> { iter_piece_order(PieceSpan::new(begin, end)).collect() };
        assert_eq!(it(0, 0), Vec::<u32>::new());

        assert_eq!(it(0, 1), vec![0]);
        assert_eq!(it(0, 2), vec![0, 1]);
        assert_eq!(it(0, 3), vec![0, 2, 1]);
        assert_eq!(it(5, 9), vec![5, 8, 6, 7]);
    }

    #[test]
    fn test_iter_piece_order_of_files() {
        let map = make_map(&[100, 0, 250], 100);
        assert_eq!(map.iter_piece_order(0).collect::<Vec<_>>(), vec![0]);
        assert_eq!(map.iter_piece_order(1).count(), 0);
        assert_eq!(map.iter_piece_order(2).collect::<Vec<_>>(), vec![1, 3, 2]);
    }

    #[test]
    fn test_entries_serialize() {
        let map = make_map(&[100, 0], 100);
        let v = serde_json::to_value(map.iter().collect::<Vec<_>>()).unwrap();
        assert_eq!(
            v,
            serde_json::json!([
                {"index": 0, "bytes": {"begin": 0, "end": 100}, "pieces": {"begin": 0, "end": 1}},
                {"index": 1, "bytes": {"begin": 100, "end": 100}, "pieces": {"begin": 1, "end": 2}},
            ])
        );
    }
}
