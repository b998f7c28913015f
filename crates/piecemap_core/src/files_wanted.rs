use bitvec::bitvec;
use bitvec::order::Msb0;

use crate::{
    file_piece_map::FilePieceMap,
    type_aliases::{BF, FileIndex, PieceIndex},
};

/// Which files the user wants downloaded. Everything is wanted by default.
#[derive(Debug, Clone)]
pub struct FilesWanted<'a> {
    map: &'a FilePieceMap,
    wanted: BF,
}

impl<'a> FilesWanted<'a> {
    pub fn new(map: &'a FilePieceMap) -> Self {
        let mut w = Self {
            map,
            wanted: BF::new(),
        };
        w.reset(map);
        w
    }

    pub fn reset(&mut self, map: &'a FilePieceMap) {
        self.map = map;
        self.wanted = bitvec![u8, Msb0; 1; map.size()];
    }

    pub fn map(&self) -> &'a FilePieceMap {
        self.map
    }

    pub fn set(&mut self, file: FileIndex, wanted: bool) {
        self.wanted.set(file, wanted);
    }

    pub fn set_many(&mut self, files: impl IntoIterator<Item = FileIndex>, wanted: bool) {
        for file in files {
            self.set(file, wanted);
        }
    }

    pub fn file_wanted(&self, file: FileIndex) -> bool {
        self.wanted[file]
    }

    /// True if any file overlapping `piece` is wanted.
    pub fn piece_wanted(&self, piece: PieceIndex) -> bool {
        self.wanted[self.map.file_span(piece).range()].any()
    }

    pub fn wanted_count(&self) -> usize {
        self.wanted.count_ones()
    }

    /// Sum of the sizes of all wanted files.
    pub fn wanted_bytes(&self) -> u64 {
        self.wanted
            .iter_ones()
            .map(|file| self.map.byte_span(file).len())
            .sum()
    }

    /// One bit per piece of the torrent, set if the piece is needed by some wanted file.
    pub fn wanted_pieces(&self) -> BF {
        let piece_count = self.map.layout().piece_count() as usize;
        let mut pieces = bitvec![u8, Msb0; 0; piece_count];
        for file in self.wanted.iter_ones() {
            let span = self.map.piece_span(file);
            let begin = (span.begin as usize).min(piece_count);
            let end = (span.end as usize).min(piece_count);
            pieces[begin..end].fill(true);
        }
        pieces
    }
}
