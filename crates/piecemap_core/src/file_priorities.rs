use crate::{
    file_piece_map::FilePieceMap,
    priority::Priority,
    type_aliases::{FileIndex, PieceIndex},
};

/// Per-file download priority over a [`FilePieceMap`].
///
/// Borrows the map, so the map can't be rebuilt while priorities computed against
/// its old shape are still around.
#[derive(Debug, Clone)]
pub struct FilePriorities<'a> {
    map: &'a FilePieceMap,
    priorities: Vec<Priority>,
}

impl<'a> FilePriorities<'a> {
    pub fn new(map: &'a FilePieceMap) -> Self {
        let mut p = Self {
            map,
            priorities: Vec::new(),
        };
        p.reset(map);
        p
    }

    /// Rebind to `map` and set every file back to [`Priority::Normal`].
    pub fn reset(&mut self, map: &'a FilePieceMap) {
        self.map = map;
        self.priorities.clear();
        self.priorities.resize(map.size(), Priority::Normal);
        self.priorities.shrink_to_fit();
    }

    pub fn map(&self) -> &'a FilePieceMap {
        self.map
    }

    pub fn set(&mut self, file: FileIndex, priority: Priority) {
        self.priorities[file] = priority;
    }

    pub fn set_many(&mut self, files: impl IntoIterator<Item = FileIndex>, priority: Priority) {
        for file in files {
            self.set(file, priority);
        }
    }

    pub fn file_priority(&self, file: FileIndex) -> Priority {
        self.priorities[file]
    }

    /// The highest priority among the files overlapping `piece`, or
    /// [`Priority::Normal`] if no file does.
    pub fn piece_priority(&self, piece: PieceIndex) -> Priority {
        self.priorities[self.map.file_span(piece).range()]
            .iter()
            .copied()
            .max()
            .unwrap_or_default()
    }
}
