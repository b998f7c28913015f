pub mod error;
pub mod file_piece_map;
pub mod file_priorities;
pub mod files_wanted;
pub mod lengths;
pub mod priority;
pub mod span;
pub mod type_aliases;

pub use error::Error;
pub use file_piece_map::{FileEntry, FilePieceMap};
pub use file_priorities::FilePriorities;
pub use files_wanted::FilesWanted;
pub use lengths::PieceLayout;
pub use priority::Priority;
pub use span::{ByteSpan, FileOffset, FileSpan, IndexSpan, PieceSpan};
