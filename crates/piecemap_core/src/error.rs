#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("piece size can't be 0")]
    ZeroPieceSize,
    #[error("too many pieces: total size {total_size}, piece size {piece_size}")]
    TooManyPieces { total_size: u64, piece_size: u32 },
    #[error("total size of files overflows u64")]
    TotalSizeOverflow,
    #[error("invalid priority {0:?}, expected one of low, normal, high")]
    InvalidPriority(String),
}
