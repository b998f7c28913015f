pub type PieceIndex = u32;

pub type FileIndex = usize;

pub type BF = bitvec::vec::BitVec<u8, bitvec::order::Msb0>;
