#![no_main]

use libfuzzer_sys::fuzz_target;
use piecemap_core::{FilePieceMap, FilePriorities, FilesWanted, Priority};

fuzz_target!(|input: (u16, Vec<u16>, u32)| {
    let (piece_size, sizes, probe) = input;
    let sizes = sizes.into_iter().take(64).map(u64::from).collect::<Vec<_>>();
    let Ok(map) = FilePieceMap::from_file_sizes(&sizes, piece_size.into()) else {
        return;
    };
    let total = map.layout().total_size();

    let mut prev_end = 0;
    for e in map.iter() {
        assert_eq!(e.bytes.begin, prev_end);
        prev_end = e.bytes.end;
        assert!(e.pieces.begin < e.pieces.end);
        for piece in e.pieces.range() {
            assert!(map.file_span(piece).contains(e.index));
        }
    }
    assert_eq!(prev_end, total);

    if total > 0 {
        let offset = probe as u64 % total;
        let fo = map.byte_offset(offset);
        assert!(map.byte_span(fo.index).contains(offset));
    }

    let mut priorities = FilePriorities::new(&map);
    let mut wanted = FilesWanted::new(&map);
    for file in (0..map.size()).step_by(2) {
        priorities.set(file, Priority::High);
        wanted.set(file, false);
    }
    let piece = probe % (map.layout().piece_count() + 2);
    let files = map.file_span(piece).range();
    let expected_high = files.clone().any(|f| f % 2 == 0);
    assert_eq!(priorities.piece_priority(piece) == Priority::High, expected_high);
    assert_eq!(wanted.piece_wanted(piece), files.clone().any(|f| f % 2 == 1));
});
