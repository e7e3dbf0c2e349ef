//! Property-based tests for the chunk codec.
//!
//! - Round-trip: reassembling a split reproduces the input
//! - Chunk count: ceil(len / size) chunks, none for empty input
//! - Name round-trip: the original name survives the part suffix

use bytes::Bytes;
use proptest::prelude::*;

use super::*;
use crate::storage::types::FilePart;

/// Turn split chunks into downloaded parts, in reverse to exercise sorting.
fn as_parts(chunks: Vec<Chunk>) -> Vec<FilePart> {
    chunks
        .into_iter()
        .rev()
        .map(|chunk| FilePart {
            index: chunk.index,
            content: chunk.payload,
            raw_file_name: chunk.source_name,
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_split_then_reassemble_round_trips(
        content in proptest::collection::vec(any::<u8>(), 0..4096),
        chunk_size in 1usize..512,
    ) {
        let content = Bytes::from(content);
        let chunks = split(&content, "object.bin", chunk_size);
        prop_assert_eq!(reassemble(as_parts(chunks)), content);
    }

    #[test]
    fn prop_chunk_count_is_ceiling(
        len in 0usize..10_000,
        chunk_size in 1usize..1024,
    ) {
        let content = Bytes::from(vec![0u8; len]);
        let chunks = split(&content, "object.bin", chunk_size);
        prop_assert_eq!(chunks.len(), len.div_ceil(chunk_size));
        prop_assert!(chunks.iter().all(|c| c.payload.len() <= chunk_size));
        prop_assert!(chunks.iter().enumerate().all(|(i, c)| c.index == i));
    }

    #[test]
    fn prop_name_round_trips(
        name in "[a-zA-Z0-9 _().-]{1,40}",
        index in 0usize..100_000,
    ) {
        let part_name = name_for(&name, index);
        prop_assert_eq!(original_name_from(&part_name), name);
        prop_assert_eq!(part_index_from(&part_name), Some(index));
    }
}
