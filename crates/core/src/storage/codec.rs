//! Splitting objects into chunks and putting them back together.
//!
//! Chunk `i` of an object named `report.pdf` is stored under
//! `report.pdf.part{i + 1}`; the suffix is what lets a download recover both the
//! chunk position and the original name.

use bytes::{Bytes, BytesMut};

use super::types::{Chunk, FilePart};

const PART_MARKER: &str = ".part";

/// Split `content` into chunks of at most `max_chunk_size` bytes.
///
/// The last chunk may be shorter. Empty content yields no chunks. Payloads are
/// views into `content`, nothing is copied.
///
/// # Panics
///
/// Panics if `max_chunk_size` is zero.
#[must_use]
pub fn split(content: &Bytes, base_name: &str, max_chunk_size: usize) -> Vec<Chunk> {
    assert!(max_chunk_size > 0, "chunk size must be non-zero");

    (0..content.len())
        .step_by(max_chunk_size)
        .enumerate()
        .map(|(index, start)| {
            let end = (start + max_chunk_size).min(content.len());
            Chunk {
                index,
                payload: content.slice(start..end),
                source_name: name_for(base_name, index),
            }
        })
        .collect()
}

/// Attachment name for chunk `index` of `base_name` (1-based suffix).
#[must_use]
pub fn name_for(base_name: &str, index: usize) -> String {
    format!("{base_name}{PART_MARKER}{}", index + 1)
}

/// Split `part_name` into the base name and the raw 1-based part number.
fn split_part_suffix(part_name: &str) -> Option<(&str, &str)> {
    let marker = part_name.rfind(PART_MARKER)?;
    let digits = &part_name[marker + PART_MARKER.len()..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((&part_name[..marker], digits))
}

/// Recover the original object name from a chunk name.
///
/// Strips a trailing `.part<digits>`. When nothing would be left (a chunk named
/// just `.part1`), the chunk name is returned unchanged.
#[must_use]
pub fn original_name_from(part_name: &str) -> String {
    match split_part_suffix(part_name) {
        Some((base, _)) if !base.is_empty() => base.to_string(),
        _ => part_name.to_string(),
    }
}

/// Zero-based chunk index encoded in a chunk name, if any.
#[must_use]
pub fn part_index_from(part_name: &str) -> Option<usize> {
    let (_, digits) = split_part_suffix(part_name)?;
    digits.parse::<usize>().ok()?.checked_sub(1)
}

/// Concatenate parts in index order.
///
/// Gaps are not detected: a missing index is skipped silently, so callers must
/// check the part set is complete first.
#[must_use]
pub fn reassemble(mut parts: Vec<FilePart>) -> Bytes {
    parts.sort_by_key(|part| part.index);

    let total = parts.iter().map(|part| part.content.len()).sum();
    let mut buffer = BytesMut::with_capacity(total);
    for part in parts {
        buffer.extend_from_slice(&part.content);
    }
    buffer.freeze()
}


#[cfg(test)]
#[path = "codec_props.rs"]
mod property_tests;
