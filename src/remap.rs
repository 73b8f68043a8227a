//! Offset-overlap remapping. When a book's chunk set is replaced, chunk
//! ids and indices are all regenerated; the one quantity stable across
//! re-segmentation is the cumulative word offset. These helpers project
//! the progress pointer and individual chunk references from an old
//! sequence's offset geometry onto a new one.

use std::collections::HashMap;

use crate::model::Chunk;

/// Half-open word interval `[start, end)` a chunk occupies within its
/// book's full content.
#[derive(Debug, Clone)]
pub struct ChunkRange {
    pub id: String,
    pub index: usize,
    pub word_count: u32,
    pub start: u64,
    pub end: u64,
}

/// Build word-offset ranges by cumulatively summing word counts in
/// index order.
pub fn build_ranges(chunks: &[Chunk]) -> Vec<ChunkRange> {
    let mut sorted: Vec<&Chunk> = chunks.iter().collect();
    sorted.sort_by_key(|c| c.index);

    let mut cursor = 0u64;
    sorted
        .into_iter()
        .map(|chunk| {
            let start = cursor;
            let end = start + u64::from(chunk.word_count);
            cursor = end;
            ChunkRange {
                id: chunk.id.clone(),
                index: chunk.index,
                word_count: chunk.word_count,
                start,
                end,
            }
        })
        .collect()
}

/// Words contributed by every chunk strictly before the pointer.
pub fn words_before_pointer(ranges: &[ChunkRange], current_chunk_index: usize) -> u64 {
    ranges
        .iter()
        .filter(|r| r.index < current_chunk_index)
        .map(|r| u64::from(r.word_count))
        .sum()
}

/// Map an absolute words-read offset to a pointer in the new index
/// space: the first range not fully consumed by `words_read`, clamped
/// to `ranges.len()` when everything is consumed.
pub fn map_pointer(ranges: &[ChunkRange], words_read: u64) -> usize {
    let mut index = 0;
    for range in ranges {
        if range.end <= words_read {
            index = range.index + 1;
            continue;
        }
        break;
    }
    index.min(ranges.len())
}

fn overlap(a: &ChunkRange, b: &ChunkRange) -> u64 {
    a.end.min(b.end).saturating_sub(a.start.max(b.start))
}

fn range_for_offset<'a>(ranges: &'a [ChunkRange], offset: u64) -> &'a ChunkRange {
    for range in ranges {
        if offset < range.end {
            return range;
        }
    }
    // Offsets past the end clamp to the last range.
    &ranges[ranges.len() - 1]
}

/// Assign each old chunk to the new chunk with maximum word overlap.
/// Ties resolve to the first maximal candidate in index order. Old
/// chunks with no overlap at all (possible at the tail of a shrinking
/// sequence) fall back to whichever new range contains their midpoint.
pub fn map_chunks_by_overlap(
    old_ranges: &[ChunkRange],
    new_ranges: &[ChunkRange],
) -> HashMap<String, String> {
    let mut mapped = HashMap::new();
    if new_ranges.is_empty() {
        return mapped;
    }

    for old_range in old_ranges {
        let mut best: Option<&ChunkRange> = None;
        let mut best_overlap = 0u64;

        for new_range in new_ranges {
            let score = overlap(old_range, new_range);
            if score > best_overlap {
                best_overlap = score;
                best = Some(new_range);
            }
        }

        if let Some(best) = best {
            mapped.insert(old_range.id.clone(), best.id.clone());
            continue;
        }

        let mid = old_range.start + u64::from(old_range.word_count) / 2;
        mapped.insert(
            old_range.id.clone(),
            range_for_offset(new_ranges, mid).id.clone(),
        );
    }

    mapped
}
