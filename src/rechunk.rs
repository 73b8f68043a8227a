//! Rechunk orchestrator: full rebuild of a book's chunk set at a new
//! word target, with the progress pointer and reading log carried over
//! via word-offset remapping. Everything before the final store commit
//! is read-only or computed in memory, so a failed source re-acquisition
//! leaves the book untouched.

use chrono::Utc;
use serde::Serialize;

use crate::chunker::chunk_book;
use crate::error::{EngineError, validate_chunk_size};
use crate::model::{BookStatus, Chunk, ReadingLogEntry};
use crate::progress::require_book;
use crate::remap::{build_ranges, map_chunks_by_overlap, map_pointer, words_before_pointer};
use crate::source::ContentSource;
use crate::store::LibraryStore;

#[derive(Debug, Clone, Serialize)]
pub struct RechunkOutcome {
    pub total_chunks: usize,
    pub current_chunk_index: usize,
}

pub fn rechunk_book(
    store: &dyn LibraryStore,
    source: &dyn ContentSource,
    book_id: &str,
    chunk_size: u32,
) -> Result<RechunkOutcome, EngineError> {
    validate_chunk_size(chunk_size)?;
    let mut book = require_book(store, book_id)?;

    let chapters = source
        .chapters(&book)
        .map_err(EngineError::SourceUnavailable)?;

    let old_chunks = store.chunks(book_id).map_err(EngineError::Store)?;
    let old_log = store.log_entries(book_id).map_err(EngineError::Store)?;

    let new_chunks: Vec<Chunk> = chunk_book(&chapters, chunk_size)
        .into_iter()
        .enumerate()
        .map(|(index, content)| Chunk::from_content(&book.id, index, content))
        .collect();

    let old_ranges = build_ranges(&old_chunks);
    let new_ranges = build_ranges(&new_chunks);

    let words_read = words_before_pointer(&old_ranges, book.current_chunk_index);
    let mapped_pointer = map_pointer(&new_ranges, words_read);
    let chunk_map = map_chunks_by_overlap(&old_ranges, &new_ranges);

    // Entry ids survive the remap; entries whose old chunk cannot be
    // mapped (empty new sequence) are dropped with it.
    let remapped_log: Vec<ReadingLogEntry> = old_log
        .into_iter()
        .filter_map(|entry| {
            let chunk_id = chunk_map.get(&entry.chunk_id)?.clone();
            Some(ReadingLogEntry { chunk_id, ..entry })
        })
        .collect();

    let total_chunks = new_chunks.len();
    let current_chunk_index = mapped_pointer.min(total_chunks);
    let completed = total_chunks > 0 && current_chunk_index >= total_chunks;

    book.chunk_size_words = chunk_size;
    book.total_chunks = total_chunks;
    book.current_chunk_index = current_chunk_index;
    book.status = if completed {
        BookStatus::Completed
    } else if book.status == BookStatus::Completed {
        BookStatus::Active
    } else {
        book.status
    };
    book.completed_at = if completed {
        book.completed_at.or_else(|| Some(Utc::now()))
    } else {
        None
    };

    store
        .replace_book(&book, new_chunks, remapped_log)
        .map_err(EngineError::Store)?;

    tracing::info!(
        book_id = %book.id,
        chunk_size,
        total_chunks,
        current_chunk_index,
        "rechunked book"
    );

    Ok(RechunkOutcome {
        total_chunks,
        current_chunk_index,
    })
}
