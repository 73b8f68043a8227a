//! Progress pointer state machine. The pointer is the index of the next
//! chunk not yet considered read; everything below it is read by
//! position. Reading ahead of the pointer skips past the intervening
//! chunks without individual log entries.

use chrono::Utc;
use serde::Serialize;

use crate::error::EngineError;
use crate::model::{Book, BookStatus, ReadVia, ReadingLogEntry, new_id};
use crate::store::LibraryStore;

#[derive(Debug, Clone, Serialize)]
pub struct ReadOutcome {
    pub new_pointer: usize,
    pub completed: bool,
    pub next_chunk_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnreadOutcome {
    pub new_pointer: usize,
    pub reverted_completion: bool,
}

/// Mark a chunk read. The read event is always logged; the pointer only
/// advances when the chunk is at or ahead of it (skip-ahead semantics).
/// A pointer reaching the chunk count completes the book.
pub fn mark_chunk_read(
    store: &dyn LibraryStore,
    chunk_id: &str,
    read_via: ReadVia,
) -> Result<ReadOutcome, EngineError> {
    let chunk = store
        .chunk(chunk_id)
        .map_err(EngineError::Store)?
        .ok_or_else(|| EngineError::ChunkNotFound(chunk_id.to_owned()))?;
    let mut book = require_book(store, &chunk.book_id)?;

    let entry = ReadingLogEntry {
        id: new_id(),
        chunk_id: chunk.id.clone(),
        book_id: chunk.book_id.clone(),
        sent_at: None,
        read_at: Some(Utc::now()),
        read_via: Some(read_via),
    };
    store.append_log(&entry).map_err(EngineError::Store)?;

    let mut completed = false;
    if chunk.index >= book.current_chunk_index {
        book.current_chunk_index = chunk.index + 1;
        if book.current_chunk_index >= book.total_chunks {
            completed = true;
            book.status = BookStatus::Completed;
            book.completed_at = Some(Utc::now());
        }
        store.update_book(&book).map_err(EngineError::Store)?;
        tracing::debug!(
            book_id = %book.id,
            new_pointer = book.current_chunk_index,
            completed,
            "advanced progress pointer"
        );
    }

    let next_chunk_id = store
        .chunks(&chunk.book_id)
        .map_err(EngineError::Store)?
        .into_iter()
        .find(|c| c.index == chunk.index + 1)
        .map(|c| c.id);

    Ok(ReadOutcome {
        new_pointer: book.current_chunk_index,
        completed,
        next_chunk_id,
    })
}

/// Mark a chunk unread: drop its log entries and, when the chunk sits
/// behind the pointer, retreat the pointer exactly to it — destroying
/// any skip-ahead gained past that chunk. Unreading the chunk that
/// completed a book reverts the completion.
pub fn mark_chunk_unread(
    store: &dyn LibraryStore,
    chunk_id: &str,
) -> Result<UnreadOutcome, EngineError> {
    let chunk = store
        .chunk(chunk_id)
        .map_err(EngineError::Store)?
        .ok_or_else(|| EngineError::ChunkNotFound(chunk_id.to_owned()))?;
    let mut book = require_book(store, &chunk.book_id)?;

    store.remove_chunk_log(&chunk.id).map_err(EngineError::Store)?;

    let mut reverted_completion = false;
    if chunk.index < book.current_chunk_index || book.status == BookStatus::Completed {
        book.current_chunk_index = chunk.index;
        if book.status == BookStatus::Completed {
            book.status = BookStatus::Active;
            book.completed_at = None;
            reverted_completion = true;
        }
        store.update_book(&book).map_err(EngineError::Store)?;
        tracing::debug!(
            book_id = %book.id,
            new_pointer = book.current_chunk_index,
            reverted_completion,
            "retreated progress pointer"
        );
    }

    Ok(UnreadOutcome {
        new_pointer: book.current_chunk_index,
        reverted_completion,
    })
}

/// Full re-read: pointer to zero, status back to active.
pub fn restart_book(store: &dyn LibraryStore, book_id: &str) -> Result<Book, EngineError> {
    let mut book = require_book(store, book_id)?;
    book.current_chunk_index = 0;
    book.status = BookStatus::Active;
    book.completed_at = None;
    store.update_book(&book).map_err(EngineError::Store)?;
    tracing::debug!(book_id = %book.id, "restarted book");
    Ok(book)
}

pub(crate) fn require_book(
    store: &dyn LibraryStore,
    book_id: &str,
) -> Result<Book, EngineError> {
    store
        .book(book_id)
        .map_err(EngineError::Store)?
        .ok_or_else(|| EngineError::BookNotFound(book_id.to_owned()))
}
