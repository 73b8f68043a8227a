//! Initial ingest: chunk a book's source directory and insert the book
//! with its full chunk set.

use std::path::Path;

use chrono::Utc;

use crate::chunker::chunk_book;
use crate::error::{EngineError, validate_chunk_size};
use crate::model::{Book, BookStatus, Chunk, new_id};
use crate::source::{load_chapters, read_manifest};
use crate::store::LibraryStore;

pub fn ingest_book(
    store: &dyn LibraryStore,
    source_dir: &Path,
    chunk_size: u32,
) -> Result<Book, EngineError> {
    validate_chunk_size(chunk_size)?;

    let manifest = read_manifest(source_dir).map_err(EngineError::SourceUnavailable)?;
    let chapters =
        load_chapters(source_dir, &manifest).map_err(EngineError::SourceUnavailable)?;

    let book_id = new_id();
    let chunks: Vec<Chunk> = chunk_book(&chapters, chunk_size)
        .into_iter()
        .enumerate()
        .map(|(index, content)| Chunk::from_content(&book_id, index, content))
        .collect();

    let book = Book {
        id: book_id,
        title: manifest.title,
        author: manifest.author,
        source_dir: source_dir.to_owned(),
        chunk_size_words: chunk_size,
        status: BookStatus::Active,
        total_chunks: chunks.len(),
        current_chunk_index: 0,
        added_at: Utc::now(),
        completed_at: None,
    };

    store.insert_book(&book, &chunks).map_err(EngineError::Store)?;
    tracing::info!(
        book_id = %book.id,
        title = %book.title,
        total_chunks = book.total_chunks,
        "ingested book"
    );
    Ok(book)
}
