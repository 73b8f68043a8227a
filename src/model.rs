//! Typed records for the library store. Every entity crossing the
//! storage boundary has an explicit shape here.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chunker::ChunkContent;

/// Display label for chunks whose chapter had no usable title.
pub const UNTITLED_CHAPTER: &str = "Untitled";

/// Policy bounds for the per-chunk word target.
pub const MIN_CHUNK_SIZE_WORDS: u32 = 300;
pub const MAX_CHUNK_SIZE_WORDS: u32 = 3000;
pub const DEFAULT_CHUNK_SIZE_WORDS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    Active,
    Paused,
    Queued,
    Completed,
}

/// Delivery channel recorded in the reading log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ReadVia {
    EmailLink,
    WebApp,
    ManualTrigger,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    /// Directory the chapter sources are re-acquired from on rechunk.
    pub source_dir: PathBuf,
    /// Word target that produced the current chunk set.
    pub chunk_size_words: u32,
    pub status: BookStatus,
    /// Must equal the number of persisted chunks for this book.
    pub total_chunks: usize,
    /// Progress pointer: index of the next chunk not yet considered
    /// read. Always in `0..=total_chunks`.
    pub current_chunk_index: usize,
    pub added_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub book_id: String,
    /// Zero-based reading-order position. Per book, indices are exactly
    /// `0..total_chunks` with no gaps or duplicates.
    pub index: usize,
    pub chapter_title: Option<String>,
    pub content_markup: String,
    pub content_text: String,
    pub word_count: u32,
}

impl Chunk {
    pub fn from_content(book_id: &str, index: usize, content: ChunkContent) -> Self {
        let chapter_title =
            (!content.chapter_title.is_empty()).then_some(content.chapter_title);
        Self {
            id: new_id(),
            book_id: book_id.to_owned(),
            index,
            chapter_title,
            content_markup: content.content_markup,
            content_text: content.content_text,
            word_count: content.word_count,
        }
    }

    pub fn display_title(&self) -> &str {
        self.chapter_title.as_deref().unwrap_or(UNTITLED_CHAPTER)
    }
}

/// One read (or delivery) event. A chunk can accumulate several entries
/// over its lifetime: read, later unread, read again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingLogEntry {
    pub id: String,
    pub chunk_id: String,
    pub book_id: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub read_via: Option<ReadVia>,
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
