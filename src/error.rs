use thiserror::Error;

use crate::model::{MAX_CHUNK_SIZE_WORDS, MIN_CHUNK_SIZE_WORDS};

/// Failures the engine surfaces to callers. All are recoverable at the
/// call site; nothing here is fatal to the process.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(
        "chunk size must be between {MIN_CHUNK_SIZE_WORDS} and {MAX_CHUNK_SIZE_WORDS} words, got {given}"
    )]
    ChunkSizeOutOfRange { given: u32 },

    #[error("book not found: {0}")]
    BookNotFound(String),

    #[error("chunk not found: {0}")]
    ChunkNotFound(String),

    #[error("reacquire book source: {0:#}")]
    SourceUnavailable(anyhow::Error),

    #[error("library store: {0:#}")]
    Store(anyhow::Error),
}

pub fn validate_chunk_size(given: u32) -> Result<(), EngineError> {
    if (MIN_CHUNK_SIZE_WORDS..=MAX_CHUNK_SIZE_WORDS).contains(&given) {
        Ok(())
    } else {
        Err(EngineError::ChunkSizeOutOfRange { given })
    }
}
