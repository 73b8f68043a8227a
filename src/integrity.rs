//! Read-only diagnostics over a book's persisted chunk set, plus the
//! repair flow that rechunks flagged books. The analyzer never mutates
//! state and never re-parses source content; it only inspects what the
//! store holds.

use serde::Serialize;

use crate::error::EngineError;
use crate::model::{Book, Chunk};
use crate::progress::require_book;
use crate::rechunk::rechunk_book;
use crate::source::ContentSource;
use crate::store::LibraryStore;

/// How far past the progress pointer the title-contiguity check looks.
/// Distant unread suffixes often repeat chapter names (samples,
/// previews) without indicating corruption.
const TITLE_LOOKAHEAD: usize = 25;

const REGIME_MIN_CHUNKS: usize = 12;
const REGIME_WINDOW: usize = 8;
const REGIME_MIN_SAMPLES: usize = 4;
const REGIME_RATIO: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityIssue {
    /// Stored total chunk count disagrees with the persisted rows.
    CountMismatch,
    /// Persisted indices are not exactly `0..n`.
    IndexGap,
    /// A chapter title reappears after being superseded near progress.
    TitleNonContiguous,
    /// Average chunk size changes sharply across the pointer, which
    /// suggests the chunk size was changed without remapping.
    MixedRegimeNearProgress,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub book_id: String,
    pub title: String,
    pub chunk_size_words: u32,
    pub issues: Vec<IntegrityIssue>,
}

pub fn analyze_book(
    store: &dyn LibraryStore,
    book_id: &str,
) -> Result<IntegrityReport, EngineError> {
    let book = require_book(store, book_id)?;
    let chunks = store.chunks(book_id).map_err(EngineError::Store)?;

    let mut issues = Vec::new();
    if chunks.len() != book.total_chunks {
        issues.push(IntegrityIssue::CountMismatch);
    }
    if has_index_gaps(&chunks) {
        issues.push(IntegrityIssue::IndexGap);
    }
    if has_non_contiguous_titles(&chunks, book.current_chunk_index) {
        issues.push(IntegrityIssue::TitleNonContiguous);
    }
    if has_mixed_regime(&chunks, book.current_chunk_index) {
        issues.push(IntegrityIssue::MixedRegimeNearProgress);
    }

    Ok(IntegrityReport {
        book_id: book.id,
        title: book.title,
        chunk_size_words: book.chunk_size_words,
        issues,
    })
}

fn has_index_gaps(chunks: &[Chunk]) -> bool {
    chunks
        .iter()
        .enumerate()
        .any(|(position, chunk)| chunk.index != position)
}

fn has_non_contiguous_titles(chunks: &[Chunk], current_chunk_index: usize) -> bool {
    let mut seen: Vec<&str> = Vec::new();
    let mut prev_title = "";

    for chunk in chunks
        .iter()
        .filter(|c| c.index <= current_chunk_index + TITLE_LOOKAHEAD)
    {
        let title = chunk.display_title();
        if title == prev_title {
            continue;
        }
        if seen.contains(&title) {
            return true;
        }
        seen.push(title);
        prev_title = title;
    }

    false
}

fn has_mixed_regime(chunks: &[Chunk], current_chunk_index: usize) -> bool {
    if chunks.len() < REGIME_MIN_CHUNKS {
        return false;
    }

    let window_start = current_chunk_index.saturating_sub(REGIME_WINDOW);
    let before: Vec<u32> = chunks
        .iter()
        .filter(|c| c.index < current_chunk_index && c.index >= window_start)
        .map(|c| c.word_count)
        .collect();
    let after: Vec<u32> = chunks
        .iter()
        .filter(|c| {
            c.index > current_chunk_index && c.index <= current_chunk_index + REGIME_WINDOW
        })
        .map(|c| c.word_count)
        .collect();

    if before.len() < REGIME_MIN_SAMPLES || after.len() < REGIME_MIN_SAMPLES {
        return false;
    }

    let avg = |counts: &[u32]| -> f64 {
        counts.iter().map(|&n| f64::from(n)).sum::<f64>() / counts.len() as f64
    };
    let avg_before = avg(&before);
    let avg_after = avg(&after);
    let ratio = avg_before.max(avg_after) / avg_before.min(avg_after).max(1.0);

    ratio >= REGIME_RATIO
}

#[derive(Debug, Clone, Serialize)]
pub struct RepairedBook {
    pub book_id: String,
    pub title: String,
    pub total_chunks: usize,
    pub current_chunk_index: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepairReport {
    pub dry_run: bool,
    pub checked: usize,
    pub flagged: Vec<IntegrityReport>,
    pub repaired: Vec<RepairedBook>,
}

/// Analyze candidate books and, unless `dry_run`, rechunk every flagged
/// one at its current word target. A dry run only reports candidates.
pub fn repair_books(
    store: &dyn LibraryStore,
    source: &dyn ContentSource,
    book_id: Option<&str>,
    dry_run: bool,
    limit: Option<usize>,
) -> Result<RepairReport, EngineError> {
    let mut candidates: Vec<Book> = match book_id {
        Some(id) => vec![require_book(store, id)?],
        None => store.books().map_err(EngineError::Store)?,
    };
    if let Some(limit) = limit {
        candidates.truncate(limit);
    }

    let mut flagged = Vec::new();
    for book in &candidates {
        let report = analyze_book(store, &book.id)?;
        if !report.issues.is_empty() {
            flagged.push(report);
        }
    }

    let mut repaired = Vec::new();
    if !dry_run {
        for report in &flagged {
            let outcome = rechunk_book(store, source, &report.book_id, report.chunk_size_words)?;
            tracing::info!(
                book_id = %report.book_id,
                issues = ?report.issues,
                total_chunks = outcome.total_chunks,
                "repaired book"
            );
            repaired.push(RepairedBook {
                book_id: report.book_id.clone(),
                title: report.title.clone(),
                total_chunks: outcome.total_chunks,
                current_chunk_index: outcome.current_chunk_index,
            });
        }
    }

    Ok(RepairReport {
        dry_run,
        checked: candidates.len(),
        flagged,
        repaired,
    })
}
