//! Chapter runs: maximal contiguous spans of chunks sharing one chapter
//! title. Always recomputed from the ordered chunk list, never stored,
//! so they cannot drift from the chunk table. Two non-adjacent spans
//! with the same title stay separate runs — grouping is positional.

use serde::Serialize;

use crate::model::{Book, Chunk};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Read,
    Partial,
    Unread,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterRun {
    pub title: String,
    pub chunk_ids: Vec<String>,
    pub chunk_indices: Vec<usize>,
}

impl ChapterRun {
    /// Read state of this run relative to the book's progress pointer.
    pub fn status(&self, book: &Book) -> RunStatus {
        let read = self
            .chunk_indices
            .iter()
            .filter(|&&index| index < book.current_chunk_index)
            .count();
        if read == self.chunk_indices.len() {
            RunStatus::Read
        } else if read > 0 {
            RunStatus::Partial
        } else {
            RunStatus::Unread
        }
    }
}

/// Group an index-ordered chunk list into chapter runs. Single pass.
pub fn build_chapter_runs(chunks: &[Chunk]) -> Vec<ChapterRun> {
    let mut runs: Vec<ChapterRun> = Vec::new();

    for chunk in chunks {
        let title = chunk.display_title();

        if let Some(prev) = runs.last_mut()
            && prev.title == title
        {
            prev.chunk_ids.push(chunk.id.clone());
            prev.chunk_indices.push(chunk.index);
            continue;
        }

        runs.push(ChapterRun {
            title: title.to_owned(),
            chunk_ids: vec![chunk.id.clone()],
            chunk_indices: vec![chunk.index],
        });
    }

    runs
}
