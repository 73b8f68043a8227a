//! Library storage seam. The engine only depends on the [`LibraryStore`]
//! trait; the in-memory implementation backs tests, and the JSON file
//! store persists the whole library as one snapshot written atomically
//! (temp file + rename) after each mutation.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::model::{Book, Chunk, ReadingLogEntry};

pub trait LibraryStore: Send + Sync {
    fn insert_book(&self, book: &Book, chunks: &[Chunk]) -> anyhow::Result<()>;
    fn book(&self, book_id: &str) -> anyhow::Result<Option<Book>>;
    fn books(&self) -> anyhow::Result<Vec<Book>>;
    fn update_book(&self, book: &Book) -> anyhow::Result<()>;
    /// All chunks of a book, ordered by index.
    fn chunks(&self, book_id: &str) -> anyhow::Result<Vec<Chunk>>;
    fn chunk(&self, chunk_id: &str) -> anyhow::Result<Option<Chunk>>;
    fn log_entries(&self, book_id: &str) -> anyhow::Result<Vec<ReadingLogEntry>>;
    fn append_log(&self, entry: &ReadingLogEntry) -> anyhow::Result<()>;
    /// Remove every log entry referencing the given chunk.
    fn remove_chunk_log(&self, chunk_id: &str) -> anyhow::Result<()>;
    /// All-or-nothing replacement of a book row, its chunk set, and its
    /// reading log. Readers never observe a partially replaced set.
    fn replace_book(
        &self,
        book: &Book,
        chunks: Vec<Chunk>,
        log: Vec<ReadingLogEntry>,
    ) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LibraryState {
    books: Vec<Book>,
    chunks: Vec<Chunk>,
    reading_log: Vec<ReadingLogEntry>,
}

impl LibraryState {
    fn insert_book(&mut self, book: &Book, chunks: &[Chunk]) -> anyhow::Result<()> {
        if self.books.iter().any(|b| b.id == book.id) {
            anyhow::bail!("book already exists: {}", book.id);
        }
        self.books.push(book.clone());
        self.chunks.extend_from_slice(chunks);
        Ok(())
    }

    fn update_book(&mut self, book: &Book) -> anyhow::Result<()> {
        let row = self
            .books
            .iter_mut()
            .find(|b| b.id == book.id)
            .ok_or_else(|| anyhow::anyhow!("book not in store: {}", book.id))?;
        *row = book.clone();
        Ok(())
    }

    fn chunks_of(&self, book_id: &str) -> Vec<Chunk> {
        let mut rows: Vec<Chunk> = self
            .chunks
            .iter()
            .filter(|c| c.book_id == book_id)
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.index);
        rows
    }

    fn replace_book(&mut self, book: &Book, chunks: Vec<Chunk>, log: Vec<ReadingLogEntry>) {
        self.reading_log.retain(|e| e.book_id != book.id);
        self.chunks.retain(|c| c.book_id != book.id);
        self.chunks.extend(chunks);
        self.reading_log.extend(log);
        match self.books.iter_mut().find(|b| b.id == book.id) {
            Some(row) => *row = book.clone(),
            None => self.books.push(book.clone()),
        }
    }
}

/// In-memory store. The single mutex makes every operation, including
/// `replace_book`, atomic with respect to concurrent readers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<LibraryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> anyhow::Result<MutexGuard<'_, LibraryState>> {
        self.state
            .lock()
            .map_err(|_| anyhow::anyhow!("library state lock poisoned"))
    }
}

impl LibraryStore for MemoryStore {
    fn insert_book(&self, book: &Book, chunks: &[Chunk]) -> anyhow::Result<()> {
        self.state()?.insert_book(book, chunks)
    }

    fn book(&self, book_id: &str) -> anyhow::Result<Option<Book>> {
        Ok(self.state()?.books.iter().find(|b| b.id == book_id).cloned())
    }

    fn books(&self) -> anyhow::Result<Vec<Book>> {
        Ok(self.state()?.books.clone())
    }

    fn update_book(&self, book: &Book) -> anyhow::Result<()> {
        self.state()?.update_book(book)
    }

    fn chunks(&self, book_id: &str) -> anyhow::Result<Vec<Chunk>> {
        Ok(self.state()?.chunks_of(book_id))
    }

    fn chunk(&self, chunk_id: &str) -> anyhow::Result<Option<Chunk>> {
        Ok(self.state()?.chunks.iter().find(|c| c.id == chunk_id).cloned())
    }

    fn log_entries(&self, book_id: &str) -> anyhow::Result<Vec<ReadingLogEntry>> {
        Ok(self
            .state()?
            .reading_log
            .iter()
            .filter(|e| e.book_id == book_id)
            .cloned()
            .collect())
    }

    fn append_log(&self, entry: &ReadingLogEntry) -> anyhow::Result<()> {
        self.state()?.reading_log.push(entry.clone());
        Ok(())
    }

    fn remove_chunk_log(&self, chunk_id: &str) -> anyhow::Result<()> {
        self.state()?.reading_log.retain(|e| e.chunk_id != chunk_id);
        Ok(())
    }

    fn replace_book(
        &self,
        book: &Book,
        chunks: Vec<Chunk>,
        log: Vec<ReadingLogEntry>,
    ) -> anyhow::Result<()> {
        self.state()?.replace_book(book, chunks, log);
        Ok(())
    }
}

/// Snapshot store: the full library lives in `library.json` under the
/// given directory. Mutations apply to a copy of the state, flush the
/// snapshot to disk, and only then become visible — a failed flush
/// leaves both memory and disk on the previous snapshot.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<LibraryState>,
}

impl JsonFileStore {
    pub fn open(dir: &Path) -> anyhow::Result<Self> {
        let path = dir.join("library.json");
        let state = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("parse library snapshot: {}", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => LibraryState::default(),
            Err(err) => {
                return Err(err).with_context(|| format!("read library snapshot: {}", path.display()));
            }
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    fn state(&self) -> anyhow::Result<MutexGuard<'_, LibraryState>> {
        self.state
            .lock()
            .map_err(|_| anyhow::anyhow!("library state lock poisoned"))
    }

    fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut LibraryState) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        let mut guard = self.state()?;
        let mut next = guard.clone();
        let value = apply(&mut next)?;
        write_json_atomic(&self.path, &next).context("flush library snapshot")?;
        *guard = next;
        Ok(value)
    }
}

impl LibraryStore for JsonFileStore {
    fn insert_book(&self, book: &Book, chunks: &[Chunk]) -> anyhow::Result<()> {
        self.mutate(|state| state.insert_book(book, chunks))
    }

    fn book(&self, book_id: &str) -> anyhow::Result<Option<Book>> {
        Ok(self.state()?.books.iter().find(|b| b.id == book_id).cloned())
    }

    fn books(&self) -> anyhow::Result<Vec<Book>> {
        Ok(self.state()?.books.clone())
    }

    fn update_book(&self, book: &Book) -> anyhow::Result<()> {
        self.mutate(|state| state.update_book(book))
    }

    fn chunks(&self, book_id: &str) -> anyhow::Result<Vec<Chunk>> {
        Ok(self.state()?.chunks_of(book_id))
    }

    fn chunk(&self, chunk_id: &str) -> anyhow::Result<Option<Chunk>> {
        Ok(self.state()?.chunks.iter().find(|c| c.id == chunk_id).cloned())
    }

    fn log_entries(&self, book_id: &str) -> anyhow::Result<Vec<ReadingLogEntry>> {
        Ok(self
            .state()?
            .reading_log
            .iter()
            .filter(|e| e.book_id == book_id)
            .cloned()
            .collect())
    }

    fn append_log(&self, entry: &ReadingLogEntry) -> anyhow::Result<()> {
        self.mutate(|state| {
            state.reading_log.push(entry.clone());
            Ok(())
        })
    }

    fn remove_chunk_log(&self, chunk_id: &str) -> anyhow::Result<()> {
        self.mutate(|state| {
            state.reading_log.retain(|e| e.chunk_id != chunk_id);
            Ok(())
        })
    }

    fn replace_book(
        &self,
        book: &Book,
        chunks: Vec<Chunk>,
        log: Vec<ReadingLogEntry>,
    ) -> anyhow::Result<()> {
        self.mutate(|state| {
            state.replace_book(book, chunks, log);
            Ok(())
        })
    }
}

fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("path has no parent: {}", path.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("create parent dir: {}", parent.display()))?;

    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    let data = serde_json::to_vec_pretty(value).context("serialize json")?;
    std::fs::write(&tmp_path, &data)
        .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("rename tmp to final: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{JsonFileStore, LibraryStore, MemoryStore};
    use crate::model::{Book, BookStatus, Chunk};

    fn sample_book(id: &str) -> Book {
        Book {
            id: id.to_owned(),
            title: "Sample".to_owned(),
            author: "Author".to_owned(),
            source_dir: "/tmp/sample".into(),
            chunk_size_words: 1000,
            status: BookStatus::Active,
            total_chunks: 2,
            current_chunk_index: 0,
            added_at: Utc::now(),
            completed_at: None,
        }
    }

    fn sample_chunk(book_id: &str, id: &str, index: usize) -> Chunk {
        Chunk {
            id: id.to_owned(),
            book_id: book_id.to_owned(),
            index,
            chapter_title: Some("One".to_owned()),
            content_markup: "<p>words here</p>".to_owned(),
            content_text: "words here".to_owned(),
            word_count: 2,
        }
    }

    #[test]
    fn chunks_come_back_ordered_by_index() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let book = sample_book("b1");
        let chunks = vec![
            sample_chunk("b1", "c1", 1),
            sample_chunk("b1", "c0", 0),
        ];
        store.insert_book(&book, &chunks)?;

        let rows = store.chunks("b1")?;
        assert_eq!(
            rows.iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![0, 1]
        );
        Ok(())
    }

    #[test]
    fn duplicate_insert_is_rejected() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        store.insert_book(&sample_book("b1"), &[])?;
        assert!(store.insert_book(&sample_book("b1"), &[]).is_err());
        Ok(())
    }

    #[test]
    fn replace_book_swaps_the_whole_chunk_set() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let mut book = sample_book("b1");
        store.insert_book(
            &book,
            &[sample_chunk("b1", "c0", 0), sample_chunk("b1", "c1", 1)],
        )?;

        book.total_chunks = 1;
        store.replace_book(&book, vec![sample_chunk("b1", "n0", 0)], vec![])?;

        let rows = store.chunks("b1")?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "n0");
        assert!(store.chunk("c0")?.is_none());
        Ok(())
    }

    #[test]
    fn json_store_round_trips_and_leaves_no_temp_files() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;

        {
            let store = JsonFileStore::open(dir.path())?;
            store.insert_book(&sample_book("b1"), &[sample_chunk("b1", "c0", 0)])?;
        }

        let reopened = JsonFileStore::open(dir.path())?;
        let book = reopened.book("b1")?.expect("book persisted");
        assert_eq!(book.title, "Sample");
        assert_eq!(reopened.chunks("b1")?.len(), 1);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())?
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name != "library.json")
            .collect();
        assert!(leftovers.is_empty(), "unexpected files: {leftovers:?}");
        Ok(())
    }
}
