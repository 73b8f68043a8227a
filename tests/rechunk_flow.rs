//! End-to-end rechunk behavior: pointer and reading-log remapping when
//! a book's chunk set is wholesale replaced.

use bookdrip::chunker::ChapterInput;
use bookdrip::error::EngineError;
use bookdrip::ingest::ingest_book;
use bookdrip::model::{Book, BookStatus, ReadVia};
use bookdrip::progress::mark_chunk_read;
use bookdrip::rechunk::rechunk_book;
use bookdrip::source::ContentSource;
use bookdrip::store::{LibraryStore, MemoryStore};

struct FixedSource(Vec<ChapterInput>);

impl ContentSource for FixedSource {
    fn chapters(&self, _book: &Book) -> anyhow::Result<Vec<ChapterInput>> {
        Ok(self.0.clone())
    }
}

struct FailingSource;

impl ContentSource for FailingSource {
    fn chapters(&self, book: &Book) -> anyhow::Result<Vec<ChapterInput>> {
        anyhow::bail!("source gone for {}", book.id)
    }
}

fn paragraph(words: usize) -> String {
    format!("<p>{}</p>", vec!["word"; words].join(" "))
}

/// One chapter of forty 100-word paragraphs (4,000 words total).
fn long_chapter() -> Vec<ChapterInput> {
    let markup = (0..40).map(|_| paragraph(100)).collect::<Vec<_>>().join("\n");
    vec![ChapterInput {
        title: "Only".to_owned(),
        markup,
    }]
}

fn seed_library(
    store: &MemoryStore,
    chapters: &[ChapterInput],
    chunk_size: u32,
) -> anyhow::Result<Book> {
    let dir = tempfile::TempDir::new()?;
    let manifest: Vec<String> = chapters
        .iter()
        .enumerate()
        .map(|(i, ch)| {
            let file = format!("ch{i}.html");
            std::fs::write(dir.path().join(&file), &ch.markup)?;
            Ok(format!(
                r#"{{ "title": "{}", "file": "{file}" }}"#,
                ch.title
            ))
        })
        .collect::<anyhow::Result<_>>()?;
    std::fs::write(
        dir.path().join("book.json"),
        format!(
            r#"{{ "title": "Long Book", "author": "Nobody", "chapters": [{}] }}"#,
            manifest.join(", ")
        ),
    )?;
    Ok(ingest_book(store, dir.path(), chunk_size)?)
}

#[test]
fn shrinking_the_target_roughly_doubles_chunks_and_keeps_the_place() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let chapters = long_chapter();
    let book = seed_library(&store, &chapters, 1000)?;

    // 100-word paragraphs at target 1000 pack into 1200-word chunks
    // plus a 400-word tail.
    let old_chunks = store.chunks(&book.id)?;
    assert_eq!(old_chunks.len(), 4);

    // Read the first two chunks (2,400 words).
    for chunk in &old_chunks[..2] {
        mark_chunk_read(&store, &chunk.id, ReadVia::WebApp)?;
    }

    let outcome = rechunk_book(&store, &FixedSource(chapters), &book.id, 500)?;

    // 600-word chunks now: seven of them, and 2,400 words read puts the
    // pointer at index 4 — about double the old index, not reset to 0.
    assert_eq!(outcome.total_chunks, 7);
    assert_eq!(outcome.current_chunk_index, 4);

    let book = store.book(&book.id)?.expect("book");
    assert_eq!(book.chunk_size_words, 500);
    assert_eq!(book.total_chunks, 7);
    assert_eq!(book.status, BookStatus::Active);

    // Indices are contiguous and the word total is conserved.
    let new_chunks = store.chunks(&book.id)?;
    for (position, chunk) in new_chunks.iter().enumerate() {
        assert_eq!(chunk.index, position);
    }
    let total: u32 = new_chunks.iter().map(|c| c.word_count).sum();
    assert_eq!(total, 4000);
    Ok(())
}

#[test]
fn noop_rechunk_keeps_pointer_and_log_positions() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let chapters = long_chapter();
    let book = seed_library(&store, &chapters, 1000)?;

    let old_chunks = store.chunks(&book.id)?;
    mark_chunk_read(&store, &old_chunks[1].id, ReadVia::EmailLink)?;
    let pointer_before = store.book(&book.id)?.expect("book").current_chunk_index;

    let outcome = rechunk_book(&store, &FixedSource(chapters), &book.id, 1000)?;
    assert_eq!(outcome.current_chunk_index, pointer_before);
    assert_eq!(outcome.total_chunks, old_chunks.len());

    // Ids were regenerated, but each log entry still points at the
    // chunk occupying the same position.
    let log = store.log_entries(&book.id)?;
    assert_eq!(log.len(), 1);
    let referenced = store.chunk(&log[0].chunk_id)?.expect("remapped chunk");
    assert_eq!(referenced.index, 1);
    assert_eq!(log[0].read_via, Some(ReadVia::EmailLink));
    Ok(())
}

#[test]
fn growing_the_target_merges_log_references() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let chapters = long_chapter();
    let book = seed_library(&store, &chapters, 500)?;

    let old_chunks = store.chunks(&book.id)?;
    assert_eq!(old_chunks.len(), 7);
    for chunk in &old_chunks[..2] {
        mark_chunk_read(&store, &chunk.id, ReadVia::WebApp)?;
    }

    rechunk_book(&store, &FixedSource(chapters), &book.id, 1000)?;

    // Both 600-word chunks read (1,200 words) collapse exactly onto the
    // first 1,200-word chunk of the new sequence.
    let book = store.book(&book.id)?.expect("book");
    assert_eq!(book.current_chunk_index, 1);
    let log = store.log_entries(&book.id)?;
    assert_eq!(log.len(), 2);
    for entry in &log {
        let referenced = store.chunk(&entry.chunk_id)?.expect("remapped chunk");
        assert_eq!(referenced.index, 0);
    }
    Ok(())
}

#[test]
fn completed_book_stays_completed_when_pointer_still_reaches_the_end() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let chapters = long_chapter();
    let book = seed_library(&store, &chapters, 1000)?;

    let old_chunks = store.chunks(&book.id)?;
    let last = old_chunks.last().expect("chunks");
    mark_chunk_read(&store, &last.id, ReadVia::WebApp)?;
    let completed_at = store.book(&book.id)?.expect("book").completed_at;
    assert!(completed_at.is_some());

    rechunk_book(&store, &FixedSource(chapters), &book.id, 500)?;

    let book = store.book(&book.id)?.expect("book");
    assert_eq!(book.status, BookStatus::Completed);
    assert_eq!(book.current_chunk_index, book.total_chunks);
    // The original completion timestamp is preserved.
    assert_eq!(book.completed_at, completed_at);
    Ok(())
}

#[test]
fn unavailable_source_fails_without_mutating_state() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let chapters = long_chapter();
    let book = seed_library(&store, &chapters, 1000)?;
    let before_chunks = store.chunks(&book.id)?;
    let before_book = store.book(&book.id)?.expect("book");

    let err = rechunk_book(&store, &FailingSource, &book.id, 500).unwrap_err();
    assert!(matches!(err, EngineError::SourceUnavailable(_)));

    let after_book = store.book(&book.id)?.expect("book");
    assert_eq!(after_book.chunk_size_words, before_book.chunk_size_words);
    assert_eq!(after_book.total_chunks, before_book.total_chunks);
    let after_chunks = store.chunks(&book.id)?;
    assert_eq!(
        after_chunks.iter().map(|c| &c.id).collect::<Vec<_>>(),
        before_chunks.iter().map(|c| &c.id).collect::<Vec<_>>()
    );
    Ok(())
}

#[test]
fn out_of_policy_target_is_rejected_before_any_work() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let chapters = long_chapter();
    let book = seed_library(&store, &chapters, 1000)?;

    let err = rechunk_book(&store, &FailingSource, &book.id, 5000).unwrap_err();
    // Validation fires before the source is touched.
    assert!(matches!(
        err,
        EngineError::ChunkSizeOutOfRange { given: 5000 }
    ));
    Ok(())
}

#[test]
fn repair_dry_run_reports_without_mutating() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let chapters = long_chapter();
    let mut book = seed_library(&store, &chapters, 1000)?;

    // Corrupt the stored total so the analyzer flags the book.
    book.total_chunks += 3;
    store.update_book(&book)?;

    let report =
        bookdrip::integrity::repair_books(&store, &FixedSource(chapters.clone()), None, true, None)?;
    assert_eq!(report.checked, 1);
    assert_eq!(report.flagged.len(), 1);
    assert!(report.repaired.is_empty());
    assert_eq!(store.book(&book.id)?.expect("book").total_chunks, 7);

    let report = bookdrip::integrity::repair_books(&store, &FixedSource(chapters), None, false, None)?;
    assert_eq!(report.repaired.len(), 1);
    let repaired = store.book(&book.id)?.expect("book");
    assert_eq!(repaired.total_chunks, 4);
    assert_eq!(repaired.total_chunks, store.chunks(&book.id)?.len());
    Ok(())
}

#[test]
fn rechunking_an_unknown_book_is_not_found() {
    let store = MemoryStore::new();
    let err = rechunk_book(&store, &FailingSource, "missing", 1000).unwrap_err();
    assert!(matches!(err, EngineError::BookNotFound(_)));
}
