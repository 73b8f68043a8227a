//! CLI command implementations: open the store, call the engine, print
//! a human-readable result on stdout.

use std::path::Path;

use crate::chapter_runs::{RunStatus, build_chapter_runs};
use crate::cli::{
    CheckArgs, IngestArgs, ReadArgs, RechunkArgs, RepairArgs, RestartArgs, TocArgs, UnreadArgs,
};
use crate::integrity::{analyze_book, repair_books};
use crate::model::BookStatus;
use crate::progress::{mark_chunk_read, mark_chunk_unread, restart_book};
use crate::rechunk::rechunk_book;
use crate::source::DirSource;
use crate::store::{JsonFileStore, LibraryStore};

fn open_store(library: &Path) -> anyhow::Result<JsonFileStore> {
    JsonFileStore::open(library)
}

fn status_label(status: BookStatus) -> &'static str {
    match status {
        BookStatus::Active => "active",
        BookStatus::Paused => "paused",
        BookStatus::Queued => "queued",
        BookStatus::Completed => "completed",
    }
}

pub fn ingest(library: &Path, args: IngestArgs) -> anyhow::Result<()> {
    let store = open_store(library)?;
    let book = crate::ingest::ingest_book(&store, Path::new(&args.source), args.chunk_size)?;
    println!(
        "ingested \"{}\" by {} ({} chunks of ~{} words, id {})",
        book.title, book.author, book.total_chunks, book.chunk_size_words, book.id
    );
    Ok(())
}

pub fn list(library: &Path) -> anyhow::Result<()> {
    let store = open_store(library)?;
    let books = store.books()?;
    if books.is_empty() {
        println!("library is empty");
        return Ok(());
    }
    for book in books {
        println!(
            "{}  {}/{}  {}  \"{}\" by {}",
            book.id,
            book.current_chunk_index,
            book.total_chunks,
            status_label(book.status),
            book.title,
            book.author
        );
    }
    Ok(())
}

pub fn toc(library: &Path, args: TocArgs) -> anyhow::Result<()> {
    let store = open_store(library)?;
    let book = crate::progress::require_book(&store, &args.book)?;
    let chunks = store.chunks(&book.id)?;
    let runs = build_chapter_runs(&chunks);

    println!("\"{}\" by {}", book.title, book.author);
    for run in &runs {
        let marker = match run.status(&book) {
            RunStatus::Read => "x",
            RunStatus::Partial => "~",
            RunStatus::Unread => " ",
        };
        let first = run.chunk_indices[0];
        let last = run.chunk_indices[run.chunk_indices.len() - 1];
        println!("[{marker}] {}  (chunks {first}..={last})", run.title);
        for (id, index) in run.chunk_ids.iter().zip(&run.chunk_indices) {
            println!("      {index:>4}  {id}");
        }
    }
    Ok(())
}

pub fn read(library: &Path, args: ReadArgs) -> anyhow::Result<()> {
    let store = open_store(library)?;
    let outcome = mark_chunk_read(&store, &args.chunk, args.via)?;
    if outcome.completed {
        println!("book completed (pointer {})", outcome.new_pointer);
    } else {
        match outcome.next_chunk_id {
            Some(next) => println!("pointer {}; next chunk {next}", outcome.new_pointer),
            None => println!("pointer {}", outcome.new_pointer),
        }
    }
    Ok(())
}

pub fn unread(library: &Path, args: UnreadArgs) -> anyhow::Result<()> {
    let store = open_store(library)?;
    let outcome = mark_chunk_unread(&store, &args.chunk)?;
    if outcome.reverted_completion {
        println!("completion reverted; pointer {}", outcome.new_pointer);
    } else {
        println!("pointer {}", outcome.new_pointer);
    }
    Ok(())
}

pub fn restart(library: &Path, args: RestartArgs) -> anyhow::Result<()> {
    let store = open_store(library)?;
    let book = restart_book(&store, &args.book)?;
    println!("restarted \"{}\"; pointer 0", book.title);
    Ok(())
}

pub fn rechunk(library: &Path, args: RechunkArgs) -> anyhow::Result<()> {
    let store = open_store(library)?;
    let outcome = rechunk_book(&store, &DirSource, &args.book, args.chunk_size)?;
    println!(
        "rechunked: {} chunks, pointer {}",
        outcome.total_chunks, outcome.current_chunk_index
    );
    Ok(())
}

pub fn check(library: &Path, args: CheckArgs) -> anyhow::Result<()> {
    let store = open_store(library)?;
    let books = match args.book {
        Some(id) => vec![crate::progress::require_book(&store, &id)?],
        None => store.books()?,
    };

    let mut clean = true;
    for book in &books {
        let report = analyze_book(&store, &book.id)?;
        if report.issues.is_empty() {
            continue;
        }
        clean = false;
        println!("{}  \"{}\"  {:?}", report.book_id, report.title, report.issues);
    }
    if clean {
        println!("no integrity issues in {} book(s)", books.len());
    }
    Ok(())
}

pub fn repair(library: &Path, args: RepairArgs) -> anyhow::Result<()> {
    let store = open_store(library)?;
    let report = repair_books(
        &store,
        &DirSource,
        args.book.as_deref(),
        !args.apply,
        args.limit,
    )?;

    println!(
        "checked {} book(s), {} flagged{}",
        report.checked,
        report.flagged.len(),
        if report.dry_run { " (dry run)" } else { "" }
    );
    for flagged in &report.flagged {
        println!("  {}  \"{}\"  {:?}", flagged.book_id, flagged.title, flagged.issues);
    }
    for repaired in &report.repaired {
        println!(
            "  repaired {}: {} chunks, pointer {}",
            repaired.book_id, repaired.total_chunks, repaired.current_chunk_index
        );
    }
    Ok(())
}
