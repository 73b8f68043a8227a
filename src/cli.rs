use clap::{Args, Parser, Subcommand};

use crate::model::ReadVia;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding the library snapshot (`library.json`).
    #[arg(long, default_value = "library")]
    pub library: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Chunk a book's source directory and add it to the library.
    Ingest(IngestArgs),
    /// List books with status and progress.
    List,
    /// Show a book's chapter runs with read state.
    Toc(TocArgs),
    /// Mark a chunk read.
    Read(ReadArgs),
    /// Mark a chunk unread.
    Unread(UnreadArgs),
    /// Reset a book's progress for a full re-read.
    Restart(RestartArgs),
    /// Rebuild a book's chunks at a new word target, remapping progress.
    Rechunk(RechunkArgs),
    /// Inspect persisted chunk sets for integrity issues.
    Check(CheckArgs),
    /// Rechunk flagged books (dry run unless --apply).
    Repair(RepairArgs),
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Source directory containing `book.json` and chapter markup files.
    #[arg(long)]
    pub source: String,

    /// Target words per chunk.
    #[arg(long, default_value_t = crate::model::DEFAULT_CHUNK_SIZE_WORDS)]
    pub chunk_size: u32,
}

#[derive(Debug, Args)]
pub struct TocArgs {
    /// Book id.
    #[arg(long)]
    pub book: String,
}

#[derive(Debug, Args)]
pub struct ReadArgs {
    /// Chunk id.
    #[arg(long)]
    pub chunk: String,

    /// Delivery channel recorded in the reading log.
    #[arg(long, value_enum, default_value = "web-app")]
    pub via: ReadVia,
}

#[derive(Debug, Args)]
pub struct UnreadArgs {
    /// Chunk id.
    #[arg(long)]
    pub chunk: String,
}

#[derive(Debug, Args)]
pub struct RestartArgs {
    /// Book id.
    #[arg(long)]
    pub book: String,
}

#[derive(Debug, Args)]
pub struct RechunkArgs {
    /// Book id.
    #[arg(long)]
    pub book: String,

    /// New target words per chunk.
    #[arg(long)]
    pub chunk_size: u32,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Restrict the check to one book.
    #[arg(long)]
    pub book: Option<String>,
}

#[derive(Debug, Args)]
pub struct RepairArgs {
    /// Restrict the repair to one book.
    #[arg(long)]
    pub book: Option<String>,

    /// Apply repairs instead of only reporting candidates.
    #[arg(long)]
    pub apply: bool,

    /// Maximum number of books to check.
    #[arg(long)]
    pub limit: Option<usize>,
}
