//! Source content reconstitution. Books are ingested from a directory
//! holding a `book.json` manifest plus one markup file per chapter; the
//! same directory is re-read whenever a book is rechunked. Parsing of
//! packaged ebook formats stays outside this crate.

use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::chunker::ChapterInput;
use crate::model::Book;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookManifest {
    pub title: String,
    pub author: String,
    pub chapters: Vec<ManifestChapter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestChapter {
    pub title: String,
    /// Path of the chapter markup file, relative to the source dir.
    pub file: String,
}

pub trait ContentSource: Send + Sync {
    /// Return the book's ordered chapter list with body markup.
    fn chapters(&self, book: &Book) -> anyhow::Result<Vec<ChapterInput>>;
}

/// Reads chapters from the book's `source_dir`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirSource;

impl ContentSource for DirSource {
    fn chapters(&self, book: &Book) -> anyhow::Result<Vec<ChapterInput>> {
        let manifest = read_manifest(&book.source_dir)?;
        load_chapters(&book.source_dir, &manifest)
    }
}

pub fn read_manifest(source_dir: &Path) -> anyhow::Result<BookManifest> {
    let path = source_dir.join("book.json");
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("read book manifest: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse book manifest: {}", path.display()))
}

pub fn load_chapters(
    source_dir: &Path,
    manifest: &BookManifest,
) -> anyhow::Result<Vec<ChapterInput>> {
    manifest
        .chapters
        .iter()
        .map(|chapter| {
            if chapter.file.split(['/', '\\']).any(|seg| seg == "..") {
                anyhow::bail!("chapter file must not contain '..': {}", chapter.file);
            }
            let path = source_dir.join(&chapter.file);
            let markup = std::fs::read_to_string(&path)
                .with_context(|| format!("read chapter markup: {}", path.display()))?;
            Ok(ChapterInput {
                title: chapter.title.clone(),
                markup,
            })
        })
        .collect()
}
