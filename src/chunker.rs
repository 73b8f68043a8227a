//! Segmentation engine: splits chapter markup into word-bounded chunks.
//!
//! Chunks never split mid-paragraph, prefer chapter boundaries, and aim
//! for approximately `target_words` words each. Inline formatting such
//! as `<em>`, `<strong>`, `<blockquote>`, `<a>` is preserved inside each
//! paragraph unit.

use std::sync::LazyLock;

use regex::Regex;

use crate::words::{count_words, strip_markup};

/// One chapter of source content, ordered as it appears in the book.
#[derive(Debug, Clone)]
pub struct ChapterInput {
    pub title: String,
    pub markup: String,
}

/// One packed chunk, tagged with the chapter title active when it was
/// closed. Content text and word count are derived from the markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkContent {
    pub chapter_title: String,
    pub content_markup: String,
    pub content_text: String,
    pub word_count: u32,
}

static P_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p[\s>].*?</p>").expect("paragraph pattern"));
static BLANK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("blank line pattern"));
static BLOCK_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^<(?:p|div|blockquote|h[1-6])[\s>]").expect("block pattern"));

/// Extract paragraph units from chapter markup.
///
/// Looks for `<p>...</p>` blocks (any attributes, case-insensitive). If
/// none are found, falls back to splitting on blank-line boundaries and
/// wraps each bare block in `<p>` tags so downstream code can treat it
/// uniformly. Units with zero words are discarded.
pub fn extract_paragraphs(markup: &str) -> Vec<String> {
    let matches: Vec<String> = P_BLOCK
        .find_iter(markup)
        .map(|m| m.as_str().trim().to_owned())
        .filter(|m| count_words(m) > 0)
        .collect();

    if !matches.is_empty() {
        return matches;
    }

    BLANK_LINE
        .split(markup)
        .map(str::trim)
        .filter(|b| count_words(b) > 0)
        .map(|b| {
            if BLOCK_OPEN.is_match(b) {
                b.to_owned()
            } else {
                format!("<p>{b}</p>")
            }
        })
        .collect()
}

fn pack(paragraphs: &[String], chapter_title: &str) -> ChunkContent {
    let content_markup = paragraphs.join("\n");
    let content_text = strip_markup(&content_markup);
    let word_count = count_words(&content_markup);
    ChunkContent {
        chapter_title: chapter_title.to_owned(),
        content_markup,
        content_text,
        word_count,
    }
}

/// Split book chapters into chunks of approximately `target_words` words.
///
/// Rules:
///  - Never split mid-paragraph.
///  - If adding a paragraph would exceed 120% of the target and the
///    buffer already has content, flush the buffer first.
///  - At chapter boundaries, flush if the buffer is at least 60% of the
///    target; otherwise the buffer carries into the next chapter.
///  - Any remaining buffer after the last chapter becomes the final
///    chunk regardless of size.
///
/// The result is deterministic for a fixed `(chapters, target_words)`.
pub fn chunk_book(chapters: &[ChapterInput], target_words: u32) -> Vec<ChunkContent> {
    let target = f64::from(target_words);
    let mut chunks = Vec::new();
    let mut buffer: Vec<String> = Vec::new();
    let mut buffer_words: u32 = 0;
    let mut current_title = String::new();

    for chapter in chapters {
        let paragraphs = extract_paragraphs(&chapter.markup);
        current_title = chapter.title.clone();

        for paragraph in paragraphs {
            let words = count_words(&paragraph);

            if buffer_words > 0 && f64::from(buffer_words + words) > target * 1.2 {
                chunks.push(pack(&buffer, &current_title));
                buffer = vec![paragraph];
                buffer_words = words;
            } else {
                buffer.push(paragraph);
                buffer_words += words;
            }
        }

        // Prefer chapter boundaries as chunk boundaries.
        if f64::from(buffer_words) >= target * 0.6 {
            chunks.push(pack(&buffer, &current_title));
            buffer.clear();
            buffer_words = 0;
        }
    }

    if !buffer.is_empty() {
        chunks.push(pack(&buffer, &current_title));
    }

    chunks
}
