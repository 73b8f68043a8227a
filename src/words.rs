//! Canonical word counting. Every component that compares word counts
//! (chunker, progress, remap, integrity) must go through these two
//! functions, never a local reimplementation.

use std::sync::LazyLock;

use regex::Regex;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));

/// Strip markup tags from a string and return trimmed plain text.
pub fn strip_markup(markup: &str) -> String {
    TAG.replace_all(markup, "").trim().to_owned()
}

/// Count words in a string after stripping markup. Splits on whitespace
/// runs and ignores empty tokens.
pub fn count_words(markup: &str) -> u32 {
    let plain = strip_markup(markup);
    plain.split_whitespace().count() as u32
}

#[cfg(test)]
mod tests {
    use super::{count_words, strip_markup};

    #[test]
    fn strips_tags_and_trims() {
        assert_eq!(
            strip_markup("  <p>One <em>two</em> three</p>\n"),
            "One two three"
        );
    }

    #[test]
    fn counts_words_across_inline_markup() {
        assert_eq!(count_words("<p>One <em>two</em> three</p>"), 3);
        assert_eq!(count_words("one\ttwo\n three"), 3);
    }

    #[test]
    fn empty_and_whitespace_count_zero() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   \n\t"), 0);
        assert_eq!(count_words("<p></p>"), 0);
    }
}
