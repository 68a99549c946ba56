//! Text statistics: word count, reading time and summaries.

use std::sync::LazyLock;

use regex::Regex;

static CJK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\x{4e00}-\x{9fa5}]").unwrap());
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[a-zA-Z0-9]+\b").unwrap());

/// Count words in plain text.
///
/// Each CJK ideograph counts as one word, plus every run of ASCII letters
/// and digits.
#[must_use]
pub fn word_count(text: &str) -> usize {
    CJK_RE.find_iter(text).count() + WORD_RE.find_iter(text).count()
}

/// Reading time estimate, at least one minute.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn reading_time(words: usize, words_per_minute: u32) -> String {
    let minutes = (words as f64 / f64::from(words_per_minute.max(1))).round() as u64;
    format!("{} min", minutes.max(1))
}

/// Summary made of the first non-blank lines of `text`.
///
/// Lines are trimmed and joined with spaces until `max_chars` characters
/// are collected. Longer summaries are cut and end in `...`.
#[must_use]
pub fn summarize(text: &str, max_chars: usize) -> String {
    let mut parts = Vec::new();
    let mut collected = 0;
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        parts.push(line);
        collected += line.chars().count();
        if collected >= max_chars {
            break;
        }
    }

    let summary = parts.join(" ");
    if summary.chars().count() <= max_chars {
        return summary;
    }
    let mut cut: String = summary.chars().take(max_chars.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}
