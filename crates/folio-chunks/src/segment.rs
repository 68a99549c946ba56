//! Text segmentation.
//!
//! HTML is cut after block-level closing tags and line breaks, then small
//! pieces are merged until each chunk reaches a minimum size.

use std::sync::LazyLock;

use regex::Regex;

static BLOCK_END_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:</(?:p|pre|h[1-6]|li|ul|ol|table)>|<br\s*/?>)").unwrap()
});

/// Split `html` into pieces ending at block boundaries.
///
/// Concatenating the pieces yields the input.
fn split_blocks(html: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for boundary in BLOCK_END_RE.find_iter(html) {
        pieces.push(&html[last..boundary.end()]);
        last = boundary.end();
    }
    if last < html.len() {
        pieces.push(&html[last..]);
    }
    pieces
}

/// Cut `html` into text chunks of at least `min_chunk_size` characters.
///
/// Whitespace-only pieces are dropped. The last chunk may be shorter than
/// the minimum.
pub(crate) fn segment(html: &str, min_chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for piece in split_blocks(html) {
        if piece.trim().is_empty() {
            continue;
        }
        current.push_str(piece);
        current_len += piece.chars().count();
        if current_len >= min_chunk_size {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
