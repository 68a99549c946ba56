//! Shared utility functions for markdown rendering.

use pulldown_cmark::HeadingLevel;

/// Convert heading level enum to number (1-6).
#[must_use]
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Byte ranges of fenced code blocks (```` ``` ```` or `~~~`) in `markdown`.
///
/// Line-based pre-passes use this to leave code untouched. An unclosed fence
/// runs to the end of the input.
pub(crate) fn fenced_code_ranges(markdown: &str) -> Vec<std::ops::Range<usize>> {
    let mut ranges = Vec::new();
    let mut open: Option<(usize, char, usize)> = None;
    let mut offset = 0;

    for line in markdown.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let fence_char = trimmed.chars().next().filter(|c| *c == '`' || *c == '~');
        let fence_len = fence_char.map_or(0, |c| trimmed.chars().take_while(|x| *x == c).count());

        match (open, fence_char) {
            (None, Some(c)) if fence_len >= 3 => open = Some((offset, c, fence_len)),
            (Some((start, c, len)), Some(fc))
                if fc == c && fence_len >= len && trimmed[fence_len..].trim().is_empty() =>
            {
                ranges.push(start..offset + line.len());
                open = None;
            }
            _ => {}
        }
        offset += line.len();
    }

    if let Some((start, _, _)) = open {
        ranges.push(start..markdown.len());
    }
    ranges
}
