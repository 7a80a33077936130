//! Split-Point Resolver: finds the longest prefix of a text that still fits a page.
//!
//! The search bisects over character counts, so every probe is a valid `&str` slice,
//! and each probe costs one oracle measurement (O(log n) measurements per split).
//! The raw result is then snapped back to the nearest preceding whitespace so a word
//! is never severed.

/// How a split result is going to be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// Splitting a page's own overflowing text. If no whitespace precedes the raw
    /// split point the unsnapped offset is returned, so an unbroken run longer than a
    /// page still makes progress.
    Overflow,
    /// Pulling a prefix of the successor's text behind content already on the page.
    /// Word snapping is strict: if only part of the first word fits, nothing is pulled.
    Append,
}

/// Returns the byte offset `k` (always on a char boundary) of the longest prefix
/// `text[..k]` that `fits`, snapped to a word boundary according to `mode`.
///
/// If the whole text fits, `text.len()` is returned unsnapped: the end of a buffer is
/// a boundary. `fits` must be monotone (a prefix of something that fits also fits).
pub fn resolve_split<F>(text: &str, mode: SplitMode, mut fits: F) -> usize
where
    F: FnMut(&str) -> bool,
{
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = boundaries.len() - 1;

    let mut start = 0usize;
    let mut end = char_count;
    while start < end {
        let mid = (start + end + 1) / 2;
        if fits(&text[..boundaries[mid]]) {
            start = mid;
        } else {
            end = mid - 1;
        }
    }
    let raw = start;

    if raw == char_count {
        return text.len();
    }

    let mut point = raw;
    while point > 0 && !ends_with_whitespace(&text[..boundaries[point]]) {
        point -= 1;
    }

    if point > 0 {
        return boundaries[point];
    }
    match mode {
        SplitMode::Overflow => boundaries[raw],
        SplitMode::Append => 0,
    }
}

fn ends_with_whitespace(s: &str) -> bool {
    s.chars().next_back().is_some_and(char::is_whitespace)
}
