//! Greedy word-wrap simulation used to decide how many lines page content occupies.
//!
//! Paragraphs are separated by `\n`; each paragraph starts on a fresh line and an empty
//! paragraph still occupies one line. A single trailing `\n` only ends the last paragraph:
//! the caret line it opens is not counted until something is typed on it. Words wider than
//! a whole line are broken between characters, the same way an editor with
//! `overflow-wrap: break-word` renders them.
//!
//! The line count is monotone in prefix length: appending characters to a string never
//! reduces the number of lines it wraps to. The split-point binary search depends on that.

use crate::layout::font_metrics::{FontMetricTable, PageConfig};

/// Counts the printed lines `text` occupies at the configured line width.
///
/// An empty string occupies 0 lines.
pub fn count_lines(text: &str, metrics: &FontMetricTable, config: &PageConfig) -> usize {
    if text.is_empty() {
        return 0;
    }
    let text = text.strip_suffix('\n').unwrap_or(text);
    text.split('\n')
        .map(|paragraph| paragraph_lines(paragraph, metrics, config.text_width_em))
        .sum()
}

/// Returns true if `text` wraps to no more lines than the page can show.
pub fn fits_page(text: &str, metrics: &FontMetricTable, config: &PageConfig) -> bool {
    count_lines(text, metrics, config) <= usize::from(config.lines_per_page)
}

fn paragraph_lines(paragraph: &str, metrics: &FontMetricTable, max_width: f32) -> usize {
    let mut lines = 1usize;
    let mut current_width = 0.0_f32;
    let mut first_on_line = true;

    for word in paragraph.split_whitespace() {
        let word_w = metrics.measure_str(word);
        let space_w = if first_on_line {
            0.0
        } else {
            metrics.space_width()
        };

        if current_width + space_w + word_w <= max_width {
            current_width += space_w + word_w;
            first_on_line = false;
            continue;
        }

        if !first_on_line {
            lines += 1;
            current_width = 0.0;
        }

        if word_w <= max_width {
            current_width = word_w;
        } else {
            // Word is wider than a line on its own: break it between characters.
            for c in word.chars() {
                let w = metrics.char_width(c);
                if current_width > 0.0 && current_width + w > max_width {
                    lines += 1;
                    current_width = 0.0;
                }
                current_width += w;
            }
        }
        first_on_line = false;
    }

    lines
}
