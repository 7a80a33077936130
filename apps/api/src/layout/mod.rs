//! Static text measurement: per-font character widths and a greedy word-wrap line counter.
//! Pagination asks "does this text fit the page?" through these without a live renderer.

pub mod font_metrics;
pub mod wrap;

pub use font_metrics::{default_page_config, page_config, FontFamily, PageConfig};
