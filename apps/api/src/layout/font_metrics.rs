//! Static font metrics used to measure page content without a live renderer.
//!
//! Character widths are in em units (relative to font size). One reference table (Inter)
//! is stored; every other family is expressed as a uniform scale of it. This is coarse,
//! but pagination only needs a consistent, monotone notion of "how much fits on a page",
//! not glyph-exact output.
//!
//! The table covers ASCII 0x20..=0x7E (95 printable characters), index = (char as usize) - 32.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Font family enum
// ────────────────────────────────────────────────────────────────────────────

/// The page fonts an editor session can be measured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFamily {
    /// Humanist sans-serif, the reference metrics.
    Inter,
    /// Old-style serif. Approx. 85% of Inter.
    EbGaramond,
    /// Geometric humanist sans-serif. Approx. 105% of Inter.
    Lato,
    /// Condensed display sans-serif. Approx. 68% of Inter.
    Oswald,
    /// Traditional TeX font. Approx. 90% of Inter.
    ComputerModern,
}

impl FromStr for FontFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inter" => Ok(FontFamily::Inter),
            "eb_garamond" | "garamond" => Ok(FontFamily::EbGaramond),
            "lato" => Ok(FontFamily::Lato),
            "oswald" => Ok(FontFamily::Oswald),
            "computer_modern" | "cm" => Ok(FontFamily::ComputerModern),
            other => Err(format!("unknown font family '{other}'")),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Page configuration
// ────────────────────────────────────────────────────────────────────────────

/// Usable text width of a US letter page with 1" side margins, in points (6.5" × 72.27).
const TEXT_WIDTH_PT: f32 = 469.755;

/// Geometry of one editor page.
///
/// `text_width_em` is the usable line width in em units at `font_size_pt`.
/// Example: 6.5" text block at 11pt → 469.755pt ÷ 11pt ≈ 42.7em.
/// `lines_per_page` is the page's visible capacity: content that wraps to more lines overflows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    pub font: FontFamily,
    pub font_size_pt: u8,
    pub text_width_em: f32,
    pub lines_per_page: u16,
}

/// Returns the default page config for the given font family: 11pt, 45 lines per page.
pub fn default_page_config(font: FontFamily) -> PageConfig {
    page_config(font, 11, 45)
}

/// Builds a page config, deriving the line width from the font size.
pub fn page_config(font: FontFamily, font_size_pt: u8, lines_per_page: u16) -> PageConfig {
    let size = f32::from(font_size_pt.max(1));
    PageConfig {
        font,
        font_size_pt,
        text_width_em: TEXT_WIDTH_PT / size,
        lines_per_page: lines_per_page.max(1),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Character-width lookup for one font family.
pub struct FontMetricTable {
    /// Multiplier applied to the reference widths.
    scale: f32,
}

/// Fallback width for non-ASCII characters, before scaling.
const REFERENCE_AVERAGE_WIDTH: f32 = 0.52;

impl FontMetricTable {
    /// Width of a single character in em units. Non-ASCII falls back to the average width.
    pub fn char_width(&self, c: char) -> f32 {
        let code = c as usize;
        let base = if (32..=126).contains(&code) {
            REFERENCE_WIDTHS[code - 32]
        } else {
            REFERENCE_AVERAGE_WIDTH
        };
        base * self.scale
    }

    /// Measures the rendered width of a string in em units.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars().map(|c| self.char_width(c)).sum()
    }

    pub fn space_width(&self) -> f32 {
        self.char_width(' ')
    }

}

/// Inter reference widths.
#[rustfmt::skip]
static REFERENCE_WIDTHS: [f32; 95] = [
    // sp    !     "     #     $     %     &     '     (     )     *     +     ,     -     .     /
    0.25, 0.30, 0.38, 0.56, 0.56, 0.89, 0.67, 0.22, 0.33, 0.33, 0.39, 0.59, 0.28, 0.33, 0.28, 0.31,
    // 0-9
    0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56,
    // :     ;     <     =     >     ?     @
    0.28, 0.28, 0.59, 0.59, 0.59, 0.50, 1.02,
    // A-M
    0.67, 0.61, 0.61, 0.67, 0.56, 0.50, 0.67, 0.67, 0.25, 0.39, 0.61, 0.53, 0.78,
    // N-Z
    0.67, 0.72, 0.56, 0.72, 0.61, 0.50, 0.56, 0.67, 0.67, 0.89, 0.61, 0.61, 0.56,
    // [     \     ]     ^     _     `
    0.28, 0.31, 0.28, 0.47, 0.56, 0.34,
    // a-m
    0.56, 0.56, 0.50, 0.56, 0.56, 0.31, 0.56, 0.56, 0.22, 0.22, 0.53, 0.22, 0.83,
    // n-z
    0.56, 0.56, 0.56, 0.56, 0.33, 0.44, 0.39, 0.56, 0.50, 0.72, 0.50, 0.50, 0.44,
    // {     |     }     ~
    0.33, 0.26, 0.33, 0.59,
];

static INTER_TABLE: FontMetricTable = FontMetricTable {
    scale: 1.0,
};

static EB_GARAMOND_TABLE: FontMetricTable = FontMetricTable {
    scale: 0.85,
};

static LATO_TABLE: FontMetricTable = FontMetricTable {
    scale: 1.05,
};

static OSWALD_TABLE: FontMetricTable = FontMetricTable {
    scale: 0.68,
};

static COMPUTER_MODERN_TABLE: FontMetricTable = FontMetricTable {
    scale: 0.90,
};

/// Returns the static metric table for a given font family.
pub fn get_metrics(font: &FontFamily) -> &'static FontMetricTable {
    match font {
        FontFamily::Inter => &INTER_TABLE,
        FontFamily::EbGaramond => &EB_GARAMOND_TABLE,
        FontFamily::Lato => &LATO_TABLE,
        FontFamily::Oswald => &OSWALD_TABLE,
        FontFamily::ComputerModern => &COMPUTER_MODERN_TABLE,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_str_empty_returns_zero() {
        let metrics = get_metrics(&FontFamily::Inter);
        assert_eq!(metrics.measure_str(""), 0.0);
    }

    #[test]
    fn test_measure_str_ascii_characters() {
        let metrics = get_metrics(&FontFamily::Inter);
        // "Rust" = R(0.61) + u(0.56) + s(0.44) + t(0.39) = 2.00
        let width = metrics.measure_str("Rust");
        assert!(
            (width - 2.00).abs() < 1e-3,
            "Rust width should be ~2.00, got {width}"
        );
    }

    #[test]
    fn test_measure_str_non_ascii_falls_back() {
        let metrics = get_metrics(&FontFamily::Inter);
        let width = metrics.measure_str("é");
        assert!((width - REFERENCE_AVERAGE_WIDTH).abs() < 1e-4);
    }

    #[test]
    fn test_scaled_family_is_proportional() {
        let inter = get_metrics(&FontFamily::Inter);
        let garamond = get_metrics(&FontFamily::EbGaramond);
        let text = "Pagination keeps words whole";
        let ratio = garamond.measure_str(text) / inter.measure_str(text);
        assert!((ratio - 0.85).abs() < 1e-3, "ratio was {ratio}");
    }

    #[test]
    fn test_condensed_font_narrower_than_wide_font() {
        let text = "Overflow cascades forward";
        assert!(
            get_metrics(&FontFamily::Oswald).measure_str(text)
                < get_metrics(&FontFamily::Lato).measure_str(text)
        );
    }

    #[test]
    fn test_font_family_from_str() {
        assert_eq!("inter".parse::<FontFamily>(), Ok(FontFamily::Inter));
        assert_eq!(" EB_Garamond ".parse::<FontFamily>(), Ok(FontFamily::EbGaramond));
        assert_eq!("cm".parse::<FontFamily>(), Ok(FontFamily::ComputerModern));
        assert!("comic_sans".parse::<FontFamily>().is_err());
    }

    #[test]
    fn test_default_page_config_sanity() {
        let config = default_page_config(FontFamily::Inter);
        assert_eq!(config.font_size_pt, 11);
        assert!(config.text_width_em > 42.0 && config.text_width_em < 43.0);
        assert_eq!(config.lines_per_page, 45);
    }

    #[test]
    fn test_page_config_clamps_degenerate_values() {
        let config = page_config(FontFamily::Lato, 0, 0);
        assert_eq!(config.lines_per_page, 1);
        assert!(config.text_width_em.is_finite());
    }
}
