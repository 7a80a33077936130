//! Height Oracle: the one capability the reflow engine needs from a renderer.

use crate::layout::font_metrics::{get_metrics, PageConfig};
use crate::layout::wrap::fits_page;
use crate::pagination::store::PageId;

/// Reports whether candidate content fits a page's visible capacity.
///
/// Probing goes through `&self`, so a measurement can never leave candidate text
/// behind in the target. Implementations must be idempotent, and callers only probe
/// targets whose mount has been signalled.
pub trait HeightOracle: Send + Sync {
    fn fits(&self, target: PageId, candidate: &str) -> bool;
}

/// Server-side oracle: wraps candidate text with static font metrics and compares the
/// line count against the page's line capacity. Every page shares one geometry.
#[derive(Debug, Clone)]
pub struct MetricOracle {
    config: PageConfig,
}

impl MetricOracle {
    pub fn new(config: PageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }
}

impl HeightOracle for MetricOracle {
    fn fits(&self, _target: PageId, candidate: &str) -> bool {
        fits_page(candidate, get_metrics(&self.config.font), &self.config)
    }
}
