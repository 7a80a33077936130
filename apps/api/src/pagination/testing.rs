//! Synthetic oracles and fixtures shared by pagination and session tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::pagination::mount::MountRegistry;
use crate::pagination::oracle::HeightOracle;
use crate::pagination::store::PageId;
use crate::pagination::ReflowEngine;

/// Fits if the candidate has at most `default` characters, or the page's own override.
pub struct CharBudget {
    default: usize,
    overrides: HashMap<PageId, usize>,
}

impl CharBudget {
    pub fn new(default: usize) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    pub fn with_page(mut self, page: PageId, budget: usize) -> Self {
        self.overrides.insert(page, budget);
        self
    }

    pub fn budget_for(&self, page: PageId) -> usize {
        self.overrides.get(&page).copied().unwrap_or(self.default)
    }
}

impl HeightOracle for CharBudget {
    fn fits(&self, target: PageId, candidate: &str) -> bool {
        candidate.chars().count() <= self.budget_for(target)
    }
}

pub fn engine_with(
    oracle: impl HeightOracle + 'static,
    mounts: Arc<MountRegistry>,
    mount_timeout: Duration,
) -> ReflowEngine {
    ReflowEngine::new(Arc::new(oracle), mounts, mount_timeout)
}

/// Engine over a char budget with an auto-mounting host.
pub fn budget_engine(budget: usize) -> ReflowEngine {
    engine_with(
        CharBudget::new(budget),
        Arc::new(MountRegistry::new(true)),
        Duration::from_secs(1),
    )
}

/// `count` space-separated words cycling through a small vocabulary.
pub fn words(count: usize) -> String {
    const VOCAB: [&str; 8] = [
        "page", "flow", "cursor", "split", "word", "buffer", "reader", "margin",
    ];
    (0..count)
        .map(|i| VOCAB[i % VOCAB.len()])
        .collect::<Vec<_>>()
        .join(" ")
}
