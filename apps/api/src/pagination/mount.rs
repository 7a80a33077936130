//! Mount signalling between the reflow engine and the host that owns render targets.
//!
//! A newly created page cannot be measured until the host has mounted its render
//! target. The engine asks for a mount, then awaits the signal (bounded by a timeout
//! on the engine side).

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use crate::pagination::store::PageId;

#[async_trait]
pub trait MountSignal: Send + Sync {
    /// Tells the host that `page` was created and needs a render target.
    fn request_mount(&self, page: PageId);

    /// Resolves once `page`'s render target can be measured.
    async fn mounted(&self, page: PageId);

    /// Tells the host that `page` was removed and its target can be dropped.
    fn release(&self, page: PageId);
}

/// Set of mounted page ids, shared through a `watch` channel so waiters wake on change.
///
/// With `auto_mount` the registry acts as its own host and mounts on request, which is
/// what the metric-measured server sessions use. Without it, something else must call
/// [`MountRegistry::mark_mounted`].
pub struct MountRegistry {
    mounted: watch::Sender<HashSet<PageId>>,
    auto_mount: bool,
}

impl MountRegistry {
    pub fn new(auto_mount: bool) -> Self {
        let (mounted, _) = watch::channel(HashSet::new());
        Self {
            mounted,
            auto_mount,
        }
    }

    pub fn mark_mounted(&self, page: PageId) {
        self.mounted.send_modify(|set| {
            set.insert(page);
        });
    }

    #[cfg(test)]
    pub fn is_mounted(&self, page: PageId) -> bool {
        self.mounted.borrow().contains(&page)
    }
}

#[async_trait]
impl MountSignal for MountRegistry {
    fn request_mount(&self, page: PageId) {
        debug!(page = %page, auto = self.auto_mount, "Mount requested");
        if self.auto_mount {
            self.mark_mounted(page);
        }
    }

    async fn mounted(&self, page: PageId) {
        let mut rx = self.mounted.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|set| set.contains(&page)).await;
    }

    fn release(&self, page: PageId) {
        self.mounted.send_modify(|set| {
            set.remove(&page);
        });
    }
}
