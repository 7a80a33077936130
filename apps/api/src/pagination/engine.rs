//! Reflow Engine: restores the page invariants after a single-page edit.
//!
//! # Pass structure
//! 1. Overflow: starting at the edited page, while the cursor page does not fit, keep the
//!    longest fitting prefix and push the rest onto the successor (prepending), moving the
//!    cursor forward. With no successor a page is appended, and the pass suspends until
//!    the host mounts it.
//! 2. Underflow: once, on the edited page only, pull the longest fitting prefix of the
//!    immediate successor back. A successor left blank is removed. Underflow never chains
//!    past that one hop; a further pass (the next edit) resolves longer chains.
//!
//! The cascade is an explicit loop over a cursor id, so stack depth does not grow with
//! document length.
//!
//! # Locking
//! The store lock is never held across the mount suspension, so plain edits can still
//! land while a pass waits. Whatever happened meanwhile is re-validated by page identity
//! when the pass resumes. Callers serialize whole passes (see `documents::session`).

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::pagination::mount::MountSignal;
use crate::pagination::oracle::HeightOracle;
use crate::pagination::split::{resolve_split, SplitMode};
use crate::pagination::store::{PageId, PageStore};
use crate::pagination::ReflowError;

/// What one settled pass changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReflowReport {
    /// Overflow pushes plus underflow pulls.
    pub moves: usize,
    pub created: Vec<PageId>,
    pub removed: Vec<PageId>,
}

impl ReflowReport {
    pub fn is_noop(&self) -> bool {
        self.moves == 0 && self.created.is_empty() && self.removed.is_empty()
    }
}

/// A page created during overflow, waiting for its mount before receiving `tail`.
struct PendingPage {
    origin: PageId,
    page: PageId,
    tail: String,
}

enum OverflowStep {
    Settled,
    Forwarded(PageId),
    NeedsPage(PendingPage),
}

pub struct ReflowEngine {
    oracle: Arc<dyn HeightOracle>,
    mounts: Arc<dyn MountSignal>,
    mount_timeout: Duration,
}

impl ReflowEngine {
    pub fn new(
        oracle: Arc<dyn HeightOracle>,
        mounts: Arc<dyn MountSignal>,
        mount_timeout: Duration,
    ) -> Self {
        Self {
            oracle,
            mounts,
            mount_timeout,
        }
    }

    /// Runs one reflow pass for the page at `edited_index`.
    pub async fn reflow(
        &self,
        pages: &Mutex<PageStore>,
        edited_index: usize,
    ) -> Result<ReflowReport, ReflowError> {
        let mut report = ReflowReport::default();

        let edited = {
            let store = pages.lock().await;
            store
                .page_at(edited_index)
                .map(|p| p.id)
                .ok_or(ReflowError::IndexOutOfRange {
                    index: edited_index,
                    len: store.len(),
                })?
        };

        let mut cursor = edited;
        loop {
            let pending = {
                let mut store = pages.lock().await;
                match self.push_overflow(&mut store, cursor, &mut report)? {
                    OverflowStep::Settled => break,
                    OverflowStep::Forwarded(next) => {
                        cursor = next;
                        continue;
                    }
                    OverflowStep::NeedsPage(pending) => pending,
                }
            };
            cursor = self.populate_new_page(pages, pending).await?;
        }

        {
            let mut store = pages.lock().await;
            self.pull_underflow(&mut store, edited, &mut report);
        }

        if report.is_noop() {
            debug!(page = %edited, "Reflow settled without changes");
        } else {
            info!(
                page = %edited,
                moves = report.moves,
                created = report.created.len(),
                removed = report.removed.len(),
                "Reflow settled"
            );
        }
        Ok(report)
    }

    /// One overflow step on `cursor`: split it if it does not fit and hand the tail on.
    fn push_overflow(
        &self,
        store: &mut PageStore,
        cursor: PageId,
        report: &mut ReflowReport,
    ) -> Result<OverflowStep, ReflowError> {
        let content = store
            .get(cursor)
            .ok_or(ReflowError::IdentityNotFound(cursor))?;
        if self.oracle.fits(cursor, content) {
            return Ok(OverflowStep::Settled);
        }

        let split = resolve_split(content, SplitMode::Overflow, |candidate| {
            self.oracle.fits(cursor, candidate)
        });
        if split == 0 || split >= content.len() {
            warn!(page = %cursor, len = content.len(), split, "Overflowing page cannot be split");
            return Err(ReflowError::NoSplitProgress {
                page: cursor,
                partial: report.clone(),
            });
        }

        let tail = store
            .get_mut(cursor)
            .map(|buf| buf.split_off(split))
            .ok_or(ReflowError::IdentityNotFound(cursor))?;
        report.moves += 1;

        match store.successor(cursor) {
            Some(next) => {
                debug!(from = %cursor, to = %next, bytes = tail.len(), "Pushing overflow forward");
                if let Some(buf) = store.get_mut(next) {
                    buf.insert_str(0, &tail);
                }
                Ok(OverflowStep::Forwarded(next))
            }
            None => {
                let page = store.append(String::new());
                report.created.push(page);
                debug!(from = %cursor, page = %page, bytes = tail.len(), "Creating page for overflow");
                self.mounts.request_mount(page);
                Ok(OverflowStep::NeedsPage(PendingPage {
                    origin: cursor,
                    page,
                    tail,
                }))
            }
        }
    }

    /// Waits for the created page's mount, re-validates it, and writes the pending tail.
    /// Returns the page the cascade continues on.
    async fn populate_new_page(
        &self,
        pages: &Mutex<PageStore>,
        pending: PendingPage,
    ) -> Result<PageId, ReflowError> {
        let waited = tokio::time::timeout(self.mount_timeout, self.mounts.mounted(pending.page)).await;

        let mut store = pages.lock().await;

        if waited.is_err() {
            warn!(
                page = %pending.page,
                timeout_ms = self.mount_timeout.as_millis() as u64,
                "Render target never mounted; rolling back page creation"
            );
            let page = pending.page;
            if store.remove(page).is_some() {
                self.mounts.release(page);
            }
            restore_tail(&mut store, pending);
            return Err(ReflowError::OracleUnavailable {
                page,
                waited: self.mount_timeout,
            });
        }

        let Some(index) = store.index_of(pending.page) else {
            debug!(page = %pending.page, "Created page vanished during mount; aborting write");
            let page = pending.page;
            restore_tail(&mut store, pending);
            return Err(ReflowError::IdentityNotFound(page));
        };

        if store.index_of(pending.origin).map(|i| i + 1) != Some(index) {
            debug!(page = %pending.page, origin = %pending.origin, "Created page moved during mount; rolling back page creation");
            let (page, origin) = (pending.page, pending.origin);
            if store.remove(page).is_some() {
                self.mounts.release(page);
            }
            restore_tail(&mut store, pending);
            return Err(ReflowError::StaleSuccessor { page, origin });
        }

        if let Some(buf) = store.get_mut(pending.page) {
            buf.insert_str(0, &pending.tail);
        }
        Ok(pending.page)
    }

    /// Pulls content back from the immediate successor into `edited`, then drops blank pages.
    fn pull_underflow(&self, store: &mut PageStore, edited: PageId, report: &mut ReflowReport) {
        let Some(index) = store.index_of(edited) else {
            debug!(page = %edited, "Edited page vanished before underflow; skipping");
            return;
        };

        if let Some(next) = store.successor(edited) {
            let current = store.get(edited).map(str::to_owned).unwrap_or_default();
            let incoming = store.get(next).map(str::to_owned).unwrap_or_default();

            if !incoming.is_empty() && self.oracle.fits(edited, &current) {
                let mut candidate = String::with_capacity(current.len() + incoming.len());
                let pull = resolve_split(&incoming, SplitMode::Append, |prefix| {
                    candidate.clear();
                    candidate.push_str(&current);
                    candidate.push_str(prefix);
                    self.oracle.fits(edited, &candidate)
                });

                if pull > 0 {
                    debug!(from = %next, to = %edited, bytes = pull, "Pulling underflow back");
                    if let Some(buf) = store.get_mut(edited) {
                        buf.push_str(&incoming[..pull]);
                    }
                    if let Some(buf) = store.get_mut(next) {
                        buf.drain(..pull);
                    }
                    report.moves += 1;
                }
            }

            if store.get(next).is_some_and(is_blank) {
                self.drop_page(store, next, report);
            }
        }

        if index > 0 && store.get(edited).is_some_and(is_blank) {
            self.drop_page(store, edited, report);
        }
    }

    fn drop_page(&self, store: &mut PageStore, page: PageId, report: &mut ReflowReport) {
        if store.remove(page).is_some() {
            debug!(page = %page, "Removing blank page");
            self.mounts.release(page);
            report.removed.push(page);
        }
    }
}

fn is_blank(content: &str) -> bool {
    content.trim().is_empty()
}

/// Puts an undelivered tail back at the end of the page it was cut from. If that page is
/// gone too, the tail goes to the end of the document so no text is lost.
fn restore_tail(store: &mut PageStore, pending: PendingPage) {
    let target = if store.get(pending.origin).is_some() {
        pending.origin
    } else {
        warn!(origin = %pending.origin, "Origin page vanished; appending tail to last page");
        last_page_id(store)
    };
    if let Some(buf) = store.get_mut(target) {
        buf.push_str(&pending.tail);
    }
}

fn last_page_id(store: &PageStore) -> PageId {
    store
        .iter()
        .last()
        .map(|p| p.id)
        .unwrap_or_else(|| store.first_id())
}
