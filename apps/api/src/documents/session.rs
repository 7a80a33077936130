//! Editor sessions: one paginated document per session, plus its chat history.
//!
//! Edits write the page buffer under the store lock and then queue for the reflow gate.
//! The gate serializes whole reflow passes; the store lock is only held for short
//! synchronous sections, so an edit may land while a pass waits for a mount.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chat::ChatExchange;
use crate::errors::AppError;
use crate::pagination::{
    HeightOracle, MountRegistry, MountSignal, PageId, PageStore, ReflowEngine, ReflowError,
    ReflowReport,
};

#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub id: PageId,
    pub index: usize,
    pub content: String,
}

/// Result of an edit once its reflow pass has finished.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EditOutcome {
    pub report: ReflowReport,
    /// Set when the pass stopped early and left a page over capacity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupted: Option<String>,
}

pub struct EditorSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pages: Mutex<PageStore>,
    reflow_gate: Mutex<()>,
    engine: ReflowEngine,
    mounts: Arc<dyn MountSignal>,
    chat: Mutex<Vec<ChatExchange>>,
}

impl EditorSession {
    /// Creates a session whose first page holds `text`. The first page is mounted immediately.
    pub fn new(
        oracle: Arc<dyn HeightOracle>,
        mounts: Arc<dyn MountSignal>,
        mount_timeout: Duration,
        text: impl Into<String>,
    ) -> Self {
        let store = PageStore::new(text);
        mounts.request_mount(store.first_id());
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            pages: Mutex::new(store),
            reflow_gate: Mutex::new(()),
            engine: ReflowEngine::new(oracle, Arc::clone(&mounts), mount_timeout),
            mounts,
            chat: Mutex::new(Vec::new()),
        }
    }

    pub async fn pages(&self) -> Vec<PageView> {
        let store = self.pages.lock().await;
        store
            .iter()
            .enumerate()
            .map(|(index, page)| PageView {
                id: page.id,
                index,
                content: page.content.clone(),
            })
            .collect()
    }

    pub async fn document_text(&self) -> String {
        self.pages.lock().await.document_text()
    }

    /// Reflows from the first page, e.g. after the session is created with text.
    pub async fn reflow_from_start(&self) -> Result<EditOutcome, AppError> {
        let first = self.pages.lock().await.first_id();
        self.run_reflow(first).await
    }

    /// Replaces a page's buffer and reflows from it.
    pub async fn edit_page(&self, page: PageId, content: String) -> Result<EditOutcome, AppError> {
        {
            let mut store = self.pages.lock().await;
            let buf = store
                .get_mut(page)
                .ok_or_else(|| AppError::NotFound(format!("Page {page} not found")))?;
            *buf = content;
        }
        self.run_reflow(page).await
    }

    /// Removes a page (never the first) and reflows its predecessor.
    pub async fn remove_page(&self, page: PageId) -> Result<EditOutcome, AppError> {
        let predecessor = {
            let mut store = self.pages.lock().await;
            let index = store
                .index_of(page)
                .ok_or_else(|| AppError::NotFound(format!("Page {page} not found")))?;
            if index == 0 {
                return Err(AppError::Validation(
                    "The first page cannot be removed".to_string(),
                ));
            }
            let predecessor = store
                .page_at(index - 1)
                .map(|p| p.id)
                .unwrap_or_else(|| store.first_id());
            store.remove(page);
            predecessor
        };
        self.mounts.release(page);
        info!(session = %self.id, page = %page, "Page removed by host");
        self.run_reflow(predecessor).await
    }

    pub async fn record_exchange(&self, exchange: ChatExchange) {
        self.chat.lock().await.push(exchange);
    }

    pub async fn chat_history(&self) -> Vec<ChatExchange> {
        self.chat.lock().await.clone()
    }

    /// Runs one reflow pass for `page` once every earlier pass has settled.
    async fn run_reflow(&self, page: PageId) -> Result<EditOutcome, AppError> {
        let _gate = self.reflow_gate.lock().await;

        let index = self.pages.lock().await.index_of(page);
        let Some(index) = index else {
            debug!(session = %self.id, page = %page, "Edited page gone before its reflow ran");
            return Ok(EditOutcome::default());
        };

        match self.engine.reflow(&self.pages, index).await {
            Ok(report) => Ok(EditOutcome {
                report,
                interrupted: None,
            }),
            Err(e) if e.is_benign() => {
                debug!(session = %self.id, error = %e, "Reflow aborted by a concurrent edit");
                Ok(EditOutcome::default())
            }
            Err(ReflowError::NoSplitProgress { page, partial }) => {
                warn!(session = %self.id, page = %page, moves = partial.moves, "Reflow left a page over capacity");
                Ok(EditOutcome {
                    interrupted: Some(format!(
                        "page {page} overflows but no split point makes progress"
                    )),
                    report: partial,
                })
            }
            Err(e) => Err(AppError::Reflow(e)),
        }
    }
}

/// All open sessions, keyed by session id.
#[derive(Clone)]
pub struct DocumentRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<EditorSession>>>>,
    oracle: Arc<dyn HeightOracle>,
    mount_timeout: Duration,
}

impl DocumentRegistry {
    pub fn new(oracle: Arc<dyn HeightOracle>, mount_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            oracle,
            mount_timeout,
        }
    }

    /// Opens a session with `text` on its first page and paginates it.
    ///
    /// Server sessions are measured with static metrics, so their host mounts pages as
    /// soon as they are requested.
    pub async fn create(
        &self,
        text: String,
    ) -> Result<(Arc<EditorSession>, EditOutcome), AppError> {
        let session = Arc::new(EditorSession::new(
            Arc::clone(&self.oracle),
            Arc::new(MountRegistry::new(true)),
            self.mount_timeout,
            text,
        ));
        let outcome = session.reflow_from_start().await?;

        self.sessions
            .write()
            .await
            .insert(session.id, Arc::clone(&session));
        info!(session = %session.id, pages = outcome.report.created.len() + 1, "Document session opened");
        Ok((session, outcome))
    }

    pub async fn get(&self, id: Uuid) -> Result<Arc<EditorSession>, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))
    }

    pub async fn close(&self, id: Uuid) -> Result<(), AppError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| info!(session = %id, "Document session closed"))
            .ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::testing::CharBudget;

    fn session(budget: usize, text: &str) -> EditorSession {
        EditorSession::new(
            Arc::new(CharBudget::new(budget)),
            Arc::new(MountRegistry::new(true)),
            Duration::from_secs(1),
            text,
        )
    }

    #[tokio::test]
    async fn test_edit_page_reflows_forward() {
        let session = session(20, "");
        let first = session.pages().await[0].id;

        let outcome = session
            .edit_page(first, "alpha beta gamma delta epsilon".to_string())
            .await
            .expect("edit");

        assert_eq!(outcome.report.created.len(), 1);
        let pages = session.pages().await;
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].content, "alpha beta gamma ");
        assert_eq!(pages[1].content, "delta epsilon");
        assert_eq!(pages[1].index, 1);
    }

    #[tokio::test]
    async fn test_edit_unknown_page_is_not_found() {
        let session = session(20, "text");
        let err = session
            .edit_page(PageId::from(42), "x".to_string())
            .await
            .expect_err("no such page");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_deleting_text_pulls_next_page_back() {
        let session = session(20, "alpha beta gamma delta epsilon");
        session.reflow_from_start().await.expect("initial reflow");
        let first = session.pages().await[0].id;

        let outcome = session
            .edit_page(first, "alpha ".to_string())
            .await
            .expect("edit");

        assert_eq!(outcome.report.removed.len(), 1);
        let pages = session.pages().await;
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].content, "alpha delta epsilon");
    }

    #[tokio::test]
    async fn test_no_split_progress_is_reported_not_raised() {
        let session = session(0, "x");
        let outcome = session.reflow_from_start().await.expect("not an error");
        assert!(outcome.interrupted.is_some());
        assert_eq!(session.pages().await[0].content, "x");
    }

    #[tokio::test]
    async fn test_interrupted_pass_reports_partial_moves() {
        let session = EditorSession::new(
            Arc::new(CharBudget::new(20).with_page(PageId::from(2), 0)),
            Arc::new(MountRegistry::new(true)),
            Duration::from_secs(1),
            "alpha beta gamma delta epsilon",
        );

        let outcome = session.reflow_from_start().await.expect("not an error");

        assert!(outcome.interrupted.is_some());
        assert_eq!(outcome.report.moves, 1);
        assert_eq!(outcome.report.created, vec![PageId::from(2)]);
        assert_eq!(session.pages().await.len(), 2);
    }

    #[tokio::test]
    async fn test_first_page_cannot_be_removed() {
        let session = session(20, "text");
        let first = session.pages().await[0].id;
        let err = session.remove_page(first).await.expect_err("first page");
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_remove_page_reflows_predecessor() {
        let session = session(10, "one two three four five");
        session.reflow_from_start().await.expect("initial reflow");
        let pages = session.pages().await;
        assert_eq!(pages.len(), 3);

        session.remove_page(pages[1].id).await.expect("remove");

        let after = session.pages().await;
        assert_eq!(after.len(), 2);
        assert_eq!(after[0].content, pages[0].content);
        assert_eq!(after[1].content, pages[2].content);
    }

    #[tokio::test]
    async fn test_document_text_joins_pages() {
        let session = session(10, "one two three four");
        session.reflow_from_start().await.expect("reflow");
        assert_eq!(session.document_text().await, "one two  three four");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmounted_page_surfaces_oracle_unavailable() {
        let session = EditorSession::new(
            Arc::new(CharBudget::new(10)),
            Arc::new(MountRegistry::new(false)),
            Duration::from_millis(100),
            "one two three four",
        );
        let err = session
            .reflow_from_start()
            .await
            .expect_err("mount never arrives");
        assert!(matches!(
            err,
            AppError::Reflow(ReflowError::OracleUnavailable { .. })
        ));
        assert_eq!(session.pages().await.len(), 1);
    }

    #[tokio::test]
    async fn test_registry_create_get_close() {
        let registry = DocumentRegistry::new(Arc::new(CharBudget::new(10)), Duration::from_secs(1));
        let (session, outcome) = registry
            .create("one two three four".to_string())
            .await
            .expect("create");
        assert_eq!(outcome.report.created.len(), 1);

        let fetched = registry.get(session.id).await.expect("get");
        assert_eq!(fetched.pages().await.len(), 2);

        registry.close(session.id).await.expect("close");
        assert!(matches!(
            registry.get(session.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(registry.close(session.id).await.is_err());
    }
}
