//! Pagination core: keeps every page's content within its visible capacity while the
//! document is edited. Overflow is pushed forward (creating pages as needed), underflow is
//! pulled back one hop from the immediate successor.

pub mod engine;
pub mod mount;
pub mod oracle;
pub mod split;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;

use thiserror::Error;

pub use engine::{ReflowEngine, ReflowReport};
pub use mount::{MountRegistry, MountSignal};
pub use oracle::{HeightOracle, MetricOracle};
pub use store::{PageId, PageStore};

#[derive(Debug, Error)]
pub enum ReflowError {
    /// The host never mounted a newly created page. The page sequence was rolled back
    /// to its pre-creation state.
    #[error("render target for page {page} was not mounted within {waited:?}")]
    OracleUnavailable { page: PageId, waited: Duration },

    /// The resolver could not move any content off an overflowing page. The content
    /// stays where it is, over capacity. `partial` holds what the pass changed before it stopped.
    #[error("page {page} overflows but no split point makes progress")]
    NoSplitProgress { page: PageId, partial: ReflowReport },

    /// A page this pass was about to write disappeared during the mount suspension.
    #[error("page {0} no longer exists")]
    IdentityNotFound(PageId),

    /// The created page still exists but is no longer right after the page that overflowed.
    #[error("page {page} is no longer the successor of page {origin}")]
    StaleSuccessor { page: PageId, origin: PageId },

    #[error("page index {index} is out of range for {len} page(s)")]
    IndexOutOfRange { index: usize, len: usize },
}

impl ReflowError {
    /// Cancellation aborts caused by a concurrent edit. Not worth reporting to a user.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            ReflowError::IdentityNotFound(_) | ReflowError::StaleSuccessor { .. }
        )
    }
}
