//! Document sessions: the host side of pagination. Owns each session's page store, routes
//! host edits into reflow passes, and exposes the result over HTTP.

pub mod handlers;
pub mod session;

pub use session::{DocumentRegistry, EditOutcome, EditorSession, PageView};
