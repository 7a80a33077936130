//! Page Store: ordered pages with stable identities.
//!
//! Order is document reading order. Identities come from a monotonic counter owned by
//! the store and are never reused, so a `PageId` stays a valid join key to the host's
//! render target even while indices shift under insertion and removal.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable page identity. Never an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(u64);

impl From<u64> for PageId {
    fn from(raw: u64) -> Self {
        PageId(raw)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One page record: identity plus its owned text buffer.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub id: PageId,
    pub content: String,
}

/// Ordered sequence of pages. Never empty: the first page is permanent.
#[derive(Debug)]
pub struct PageStore {
    pages: Vec<Page>,
    next_id: u64,
}

impl PageStore {
    /// Creates a store holding a single page with `initial` content.
    pub fn new(initial: impl Into<String>) -> Self {
        let mut store = PageStore {
            pages: Vec::new(),
            next_id: 1,
        };
        store.append(initial);
        store
    }

    fn issue_id(&mut self) -> PageId {
        let id = PageId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Appends a page at the end and returns its fresh identity.
    pub fn append(&mut self, content: impl Into<String>) -> PageId {
        let id = self.issue_id();
        self.pages.push(Page {
            id,
            content: content.into(),
        });
        id
    }

    /// Inserts a page directly after `after`. Returns `None` if `after` is not in the store.
    #[cfg(test)]
    pub fn insert_after(&mut self, after: PageId, content: impl Into<String>) -> Option<PageId> {
        let index = self.index_of(after)?;
        let id = self.issue_id();
        self.pages.insert(
            index + 1,
            Page {
                id,
                content: content.into(),
            },
        );
        Some(id)
    }

    /// Removes a page, keeping the relative order of the rest.
    ///
    /// The first page is permanent; asking to remove it (or an unknown id) returns `None`.
    pub fn remove(&mut self, id: PageId) -> Option<Page> {
        match self.index_of(id)? {
            0 => None,
            index => Some(self.pages.remove(index)),
        }
    }

    pub fn get(&self, id: PageId) -> Option<&str> {
        self.pages
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.content.as_str())
    }

    pub fn get_mut(&mut self, id: PageId) -> Option<&mut String> {
        self.pages
            .iter_mut()
            .find(|p| p.id == id)
            .map(|p| &mut p.content)
    }

    pub fn index_of(&self, id: PageId) -> Option<usize> {
        self.pages.iter().position(|p| p.id == id)
    }

    pub fn page_at(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    /// Identity of the page immediately after `id`, if any.
    pub fn successor(&self, id: PageId) -> Option<PageId> {
        let index = self.index_of(id)?;
        self.pages.get(index + 1).map(|p| p.id)
    }

    pub fn first_id(&self) -> PageId {
        self.pages[0].id
    }

    pub fn iter(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Read-only aggregation for collaborators: page buffers joined by a single space.
    pub fn document_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Page buffers concatenated with no separator: the exact document characters.
    #[cfg(test)]
    pub fn raw_text(&self) -> String {
        self.pages.iter().map(|p| p.content.as_str()).collect()
    }
}
