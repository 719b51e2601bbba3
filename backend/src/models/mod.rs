//! Data models shared across storage access and API handlers.

use serde::{Deserialize, Serialize};

pub mod audit_log;
pub mod feedback;
pub mod invite;
pub mod password_reset;
pub mod session;
pub mod user;

/// Page window over a filtered listing. `offset` counts whole pages of
/// `page_limit` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page_limit: u32,
    pub offset: u32,
}

impl PageWindow {
    pub fn new(page_limit: u32, offset: u32) -> Self {
        Self {
            page_limit: page_limit.max(1),
            offset,
        }
    }

    /// Index of the first record on the page.
    pub fn start(&self) -> usize {
        self.page_limit as usize * self.offset as usize
    }

    /// Number of matching records that must be collected before the page is
    /// complete; scanning can stop once this many have been seen.
    pub fn target(&self) -> usize {
        self.start() + self.page_limit as usize
    }

    /// Cuts the page out of records collected up to [`PageWindow::target`].
    pub fn slice<T>(&self, mut collected: Vec<T>) -> Vec<T> {
        let start = self.start().min(collected.len());
        collected.truncate(self.target());
        collected.split_off(start)
    }
}

/// Body of the `*/list` endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPayload {
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default)]
    pub offset: u32,
}

impl ListPayload {
    /// Search term with surrounding whitespace removed; blank means none.
    pub fn term(&self) -> Option<&str> {
        self.term.as_deref().map(str::trim).filter(|term| !term.is_empty())
    }
}

/// Toggles an entity's soft-delete flag.
#[derive(Debug, Clone, Deserialize)]
pub struct DeletePayload {
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListMeta {
    pub count: usize,
    pub offset: u32,
    pub pagesize: u32,
}

/// Wrapper for paginated API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T: Serialize> {
    pub meta: ListMeta,
    pub results: Vec<T>,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(results: Vec<T>, window: PageWindow) -> Self {
        Self {
            meta: ListMeta {
                count: results.len(),
                offset: window.offset,
                pagesize: window.page_limit,
            },
            results,
        }
    }
}
