//! Page cursor for incremental tag loading.

/// Records requested per page unless configured otherwise
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Forward-only pagination cursor.
///
/// `has_more` starts true and is never cleared: the cursor keeps advancing
/// past the last real page if asked to, producing requests that return no
/// new tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    page: u32,
    limit: u32,
    has_more: bool,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT)
    }
}

impl PaginationState {
    /// Start at page 0. A zero limit is raised to 1.
    pub fn new(limit: u32) -> Self {
        Self {
            page: 0,
            limit: limit.max(1),
            has_more: true,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Move to the next page if more pages are believed to exist
    pub fn advance(&mut self) {
        if !self.has_more {
            return;
        }
        self.page = self.page.saturating_add(1);
        tracing::debug!(page = self.page, limit = self.limit, "pagination advanced");
    }
}
