/// Per-restaurant pagination progress
///
/// Owned exclusively by one restaurant's chain. The current page only moves
/// forward, so a payload that reports an earlier page than the one requested
/// cannot send the chain back over pages it already processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationCursor {
    pub res_id: String,
    pub current_page: u32,
    pub total_pages: u32,
}

impl PaginationCursor {
    /// Creates a cursor positioned before the first page
    pub fn new(res_id: impl Into<String>) -> Self {
        Self {
            res_id: res_id.into(),
            current_page: 0,
            total_pages: 1,
        }
    }

    /// Records the metadata of a page that was just fetched
    ///
    /// # Arguments
    ///
    /// * `requested` - The page number that was requested
    /// * `reported_current` - `currentPage` as reported by the payload
    /// * `reported_total` - `numberOfPages` as reported by the payload
    pub fn record_page(&mut self, requested: u32, reported_current: u32, reported_total: u32) {
        let current = requested.max(reported_current).max(self.current_page);
        self.current_page = current;
        self.total_pages = reported_total;
    }

    /// Returns true if the platform reported pages beyond the current one
    pub fn has_more(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Returns the next page to request, or None when the last page was reached
    pub fn next_page(&self) -> Option<u32> {
        if self.has_more() {
            Some(self.current_page + 1)
        } else {
            None
        }
    }
}
