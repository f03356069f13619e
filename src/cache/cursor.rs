// SPDX-License-Identifier: MPL-2.0

/// Pagination state for one feed context.
///
/// `page` is the last page accepted (0 before the first load). Deleting a
/// post does not move the cursor, so after deletions the next page number
/// can overlap items already shown; upserts on append absorb the overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page: u32,
    pub page_size: u32,
    /// No further pages exist on the server
    pub exhausted: bool,
    /// Total items received for this context, duplicates included
    pub fetched: u64,
}

impl PageCursor {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 0,
            page_size: page_size.max(1),
            exhausted: false,
            fetched: 0,
        }
    }

    /// Page number to request next, or `None` once the feed is exhausted
    pub fn next_page(&self) -> Option<u32> {
        (!self.exhausted).then_some(self.page + 1)
    }

    /// Reset to a freshly accepted first page
    pub fn reset(&mut self, received: usize, total_pages: Option<u32>) {
        self.page = 0;
        self.fetched = 0;
        self.exhausted = false;
        self.advance(1, received, total_pages);
    }

    /// Record that `page` arrived with `received` items.
    ///
    /// The feed is exhausted when a short page arrives or the server says
    /// `page` was the last one.
    pub fn advance(&mut self, page: u32, received: usize, total_pages: Option<u32>) {
        self.page = page;
        self.fetched += received as u64;
        let short_page = received < self.page_size as usize;
        let last_page = total_pages.is_some_and(|total| page >= total);
        self.exhausted = short_page || last_page;
    }
}
