// SPDX-License-Identifier: MPL-2.0

use crate::api::{FeedPage, Post};
use crate::cache::cursor::PageCursor;
use crate::cache::index::{IndexedList, Placement, Upsert};
use std::fmt;
use tracing::debug;

/// Scope of a paginated post listing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeedContext {
    /// Everyone's posts
    Global,
    /// Posts of one user, keyed by user id
    Profile(String),
}

impl FeedContext {
    /// Stable key for logging and diagnostics
    pub fn key(&self) -> String {
        match self {
            FeedContext::Global => "global".to_string(),
            FeedContext::Profile(user_id) => format!("profile:{user_id}"),
        }
    }
}

impl fmt::Display for FeedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// A page the cache wants next: which context, which page, how big.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub context: FeedContext,
    pub page: u32,
    pub page_size: u32,
}

/// Ordered in-memory collection of posts for the active feed context.
#[derive(Debug, Clone)]
pub struct FeedCache {
    context: Option<FeedContext>,
    items: IndexedList<Post>,
    cursor: PageCursor,
}

impl FeedCache {
    pub fn new(page_size: u32) -> Self {
        Self {
            context: None,
            items: IndexedList::new(),
            cursor: PageCursor::new(page_size),
        }
    }

    pub fn context(&self) -> Option<&FeedContext> {
        self.context.as_ref()
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn page_size(&self) -> u32 {
        self.cursor.page_size
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor.exhausted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Post> {
        self.items.get(id)
    }

    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.items.iter()
    }

    /// Render-ready copy of the current posts
    pub fn snapshot(&self) -> Vec<Post> {
        self.items.to_vec()
    }

    /// Request for the first page of `context`
    pub fn first_request(&self, context: FeedContext) -> PageRequest {
        PageRequest {
            context,
            page: 1,
            page_size: self.cursor.page_size,
        }
    }

    /// Request for the next page of the active context. `None` when no
    /// context is loaded or the feed is exhausted.
    pub fn next_request(&self) -> Option<PageRequest> {
        let context = self.context.clone()?;
        let page = self.cursor.next_page()?;
        Some(PageRequest {
            context,
            page,
            page_size: self.cursor.page_size,
        })
    }

    /// Replace everything with the first page of `context`.
    pub fn load_first_page(&mut self, context: FeedContext, page: FeedPage) {
        let received = page.posts.len();
        self.items = IndexedList::from_records(page.posts);
        self.cursor.reset(received, page.total_pages);

        debug!(
            context = %context,
            received,
            exhausted = self.cursor.exhausted,
            "loaded first feed page"
        );
        self.context = Some(context);
    }

    /// Append a later page. Posts already present are refreshed in place
    /// rather than duplicated. Returns how many posts were new.
    pub fn load_next_page(&mut self, request: &PageRequest, page: FeedPage) -> usize {
        let received = page.posts.len();
        let mut inserted = 0;
        for post in page.posts {
            if self.items.upsert(post, Placement::Tail) == Upsert::Inserted {
                inserted += 1;
            }
        }
        self.cursor.advance(request.page, received, page.total_pages);

        debug!(
            context = %request.context,
            page = request.page,
            received,
            inserted,
            fetched = self.cursor.fetched,
            exhausted = self.cursor.exhausted,
            "appended feed page"
        );
        inserted
    }

    /// Upsert a single server-confirmed post. New posts go to the head.
    pub fn apply_record_update(&mut self, post: Post) -> Upsert {
        self.items.upsert(post, Placement::Head)
    }

    /// Remove a post. Absent ids are ignored and the cursor never moves.
    pub fn apply_record_deletion(&mut self, id: &str) -> Option<Post> {
        self.items.remove(id)
    }

    /// Drop all posts and forget the context
    pub fn clear(&mut self) {
        self.items.clear();
        self.context = None;
        self.cursor = PageCursor::new(self.cursor.page_size);
    }

    pub fn is_consistent(&self) -> bool {
        self.items.is_consistent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn post(id: &str) -> Post {
        Post {
            id: id.to_string(),
            author_id: "author".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            location: None,
            text: format!("post {id}"),
            media_ref: None,
            author_avatar: None,
            likes: Default::default(),
            comments: Vec::new(),
            created_at: None,
        }
    }

    fn page(ids: &[&str]) -> FeedPage {
        FeedPage {
            posts: ids.iter().map(|id| post(id)).collect(),
            ..Default::default()
        }
    }

    fn ids(cache: &FeedCache) -> Vec<String> {
        cache.posts().map(|p| p.id.clone()).collect()
    }

    #[test]
    fn test_overlapping_pages_do_not_duplicate() {
        let mut cache = FeedCache::new(2);
        cache.load_first_page(FeedContext::Global, page(&["A", "B"]));

        let request = cache.next_request().unwrap();
        assert_eq!(request.page, 2);
        let inserted = cache.load_next_page(&request, page(&["B", "C"]));

        assert_eq!(inserted, 1);
        assert_eq!(ids(&cache), vec!["A", "B", "C"]);
        assert!(!cache.is_exhausted());
        assert!(cache.is_consistent());
    }

    #[test]
    fn test_short_page_stops_fetching() {
        let mut cache = FeedCache::new(2);
        cache.load_first_page(FeedContext::Global, page(&["A", "B"]));
        let request = cache.next_request().unwrap();
        cache.load_next_page(&request, page(&["C"]));

        assert!(cache.is_exhausted());
        assert_eq!(cache.next_request(), None);
    }

    #[test]
    fn test_no_request_before_first_load() {
        let cache = FeedCache::new(5);
        assert_eq!(cache.next_request(), None);
        assert_eq!(cache.first_request(FeedContext::Global).page, 1);
    }

    #[test]
    fn test_first_page_replaces_other_context() {
        let mut cache = FeedCache::new(2);
        cache.load_first_page(FeedContext::Global, page(&["A", "B"]));
        let request = cache.next_request().unwrap();
        cache.load_next_page(&request, page(&["C", "D"]));

        cache.load_first_page(FeedContext::Profile("u1".into()), page(&["X"]));

        assert_eq!(ids(&cache), vec!["X"]);
        assert_eq!(cache.context(), Some(&FeedContext::Profile("u1".into())));
        assert_eq!(cache.cursor().page, 1);
        assert!(cache.is_exhausted());
    }

    #[test]
    fn test_record_update_and_deletion_leave_cursor_alone() {
        let mut cache = FeedCache::new(2);
        cache.load_first_page(FeedContext::Global, page(&["A", "B"]));
        let before = *cache.cursor();

        let mut liked = post("B");
        liked.likes.insert("u1".to_string());
        assert_eq!(cache.apply_record_update(liked), Upsert::Replaced);
        assert_eq!(cache.apply_record_update(post("N")), Upsert::Inserted);
        assert!(cache.apply_record_deletion("A").is_some());
        assert!(cache.apply_record_deletion("A").is_none());

        assert_eq!(ids(&cache), vec!["N", "B"]);
        assert!(cache.get("B").unwrap().is_liked_by("u1"));
        assert_eq!(*cache.cursor(), before);
    }

    #[test]
    fn test_clear_forgets_context() {
        let mut cache = FeedCache::new(3);
        cache.load_first_page(FeedContext::Global, page(&["A"]));
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.context(), None);
        assert_eq!(cache.page_size(), 3);
    }
}
