// SPDX-License-Identifier: MPL-2.0

mod achievements;
mod cursor;
mod db;
mod feeds;
mod index;
mod local;
pub mod posts;
mod schema;

pub use achievements::{
    AchievementStats, AchievementStore, CategoryFilter, Categorized, Overrides, ProgressState,
    draft_from_catalog, filter_by_category, is_local_id, new_local_id, validate_draft,
};
pub use cursor::PageCursor;
pub use db::CacheDb;
pub use feeds::{FeedCache, FeedContext, PageRequest};
pub use index::{IndexedList, Keyed, Placement, Upsert};
pub use local::LocalStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("database path error: {0}")]
    Path(String),
}

/// Input rejected before any state is touched
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("target must be greater than zero")]
    NonPositiveTarget,
    #[error("text must not be empty")]
    EmptyText,
    #[error("search query must not be empty")]
    EmptyQuery,
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("you can't follow yourself")]
    SelfFriend,
    #[error("not allowed: {0}")]
    Forbidden(&'static str),
}
