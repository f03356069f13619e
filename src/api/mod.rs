// SPDX-License-Identifier: MPL-2.0

mod client;
mod types;

pub use client::{ClientError, QuestlyClient};
pub use types::{
    Achievement, Catalog, CatalogEntry, Category, Comment, DEFAULT_ICON, FeedPage, Friend,
    NewAchievement, NewPost, Post, Session, User,
};
