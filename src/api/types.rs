// SPDX-License-Identifier: MPL-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// A post as the server returns it.
///
/// Field names follow the server's JSON, but the struct is our own so the
/// rest of the crate never depends on the wire shape directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "userId")]
    pub author_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub location: Option<String>,
    #[serde(rename = "description", default)]
    pub text: String,
    /// Attached picture, if any
    #[serde(
        rename = "picturePath",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub media_ref: Option<String>,
    #[serde(
        rename = "userPicturePath",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub author_avatar: Option<String>,
    /// User ids that liked this post. The server sends `{ userId: true }`.
    #[serde(default, with = "likes_map")]
    pub likes: BTreeSet<String>,
    /// Comments in insertion order
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Post {
    pub fn author_name(&self) -> String {
        display_name(&self.first_name, &self.last_name)
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.contains(user_id)
    }

    pub fn comment(&self, comment_id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "userId")]
    pub author_id: String,
    #[serde(rename = "userFirstName", default)]
    pub author_first_name: String,
    #[serde(rename = "userLastName", default)]
    pub author_last_name: String,
    #[serde(
        rename = "userPicturePath",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub author_avatar: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Comment {
    pub fn author_display_name(&self) -> String {
        display_name(&self.author_first_name, &self.author_last_name)
    }
}

/// One page of a feed listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_items: Option<u64>,
}

/// Body for creating a text post
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub user_id: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Sport,
    Learning,
    Creativity,
    Health,
    #[serde(other)]
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Sport,
        Category::Learning,
        Category::Creativity,
        Category::Health,
        Category::Other,
    ];

    /// Icon used when a custom achievement doesn't pick one
    pub fn default_icon(self) -> &'static str {
        match self {
            Category::Sport => "🏃‍♂️",
            Category::Learning => "📚",
            Category::Creativity => "🎨",
            Category::Health => "💪",
            Category::Other => "🌟",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Sport => "sport",
            Category::Learning => "learning",
            Category::Creativity => "creativity",
            Category::Health => "health",
            Category::Other => "other",
        }
    }
}

/// Fallback icon for achievements and catalog entries
pub const DEFAULT_ICON: &str = "🏆";

/// Predefined achievement template from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Missing on the wire for some entries; filled from the catalog bucket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub icon: Option<String>,
    #[serde(default = "default_target")]
    pub target: u32,
}

impl CatalogEntry {
    pub fn category(&self) -> Category {
        self.category.unwrap_or(Category::Other)
    }

    pub fn icon(&self) -> &str {
        self.icon.as_deref().unwrap_or(DEFAULT_ICON)
    }
}

/// The catalog document: entries grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub sport: Vec<CatalogEntry>,
    #[serde(default)]
    pub learning: Vec<CatalogEntry>,
    #[serde(default)]
    pub creativity: Vec<CatalogEntry>,
}

impl Catalog {
    /// Flatten into sport, learning, creativity order, filling in the
    /// category of entries that did not carry one.
    pub fn into_entries(self) -> Vec<CatalogEntry> {
        let buckets = [
            (Category::Sport, self.sport),
            (Category::Learning, self.learning),
            (Category::Creativity, self.creativity),
        ];

        buckets
            .into_iter()
            .flat_map(|(category, entries)| {
                entries.into_iter().map(move |mut entry| {
                    entry.category.get_or_insert(category);
                    entry
                })
            })
            .collect()
    }
}

/// A user-owned achievement (challenge) with progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: Category,
    #[serde(default = "default_icon")]
    pub icon: String,
    pub target: u32,
    #[serde(default)]
    pub current: u32,
    #[serde(default)]
    pub completed: bool,
    #[serde(alias = "date", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Payload for creating an achievement on the server, or locally from a
/// custom form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAchievement {
    pub title: String,
    pub description: String,
    pub target: u32,
    pub current: u32,
    pub category: Category,
    pub icon: String,
}

/// A friend entry as embedded in a user document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub picture_path: Option<String>,
}

impl Friend {
    pub fn name(&self) -> String {
        display_name(&self.first_name, &self.last_name)
    }
}

/// The logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Friends arrive either as ids or as embedded documents; only the
    /// embedded form is kept.
    #[serde(default, deserialize_with = "embedded_friends")]
    pub friends: Vec<Friend>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub picture_path: Option<String>,
}

/// Login result: the user plus its bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub token: String,
}

fn display_name(first: &str, last: &str) -> String {
    format!("{first} {last}").trim().to_string()
}

fn default_target() -> u32 {
    1
}

fn default_category() -> Category {
    Category::Other
}

fn default_icon() -> String {
    DEFAULT_ICON.to_string()
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn embedded_friends<'de, D>(deserializer: D) -> Result<Vec<Friend>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FriendRef {
        Embedded(Friend),
        #[allow(dead_code)]
        Id(String),
    }

    let refs: Option<Vec<FriendRef>> = Option::deserialize(deserializer)?;
    Ok(refs
        .unwrap_or_default()
        .into_iter()
        .filter_map(|r| match r {
            FriendRef::Embedded(friend) => Some(friend),
            FriendRef::Id(_) => None,
        })
        .collect())
}

/// The server keeps likes as a `{ userId: true }` map. Older documents and
/// some test fixtures use a plain array, so both are accepted.
mod likes_map {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::{BTreeMap, BTreeSet};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Likes {
        Map(BTreeMap<String, bool>),
        List(Vec<String>),
    }

    pub fn serialize<S>(likes: &BTreeSet<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let map: BTreeMap<&str, bool> = likes.iter().map(|id| (id.as_str(), true)).collect();
        map.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let likes: Option<Likes> = Option::deserialize(deserializer)?;
        Ok(match likes {
            Some(Likes::Map(map)) => map
                .into_iter()
                .filter_map(|(id, liked)| liked.then_some(id))
                .collect(),
            Some(Likes::List(ids)) => ids.into_iter().collect(),
            None => BTreeSet::new(),
        })
    }
}
