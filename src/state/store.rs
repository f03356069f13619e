// SPDX-License-Identifier: MPL-2.0

//! The process-wide client state.
//!
//! Everything the rendering layer shows is read from a [`Store`], and the
//! only way to change it is [`Store::dispatch`]. Each dispatch runs to
//! completion before the next one starts, so reducers never interleave.

use crate::api::{Achievement, Catalog, FeedPage, Friend, Post, Session};
use crate::cache::{
    AchievementStats, AchievementStore, CategoryFilter, FeedCache, FeedContext, PageRequest,
};
use crate::state::{SessionState, ThemeMode};
use tracing::{debug, info};

/// A state change, usually the resolved result of a network call
#[derive(Debug, Clone)]
pub enum Action {
    Login(Session),
    /// Forget the session and the feed
    Logout,
    SetFriends(Vec<Friend>),
    ToggleTheme,
    SetTheme(ThemeMode),

    /// First page of a context arrived: replace the feed
    FeedReplaced {
        context: FeedContext,
        page: FeedPage,
    },
    /// A later page arrived: append with upsert
    FeedAppended {
        request: PageRequest,
        page: FeedPage,
    },
    /// Server-confirmed post after a create, like or comment change
    PostUpdated(Post),
    PostDeleted(String),

    CatalogLoaded(Catalog),
    AchievementsRestored(Vec<Achievement>),
    AchievementAdded(Achievement),
    ProgressSet {
        id: String,
        value: i64,
    },
    ProgressIncremented(String),
    AchievementCompleted(String),
    AchievementRemoved(String),
    /// The server assigned an id to an achievement created locally
    AchievementReconciled {
        local_id: String,
        server: Achievement,
    },
}

/// Follow-up work the caller owes after a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    /// The user's achievements changed and should be written to disk
    PersistAchievements,
}

#[derive(Debug, Clone)]
pub struct Store {
    session: SessionState,
    theme: ThemeMode,
    feed: FeedCache,
    achievements: AchievementStore,
}

impl Store {
    pub fn new(page_size: u32, theme: ThemeMode) -> Self {
        Self {
            session: SessionState::default(),
            theme,
            feed: FeedCache::new(page_size),
            achievements: AchievementStore::new(),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn theme(&self) -> ThemeMode {
        self.theme
    }

    pub fn feed(&self) -> &FeedCache {
        &self.feed
    }

    pub fn achievements(&self) -> &AchievementStore {
        &self.achievements
    }

    /// Render-ready posts of the active feed
    pub fn posts(&self) -> Vec<Post> {
        self.feed.snapshot()
    }

    /// User-owned achievements in `filter`, recomputed on every call
    pub fn achievements_in(&self, filter: CategoryFilter) -> Vec<Achievement> {
        self.achievements
            .filtered(filter)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> AchievementStats {
        self.achievements.stats()
    }

    pub fn dispatch(&mut self, action: Action) -> Effect {
        match action {
            Action::Login(session) => {
                info!(user = %session.user.id, "logged in");
                self.session.login(session);
                Effect::None
            }
            Action::Logout => {
                info!("logged out");
                self.session.logout();
                self.feed.clear();
                Effect::None
            }
            Action::SetFriends(friends) => {
                if !self.session.set_friends(friends) {
                    debug!("ignoring friend list without a session");
                }
                Effect::None
            }
            Action::ToggleTheme => {
                self.theme = self.theme.toggled();
                Effect::None
            }
            Action::SetTheme(theme) => {
                self.theme = theme;
                Effect::None
            }

            Action::FeedReplaced { context, page } => {
                self.feed.load_first_page(context, page);
                Effect::None
            }
            Action::FeedAppended { request, page } => {
                self.feed.load_next_page(&request, page);
                Effect::None
            }
            Action::PostUpdated(post) => {
                self.feed.apply_record_update(post);
                Effect::None
            }
            Action::PostDeleted(id) => {
                if self.feed.apply_record_deletion(&id).is_none() {
                    debug!(post = %id, "deleted post was not cached");
                }
                Effect::None
            }

            Action::CatalogLoaded(catalog) => {
                self.achievements.set_catalog(catalog.into_entries());
                Effect::None
            }
            Action::AchievementsRestored(achievements) => {
                self.achievements.restore(achievements);
                Effect::None
            }
            Action::AchievementAdded(achievement) => {
                self.achievements.add(achievement);
                Effect::PersistAchievements
            }
            Action::ProgressSet { id, value } => {
                changed(self.achievements.set_progress(&id, value).is_some())
            }
            Action::ProgressIncremented(id) => changed(self.achievements.increment(&id).is_some()),
            Action::AchievementCompleted(id) => changed(self.achievements.complete(&id).is_some()),
            Action::AchievementRemoved(id) => changed(self.achievements.remove(&id).is_some()),
            Action::AchievementReconciled { local_id, server } => {
                changed(self.achievements.reconcile(&local_id, server))
            }
        }
    }
}

fn changed(hit: bool) -> Effect {
    if hit {
        Effect::PersistAchievements
    } else {
        Effect::None
    }
}
