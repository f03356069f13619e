// SPDX-License-Identifier: MPL-2.0

//! Application controller.
//!
//! Wires the REST client to the store: every network call resolves first,
//! then its result is dispatched. A failed call returns the error and leaves
//! the store exactly as it was, so retrying is always safe.

use crate::api::{
    Achievement, CatalogEntry, Category, ClientError, NewPost, QuestlyClient, Session, User,
};
use crate::cache::posts::{can_delete_comment, can_delete_post, validate_text};
use crate::cache::{
    AchievementStats, CacheDb, CacheError, FeedContext, LocalStore, Overrides, ProgressState,
    ValidationError, draft_from_catalog, new_local_id, validate_draft,
};
use crate::config::USER_AWARDS_KEY;
use crate::state::settings::SettingsError;
use crate::state::{Action, AppSettings, Effect, Store, ThemeMode};
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("not logged in")]
    NotLoggedIn,
    #[error("achievement {0} not found")]
    UnknownAchievement(String),
}

pub struct App {
    client: QuestlyClient,
    store: Store,
    db: Option<CacheDb>,
    settings: AppSettings,
}

impl App {
    /// Build the controller and rehydrate the user's achievements from
    /// `db`. A store that cannot be read is logged and treated as empty.
    pub fn new(settings: AppSettings, db: Option<CacheDb>) -> Result<Self, AppError> {
        let client = QuestlyClient::new(&settings.api_url, &settings.awards_url)?;
        let mut store = Store::new(settings.page_size, settings.theme);

        if let Some(db) = &db {
            match LocalStore::new(db).get_json::<Vec<Achievement>>(USER_AWARDS_KEY) {
                Ok(Some(saved)) => {
                    debug!(count = saved.len(), "restored achievements");
                    store.dispatch(Action::AchievementsRestored(saved));
                }
                Ok(None) => {}
                Err(CacheError::Serialization(e)) => {
                    warn!("Discarding unreadable saved achievements: {}", e);
                    if let Err(e) = LocalStore::new(db).remove(USER_AWARDS_KEY) {
                        warn!("Failed to discard saved achievements: {}", e);
                    }
                }
                Err(e) => warn!("Failed to restore achievements: {}", e),
            }
        }

        Ok(Self {
            client,
            store,
            db,
            settings,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn client(&self) -> &QuestlyClient {
        &self.client
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn stats(&self) -> AchievementStats {
        self.store.stats()
    }

    fn apply(&mut self, action: Action) {
        if self.store.dispatch(action) == Effect::PersistAchievements {
            self.persist_achievements();
        }
    }

    /// Mirror the user's achievements to the local store. Failures are
    /// logged; the in-memory copy stays authoritative.
    fn persist_achievements(&self) {
        let Some(db) = &self.db else {
            return;
        };

        let snapshot = self.store.achievements().owned_snapshot();
        if let Err(e) = LocalStore::new(db).set_json(USER_AWARDS_KEY, &snapshot) {
            warn!("Failed to persist achievements: {}", e);
        }
    }

    fn user_id(&self) -> Result<String, AppError> {
        self.store
            .session()
            .user_id()
            .map(str::to_string)
            .ok_or(AppError::NotLoggedIn)
    }

    // ===== Session =====

    pub fn login(&mut self, session: Session) {
        self.client.set_token(Some(session.token.clone()));
        self.apply(Action::Login(session));
    }

    pub fn logout(&mut self) {
        self.client.set_token(None);
        self.apply(Action::Logout);
    }

    /// Flip light/dark. The change reaches disk on [`App::save_settings`].
    pub fn toggle_theme(&mut self) -> ThemeMode {
        self.apply(Action::ToggleTheme);
        self.settings.theme = self.store.theme();
        self.settings.theme
    }

    pub fn save_settings(&self) -> Result<(), AppError> {
        self.settings.save()?;
        Ok(())
    }

    pub async fn refresh_friends(&mut self) -> Result<(), AppError> {
        let user_id = self.user_id()?;
        let friends = self
            .client
            .get_friends(&user_id)
            .await
            .inspect_err(|e| warn!("Failed to fetch friends: {}", e))?;
        self.apply(Action::SetFriends(friends));
        Ok(())
    }

    /// Follow or unfollow `friend_id`; returns whether they are now a friend
    pub async fn toggle_friend(&mut self, friend_id: &str) -> Result<bool, AppError> {
        let user_id = self.user_id()?;
        if user_id == friend_id {
            return Err(ValidationError::SelfFriend.into());
        }

        let friends = self.client.toggle_friend(&user_id, friend_id).await?;
        self.apply(Action::SetFriends(friends));
        Ok(self.store.session().is_friend(friend_id))
    }

    /// Find users by name. Results are returned to the caller and never
    /// cached.
    pub async fn search_users(&self, query: &str) -> Result<Vec<User>, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ValidationError::EmptyQuery.into());
        }
        self.user_id()?;

        let users = self
            .client
            .search_users(query)
            .await
            .inspect_err(|e| warn!("User search failed: {}", e))?;
        debug!(query, results = users.len(), "user search");
        Ok(users)
    }

    /// Fetch a user's profile document
    pub async fn get_user(&self, user_id: &str) -> Result<User, AppError> {
        self.user_id()?;
        Ok(self.client.get_user(user_id).await?)
    }

    // ===== Feed =====

    /// Load the first page of `context`, replacing whatever was shown.
    /// Returns the number of posts now cached.
    pub async fn open_feed(&mut self, context: FeedContext) -> Result<usize, AppError> {
        let request = self.store.feed().first_request(context);
        let page = self
            .client
            .get_feed(&request.context, request.page, request.page_size)
            .await
            .inspect_err(|e| warn!("Failed to fetch {} feed: {}", request.context, e))?;

        self.apply(Action::FeedReplaced {
            context: request.context,
            page,
        });
        info!(
            posts = self.store.feed().len(),
            exhausted = self.store.feed().is_exhausted(),
            "feed opened"
        );
        Ok(self.store.feed().len())
    }

    /// Fetch the next page. Returns false without a request when the feed
    /// is exhausted or no context is open.
    pub async fn load_more(&mut self) -> Result<bool, AppError> {
        let Some(request) = self.store.feed().next_request() else {
            debug!("no further pages to fetch");
            return Ok(false);
        };

        let page = self
            .client
            .get_feed(&request.context, request.page, request.page_size)
            .await
            .inspect_err(|e| {
                warn!(
                    transient = e.is_transient(),
                    "Failed to fetch page {} of {} feed: {}",
                    request.page,
                    request.context,
                    e
                )
            })?;

        self.apply(Action::FeedAppended { request, page });
        Ok(true)
    }

    pub async fn create_post(
        &mut self,
        text: &str,
        picture_path: Option<String>,
    ) -> Result<String, AppError> {
        let description = validate_text(text)?;
        let user_id = self.user_id()?;

        let post = self
            .client
            .create_post(&NewPost {
                user_id,
                description,
                picture_path,
            })
            .await?;

        let id = post.id.clone();
        self.apply(Action::PostUpdated(post));
        Ok(id)
    }

    /// Ask the server to toggle our like and show whatever it stored.
    /// Returns whether the post is now liked by us.
    pub async fn toggle_like(&mut self, post_id: &str) -> Result<bool, AppError> {
        let user_id = self.user_id()?;
        let post = self
            .client
            .like(post_id, &user_id)
            .await
            .inspect_err(|e| warn!("Like/unlike failed: {}", e))?;

        let liked = post.is_liked_by(&user_id);
        self.apply(Action::PostUpdated(post));
        Ok(liked)
    }

    pub async fn add_comment(&mut self, post_id: &str, text: &str) -> Result<(), AppError> {
        let text = validate_text(text)?;
        let user_id = self.user_id()?;

        let post = self.client.add_comment(post_id, &user_id, &text).await?;
        self.apply(Action::PostUpdated(post));
        Ok(())
    }

    pub async fn delete_comment(
        &mut self,
        post_id: &str,
        comment_id: &str,
    ) -> Result<(), AppError> {
        let user_id = self.user_id()?;
        if let Some(post) = self.store.feed().get(post_id)
            && post.comment(comment_id).is_some()
            && !can_delete_comment(post, comment_id, &user_id)
        {
            return Err(ValidationError::Forbidden(
                "only the author or post owner can delete a comment",
            )
            .into());
        }

        let post = self
            .client
            .delete_comment(post_id, comment_id, &user_id)
            .await?;
        self.apply(Action::PostUpdated(post));
        Ok(())
    }

    pub async fn delete_post(&mut self, post_id: &str) -> Result<(), AppError> {
        let user_id = self.user_id()?;
        if let Some(post) = self.store.feed().get(post_id)
            && !can_delete_post(post, &user_id)
        {
            return Err(ValidationError::Forbidden("only the author can delete a post").into());
        }

        self.client
            .delete_post(post_id, &user_id)
            .await
            .inspect_err(|e| warn!("Delete failed: {}", e))?;
        self.apply(Action::PostDeleted(post_id.to_string()));
        Ok(())
    }

    // ===== Achievements =====

    pub async fn load_catalog(&mut self) -> Result<usize, AppError> {
        let catalog = self
            .client
            .get_catalog()
            .await
            .inspect_err(|e| warn!("Failed to fetch catalog: {}", e))?;
        self.apply(Action::CatalogLoaded(catalog));
        Ok(self.store.achievements().catalog().len())
    }

    /// Adopt a catalog entry as a new local achievement; returns its id
    pub fn add_from_catalog(
        &mut self,
        entry: &CatalogEntry,
        overrides: Overrides,
    ) -> Result<String, AppError> {
        let draft = draft_from_catalog(entry, overrides)?;
        Ok(self.add_local(Achievement::from_draft(draft, new_local_id(), Utc::now())))
    }

    pub fn add_custom(
        &mut self,
        title: &str,
        description: &str,
        target: u32,
        category: Category,
        icon: Option<String>,
    ) -> Result<String, AppError> {
        let draft = validate_draft(
            title.to_string(),
            description.to_string(),
            target,
            category,
            icon,
        )?;
        Ok(self.add_local(Achievement::from_draft(draft, new_local_id(), Utc::now())))
    }

    fn add_local(&mut self, achievement: Achievement) -> String {
        let id = achievement.id.clone();
        self.apply(Action::AchievementAdded(achievement));
        id
    }

    /// Send a local achievement to the server and switch it to the
    /// server's id. Returns the new id.
    pub async fn sync_achievement(&mut self, local_id: &str) -> Result<String, AppError> {
        let payload = self
            .store
            .achievements()
            .get(local_id)
            .map(Achievement::to_payload)
            .ok_or_else(|| AppError::UnknownAchievement(local_id.to_string()))?;

        let server = self.client.create_achievement(&payload).await?;
        let server_id = server.id.clone();
        self.apply(Action::AchievementReconciled {
            local_id: local_id.to_string(),
            server,
        });
        Ok(server_id)
    }

    pub fn set_progress(&mut self, id: &str, value: i64) -> Option<ProgressState> {
        self.apply(Action::ProgressSet {
            id: id.to_string(),
            value,
        });
        self.progress_of(id)
    }

    pub fn increment(&mut self, id: &str) -> Option<ProgressState> {
        self.apply(Action::ProgressIncremented(id.to_string()));
        self.progress_of(id)
    }

    pub fn complete(&mut self, id: &str) -> Option<ProgressState> {
        self.apply(Action::AchievementCompleted(id.to_string()));
        self.progress_of(id)
    }

    pub fn remove_achievement(&mut self, id: &str) {
        self.apply(Action::AchievementRemoved(id.to_string()));
    }

    fn progress_of(&self, id: &str) -> Option<ProgressState> {
        self.store.achievements().get(id).map(Achievement::state)
    }
}
