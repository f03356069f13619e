// SPDX-License-Identifier: MPL-2.0

use crate::api::types::{
    Achievement, Catalog, FeedPage, Friend, NewAchievement, NewPost, Post, User,
};
use crate::cache::FeedContext;
use crate::config::{APP_NAME, DEFAULT_API_URL, DEFAULT_AWARDS_URL};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// Whether retrying the same request later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Network(_))
            || matches!(self, ClientError::Server { status, .. } if *status >= 500)
    }
}

/// REST client for the posts/users API and the awards API.
///
/// Every method either returns the server's view of the affected record or
/// an error; it never touches local state.
pub struct QuestlyClient {
    http: reqwest::Client,
    api_url: Url,
    awards_url: Url,
    token: RwLock<Option<String>>,
}

impl QuestlyClient {
    pub fn new(api_url: &str, awards_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("{APP_NAME}/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_url: Url::parse(api_url)?,
            awards_url: Url::parse(awards_url)?,
            token: RwLock::new(None),
        })
    }

    pub fn with_defaults() -> Result<Self, ClientError> {
        Self::new(DEFAULT_API_URL, DEFAULT_AWARDS_URL)
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Fetch one page of a feed. Pages are 1-based.
    pub async fn get_feed(
        &self,
        context: &FeedContext,
        page: u32,
        limit: u32,
    ) -> Result<FeedPage, ClientError> {
        let mut url = match context {
            FeedContext::Global => endpoint(&self.api_url, &["posts"])?,
            FeedContext::Profile(user_id) => {
                endpoint(&self.api_url, &["posts", user_id, "posts"])?
            }
        };
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());

        debug!(%url, "fetching feed page");
        let response = self.send(self.authed(Method::GET, url)?).await?;
        decode(response).await
    }

    pub async fn create_post(&self, post: &NewPost) -> Result<Post, ClientError> {
        let url = endpoint(&self.api_url, &["posts"])?;
        let response = self.send(self.authed(Method::POST, url)?.json(post)).await?;
        decode(response).await
    }

    /// Toggle the like of `user_id` on the server; returns the stored post.
    pub async fn like(&self, post_id: &str, user_id: &str) -> Result<Post, ClientError> {
        let url = endpoint(&self.api_url, &["posts", post_id, "like"])?;
        let request = self
            .authed(Method::PATCH, url)?
            .json(&json!({ "userId": user_id }));
        decode(self.send(request).await?).await
    }

    pub async fn add_comment(
        &self,
        post_id: &str,
        user_id: &str,
        text: &str,
    ) -> Result<Post, ClientError> {
        let url = endpoint(&self.api_url, &["posts", post_id, "comment"])?;
        let request = self
            .authed(Method::PATCH, url)?
            .json(&json!({ "userId": user_id, "text": text }));
        decode(self.send(request).await?).await
    }

    pub async fn delete_comment(
        &self,
        post_id: &str,
        comment_id: &str,
        user_id: &str,
    ) -> Result<Post, ClientError> {
        let url = endpoint(&self.api_url, &["posts", post_id, "comments", comment_id])?;
        let request = self
            .authed(Method::DELETE, url)?
            .json(&json!({ "userId": user_id }));
        decode(self.send(request).await?).await
    }

    pub async fn delete_post(&self, post_id: &str, user_id: &str) -> Result<(), ClientError> {
        let url = endpoint(&self.api_url, &["posts", post_id])?;
        let request = self
            .authed(Method::DELETE, url)?
            .json(&json!({ "userId": user_id }));
        self.send(request).await?;
        Ok(())
    }

    /// The catalog endpoint wraps the document in an array; only the first
    /// element is meaningful.
    pub async fn get_catalog(&self) -> Result<Catalog, ClientError> {
        let url = endpoint(&self.awards_url, &["api", "awards"])?;
        let response = self.send(self.http.get(url)).await?;
        let documents: Vec<Catalog> = decode(response).await?;
        Ok(documents.into_iter().next().unwrap_or_default())
    }

    pub async fn create_achievement(
        &self,
        payload: &NewAchievement,
    ) -> Result<Achievement, ClientError> {
        let url = endpoint(&self.awards_url, &["api", "awards"])?;
        let response = self
            .send(self.authed(Method::POST, url)?.json(payload))
            .await?;
        decode(response).await
    }

    pub async fn get_friends(&self, user_id: &str) -> Result<Vec<Friend>, ClientError> {
        let url = endpoint(&self.api_url, &["users", user_id, "friends"])?;
        decode(self.send(self.authed(Method::GET, url)?).await?).await
    }

    /// Add or remove `friend_id`; returns the user's updated friend list.
    pub async fn toggle_friend(
        &self,
        user_id: &str,
        friend_id: &str,
    ) -> Result<Vec<Friend>, ClientError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum FriendsResponse {
            User { friends: Vec<Friend> },
            List(Vec<Friend>),
        }

        let url = endpoint(&self.api_url, &["users", user_id, friend_id])?;
        let response: FriendsResponse =
            decode(self.send(self.authed(Method::PATCH, url)?).await?).await?;

        Ok(match response {
            FriendsResponse::User { friends } => friends,
            FriendsResponse::List(friends) => friends,
        })
    }

    /// Users whose name matches `query`
    pub async fn search_users(&self, query: &str) -> Result<Vec<User>, ClientError> {
        let mut url = endpoint(&self.api_url, &["users", "search", "users"])?;
        url.query_pairs_mut().append_pair("query", query);

        debug!(%url, "searching users");
        decode(self.send(self.authed(Method::GET, url)?).await?).await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, ClientError> {
        let url = endpoint(&self.api_url, &["users", user_id])?;
        decode(self.send(self.authed(Method::GET, url)?).await?).await
    }

    fn authed(&self, method: Method, url: Url) -> Result<RequestBuilder, ClientError> {
        let token = self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ClientError::NotAuthenticated)?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized(message),
            _ => ClientError::Server {
                status: status.as_u16(),
                message,
            },
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let body = response
        .bytes()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))?;
    serde_json::from_slice(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

/// Append path segments to a base URL, keeping any path the base already has.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ClientError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let base = Url::parse("https://example.com/api/").unwrap();
        let url = endpoint(&base, &["posts", "p 1", "like"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/posts/p%201/like");
    }

    #[test]
    fn test_endpoint_on_bare_host() {
        let base = Url::parse("http://localhost:3001").unwrap();
        let url = endpoint(&base, &["posts"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3001/posts");
    }

    #[test]
    fn test_requests_need_a_token() {
        let client = QuestlyClient::with_defaults().unwrap();
        assert!(!client.is_authenticated());
        let url = Url::parse("http://localhost:3001/posts").unwrap();
        assert!(matches!(
            client.authed(Method::GET, url),
            Err(ClientError::NotAuthenticated)
        ));

        client.set_token(Some("t".to_string()));
        assert!(client.is_authenticated());
    }

    #[test]
    fn test_token_write_survives_poisoned_lock() {
        let client = QuestlyClient::with_defaults().unwrap();
        std::thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _guard = client.token.write().unwrap();
                    panic!("writer died holding the lock");
                })
                .join();
        });
        assert!(client.token.is_poisoned());

        client.set_token(Some("fresh".to_string()));
        assert!(client.is_authenticated());
        client.set_token(None);
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_transient_errors() {
        assert!(ClientError::Network("reset".into()).is_transient());
        assert!(
            ClientError::Server {
                status: 503,
                message: String::new()
            }
            .is_transient()
        );
        assert!(!ClientError::Unauthorized(String::new()).is_transient());
    }
}
