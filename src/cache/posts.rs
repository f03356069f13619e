// SPDX-License-Identifier: MPL-2.0

//! Like and comment rules for posts.
//!
//! The cache never synthesizes likes or comments locally: the server's
//! returned post is upserted as-is. These helpers describe what the server
//! does and what the current user is allowed to ask for.

use crate::api::Post;
use crate::cache::ValidationError;

/// Flip `user_id`'s like on a copy of `post`. Applying it twice restores
/// the like set.
pub fn toggle_like(post: &Post, user_id: &str) -> Post {
    let mut toggled = post.clone();
    if !toggled.likes.remove(user_id) {
        toggled.likes.insert(user_id.to_string());
    }
    toggled
}

/// Comments can be deleted by their author or by the owner of the post.
pub fn can_delete_comment(post: &Post, comment_id: &str, user_id: &str) -> bool {
    post.comment(comment_id)
        .is_some_and(|comment| comment.author_id == user_id || post.author_id == user_id)
}

/// Only the author may delete a post
pub fn can_delete_post(post: &Post, user_id: &str) -> bool {
    post.author_id == user_id
}

/// Trim user-entered text, rejecting blank input
pub fn validate_text(text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyText);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Comment;

    fn post_with_comment() -> Post {
        Post {
            id: "p1".to_string(),
            author_id: "owner".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            location: None,
            text: "hello".to_string(),
            media_ref: None,
            author_avatar: None,
            likes: ["a".to_string()].into_iter().collect(),
            comments: vec![Comment {
                id: "c1".to_string(),
                author_id: "commenter".to_string(),
                author_first_name: String::new(),
                author_last_name: String::new(),
                author_avatar: None,
                text: "hi".to_string(),
                created_at: None,
            }],
            created_at: None,
        }
    }

    #[test]
    fn test_toggle_like_adds_and_removes() {
        let post = post_with_comment();

        let liked = toggle_like(&post, "b");
        assert!(liked.is_liked_by("b"));
        assert_eq!(liked.like_count(), 2);

        let unliked = toggle_like(&liked, "b");
        assert_eq!(unliked.likes, post.likes);
    }

    #[test]
    fn test_comment_deletion_rights() {
        let post = post_with_comment();
        assert!(can_delete_comment(&post, "c1", "commenter"));
        assert!(can_delete_comment(&post, "c1", "owner"));
        assert!(!can_delete_comment(&post, "c1", "stranger"));
        assert!(!can_delete_comment(&post, "missing", "owner"));
    }

    #[test]
    fn test_post_deletion_rights() {
        let post = post_with_comment();
        assert!(can_delete_post(&post, "owner"));
        assert!(!can_delete_post(&post, "commenter"));
    }

    #[test]
    fn test_validate_text() {
        assert_eq!(validate_text("  hi  ").unwrap(), "hi");
        assert!(matches!(validate_text(" \n "), Err(ValidationError::EmptyText)));
    }
}
