//! Core domain types for postjoin.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the workspace.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod ids;
mod settings;

pub use ids::{CommentId, PostId, UserId};
pub use settings::{ConcurrencyLimit, FetchMode, JoinStrategy, OrphanPolicy, SettingParseError};

use serde::{Deserialize, Serialize};

// ============================================================================
// Remote Resources
// ============================================================================

/// A post as returned by `GET <base>/posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub user_id: UserId,
    pub id: PostId,
    pub title: String,
    pub body: String,
}

/// A comment as returned by `GET <base>/posts/{id}/comments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub post_id: PostId,
    pub id: CommentId,
    pub name: String,
    pub email: String,
    pub body: String,
    /// Back-reference to the owning post, filled in only when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Box<Post>>,
}

impl Comment {
    #[must_use]
    pub fn belongs_to(&self, post: &Post) -> bool {
        self.post_id == post.id
    }

    #[must_use]
    pub fn with_post(mut self, post: &Post) -> Self {
        self.post = Some(Box::new(post.clone()));
        self
    }
}

// ============================================================================
// Joined Output
// ============================================================================

/// A post with its comments attached.
///
/// Serializes flat: `{userId, id, title, body, comments}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedPost {
    #[serde(flatten)]
    pub post: Post,
    pub comments: Vec<Comment>,
}

impl EnrichedPost {
    #[must_use]
    pub fn new(post: Post, comments: Vec<Comment>) -> Self {
        Self { post, comments }
    }

    #[must_use]
    pub fn id(&self) -> PostId {
        self.post.id
    }

    /// Set every comment's back-reference to this post.
    pub fn link_parent(&mut self) {
        for comment in &mut self.comments {
            comment.post = Some(Box::new(self.post.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post(id: u64) -> Post {
        Post {
            user_id: UserId::new(7),
            id: PostId::new(id),
            title: format!("title {id}"),
            body: format!("body {id}"),
        }
    }

    fn comment(id: u64, post_id: u64) -> Comment {
        Comment {
            post_id: PostId::new(post_id),
            id: CommentId::new(id),
            name: "name".to_string(),
            email: "someone@example.com".to_string(),
            body: "text".to_string(),
            post: None,
        }
    }

    #[test]
    fn post_deserializes_camel_case() {
        let value = json!({"userId": 1, "id": 3, "title": "t", "body": "b"});
        let parsed: Post = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.user_id, UserId::new(1));
        assert_eq!(parsed.id, PostId::new(3));
    }

    #[test]
    fn comment_without_post_field_deserializes() {
        let value = json!({
            "postId": 1,
            "id": 10,
            "name": "n",
            "email": "e@example.com",
            "body": "b"
        });
        let parsed: Comment = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.post_id, PostId::new(1));
        assert!(parsed.post.is_none());
    }

    #[test]
    fn comment_with_missing_field_fails() {
        let value = json!({"postId": 1, "id": 10, "name": "n"});
        assert!(serde_json::from_value::<Comment>(value).is_err());
    }

    #[test]
    fn enriched_post_serializes_flat() {
        let enriched = EnrichedPost::new(post(1), vec![comment(10, 1)]);
        let value = serde_json::to_value(&enriched).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["userId"], 7);
        assert_eq!(value["comments"][0]["id"], 10);
        assert_eq!(value["comments"][0]["postId"], 1);
        assert!(value["comments"][0].get("post").is_none());
        assert!(value.get("post").is_none());
    }

    #[test]
    fn link_parent_sets_back_reference() {
        let mut enriched = EnrichedPost::new(post(2), vec![comment(20, 2), comment(21, 2)]);
        enriched.link_parent();
        for c in &enriched.comments {
            assert_eq!(c.post.as_deref(), Some(&post(2)));
        }
    }

    #[test]
    fn belongs_to_matches_post_id() {
        assert!(comment(1, 5).belongs_to(&post(5)));
        assert!(!comment(1, 5).belongs_to(&post(6)));
    }
}
