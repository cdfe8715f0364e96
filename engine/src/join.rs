//! Join strategies: attaching comment collections to their posts.
//!
//! - [`attach_inline`] runs inside each per-post fetch, so the post identity
//!   comes from the closure and no matching is needed.
//! - [`scatter_merge`] runs once after all collections are fetched. It makes
//!   no assumption about collection order and matches on `post_id`, scanning
//!   every collection for every post (O(posts × comments)).
//!
//! Comments that do not belong where they were found are handled per
//! [`OrphanPolicy`].

use std::collections::HashSet;
use std::fmt;

use postjoin_types::{Comment, CommentId, EnrichedPost, OrphanPolicy, Post, PostId};
use thiserror::Error;

/// A comment whose `post_id` matches no fetched post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Orphan {
    pub comment_id: CommentId,
    pub post_id: PostId,
}

impl fmt::Display for Orphan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "comment {} -> post {}", self.comment_id, self.post_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("{} comment(s) reference posts that were not fetched: {}", .0.len(), format_orphans(.0))]
    OrphanComments(Vec<Orphan>),

    #[error("comment {comment_id} was fetched for post {fetched_for} but references post {references}")]
    MismatchedComment {
        comment_id: CommentId,
        fetched_for: PostId,
        references: PostId,
    },
}

fn format_orphans(orphans: &[Orphan]) -> String {
    const SHOWN: usize = 5;
    let mut out = orphans
        .iter()
        .take(SHOWN)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    if orphans.len() > SHOWN {
        out.push_str(&format!(", and {} more", orphans.len() - SHOWN));
    }
    out
}

/// Attach the comments fetched for `post` to it.
///
/// Under [`OrphanPolicy::Ignore`] the comments are attached exactly as the
/// remote source returned them. Under [`OrphanPolicy::Error`] a comment that
/// references a different post fails the join.
pub fn attach_inline(
    post: Post,
    comments: Vec<Comment>,
    policy: OrphanPolicy,
) -> Result<EnrichedPost, JoinError> {
    if policy == OrphanPolicy::Error
        && let Some(stray) = comments.iter().find(|c| !c.belongs_to(&post))
    {
        return Err(JoinError::MismatchedComment {
            comment_id: stray.id,
            fetched_for: post.id,
            references: stray.post_id,
        });
    }
    Ok(EnrichedPost::new(post, comments))
}

/// Join independently fetched posts and comment collections by `post_id`.
///
/// Output follows the order of `posts`. Within a post, comments keep their
/// collection order, and collections are concatenated in the order given.
pub fn scatter_merge(
    posts: &[Post],
    collections: &[Vec<Comment>],
    policy: OrphanPolicy,
) -> Result<Vec<EnrichedPost>, JoinError> {
    if policy == OrphanPolicy::Error {
        let orphans = find_orphans(posts, collections);
        if !orphans.is_empty() {
            return Err(JoinError::OrphanComments(orphans));
        }
    }

    let merged = posts
        .iter()
        .map(|post| {
            let comments = collections
                .iter()
                .flat_map(|collection| collection.iter().filter(|c| c.belongs_to(post)))
                .cloned()
                .collect();
            EnrichedPost::new(post.clone(), comments)
        })
        .collect();

    Ok(merged)
}

/// Every comment whose `post_id` is not among `posts`, in collection order.
#[must_use]
pub fn find_orphans(posts: &[Post], collections: &[Vec<Comment>]) -> Vec<Orphan> {
    let known: HashSet<PostId> = posts.iter().map(|p| p.id).collect();
    collections
        .iter()
        .flatten()
        .filter(|c| !known.contains(&c.post_id))
        .map(|c| Orphan {
            comment_id: c.id,
            post_id: c.post_id,
        })
        .collect()
}

/// Set the `post` back-reference on every attached comment.
pub fn link_parents(enriched: &mut [EnrichedPost]) {
    for entry in enriched {
        entry.link_parent();
    }
}
