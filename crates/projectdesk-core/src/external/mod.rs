//! Read-through access to the public demo REST API
//!
//! [`ExternalClient`] speaks HTTP and normalizes every failure into an
//! [`ExternalError`](crate::error::ExternalError). [`ExternalCache`] sits in
//! front of any [`ExternalSource`] and adds freshness windows, retries with
//! backoff, and invalidation after writes.

mod cache;
mod client;
mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use cache::{CachePolicy, ExternalCache, QueryKey};
pub use client::{DEFAULT_BASE_URL, ExternalClient, ExternalClientBuilder};
pub use types::{Comment, CommentId, Company, NewComment, NewPost, Post, PostId, User, UserId};

/// Remote users, posts and comments
///
/// Implemented by [`ExternalClient`] for the real API and by in-memory fakes in tests.
#[async_trait]
pub trait ExternalSource: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>>;

    async fn get_user(&self, id: UserId) -> Result<User>;

    async fn list_posts(&self) -> Result<Vec<Post>>;

    async fn list_posts_by_user(&self, user_id: UserId) -> Result<Vec<Post>>;

    async fn create_post(&self, post: &NewPost) -> Result<Post>;

    /// Replace a post wholesale
    async fn update_post(&self, id: PostId, post: &NewPost) -> Result<Post>;

    async fn delete_post(&self, id: PostId) -> Result<()>;

    async fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>>;

    async fn create_comment(&self, comment: &NewComment) -> Result<Comment>;
}
