//! Keyed read-through cache over an [`ExternalSource`]
//!
//! Reads are served from memory while an entry is younger than
//! `stale_after` and has not been invalidated. Anything else goes to the
//! source, retrying transient failures with exponential backoff. Entries
//! nobody has read for `cache_for` are evicted.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::types::{Comment, NewComment, NewPost, Post, PostId, User, UserId};
use super::{ExternalClient, ExternalSource};
use crate::config::ExternalConfig;
use crate::error::{ExternalError, Result};

/// Upper bound on a single backoff sleep
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Freshness and retry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub stale_after: Duration,
    pub cache_for: Duration,
    /// Extra attempts after the first failed read
    pub retry_attempts: u32,
    pub retry_base_delay: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(5 * 60),
            cache_for: Duration::from_secs(10 * 60),
            retry_attempts: 2,
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

impl CachePolicy {
    pub fn from_config(config: &ExternalConfig) -> Self {
        Self {
            stale_after: Duration::from_secs(config.stale_secs),
            cache_for: Duration::from_secs(config.cache_secs),
            retry_attempts: config.retry_attempts,
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }

    /// Sleep before retry number `attempt` (1-based), with up to 10% jitter
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let delay = self.retry_base_delay.saturating_mul(factor).min(MAX_BACKOFF);

        let jitter_ms = (delay.as_millis() / 10) as u64;
        if jitter_ms == 0 {
            return delay;
        }
        delay + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

/// Identity of a cached read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Users,
    User(UserId),
    Posts,
    PostsByUser(UserId),
    Comments(PostId),
}

impl QueryKey {
    /// Every key whose contents a post write can change
    pub fn is_posts(&self) -> bool {
        matches!(self, QueryKey::Posts | QueryKey::PostsByUser(_))
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Users => f.write_str("users"),
            QueryKey::User(id) => write!(f, "users/{id}"),
            QueryKey::Posts => f.write_str("posts"),
            QueryKey::PostsByUser(id) => write!(f, "posts?userId={id}"),
            QueryKey::Comments(id) => write!(f, "posts/{id}/comments"),
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    value: serde_json::Value,
    fetched_at: Instant,
    last_used: Instant,
    invalidated: bool,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant, stale_after: Duration) -> bool {
        !self.invalidated && now.saturating_duration_since(self.fetched_at) < stale_after
    }
}

/// Cached view of the demo API
pub struct ExternalCache {
    source: Arc<dyn ExternalSource>,
    policy: CachePolicy,
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
}

impl fmt::Debug for ExternalCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalCache")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ExternalCache {
    pub fn new(source: Arc<dyn ExternalSource>, policy: CachePolicy) -> Self {
        Self {
            source,
            policy,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cache in front of a real HTTP client built from config
    pub fn from_config(config: &ExternalConfig) -> Result<Self> {
        let client = ExternalClient::from_config(config)?;
        Ok(Self::new(Arc::new(client), CachePolicy::from_config(config)))
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    // ========== Reads ==========

    pub async fn users(&self) -> Result<Vec<User>> {
        self.query(QueryKey::Users, || self.source.list_users())
            .await
    }

    pub async fn user(&self, id: UserId) -> Result<User> {
        self.query(QueryKey::User(id), || self.source.get_user(id))
            .await
    }

    pub async fn posts(&self) -> Result<Vec<Post>> {
        self.query(QueryKey::Posts, || self.source.list_posts())
            .await
    }

    pub async fn posts_by_user(&self, user_id: UserId) -> Result<Vec<Post>> {
        self.query(QueryKey::PostsByUser(user_id), || {
            self.source.list_posts_by_user(user_id)
        })
        .await
    }

    pub async fn comments(&self, post_id: PostId) -> Result<Vec<Comment>> {
        self.query(QueryKey::Comments(post_id), || {
            self.source.list_comments(post_id)
        })
        .await
    }

    /// The first `limit` posts
    pub async fn recent_posts(&self, limit: usize) -> Result<Vec<Post>> {
        let mut posts = self.posts().await?;
        posts.truncate(limit);
        Ok(posts)
    }

    /// The first `limit` users, shown as team members
    pub async fn team_members(&self, limit: usize) -> Result<Vec<User>> {
        let mut users = self.users().await?;
        users.truncate(limit);
        Ok(users)
    }

    // ========== Writes ==========

    pub async fn create_post(&self, post: &NewPost) -> Result<Post> {
        post.validate()?;
        let created = self.source.create_post(post).await?;
        info!(post_id = created.id, "Created post");
        self.invalidate_posts().await;
        Ok(created)
    }

    pub async fn update_post(&self, id: PostId, post: &NewPost) -> Result<Post> {
        post.validate()?;
        let updated = self.source.update_post(id, post).await?;
        self.invalidate_posts().await;
        Ok(updated)
    }

    pub async fn delete_post(&self, id: PostId) -> Result<()> {
        self.source.delete_post(id).await?;
        info!(post_id = id, "Deleted post");
        self.invalidate_where(|key| key.is_posts() || *key == QueryKey::Comments(id))
            .await;
        Ok(())
    }

    pub async fn create_comment(&self, comment: &NewComment) -> Result<Comment> {
        comment.validate()?;
        let created = self.source.create_comment(comment).await?;
        self.invalidate(&QueryKey::Comments(comment.post_id)).await;
        Ok(created)
    }

    // ========== Cache control ==========

    /// Mark one entry stale; the next read refetches it
    pub async fn invalidate(&self, key: &QueryKey) {
        if let Some(entry) = self.entries.lock().await.get_mut(key) {
            entry.invalidated = true;
            debug!(key = %key, "Invalidated cache entry");
        }
    }

    pub async fn invalidate_where(&self, predicate: impl Fn(&QueryKey) -> bool) {
        let mut entries = self.entries.lock().await;
        for (key, entry) in entries.iter_mut() {
            if predicate(key) {
                entry.invalidated = true;
                debug!(key = %key, "Invalidated cache entry");
            }
        }
    }

    /// Mark every posts listing stale
    pub async fn invalidate_posts(&self) {
        self.invalidate_where(QueryKey::is_posts).await;
    }

    /// Drop entries nobody has read within `cache_for`; returns how many were dropped
    pub async fn collect_garbage(&self) -> usize {
        let mut entries = self.entries.lock().await;
        self.evict_unused(&mut entries, Instant::now())
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Whether `key` would be answered from memory right now
    pub async fn is_fresh(&self, key: &QueryKey) -> bool {
        self.entries
            .lock()
            .await
            .get(key)
            .is_some_and(|entry| entry.is_fresh(Instant::now(), self.policy.stale_after))
    }

    pub async fn contains(&self, key: &QueryKey) -> bool {
        self.entries.lock().await.contains_key(key)
    }

    fn evict_unused(&self, entries: &mut HashMap<QueryKey, CacheEntry>, now: Instant) -> usize {
        let before = entries.len();
        entries.retain(|key, entry| {
            let keep = now.saturating_duration_since(entry.last_used) < self.policy.cache_for;
            if !keep {
                debug!(key = %key, "Evicted unused cache entry");
            }
            keep
        });
        before - entries.len()
    }

    async fn query<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        {
            let now = Instant::now();
            let mut entries = self.entries.lock().await;
            self.evict_unused(&mut entries, now);

            if let Some(entry) = entries.get_mut(&key) {
                entry.last_used = now;
                if entry.is_fresh(now, self.policy.stale_after) {
                    match serde_json::from_value(entry.value.clone()) {
                        Ok(value) => {
                            debug!(key = %key, "Cache hit");
                            return Ok(value);
                        }
                        Err(e) => warn!(key = %key, error = %e, "Discarding unreadable cache entry"),
                    }
                }
            }
        }

        debug!(key = %key, "Cache miss, fetching");
        let value = self.fetch_with_retry(&key, fetch).await?;
        let json = serde_json::to_value(&value)
            .map_err(|e| ExternalError::client(format!("Failed to cache response: {e}")))?;

        let now = Instant::now();
        self.entries.lock().await.insert(
            key,
            CacheEntry {
                value: json,
                fetched_at: now,
                last_used: now,
                invalidated: false,
            },
        );
        Ok(value)
    }

    async fn fetch_with_retry<T, F, Fut>(&self, key: &QueryKey, fetch: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempts = 0;

        loop {
            attempts += 1;

            match fetch().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempts <= self.policy.retry_attempts => {
                    let backoff = self.policy.backoff(attempts);
                    warn!(
                        key = %key,
                        attempt = attempts,
                        wait_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Read failed, retrying after backoff"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    warn!(key = %key, attempts, error = %e, "Read failed");
                    return Err(e);
                }
            }
        }
    }
}
