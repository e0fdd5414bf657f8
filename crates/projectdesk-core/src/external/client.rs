//! HTTP client for the demo REST API
//!
//! Every failure leaves this module as an [`ExternalError`]:
//! - a failure status becomes `server-error` carrying the remote message
//! - no response (connect failure, timeout) becomes `network-error`
//! - a request that cannot be built or a body that cannot be decoded becomes `client-error`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::ExternalSource;
use super::types::{Comment, NewComment, NewPost, Post, PostId, User, UserId};
use crate::config::ExternalConfig;
use crate::error::{ExternalError, Result};

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Default request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Message used when a failure response carries no `message` field
const GENERIC_SERVER_MESSAGE: &str = "Error processing request";

/// Demo API client
#[derive(Clone)]
pub struct ExternalClient {
    http_client: HttpClient,
    base_url: String,
}

impl std::fmt::Debug for ExternalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Builder for creating an ExternalClient
#[derive(Default)]
pub struct ExternalClientBuilder {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl ExternalClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL (defaults to JSONPlaceholder)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn build(self) -> Result<ExternalClient> {
        let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ExternalError::client(format!("Failed to build HTTP client: {e}")))?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(ExternalClient {
            http_client,
            base_url,
        })
    }
}

impl ExternalClient {
    pub fn new() -> Result<Self> {
        ExternalClientBuilder::new().build()
    }

    pub fn builder() -> ExternalClientBuilder {
        ExternalClientBuilder::new()
    }

    pub fn from_config(config: &ExternalConfig) -> Result<Self> {
        ExternalClientBuilder::new()
            .base_url(&config.base_url)
            .timeout_secs(config.timeout_secs)
            .build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(method = "GET", url = %url, "Sending request");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;
        decode(check_status(response).await?).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(method = %method, url = %url, "Sending request");

        let response = self
            .http_client
            .request(method, &url)
            .json(body)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;
        decode(check_status(response).await?).await
    }
}

#[async_trait]
impl ExternalSource for ExternalClient {
    async fn list_users(&self) -> Result<Vec<User>> {
        self.get_json("/users").await
    }

    async fn get_user(&self, id: UserId) -> Result<User> {
        self.get_json(&format!("/users/{id}")).await
    }

    async fn list_posts(&self) -> Result<Vec<Post>> {
        self.get_json("/posts").await
    }

    async fn list_posts_by_user(&self, user_id: UserId) -> Result<Vec<Post>> {
        self.get_json(&format!("/posts?userId={user_id}")).await
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post> {
        self.send_json(Method::POST, "/posts", post).await
    }

    async fn update_post(&self, id: PostId, post: &NewPost) -> Result<Post> {
        self.send_json(Method::PUT, &format!("/posts/{id}"), post)
            .await
    }

    async fn delete_post(&self, id: PostId) -> Result<()> {
        let url = self.url(&format!("/posts/{id}"));
        debug!(method = "DELETE", url = %url, "Sending request");

        let response = self
            .http_client
            .delete(&url)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;
        check_status(response).await?;
        Ok(())
    }

    async fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>> {
        self.get_json(&format!("/posts/{post_id}/comments")).await
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<Comment> {
        self.send_json(Method::POST, "/comments", comment).await
    }
}

/// Turn a failure status into a `server-error`, passing successes through
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = extract_message(&body).unwrap_or_else(|| GENERIC_SERVER_MESSAGE.to_string());
    warn!(status = status.as_u16(), message = %message, "Response error");

    Err(ExternalError::server(status.as_u16(), message).into())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| ExternalError::client(format!("Failed to parse response: {e}")).into())
}

/// Map a reqwest failure onto the network/client split
fn classify_transport(err: &reqwest::Error) -> ExternalError {
    if err.is_builder() {
        warn!(error = %err, "Request could not be built");
        return ExternalError::client(err.to_string());
    }
    if err.is_decode() || err.is_body() {
        warn!(error = %err, "Request body error");
        return ExternalError::client(err.to_string());
    }

    warn!(error = %err, timeout = err.is_timeout(), "Network error");
    if err.is_timeout() {
        ExternalError::network("Request timed out waiting for the server")
    } else {
        ExternalError::network(format!("Could not connect to the server: {err}"))
    }
}

/// Pull a `message` field out of a JSON error body
fn extract_message(body: &str) -> Option<String> {
    let json = serde_json::from_str::<serde_json::Value>(body).ok()?;
    if let Some(message) = json.get("message").and_then(|v| v.as_str()) {
        return Some(message.to_string());
    }
    if let Some(error) = json.get("error")
        && let Some(message) = error.get("message").and_then(|v| v.as_str())
    {
        return Some(message.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorOrigin};

    #[test]
    fn test_client_builder() {
        let client = ExternalClient::builder()
            .base_url("https://example.com/")
            .timeout_secs(3)
            .build()
            .unwrap();

        assert_eq!(client.base_url(), "https://example.com");
        assert_eq!(client.url("/posts"), "https://example.com/posts");
    }

    #[test]
    fn test_client_defaults() {
        let client = ExternalClient::new().unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_client_from_config() {
        let config = ExternalConfig {
            base_url: "http://localhost:9999".to_string(),
            ..ExternalConfig::default()
        };
        let client = ExternalClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9999");
    }

    #[test]
    fn test_client_debug() {
        let client = ExternalClient::new().unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("ExternalClient"));
        assert!(debug.contains("jsonplaceholder"));
    }

    #[test]
    fn test_client_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ExternalClient>();
    }

    #[test]
    fn test_extract_message() {
        assert_eq!(
            extract_message(r#"{"message": "Not allowed"}"#),
            Some("Not allowed".to_string())
        );
        assert_eq!(
            extract_message(r#"{"error": {"message": "Bad id"}}"#),
            Some("Bad id".to_string())
        );
        assert_eq!(extract_message("{}"), None);
        assert_eq!(extract_message("<html>"), None);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = ExternalClient::builder()
            .base_url("http://127.0.0.1:1")
            .timeout_secs(2)
            .build()
            .unwrap();

        let err = client.list_users().await.unwrap_err();
        assert_eq!(err.origin(), Some(ErrorOrigin::Network));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_malformed_url_is_client_error() {
        let client = ExternalClient::builder()
            .base_url("not a url")
            .build()
            .unwrap();

        let err = client.list_posts().await.unwrap_err();
        assert!(matches!(
            err,
            Error::External(ExternalError {
                origin: ErrorOrigin::Client,
                ..
            })
        ));
        assert!(!err.is_retryable());
    }
}
