//! Remote API client
//!
//! [`Remote`] is the capability the pruning core needs from the platform:
//! resolve the account, list its timeline and favorites by page, and delete
//! single items. [`TwitterClient`] implements it over the v1.1 REST API with
//! OAuth 1.0a signed requests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::auth::Credentials;
use crate::backoff::{RATE_LIMIT_RESET_HEADER, RateLimit};
use crate::item::{Account, Item};

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com/1.1";

/// Errors from a single API call
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// HTTP 429; not an error for the caller until backing off fails
    #[error("{0}")]
    RateLimited(RateLimit),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Remote operations the pruning core depends on
#[async_trait]
pub trait Remote: Send + Sync {
    /// Resolve the account the credentials belong to
    async fn verify_credentials(&self) -> Result<Account, ApiError>;

    /// Page of the account's own timeline (reposts included, owner trimmed)
    /// with ids at or below `max_id`, newest first
    async fn user_timeline(
        &self,
        screen_name: &str,
        max_id: Option<i64>,
        count: u32,
    ) -> Result<Vec<Item>, ApiError>;

    /// Page of the account's favorites with ids at or below `max_id`
    async fn favorites(
        &self,
        user_id: i64,
        max_id: Option<i64>,
        count: u32,
    ) -> Result<Vec<Item>, ApiError>;

    /// Delete one of the account's posts
    async fn destroy_status(&self, id: i64) -> Result<(), ApiError>;

    /// Remove one post from the account's favorites
    async fn destroy_favorite(&self, id: i64) -> Result<(), ApiError>;
}

/// REST client for the v1.1 API
#[derive(Debug, Clone)]
pub struct TwitterClient {
    client: Client,
    base_url: Url,
    credentials: Credentials,
}

impl TwitterClient {
    pub fn new(
        base_url: &str,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        params: Vec<(String, String)>,
    ) -> Result<Response, ApiError> {
        let url = self.base_url.join(path)?;
        let authorization = self
            .credentials
            .authorization(method.as_str(), &url, &params)?;
        debug!(%method, %url, "Calling API");

        let response = self
            .client
            .request(method, url)
            .header("Authorization", authorization)
            .query(&params)
            .send()
            .await?;

        check_status(response).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Vec<(String, String)>,
    ) -> Result<T, ApiError> {
        let response = self.send(Method::GET, path, params).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn post(&self, path: &str, params: Vec<(String, String)>) -> Result<(), ApiError> {
        self.send(Method::POST, path, params).await?;
        Ok(())
    }
}

/// Map non-success responses onto [`ApiError`].
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let reset = response
            .headers()
            .get(RATE_LIMIT_RESET_HEADER)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
        return Err(ApiError::RateLimited(RateLimit::new(reset)));
    }

    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ApiError::Status { status, body });
    }

    Ok(response)
}

/// Paging parameters shared by both listings.
///
/// `tweet_mode=extended` makes the API send the untruncated body as
/// `full_text`; plain `text` is cut at 140 characters.
fn page_params(count: u32, max_id: Option<i64>) -> Vec<(String, String)> {
    let mut params = vec![("count".to_string(), count.to_string())];
    if let Some(max_id) = max_id {
        params.push(("max_id".to_string(), max_id.to_string()));
    }
    params.push(("tweet_mode".to_string(), "extended".to_string()));
    params
}

#[async_trait]
impl Remote for TwitterClient {
    async fn verify_credentials(&self) -> Result<Account, ApiError> {
        self.get("account/verify_credentials.json", Vec::new()).await
    }

    async fn user_timeline(
        &self,
        screen_name: &str,
        max_id: Option<i64>,
        count: u32,
    ) -> Result<Vec<Item>, ApiError> {
        let mut params = vec![("screen_name".to_string(), screen_name.to_string())];
        params.extend(page_params(count, max_id));
        params.push(("include_rts".to_string(), "true".to_string()));
        params.push(("trim_user".to_string(), "true".to_string()));
        self.get("statuses/user_timeline.json", params).await
    }

    async fn favorites(
        &self,
        user_id: i64,
        max_id: Option<i64>,
        count: u32,
    ) -> Result<Vec<Item>, ApiError> {
        let mut params = vec![("user_id".to_string(), user_id.to_string())];
        params.extend(page_params(count, max_id));
        self.get("favorites/list.json", params).await
    }

    async fn destroy_status(&self, id: i64) -> Result<(), ApiError> {
        self.post(&format!("statuses/destroy/{id}.json"), Vec::new())
            .await
    }

    async fn destroy_favorite(&self, id: i64) -> Result<(), ApiError> {
        self.post(
            "favorites/destroy.json",
            vec![("id".to_string(), id.to_string())],
        )
        .await
    }
}
