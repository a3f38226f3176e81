//! Reddit publishing adapter
//!
//! Reddit's documented shape is two steps: a password-grant token request
//! against the public host, then a submit call against the OAuth host with
//! the bearer token. Self posts carry title and selftext; image and video
//! posts upload the local file with the matching `kind`.

use async_trait::async_trait;
use reqwest::header;
use reqwest::multipart::Form;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;

use crate::crypto::CredentialCipher;
use crate::queue::QueueItem;

use super::{
    check_response, file_part, require, PostHandler, PreparedPost, PublishError, PublishResult,
};

const DEFAULT_AUTH_URL: &str = "https://www.reddit.com";
const DEFAULT_API_URL: &str = "https://oauth.reddit.com";

// ============================================================================
// Credentials
// ============================================================================

/// Decrypted Reddit credentials
#[derive(Debug, Clone)]
pub struct RedditAuth {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    pub username: String,
    pub password: String,
    pub target_subreddit: String,
}

impl RedditAuth {
    /// Decrypt the Reddit credential fields carried by an item
    pub fn from_item(item: &QueueItem, cipher: &CredentialCipher) -> PublishResult<Self> {
        Ok(Self {
            client_id: cipher.decrypt(require(&item.client_id, "client_id")?)?,
            client_secret: cipher.decrypt(require(&item.client_secret, "client_secret")?)?,
            user_agent: cipher.decrypt(require(&item.user_agent, "user_agent")?)?,
            username: cipher.decrypt(require(&item.username, "username")?)?,
            password: cipher.decrypt(require(&item.password, "password")?)?,
            target_subreddit: require(&item.target_subreddit, "target_subreddit")?.to_string(),
        })
    }
}

// ============================================================================
// API
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Thin Reddit API wrapper
#[derive(Debug, Clone)]
pub struct RedditApi {
    http: Client,
    auth_url: String,
    api_url: String,
}

impl RedditApi {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            auth_url: DEFAULT_AUTH_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Point both hosts at one base URL (used by tests against a mock server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base = base_url.into().trim_end_matches('/').to_string();
        self.auth_url = base.clone();
        self.api_url = base;
        self
    }

    /// Password-grant token request
    async fn access_token(&self, auth: &RedditAuth) -> PublishResult<String> {
        let url = format!("{}/api/v1/access_token", self.auth_url);

        let response = self
            .http
            .post(&url)
            .basic_auth(&auth.client_id, Some(&auth.client_secret))
            .header(header::USER_AGENT, &auth.user_agent)
            .form(&[
                ("grant_type", "password"),
                ("username", auth.username.as_str()),
                ("password", auth.password.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected {
                platform: "reddit",
                status: status.as_u16(),
                detail,
            });
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Submit a self post to the target subreddit
    pub async fn submit_self(
        &self,
        auth: &RedditAuth,
        title: &str,
        selftext: &str,
    ) -> PublishResult<()> {
        let token = self.access_token(auth).await?;
        let url = format!("{}/api/submit", self.api_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .header(header::USER_AGENT, &auth.user_agent)
            .form(&[
                ("api_type", "json"),
                ("kind", "self"),
                ("sr", auth.target_subreddit.as_str()),
                ("title", title),
                ("text", selftext),
            ])
            .send()
            .await?;

        check_response("reddit", response).await
    }

    /// Submit an image or video post from a local file
    pub async fn submit_media(
        &self,
        auth: &RedditAuth,
        title: &str,
        kind: &str,
        media: &std::path::Path,
    ) -> PublishResult<()> {
        let token = self.access_token(auth).await?;
        let url = format!("{}/api/submit", self.api_url);

        let form = Form::new()
            .text("api_type", "json")
            .text("kind", kind.to_string())
            .text("sr", auth.target_subreddit.clone())
            .text("title", title.to_string())
            .part("file", file_part(media).await?);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .header(header::USER_AGENT, &auth.user_agent)
            .multipart(form)
            .send()
            .await?;

        check_response("reddit", response).await
    }
}

// ============================================================================
// Body Composition
// ============================================================================

fn self_text(item: &QueueItem) -> String {
    format!("{}\n{}", item.body_text(), item.link_text())
}

// ============================================================================
// Handlers
// ============================================================================

/// Self post route; short and long posts share the submit shape
pub struct RedditTextPost {
    api: Arc<RedditApi>,
    label: &'static str,
}

impl RedditTextPost {
    pub fn short(api: Arc<RedditApi>) -> Self {
        Self {
            api,
            label: "reddit short text",
        }
    }

    pub fn long(api: Arc<RedditApi>) -> Self {
        Self {
            api,
            label: "reddit long text",
        }
    }
}

#[async_trait]
impl PostHandler for RedditTextPost {
    fn name(&self) -> &'static str {
        self.label
    }

    async fn publish(&self, post: &PreparedPost<'_>) -> PublishResult<()> {
        let auth = post.credentials.reddit()?;
        self.api
            .submit_self(auth, post.item.title_text(), &self_text(post.item))
            .await
    }
}

/// Image submit route
pub struct RedditImagePost {
    api: Arc<RedditApi>,
}

impl RedditImagePost {
    pub fn new(api: Arc<RedditApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PostHandler for RedditImagePost {
    fn name(&self) -> &'static str {
        "reddit image"
    }

    async fn publish(&self, post: &PreparedPost<'_>) -> PublishResult<()> {
        let auth = post.credentials.reddit()?;
        let media = post.media_path()?;
        self.api
            .submit_media(auth, post.item.title_text(), "image", media)
            .await
    }
}

/// Video submit route
pub struct RedditVideoPost {
    api: Arc<RedditApi>,
}

impl RedditVideoPost {
    pub fn new(api: Arc<RedditApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PostHandler for RedditVideoPost {
    fn name(&self) -> &'static str {
        "reddit video"
    }

    async fn publish(&self, post: &PreparedPost<'_>) -> PublishResult<()> {
        let auth = post.credentials.reddit()?;
        let media = post.media_path()?;
        self.api
            .submit_media(auth, post.item.title_text(), "video", media)
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_decrypts_account_fields() {
        let cipher = CredentialCipher::new("passphrase", "salt").unwrap();
        let item = QueueItem {
            client_id: Some(cipher.encrypt("id")),
            client_secret: Some(cipher.encrypt("secret")),
            user_agent: Some(cipher.encrypt("embercast/0.1")),
            username: Some(cipher.encrypt("poster")),
            password: Some(cipher.encrypt("hunter2")),
            target_subreddit: Some("rust".to_string()),
            ..Default::default()
        };

        let auth = RedditAuth::from_item(&item, &cipher).unwrap();
        assert_eq!(auth.user_agent, "embercast/0.1");
        assert_eq!(auth.username, "poster");
        assert_eq!(auth.target_subreddit, "rust");
    }

    #[test]
    fn test_auth_missing_subreddit() {
        let cipher = CredentialCipher::new("passphrase", "salt").unwrap();
        let item = QueueItem {
            client_id: Some(cipher.encrypt("id")),
            client_secret: Some(cipher.encrypt("secret")),
            user_agent: Some(cipher.encrypt("ua")),
            username: Some(cipher.encrypt("poster")),
            password: Some(cipher.encrypt("pw")),
            ..Default::default()
        };

        assert!(matches!(
            RedditAuth::from_item(&item, &cipher),
            Err(PublishError::MissingField("target_subreddit"))
        ));
    }

    #[test]
    fn test_self_text_appends_link() {
        let item = QueueItem {
            body: Some("discussion".to_string()),
            link_url: Some("https://example.com".to_string()),
            ..Default::default()
        };

        assert_eq!(self_text(&item), "discussion\nhttps://example.com");
    }

    #[test]
    fn test_mock_base_url_covers_both_hosts() {
        let api = RedditApi::new(Client::new()).with_base_url("http://127.0.0.1:9999/");
        assert_eq!(api.auth_url, "http://127.0.0.1:9999");
        assert_eq!(api.api_url, "http://127.0.0.1:9999");
    }
}
