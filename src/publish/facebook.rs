//! Facebook publishing adapter
//!
//! Posts target the Graph API page edges: `/{page}/feed` for text,
//! `/{page}/photos` and `/{page}/videos` for media uploads. The page access
//! token rides as a query parameter, matching the Graph API convention.
//! Video posting requires the page token to carry the `publish_video`
//! permission.

use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::Client;
use std::sync::Arc;

use crate::crypto::CredentialCipher;
use crate::queue::QueueItem;

use super::{check_response, file_part, require, PostHandler, PreparedPost, PublishResult};

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";

// ============================================================================
// Credentials
// ============================================================================

/// Decrypted Facebook credentials
#[derive(Debug, Clone)]
pub struct FacebookAuth {
    pub access_token: String,
    pub page_id: String,
}

impl FacebookAuth {
    /// Decrypt the Facebook credential fields carried by an item
    pub fn from_item(item: &QueueItem, cipher: &CredentialCipher) -> PublishResult<Self> {
        Ok(Self {
            access_token: cipher.decrypt(require(&item.access_token, "access_token")?)?,
            page_id: require(&item.page_id, "page_id")?.to_string(),
        })
    }
}

// ============================================================================
// API
// ============================================================================

/// Thin Graph API wrapper
#[derive(Debug, Clone)]
pub struct FacebookApi {
    http: Client,
    base_url: String,
}

impl FacebookApi {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the base URL (used by tests against a local mock server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Publish a message to the page feed
    pub async fn post_feed(&self, auth: &FacebookAuth, message: &str) -> PublishResult<()> {
        let url = format!("{}/{}/feed", self.base_url, auth.page_id);

        let response = self
            .http
            .post(&url)
            .query(&[("message", message), ("access_token", &auth.access_token)])
            .send()
            .await?;

        check_response("facebook", response).await
    }

    /// Upload an image to the page photos edge
    pub async fn post_photo(
        &self,
        auth: &FacebookAuth,
        message: &str,
        media: &std::path::Path,
    ) -> PublishResult<()> {
        let url = format!("{}/{}/photos", self.base_url, auth.page_id);

        let form = Form::new()
            .text("message", message.to_string())
            .part("source", file_part(media).await?);

        let response = self
            .http
            .post(&url)
            .query(&[("access_token", &auth.access_token)])
            .multipart(form)
            .send()
            .await?;

        check_response("facebook", response).await
    }

    /// Upload a video to the page videos edge
    pub async fn post_video(
        &self,
        auth: &FacebookAuth,
        message: &str,
        media: &std::path::Path,
    ) -> PublishResult<()> {
        let url = format!("{}/{}/videos", self.base_url, auth.page_id);

        let form = Form::new()
            .text("description", message.to_string())
            .part("source", file_part(media).await?);

        let response = self
            .http
            .post(&url)
            .query(&[("access_token", &auth.access_token)])
            .multipart(form)
            .send()
            .await?;

        check_response("facebook", response).await
    }
}

// ============================================================================
// Message Composition
// ============================================================================

// The queue side pre-spaces body, link and tags; the feed message is their
// direct concatenation.
fn feed_message(item: &QueueItem) -> String {
    format!(
        "{}{}{}",
        item.body_text(),
        item.link_text(),
        item.tags_joined()
    )
}

fn media_message(item: &QueueItem) -> String {
    format!("{}{}", item.caption_text(), item.tags_joined())
}

// ============================================================================
// Handlers
// ============================================================================

/// Feed text route; short and long posts share the feed edge
pub struct FacebookTextPost {
    api: Arc<FacebookApi>,
    label: &'static str,
}

impl FacebookTextPost {
    pub fn short(api: Arc<FacebookApi>) -> Self {
        Self {
            api,
            label: "facebook short text",
        }
    }

    pub fn long(api: Arc<FacebookApi>) -> Self {
        Self {
            api,
            label: "facebook long text",
        }
    }
}

#[async_trait]
impl PostHandler for FacebookTextPost {
    fn name(&self) -> &'static str {
        self.label
    }

    async fn publish(&self, post: &PreparedPost<'_>) -> PublishResult<()> {
        let auth = post.credentials.facebook()?;
        self.api.post_feed(auth, &feed_message(post.item)).await
    }
}

/// Photo upload route
pub struct FacebookImagePost {
    api: Arc<FacebookApi>,
}

impl FacebookImagePost {
    pub fn new(api: Arc<FacebookApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PostHandler for FacebookImagePost {
    fn name(&self) -> &'static str {
        "facebook image"
    }

    async fn publish(&self, post: &PreparedPost<'_>) -> PublishResult<()> {
        let auth = post.credentials.facebook()?;
        let media = post.media_path()?;
        self.api
            .post_photo(auth, &media_message(post.item), media)
            .await
    }
}

/// Video upload route
pub struct FacebookVideoPost {
    api: Arc<FacebookApi>,
}

impl FacebookVideoPost {
    pub fn new(api: Arc<FacebookApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PostHandler for FacebookVideoPost {
    fn name(&self) -> &'static str {
        "facebook video"
    }

    async fn publish(&self, post: &PreparedPost<'_>) -> PublishResult<()> {
        let auth = post.credentials.facebook()?;
        let media = post.media_path()?;
        self.api
            .post_video(auth, &media_message(post.item), media)
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::PublishError;
    use crate::queue::Tags;

    fn test_cipher() -> CredentialCipher {
        CredentialCipher::new("passphrase", "salt").unwrap()
    }

    #[test]
    fn test_auth_decrypts_token() {
        let cipher = test_cipher();
        let item = QueueItem {
            access_token: Some(cipher.encrypt("page-token")),
            page_id: Some("my-page".to_string()),
            ..Default::default()
        };

        let auth = FacebookAuth::from_item(&item, &cipher).unwrap();
        assert_eq!(auth.access_token, "page-token");
        assert_eq!(auth.page_id, "my-page");
    }

    #[test]
    fn test_auth_missing_page_id() {
        let cipher = test_cipher();
        let item = QueueItem {
            access_token: Some(cipher.encrypt("page-token")),
            ..Default::default()
        };

        assert!(matches!(
            FacebookAuth::from_item(&item, &cipher),
            Err(PublishError::MissingField("page_id"))
        ));
    }

    #[test]
    fn test_feed_message_concatenation() {
        let item = QueueItem {
            body: Some("Fresh post. ".to_string()),
            link_url: Some("https://example.com ".to_string()),
            tags: Some(Tags::Text("#news".to_string())),
            ..Default::default()
        };

        assert_eq!(feed_message(&item), "Fresh post. https://example.com #news");
    }

    #[test]
    fn test_media_message_uses_caption() {
        let item = QueueItem {
            caption: Some("Look at this ".to_string()),
            tags: Some(Tags::Text("#photo".to_string())),
            ..Default::default()
        };

        assert_eq!(media_message(&item), "Look at this #photo");
    }
}
