//! Twitter publishing adapter
//!
//! Tweets post to `/2/tweets`; media posts upload through
//! `/1.1/media/upload.json` first and reference the returned media id.
//! The status text is body (or caption for media posts), link and tags
//! joined by newlines.

use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;

use crate::crypto::CredentialCipher;
use crate::queue::QueueItem;

use super::{
    check_response, file_part, require, PostHandler, PreparedPost, PublishError, PublishResult,
};

const DEFAULT_BASE_URL: &str = "https://api.twitter.com";

// ============================================================================
// Credentials
// ============================================================================

/// Decrypted Twitter credentials
#[derive(Debug, Clone)]
pub struct TwitterAuth {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token_key: String,
    pub access_token_secret: String,
}

impl TwitterAuth {
    /// Decrypt the Twitter credential fields carried by an item
    pub fn from_item(item: &QueueItem, cipher: &CredentialCipher) -> PublishResult<Self> {
        Ok(Self {
            consumer_key: cipher.decrypt(require(&item.consumer_key, "consumer_key")?)?,
            consumer_secret: cipher.decrypt(require(&item.consumer_secret, "consumer_secret")?)?,
            access_token_key: cipher
                .decrypt(require(&item.access_token_key, "access_token_key")?)?,
            access_token_secret: cipher
                .decrypt(require(&item.access_token_secret, "access_token_secret")?)?,
        })
    }
}

// ============================================================================
// API
// ============================================================================

#[derive(Debug, Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}

/// Thin Twitter API wrapper
#[derive(Debug, Clone)]
pub struct TwitterApi {
    http: Client,
    base_url: String,
}

impl TwitterApi {
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

    /// Post a text-only tweet
    pub async fn post_tweet(&self, auth: &TwitterAuth, text: &str) -> PublishResult<()> {
        let url = format!("{}/2/tweets", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&auth.access_token_key)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;

        check_response("twitter", response).await
    }

    /// Upload a media file, then post a tweet referencing it
    pub async fn post_media_tweet(
        &self,
        auth: &TwitterAuth,
        text: &str,
        media: &std::path::Path,
    ) -> PublishResult<()> {
        let upload_url = format!("{}/1.1/media/upload.json", self.base_url);

        let form = Form::new().part("media", file_part(media).await?);
        let response = self
            .http
            .post(&upload_url)
            .bearer_auth(&auth.access_token_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected {
                platform: "twitter",
                status: status.as_u16(),
                detail,
            });
        }

        let upload: MediaUploadResponse = response.json().await?;

        let tweet_url = format!("{}/2/tweets", self.base_url);
        let response = self
            .http
            .post(&tweet_url)
            .bearer_auth(&auth.access_token_key)
            .json(&serde_json::json!({
                "text": text,
                "media": { "media_ids": [upload.media_id_string] },
            }))
            .send()
            .await?;

        check_response("twitter", response).await
    }
}

// ============================================================================
// Status Composition
// ============================================================================

fn status_text(lead: &str, item: &QueueItem) -> String {
    format!("{}\n{}\n{}", lead, item.link_text(), item.tags_joined())
}

// ============================================================================
// Handlers
// ============================================================================

/// Text tweet route; the long variant posts the same composition and lets
/// the platform enforce its own length limit
pub struct TwitterTextPost {
    api: Arc<TwitterApi>,
    label: &'static str,
}

impl TwitterTextPost {
    pub fn short(api: Arc<TwitterApi>) -> Self {
        Self {
            api,
            label: "twitter short text",
        }
    }

    pub fn long(api: Arc<TwitterApi>) -> Self {
        Self {
            api,
            label: "twitter long text",
        }
    }
}

#[async_trait]
impl PostHandler for TwitterTextPost {
    fn name(&self) -> &'static str {
        self.label
    }

    async fn publish(&self, post: &PreparedPost<'_>) -> PublishResult<()> {
        let auth = post.credentials.twitter()?;
        let text = status_text(post.item.body_text(), post.item);
        self.api.post_tweet(auth, &text).await
    }
}

/// Image tweet route
pub struct TwitterImagePost {
    api: Arc<TwitterApi>,
}

impl TwitterImagePost {
    pub fn new(api: Arc<TwitterApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PostHandler for TwitterImagePost {
    fn name(&self) -> &'static str {
        "twitter image"
    }

    async fn publish(&self, post: &PreparedPost<'_>) -> PublishResult<()> {
        let auth = post.credentials.twitter()?;
        let media = post.media_path()?;
        let text = status_text(post.item.caption_text(), post.item);
        self.api.post_media_tweet(auth, &text, media).await
    }
}

/// Video tweet route
pub struct TwitterVideoPost {
    api: Arc<TwitterApi>,
}

impl TwitterVideoPost {
    pub fn new(api: Arc<TwitterApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PostHandler for TwitterVideoPost {
    fn name(&self) -> &'static str {
        "twitter video"
    }

    async fn publish(&self, post: &PreparedPost<'_>) -> PublishResult<()> {
        let auth = post.credentials.twitter()?;
        let media = post.media_path()?;
        let text = status_text(post.item.caption_text(), post.item);
        self.api.post_media_tweet(auth, &text, media).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Tags;

    #[test]
    fn test_auth_decrypts_all_four_fields() {
        let cipher = CredentialCipher::new("passphrase", "salt").unwrap();
        let item = QueueItem {
            consumer_key: Some(cipher.encrypt("ck")),
            consumer_secret: Some(cipher.encrypt("cs")),
            access_token_key: Some(cipher.encrypt("atk")),
            access_token_secret: Some(cipher.encrypt("ats")),
            ..Default::default()
        };

        let auth = TwitterAuth::from_item(&item, &cipher).unwrap();
        assert_eq!(auth.consumer_key, "ck");
        assert_eq!(auth.consumer_secret, "cs");
        assert_eq!(auth.access_token_key, "atk");
        assert_eq!(auth.access_token_secret, "ats");
    }

    #[test]
    fn test_auth_missing_field() {
        let cipher = CredentialCipher::new("passphrase", "salt").unwrap();
        let item = QueueItem {
            consumer_key: Some(cipher.encrypt("ck")),
            ..Default::default()
        };

        assert!(TwitterAuth::from_item(&item, &cipher).is_err());
    }

    #[test]
    fn test_status_text_newline_layout() {
        let item = QueueItem {
            body: Some("new post".to_string()),
            link_url: Some("https://example.com".to_string()),
            tags: Some(Tags::Text("#rust #news".to_string())),
            ..Default::default()
        };

        assert_eq!(
            status_text(item.body_text(), &item),
            "new post\nhttps://example.com\n#rust #news"
        );
    }

    #[test]
    fn test_status_text_tolerates_missing_parts() {
        let item = QueueItem {
            caption: Some("clip".to_string()),
            ..Default::default()
        };

        assert_eq!(status_text(item.caption_text(), &item), "clip\n\n");
    }
}
