//! Tumblr publishing adapter
//!
//! Everything goes through `POST /v2/blog/{blog}/post` with a `type`
//! discriminator: text posts send form fields, photo and video posts send
//! multipart bodies with the file under the `data` field. Tags travel as a
//! comma-joined list, the one platform here that takes them as a list
//! rather than a preprocessed string.

use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::Client;
use std::sync::Arc;

use crate::crypto::CredentialCipher;
use crate::queue::QueueItem;

use super::{check_response, file_part, require, PostHandler, PreparedPost, PublishResult};

const DEFAULT_BASE_URL: &str = "https://api.tumblr.com";

// ============================================================================
// Credentials
// ============================================================================

/// Decrypted Tumblr credentials
#[derive(Debug, Clone)]
pub struct TumblrAuth {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub oauth_token: String,
    pub oauth_secret: String,
    pub blog_name: String,
}

impl TumblrAuth {
    /// Decrypt the Tumblr credential fields carried by an item
    pub fn from_item(item: &QueueItem, cipher: &CredentialCipher) -> PublishResult<Self> {
        Ok(Self {
            consumer_key: cipher.decrypt(require(&item.consumer_key, "consumer_key")?)?,
            consumer_secret: cipher.decrypt(require(&item.consumer_secret, "consumer_secret")?)?,
            oauth_token: cipher.decrypt(require(&item.oauth_token, "oauth_token")?)?,
            oauth_secret: cipher.decrypt(require(&item.oauth_secret, "oauth_secret")?)?,
            blog_name: require(&item.blog_name, "blog_name")?.to_string(),
        })
    }
}

// ============================================================================
// API
// ============================================================================

/// Thin Tumblr API wrapper
#[derive(Debug, Clone)]
pub struct TumblrApi {
    http: Client,
    base_url: String,
}

impl TumblrApi {
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

    fn post_url(&self, auth: &TumblrAuth) -> String {
        format!("{}/v2/blog/{}/post", self.base_url, auth.blog_name)
    }

    /// Create a published text post
    pub async fn create_text(
        &self,
        auth: &TumblrAuth,
        title: &str,
        body: &str,
        tags: &[String],
    ) -> PublishResult<()> {
        let response = self
            .http
            .post(self.post_url(auth))
            .bearer_auth(&auth.oauth_token)
            .form(&[
                ("type", "text"),
                ("state", "published"),
                ("title", title),
                ("body", body),
                ("tags", &tags.join(",")),
            ])
            .send()
            .await?;

        check_response("tumblr", response).await
    }

    /// Create a published photo post from a local file
    pub async fn create_photo(
        &self,
        auth: &TumblrAuth,
        caption: &str,
        tags: &[String],
        media: &std::path::Path,
    ) -> PublishResult<()> {
        let form = Form::new()
            .text("type", "photo")
            .text("state", "published")
            .text("caption", caption.to_string())
            .text("tags", tags.join(","))
            .part("data[0]", file_part(media).await?);

        let response = self
            .http
            .post(self.post_url(auth))
            .bearer_auth(&auth.oauth_token)
            .multipart(form)
            .send()
            .await?;

        check_response("tumblr", response).await
    }

    /// Create a published video post from a local file
    pub async fn create_video(
        &self,
        auth: &TumblrAuth,
        caption: &str,
        tags: &[String],
        media: &std::path::Path,
    ) -> PublishResult<()> {
        let form = Form::new()
            .text("type", "video")
            .text("state", "published")
            .text("caption", caption.to_string())
            .text("tags", tags.join(","))
            .part("data", file_part(media).await?);

        let response = self
            .http
            .post(self.post_url(auth))
            .bearer_auth(&auth.oauth_token)
            .multipart(form)
            .send()
            .await?;

        check_response("tumblr", response).await
    }
}

// ============================================================================
// Body Composition
// ============================================================================

fn text_body(item: &QueueItem) -> String {
    format!("{}\n{}", item.body_text(), item.link_text())
}

fn media_caption(item: &QueueItem) -> String {
    format!("{}\n{}", item.caption_text(), item.link_text())
}

// ============================================================================
// Handlers
// ============================================================================

/// Text post route; short and long posts share the text type
pub struct TumblrTextPost {
    api: Arc<TumblrApi>,
    label: &'static str,
}

impl TumblrTextPost {
    pub fn short(api: Arc<TumblrApi>) -> Self {
        Self {
            api,
            label: "tumblr short text",
        }
    }

    pub fn long(api: Arc<TumblrApi>) -> Self {
        Self {
            api,
            label: "tumblr long text",
        }
    }
}

#[async_trait]
impl PostHandler for TumblrTextPost {
    fn name(&self) -> &'static str {
        self.label
    }

    async fn publish(&self, post: &PreparedPost<'_>) -> PublishResult<()> {
        let auth = post.credentials.tumblr()?;
        self.api
            .create_text(
                auth,
                post.item.title_text(),
                &text_body(post.item),
                &post.item.tags_list(),
            )
            .await
    }
}

/// Photo post route
pub struct TumblrPhotoPost {
    api: Arc<TumblrApi>,
}

impl TumblrPhotoPost {
    pub fn new(api: Arc<TumblrApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PostHandler for TumblrPhotoPost {
    fn name(&self) -> &'static str {
        "tumblr image"
    }

    async fn publish(&self, post: &PreparedPost<'_>) -> PublishResult<()> {
        let auth = post.credentials.tumblr()?;
        let media = post.media_path()?;
        self.api
            .create_photo(auth, &media_caption(post.item), &post.item.tags_list(), media)
            .await
    }
}

/// Video post route
pub struct TumblrVideoPost {
    api: Arc<TumblrApi>,
}

impl TumblrVideoPost {
    pub fn new(api: Arc<TumblrApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PostHandler for TumblrVideoPost {
    fn name(&self) -> &'static str {
        "tumblr video"
    }

    async fn publish(&self, post: &PreparedPost<'_>) -> PublishResult<()> {
        let auth = post.credentials.tumblr()?;
        let media = post.media_path()?;
        self.api
            .create_video(auth, &media_caption(post.item), &post.item.tags_list(), media)
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
