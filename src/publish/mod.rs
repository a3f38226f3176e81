//! Outbound publishing: platform adapters and dispatch routing
//!
//! Every queued item resolves to exactly one handler through a two-key
//! lookup on `(platform, post kind)`. The table is built once at startup
//! and covers all sixteen routes explicitly; adding a platform or kind
//! means adding rows, not branches.
//!
//! Adapters are deliberately thin: credentials are decrypted up front into
//! a typed [`Credentials`] value, each publish is a single canonical HTTP
//! round-trip (reddit's documented token-then-submit pair counts as one),
//! and base URLs are overridable so tests can stand in a local server.

pub mod facebook;
pub mod media;
pub mod reddit;
pub mod tumblr;
pub mod twitter;

use async_trait::async_trait;
use reqwest::multipart::Part;
use reqwest::Client;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::config::Config;
use crate::crypto::{CredentialCipher, CryptoError};
use crate::queue::{Platform, PostKind, QueueItem};

use facebook::{FacebookApi, FacebookAuth, FacebookImagePost, FacebookTextPost, FacebookVideoPost};
use reddit::{RedditApi, RedditAuth, RedditImagePost, RedditTextPost, RedditVideoPost};
use tumblr::{TumblrApi, TumblrAuth, TumblrPhotoPost, TumblrTextPost, TumblrVideoPost};
use twitter::{TwitterApi, TwitterAuth, TwitterImagePost, TwitterTextPost, TwitterVideoPost};

// ============================================================================
// Errors
// ============================================================================

/// Result type for publish operations
pub type PublishResult<T> = Result<T, PublishError>;

/// Errors raised while dispatching one item.
///
/// All of these are local to the item being published; none of them stop
/// the consumer loop.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The item lacks a field its platform/kind requires
    #[error("queue item is missing required field '{0}'")]
    MissingField(&'static str),

    /// The decrypted credentials are for a different platform
    #[error("credentials do not match platform (expected {expected})")]
    WrongCredentials { expected: &'static str },

    /// A credential field failed to decrypt
    #[error("credential decryption failed: {0}")]
    Credentials(#[from] CryptoError),

    /// Network-level failure talking to the platform
    #[error("platform request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Local media file could not be read for upload
    #[error("media file unavailable: {0}")]
    Io(#[from] std::io::Error),

    /// The platform answered with a non-success status
    #[error("{platform} rejected the post (HTTP {status}): {detail}")]
    Rejected {
        platform: &'static str,
        status: u16,
        detail: String,
    },

    /// No handler is registered for this platform/kind pair
    #[error("no handler registered for {platform} {kind}")]
    NoRoute { platform: Platform, kind: PostKind },
}

/// Missing-field guard for item payload access
pub(crate) fn require<'a>(
    field: &'a Option<String>,
    name: &'static str,
) -> PublishResult<&'a str> {
    field.as_deref().ok_or(PublishError::MissingField(name))
}

/// Read a local media file into a multipart part named after the file
pub(crate) async fn file_part(path: &Path) -> PublishResult<Part> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string();
    Ok(Part::bytes(bytes).file_name(file_name))
}

/// Map a non-success platform response to a [`PublishError::Rejected`]
pub(crate) async fn check_response(
    platform: &'static str,
    response: reqwest::Response,
) -> PublishResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let detail = response.text().await.unwrap_or_default();
    Err(PublishError::Rejected {
        platform,
        status: status.as_u16(),
        detail,
    })
}

// ============================================================================
// Credentials
// ============================================================================

/// Decrypted platform credentials for one queue item.
///
/// Decryption happens once, before dispatch; handlers receive the typed
/// variant for their platform and never see ciphertext.
#[derive(Debug, Clone)]
pub enum Credentials {
    Facebook(FacebookAuth),
    Twitter(TwitterAuth),
    Tumblr(TumblrAuth),
    Reddit(RedditAuth),
}

impl Credentials {
    /// Decrypt the credential fields the item's platform requires
    pub fn decrypt(item: &QueueItem, cipher: &CredentialCipher) -> PublishResult<Self> {
        match item.platform {
            Platform::Facebook => Ok(Self::Facebook(FacebookAuth::from_item(item, cipher)?)),
            Platform::Twitter => Ok(Self::Twitter(TwitterAuth::from_item(item, cipher)?)),
            Platform::Tumblr => Ok(Self::Tumblr(TumblrAuth::from_item(item, cipher)?)),
            Platform::Reddit => Ok(Self::Reddit(RedditAuth::from_item(item, cipher)?)),
        }
    }

    pub fn facebook(&self) -> PublishResult<&FacebookAuth> {
        match self {
            Self::Facebook(auth) => Ok(auth),
            _ => Err(PublishError::WrongCredentials {
                expected: "facebook",
            }),
        }
    }

    pub fn twitter(&self) -> PublishResult<&TwitterAuth> {
        match self {
            Self::Twitter(auth) => Ok(auth),
            _ => Err(PublishError::WrongCredentials { expected: "twitter" }),
        }
    }

    pub fn tumblr(&self) -> PublishResult<&TumblrAuth> {
        match self {
            Self::Tumblr(auth) => Ok(auth),
            _ => Err(PublishError::WrongCredentials { expected: "tumblr" }),
        }
    }

    pub fn reddit(&self) -> PublishResult<&RedditAuth> {
        match self {
            Self::Reddit(auth) => Ok(auth),
            _ => Err(PublishError::WrongCredentials { expected: "reddit" }),
        }
    }
}

// ============================================================================
// Prepared Post
// ============================================================================

/// One item ready for dispatch: payload, decrypted credentials, and the
/// local media file when the kind requires one.
#[derive(Debug, Clone, Copy)]
pub struct PreparedPost<'a> {
    pub item: &'a QueueItem,
    pub credentials: &'a Credentials,
    pub media: Option<&'a Path>,
}

impl<'a> PreparedPost<'a> {
    pub fn new(item: &'a QueueItem, credentials: &'a Credentials) -> Self {
        Self {
            item,
            credentials,
            media: None,
        }
    }

    /// Attach the fetched local media file
    pub fn with_media(mut self, path: &'a Path) -> Self {
        self.media = Some(path);
        self
    }

    /// Local media path; errors when the handler needs media and none was fetched
    pub fn media_path(&self) -> PublishResult<&'a Path> {
        self.media.ok_or(PublishError::MissingField("multimedia_url"))
    }
}

// ============================================================================
// Handler Trait
// ============================================================================

/// A publishing route for one `(platform, kind)` cell.
///
/// Implementations perform exactly one publish attempt; retries belong to
/// the weekly slot cycle, not to the handler.
#[async_trait]
pub trait PostHandler: Send + Sync {
    /// Route label used in logs (e.g. "facebook video")
    fn name(&self) -> &'static str;

    /// Publish one prepared post
    async fn publish(&self, post: &PreparedPost<'_>) -> PublishResult<()>;
}

// ============================================================================
// Dispatch Table
// ============================================================================

/// Two-key routing table mapping `(platform, kind)` to its handler.
///
/// Built once at startup; all sixteen routes are registered explicitly so
/// every decodable item resolves without fallthrough.
pub struct DispatchTable {
    routes: HashMap<(Platform, PostKind), Arc<dyn PostHandler>>,
}

impl DispatchTable {
    /// Build the table with one shared HTTP client from configuration
    pub fn new(config: &Config) -> PublishResult<Self> {
        let http = Client::builder().timeout(config.http_timeout()).build()?;

        Ok(Self::with_apis(
            Arc::new(FacebookApi::new(http.clone())),
            Arc::new(TwitterApi::new(http.clone())),
            Arc::new(TumblrApi::new(http.clone())),
            Arc::new(RedditApi::new(http)),
        ))
    }

    /// Build the table around explicit platform APIs (tests point these at
    /// a local mock server)
    pub fn with_apis(
        facebook: Arc<FacebookApi>,
        twitter: Arc<TwitterApi>,
        tumblr: Arc<TumblrApi>,
        reddit: Arc<RedditApi>,
    ) -> Self {
        let mut routes: HashMap<(Platform, PostKind), Arc<dyn PostHandler>> = HashMap::new();

        routes.insert(
            (Platform::Facebook, PostKind::ShortText),
            Arc::new(FacebookTextPost::short(facebook.clone())),
        );
        routes.insert(
            (Platform::Facebook, PostKind::LongText),
            Arc::new(FacebookTextPost::long(facebook.clone())),
        );
        routes.insert(
            (Platform::Facebook, PostKind::Image),
            Arc::new(FacebookImagePost::new(facebook.clone())),
        );
        routes.insert(
            (Platform::Facebook, PostKind::Video),
            Arc::new(FacebookVideoPost::new(facebook)),
        );

        routes.insert(
            (Platform::Twitter, PostKind::ShortText),
            Arc::new(TwitterTextPost::short(twitter.clone())),
        );
        routes.insert(
            (Platform::Twitter, PostKind::LongText),
            Arc::new(TwitterTextPost::long(twitter.clone())),
        );
        routes.insert(
            (Platform::Twitter, PostKind::Image),
            Arc::new(TwitterImagePost::new(twitter.clone())),
        );
        routes.insert(
            (Platform::Twitter, PostKind::Video),
            Arc::new(TwitterVideoPost::new(twitter)),
        );

        routes.insert(
            (Platform::Tumblr, PostKind::ShortText),
            Arc::new(TumblrTextPost::short(tumblr.clone())),
        );
        routes.insert(
            (Platform::Tumblr, PostKind::LongText),
            Arc::new(TumblrTextPost::long(tumblr.clone())),
        );
        routes.insert(
            (Platform::Tumblr, PostKind::Image),
            Arc::new(TumblrPhotoPost::new(tumblr.clone())),
        );
        routes.insert(
            (Platform::Tumblr, PostKind::Video),
            Arc::new(TumblrVideoPost::new(tumblr)),
        );

        routes.insert(
            (Platform::Reddit, PostKind::ShortText),
            Arc::new(RedditTextPost::short(reddit.clone())),
        );
        routes.insert(
            (Platform::Reddit, PostKind::LongText),
            Arc::new(RedditTextPost::long(reddit.clone())),
        );
        routes.insert(
            (Platform::Reddit, PostKind::Image),
            Arc::new(RedditImagePost::new(reddit.clone())),
        );
        routes.insert(
            (Platform::Reddit, PostKind::Video),
            Arc::new(RedditVideoPost::new(reddit)),
        );

        Self { routes }
    }

    /// Resolve the handler for one platform/kind pair
    pub fn handler(&self, platform: Platform, kind: PostKind) -> PublishResult<&dyn PostHandler> {
        self.routes
            .get(&(platform, kind))
            .map(|handler| handler.as_ref())
            .ok_or(PublishError::NoRoute { platform, kind })
    }

    /// Number of registered routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchTable")
            .field("routes", &self.routes.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_table() -> DispatchTable {
        let http = Client::new();
        DispatchTable::with_apis(
            Arc::new(FacebookApi::new(http.clone())),
            Arc::new(TwitterApi::new(http.clone())),
            Arc::new(TumblrApi::new(http.clone())),
            Arc::new(RedditApi::new(http)),
        )
    }

    #[test]
    fn test_every_route_is_registered() {
        let table = test_table();
        assert_eq!(table.len(), 16);

        for platform in Platform::ALL {
            for kind in PostKind::ALL {
                let handler = table.handler(platform, kind).unwrap();
                assert!(handler.name().starts_with(platform.as_str()));
            }
        }
    }

    #[test]
    fn test_video_routes_are_video_handlers() {
        // Video must never resolve to an image route
        let table = test_table();

        for platform in Platform::ALL {
            let name = table.handler(platform, PostKind::Video).unwrap().name();
            assert!(name.ends_with("video"), "got {name}");
        }
    }

    #[test]
    fn test_twitter_long_text_has_a_route() {
        let table = test_table();
        let handler = table.handler(Platform::Twitter, PostKind::LongText).unwrap();
        assert_eq!(handler.name(), "twitter long text");
    }

    #[test]
    fn test_credentials_platform_mismatch() {
        let creds = Credentials::Facebook(FacebookAuth {
            access_token: "token".to_string(),
            page_id: "page".to_string(),
        });

        assert!(creds.facebook().is_ok());
        assert!(matches!(
            creds.twitter(),
            Err(PublishError::WrongCredentials { expected: "twitter" })
        ));
    }

    #[test]
    fn test_require_guard() {
        let present = Some("value".to_string());
        assert_eq!(require(&present, "field").unwrap(), "value");

        let absent: Option<String> = None;
        assert!(matches!(
            require(&absent, "page_id"),
            Err(PublishError::MissingField("page_id"))
        ));
    }
}
