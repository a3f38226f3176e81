//! Queue payload model
//!
//! One JSON object per slot, produced by the queue side. The shape is a
//! superset across platforms: every item carries `platform` and `post_type`,
//! and the remaining fields depend on which platform the item targets.
//! Credential fields arrive encrypted (see [`crate::crypto`]).

use serde::{Deserialize, Serialize};

// ============================================================================
// Platform
// ============================================================================

/// Target platform for a queued post.
///
/// Unknown platform strings deserialize as [`Platform::Reddit`]; reddit is
/// the queue's default platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Twitter,
    Tumblr,
    #[serde(other)]
    Reddit,
}

impl Platform {
    /// All platforms, in routing-table order
    pub const ALL: [Platform; 4] = [
        Platform::Facebook,
        Platform::Twitter,
        Platform::Tumblr,
        Platform::Reddit,
    ];

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Twitter => "twitter",
            Self::Tumblr => "tumblr",
            Self::Reddit => "reddit",
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::Reddit
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Post Kind
// ============================================================================

/// Post type, decoded from the item's numeric `post_type`.
///
/// 1 = short text, 2 = long text, 3 = image, anything else = video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostKind {
    ShortText,
    LongText,
    Image,
    Video,
}

impl PostKind {
    /// All kinds, in routing-table order
    pub const ALL: [PostKind; 4] = [
        PostKind::ShortText,
        PostKind::LongText,
        PostKind::Image,
        PostKind::Video,
    ];

    /// Decode the numeric wire code
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::ShortText,
            2 => Self::LongText,
            3 => Self::Image,
            _ => Self::Video,
        }
    }

    /// Whether this kind requires a media file before publishing
    pub fn needs_media(&self) -> bool {
        matches!(self, Self::Image | Self::Video)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShortText => "short text",
            Self::LongText => "long text",
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl std::fmt::Display for PostKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tags
// ============================================================================

/// Tag payloads arrive either preprocessed into a single string or as a
/// list, depending on the target platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tags {
    Text(String),
    List(Vec<String>),
}

impl Tags {
    /// Tags as one display string
    pub fn joined(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::List(items) => items.join(" "),
        }
    }

    /// Tags as a list
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::Text(text) => text.split_whitespace().map(str::to_string).collect(),
            Self::List(items) => items.clone(),
        }
    }
}

impl Default for Tags {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

// ============================================================================
// Queue Item
// ============================================================================

/// A queued post read from the remote queue for one slot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueItem {
    /// Target platform
    #[serde(default)]
    pub platform: Platform,

    /// Numeric post type, decoded via [`PostKind::from_code`]
    #[serde(default)]
    pub post_type: i64,

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------
    pub title: Option<String>,
    pub body: Option<String>,
    pub caption: Option<String>,
    pub link_url: Option<String>,
    pub tags: Option<Tags>,
    pub multimedia_url: Option<String>,

    // ------------------------------------------------------------------
    // Facebook credentials
    // ------------------------------------------------------------------
    /// Encrypted page access token
    pub access_token: Option<String>,
    pub page_id: Option<String>,

    // ------------------------------------------------------------------
    // Twitter / Tumblr credentials (consumer pair shared by both)
    // ------------------------------------------------------------------
    /// Encrypted consumer key
    pub consumer_key: Option<String>,
    /// Encrypted consumer secret
    pub consumer_secret: Option<String>,
    /// Encrypted access token key (twitter)
    pub access_token_key: Option<String>,
    /// Encrypted access token secret (twitter)
    pub access_token_secret: Option<String>,
    /// Encrypted OAuth token (tumblr)
    pub oauth_token: Option<String>,
    /// Encrypted OAuth secret (tumblr)
    pub oauth_secret: Option<String>,
    pub blog_name: Option<String>,

    // ------------------------------------------------------------------
    // Reddit credentials
    // ------------------------------------------------------------------
    /// Encrypted client id
    pub client_id: Option<String>,
    /// Encrypted client secret
    pub client_secret: Option<String>,
    /// Encrypted user agent
    pub user_agent: Option<String>,
    /// Encrypted account username
    pub username: Option<String>,
    /// Encrypted account password
    pub password: Option<String>,
    pub target_subreddit: Option<String>,
}

impl QueueItem {
    /// Post kind decoded from the wire code
    pub fn kind(&self) -> PostKind {
        PostKind::from_code(self.post_type)
    }

    /// File name for the item's media reference: the final path segment.
    ///
    /// References may be bare names ("clip.mp4") or full URLs; either way
    /// the scratch file is keyed by the last segment.
    pub fn media_file_name(&self) -> Option<&str> {
        self.multimedia_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .and_then(|url| url.rsplit('/').next())
            .filter(|name| !name.is_empty())
    }

    /// Title, empty when absent
    pub fn title_text(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// Body, empty when absent
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }

    /// Caption, empty when absent
    pub fn caption_text(&self) -> &str {
        self.caption.as_deref().unwrap_or("")
    }

    /// Link URL, empty when absent
    pub fn link_text(&self) -> &str {
        self.link_url.as_deref().unwrap_or("")
    }

    /// Tags as one display string, empty when absent
    pub fn tags_joined(&self) -> String {
        self.tags.as_ref().map(Tags::joined).unwrap_or_default()
    }

    /// Tags as a list, empty when absent
    pub fn tags_list(&self) -> Vec<String> {
        self.tags.as_ref().map(Tags::to_list).unwrap_or_default()
    }
}
