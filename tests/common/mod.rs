//! Common test utilities

use embercast::config::Config;
use embercast::crypto::CredentialCipher;
use embercast::queue::{Platform, QueueItem, Tags};

/// Passphrase shared by fixtures and the configs built here
pub const TEST_PASSPHRASE: &str = "passphrase";

/// Salt shared by fixtures and the configs built here
pub const TEST_SALT: &str = "salt";

/// Config wired for tests: given shard, shared passphrase/salt, short timeout
pub fn test_config(server_id: u32) -> Config {
    Config {
        server_id,
        secret_key: TEST_PASSPHRASE.to_string(),
        salt: TEST_SALT.to_string(),
        http_timeout_secs: 5,
        ..Config::default()
    }
}

/// Cipher matching the configs built by [`test_config`]
pub fn test_cipher() -> CredentialCipher {
    CredentialCipher::new(TEST_PASSPHRASE, TEST_SALT).unwrap()
}

/// A reddit short-text item with credentials encrypted under `cipher`
#[allow(dead_code)]
pub fn reddit_text_item(cipher: &CredentialCipher) -> QueueItem {
    QueueItem {
        platform: Platform::Reddit,
        post_type: 1,
        title: Some("Release day".to_string()),
        body: Some("The new build is out.".to_string()),
        link_url: Some("https://example.com/release".to_string()),
        client_id: Some(cipher.encrypt("client-id")),
        client_secret: Some(cipher.encrypt("client-secret")),
        user_agent: Some(cipher.encrypt("embercast-tests/0.1")),
        username: Some(cipher.encrypt("poster")),
        password: Some(cipher.encrypt("hunter2")),
        target_subreddit: Some("rust".to_string()),
        ..Default::default()
    }
}

/// A facebook image item with credentials encrypted under `cipher`
#[allow(dead_code)]
pub fn facebook_image_item(cipher: &CredentialCipher) -> QueueItem {
    QueueItem {
        platform: Platform::Facebook,
        post_type: 3,
        caption: Some("Sunset over the bay ".to_string()),
        tags: Some(Tags::Text("#photo".to_string())),
        multimedia_url: Some("https://cdn.example.com/files/sunset.jpg".to_string()),
        access_token: Some(cipher.encrypt("fb-page-token")),
        page_id: Some("page-42".to_string()),
        ..Default::default()
    }
}
