//! Credential decryption for queue payloads
//!
//! Queue items carry their platform secrets as Fernet tokens minted by the
//! queue side. Both ends derive the same key from a shared passphrase and
//! salt: PBKDF2-SHA256 over the passphrase, 100000 rounds, 32-byte output,
//! URL-safe base64 encoded. The derived key is fixed configuration, so it is
//! computed once and held for the process lifetime.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use fernet::Fernet;
use pbkdf2::pbkdf2_hmac_array;
use sha2::Sha256;
use thiserror::Error;

/// PBKDF2 iteration count shared with the token-minting side
pub const PBKDF2_ROUNDS: u32 = 100_000;

/// Derived key length in bytes
pub const KEY_LEN: usize = 32;

// ============================================================================
// Errors
// ============================================================================

/// Result type for crypto operations
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Credential decryption errors
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The derived key was rejected by the token scheme
    #[error("key derivation produced an unusable key")]
    KeyDerivation,

    /// Malformed token, failed authentication tag, or mismatched key
    #[error("credential token rejected: {0}")]
    InvalidToken(#[from] fernet::DecryptionError),

    /// Token decrypted to bytes that are not valid UTF-8
    #[error("decrypted credential is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::string::FromUtf8Error),
}

impl CryptoError {
    /// Only a broken key derivation is unrecoverable; token failures are
    /// local to the item that carried the token.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::KeyDerivation)
    }
}

// ============================================================================
// Credential Cipher
// ============================================================================

/// Symmetric cipher for credential fields embedded in queue items
#[derive(Clone)]
pub struct CredentialCipher {
    fernet: Fernet,
}

impl CredentialCipher {
    /// Derive the key from passphrase and salt and build the cipher.
    ///
    /// Derivation is deterministic; the same passphrase/salt pair always
    /// yields the same key, so one cipher instance serves the whole process.
    pub fn new(passphrase: &str, salt: &str) -> CryptoResult<Self> {
        let key = pbkdf2_hmac_array::<Sha256, KEY_LEN>(
            passphrase.as_bytes(),
            salt.as_bytes(),
            PBKDF2_ROUNDS,
        );
        let encoded = URL_SAFE.encode(key);
        let fernet = Fernet::new(&encoded).ok_or(CryptoError::KeyDerivation)?;
        Ok(Self { fernet })
    }

    /// Decrypt a credential token to its plaintext string
    pub fn decrypt(&self, token: &str) -> CryptoResult<String> {
        let plaintext = self.fernet.decrypt(token)?;
        Ok(String::from_utf8(plaintext)?)
    }

    /// Encrypt a plaintext string into a token this cipher can decrypt
    pub fn encrypt(&self, plaintext: &str) -> String {
        self.fernet.encrypt(plaintext.as_bytes())
    }
}

impl std::fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        f.debug_struct("CredentialCipher").finish_non_exhaustive()
    }
}
