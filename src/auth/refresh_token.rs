/// Refresh Token Generation
///
/// Refresh tokens are:
/// - 32 bytes from the OS CSPRNG, encoded as unpadded URL-safe base64
/// - Opaque: they carry no claims
/// - Stored only as a SHA-256 digest, never in plaintext
/// - Compared against the stored digest in constant time

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const TOKEN_BYTES: usize = 32;

#[derive(Clone)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Draw a new token from the OS random source
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wrap a token presented by a client
    pub fn presented(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// SHA-256 digest (lowercase hex) persisted in place of the token
    pub fn digest(&self) -> String {
        hash_token(&self.0)
    }

    /// Constant-time check of this token against a stored digest
    pub fn matches(&self, stored_digest: &str) -> bool {
        self.digest()
            .as_bytes()
            .ct_eq(stored_digest.as_bytes())
            .into()
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshToken(<redacted>)")
    }
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
