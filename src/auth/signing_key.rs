/// Signing Key Provider
///
/// Holds the HMAC secret used to sign and verify access tokens. Built once
/// at startup and shared read-only afterwards.

use std::fmt;

use jsonwebtoken::{DecodingKey, EncodingKey};

use crate::configuration::JwtSettings;
use crate::error::ConfigError;

pub(crate) const MIN_SECRET_BYTES: usize = 32;

#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    /// Build a key from raw secret bytes
    ///
    /// # Errors
    /// Returns `ConfigError` if the secret is empty or shorter than 256 bits
    pub fn from_secret(secret: &[u8]) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }
        if secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::InvalidValue(format!(
                "signing secret must be at least {} bytes, got {}",
                MIN_SECRET_BYTES,
                secret.len()
            )));
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        })
    }

    pub fn from_settings(settings: &JwtSettings) -> Result<Self, ConfigError> {
        Self::from_secret(settings.secret.as_bytes())
    }

    pub(crate) fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}
