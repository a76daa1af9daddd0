/// Access Token Codec
///
/// Mints and validates HS256 access tokens. Only HS256 is ever accepted, so
/// a token whose header asks for `none` or for another algorithm fails
/// before its payload is looked at.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};

use crate::auth::claims::{Claims, IdentityClaims};
use crate::auth::signing_key::SigningKey;
use crate::configuration::JwtSettings;
use crate::error::{CodecError, ConfigError};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Whether `validate` checks the `exp` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPolicy {
    Enforce,
    /// Refresh exchange only
    Ignore,
}

/// A freshly minted access token
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn into_string(self) -> String {
        self.value
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AccessTokenCodec {
    key: SigningKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl AccessTokenCodec {
    pub fn new(
        key: SigningKey,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            key,
            issuer: issuer.into(),
            audience: audience.into(),
            ttl,
        }
    }

    /// # Errors
    /// Returns `ConfigError` if the access TTL is not a representable duration
    pub fn from_settings(key: SigningKey, settings: &JwtSettings) -> Result<Self, ConfigError> {
        let ttl = Duration::try_seconds(settings.access_token_expiry).ok_or_else(|| {
            ConfigError::InvalidValue("jwt.access_token_expiry is out of range".to_string())
        })?;

        Ok(Self::new(
            key,
            settings.issuer.clone(),
            settings.audience.clone(),
            ttl,
        ))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `identity`, valid from `now` for the configured TTL
    ///
    /// # Errors
    /// Returns `MissingClaim` for an empty subject id, `Signing` if encoding fails
    pub fn mint(
        &self,
        identity: &IdentityClaims,
        now: DateTime<Utc>,
    ) -> Result<AccessToken, CodecError> {
        if identity.subject_id.trim().is_empty() {
            return Err(CodecError::MissingClaim("sub".to_string()));
        }

        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| CodecError::Signing("token expiry is out of range".to_string()))?;
        let claims = Claims::new(
            identity,
            now,
            self.ttl.num_seconds(),
            &self.issuer,
            &self.audience,
        );

        let value = encode(&Header::new(ALGORITHM), &claims, self.key.encoding())
            .map_err(|e| CodecError::Signing(e.to_string()))?;

        Ok(AccessToken { value, expires_at })
    }

    /// Verify `token` and return the identity it carries
    ///
    /// Signature, algorithm, issuer and audience are always checked.
    /// `exp` is compared against `now` only under `ExpiryPolicy::Enforce`.
    ///
    /// # Errors
    /// Returns a `CodecError` naming the first failed check
    pub fn validate(
        &self,
        token: &str,
        now: DateTime<Utc>,
        policy: ExpiryPolicy,
    ) -> Result<IdentityClaims, CodecError> {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is judged against the caller's clock below, without leeway.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        let claims = decode::<Claims>(token, self.key.decoding(), &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("JWT validation error: {}", e);
                map_decode_error(e)
            })?;

        if claims.sub.trim().is_empty() {
            return Err(CodecError::MissingClaim("sub".to_string()));
        }

        if policy == ExpiryPolicy::Enforce && claims.is_expired_at(now) {
            return Err(CodecError::Expired);
        }

        Ok(claims.into_identity())
    }
}

fn map_decode_error(err: JwtError) -> CodecError {
    match err.kind() {
        ErrorKind::InvalidSignature => CodecError::InvalidSignature,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            CodecError::InvalidAlgorithm
        }
        ErrorKind::InvalidIssuer => CodecError::ClaimRejected("issuer"),
        ErrorKind::InvalidAudience => CodecError::ClaimRejected("audience"),
        ErrorKind::InvalidSubject => CodecError::ClaimRejected("subject"),
        ErrorKind::MissingRequiredClaim(claim) => CodecError::MissingClaim(claim.clone()),
        ErrorKind::ExpiredSignature => CodecError::Expired,
        _ => CodecError::Malformed(err.to_string()),
    }
}
