/// JWT Claims structure
///
/// `IdentityClaims` is what callers hand to the codec and get back from it.
/// `Claims` is the wire payload: the identity plus the registered JWT
/// claims (RFC 7519).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity facts carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Stable, non-empty user identifier
    pub subject_id: String,
    pub display_name: String,
    pub roles: Vec<String>,
}

impl IdentityClaims {
    pub fn new(
        subject_id: impl Into<String>,
        display_name: impl Into<String>,
        roles: Vec<String>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            display_name: display_name.into(),
            roles,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// JWT payload for access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    #[serde(default)]
    pub sub: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token ID, unique per minted token
    #[serde(default)]
    pub jti: String,
}

impl Claims {
    /// Build the payload for a token issued at `issued_at`
    ///
    /// # Arguments
    /// * `identity` - Who the token is for
    /// * `issued_at` - Mint instant
    /// * `ttl_seconds` - Lifetime from `issued_at`
    /// * `issuer` / `audience` - Configured token scope
    pub fn new(
        identity: &IdentityClaims,
        issued_at: DateTime<Utc>,
        ttl_seconds: i64,
        issuer: &str,
        audience: &str,
    ) -> Self {
        let iat = issued_at.timestamp();
        Self {
            sub: identity.subject_id.clone(),
            name: identity.display_name.clone(),
            roles: identity.roles.clone(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            iat,
            exp: iat + ttl_seconds,
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Expired once `now` reaches `exp`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    pub fn into_identity(self) -> IdentityClaims {
        IdentityClaims {
            subject_id: self.sub,
            display_name: self.name,
            roles: self.roles,
        }
    }
}
