/// Rotation Protocol
///
/// Issues access/refresh pairs and rotates them. Per subject the store holds
/// either nothing or one active session; every successful login or refresh
/// replaces it, so at most one refresh token is ever valid for a subject.
///
/// A rejected refresh never writes to the store. Otherwise a stale or
/// stolen token could be replayed to knock out the legitimate session.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::auth::{
    AccessToken, AccessTokenCodec, ExpiryPolicy, IdentityClaims, RefreshToken, SigningKey,
};
use crate::clock::{Clock, SystemClock};
use crate::configuration::JwtSettings;
use crate::error::{CodecError, ConfigError, RotationError, StoreError};
use crate::identity::IdentityResolver;
use crate::session::{SessionRecord, SessionStore};

const DEFAULT_STORE_TIMEOUT_MS: u64 = 2_000;

/// Access and refresh token issued together
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    /// Protocol clock reading the pair was minted at
    pub issued_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct RotationProtocol {
    codec: Arc<AccessTokenCodec>,
    sessions: Arc<dyn SessionStore>,
    identities: Arc<dyn IdentityResolver>,
    clock: Arc<dyn Clock>,
    refresh_ttl: Duration,
    store_timeout: std::time::Duration,
    strict_rotation: bool,
}

impl RotationProtocol {
    pub fn new(
        codec: AccessTokenCodec,
        sessions: Arc<dyn SessionStore>,
        identities: Arc<dyn IdentityResolver>,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            codec: Arc::new(codec),
            sessions,
            identities,
            clock: Arc::new(SystemClock),
            refresh_ttl,
            store_timeout: std::time::Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            strict_rotation: false,
        }
    }

    /// Build the protocol from validated settings
    ///
    /// # Errors
    /// Returns `ConfigError` for invalid settings, a bad signing secret, or
    /// strict rotation on a store without compare-and-save
    pub fn from_settings(
        settings: &JwtSettings,
        sessions: Arc<dyn SessionStore>,
        identities: Arc<dyn IdentityResolver>,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let key = SigningKey::from_settings(settings)?;
        let codec = AccessTokenCodec::from_settings(key, settings)?;
        let refresh_ttl = Duration::try_seconds(settings.refresh_token_expiry).ok_or_else(|| {
            ConfigError::InvalidValue("jwt.refresh_token_expiry is out of range".to_string())
        })?;

        Self::new(codec, sessions, identities, refresh_ttl)
        .with_store_timeout(std::time::Duration::from_millis(settings.store_timeout_ms))
        .with_strict_rotation(settings.strict_rotation)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_store_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Rotate with compare-and-save so only one of several racing refreshes wins
    pub fn with_strict_rotation(mut self, strict: bool) -> Result<Self, ConfigError> {
        if strict && !self.sessions.supports_compare_and_save() {
            return Err(ConfigError::InvalidValue(
                "strict rotation requires a session store with compare-and-save".to_string(),
            ));
        }
        self.strict_rotation = strict;
        Ok(self)
    }

    pub fn access_ttl(&self) -> Duration {
        self.codec.ttl()
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Start a session for a subject the caller has already authenticated
    ///
    /// Any previous session for the subject is overwritten.
    ///
    /// # Errors
    /// `UnknownSubject` if identity resolution does not know the subject,
    /// `StoreUnavailable` if resolution or the session write fails
    pub async fn login(&self, subject_id: &str) -> Result<TokenPair, RotationError> {
        let identity = self
            .guarded(self.identities.resolve(subject_id))
            .await?
            .ok_or_else(|| {
                tracing::warn!(subject_id = %subject_id, "Login for unknown subject");
                RotationError::UnknownSubject
            })?;

        let now = self.clock.now();
        let (pair, record) = self.issue(&identity, now)?;

        self.guarded(self.sessions.save(subject_id, record)).await?;

        tracing::info!(subject_id = %subject_id, "Session issued");
        Ok(pair)
    }

    /// Exchange an (expired or not) access token and the current refresh token
    /// for a new pair
    ///
    /// # Errors
    /// - `InvalidAccessToken`: bad signature, algorithm, issuer, audience or encoding
    /// - `MalformedClaims`: the token names no subject
    /// - `InvalidRefreshToken`: no session, a different token, an expired
    ///   session, or (strict rotation) a concurrent rotation won
    /// - `StoreUnavailable`: the store failed or timed out
    pub async fn refresh(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<TokenPair, RotationError> {
        let now = self.clock.now();

        let presented_identity = self
            .codec
            .validate(access_token, now, ExpiryPolicy::Ignore)
            .map_err(|e| {
                tracing::warn!(error = %e, "Refresh rejected: access token invalid");
                reject_access_token(e)
            })?;
        let subject_id = presented_identity.subject_id;

        let session = self.guarded(self.sessions.load(&subject_id)).await?;
        let presented = RefreshToken::presented(refresh_token);

        let session = match session {
            None => {
                tracing::warn!(subject_id = %subject_id, "Refresh rejected: no session");
                return Err(RotationError::InvalidRefreshToken);
            }
            Some(session) if !presented.matches(&session.refresh_token_digest) => {
                tracing::warn!(subject_id = %subject_id, "Refresh rejected: token mismatch");
                return Err(RotationError::InvalidRefreshToken);
            }
            Some(session) if !session.is_live_at(now) => {
                tracing::info!(subject_id = %subject_id, "Refresh rejected: session expired");
                return Err(RotationError::InvalidRefreshToken);
            }
            Some(session) => session,
        };

        let identity = self
            .guarded(self.identities.resolve(&subject_id))
            .await?
            .ok_or_else(|| {
                tracing::warn!(subject_id = %subject_id, "Refresh rejected: subject no longer exists");
                RotationError::InvalidRefreshToken
            })?;

        let (pair, record) = self.issue(&identity, now)?;

        if self.strict_rotation {
            match self
                .guarded(self.sessions.compare_and_save(
                    &subject_id,
                    &session.refresh_token_digest,
                    record,
                ))
                .await
            {
                Ok(()) => {}
                Err(StoreError::Conflict) => {
                    tracing::warn!(subject_id = %subject_id, "Refresh rejected: concurrent rotation");
                    return Err(RotationError::InvalidRefreshToken);
                }
                Err(e) => return Err(e.into()),
            }
        } else {
            self.guarded(self.sessions.save(&subject_id, record)).await?;
        }

        tracing::info!(subject_id = %subject_id, "Session rotated");
        Ok(pair)
    }

    /// Drop the subject's session; outstanding refresh tokens stop working at once
    pub async fn logout(&self, subject_id: &str) -> Result<(), RotationError> {
        self.guarded(self.sessions.clear(subject_id)).await?;
        tracing::info!(subject_id = %subject_id, "Session cleared");
        Ok(())
    }

    /// Validate an access token for a protected request, expiry enforced
    pub fn authenticate(&self, access_token: &str) -> Result<IdentityClaims, RotationError> {
        self.codec
            .validate(access_token, self.clock.now(), ExpiryPolicy::Enforce)
            .map_err(reject_access_token)
    }

    fn issue(
        &self,
        identity: &IdentityClaims,
        now: DateTime<Utc>,
    ) -> Result<(TokenPair, SessionRecord), RotationError> {
        let access_token = self
            .codec
            .mint(identity, now)
            .map_err(RotationError::Issuance)?;
        let refresh_expires_at = now.checked_add_signed(self.refresh_ttl).ok_or_else(|| {
            RotationError::Issuance(CodecError::Signing(
                "session expiry is out of range".to_string(),
            ))
        })?;
        let refresh_token = RefreshToken::generate();

        let record = SessionRecord::new(refresh_token.digest(), refresh_expires_at);
        let pair = TokenPair {
            access_token,
            refresh_token,
            issued_at: now,
            refresh_expires_at,
        };

        Ok((pair, record))
    }

    /// Bound a store call by the configured timeout
    async fn guarded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(timeout = ?self.store_timeout, "Session store call timed out");
                Err(StoreError::Timeout(self.store_timeout))
            }
        }
    }
}

fn reject_access_token(err: CodecError) -> RotationError {
    match err {
        CodecError::MissingClaim(claim) if claim == "sub" => {
            RotationError::MalformedClaims(claim)
        }
        other => RotationError::InvalidAccessToken(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::configuration::test_jwt_settings;
    use crate::identity::InMemoryIdentityDirectory;
    use crate::session::InMemorySessionStore;
    use async_trait::async_trait;
    use jsonwebtoken::{encode, EncodingKey, Header};

    struct Harness {
        protocol: RotationProtocol,
        sessions: InMemorySessionStore,
        identities: InMemoryIdentityDirectory,
        clock: ManualClock,
    }

    fn harness() -> Harness {
        let sessions = InMemorySessionStore::new();
        let identities = InMemoryIdentityDirectory::new();
        identities.insert(IdentityClaims::new("u1", "Ursula", vec!["Member".to_string()]));
        identities.insert(IdentityClaims::new("u2", "Ged", vec![]));
        let clock = ManualClock::new();

        let protocol = RotationProtocol::from_settings(
            &test_jwt_settings(),
            Arc::new(sessions.clone()),
            Arc::new(identities.clone()),
        )
        .expect("valid settings")
        .with_clock(Arc::new(clock.clone()));

        Harness {
            protocol,
            sessions,
            identities,
            clock,
        }
    }

    async fn refresh(h: &Harness, pair: &TokenPair) -> Result<TokenPair, RotationError> {
        h.protocol
            .refresh(pair.access_token.as_str(), pair.refresh_token.as_str())
            .await
    }

    #[tokio::test]
    async fn test_login_then_refresh_then_replay() {
        let h = harness();

        let first = h.protocol.login("u1").await.expect("login succeeds");
        let second = refresh(&h, &first).await.expect("refresh succeeds");

        assert_ne!(first.access_token.as_str(), second.access_token.as_str());
        assert_ne!(first.refresh_token.as_str(), second.refresh_token.as_str());

        assert!(matches!(
            refresh(&h, &first).await,
            Err(RotationError::InvalidRefreshToken)
        ));
        // The replay did not disturb the live session.
        assert!(refresh(&h, &second).await.is_ok());
    }

    #[tokio::test]
    async fn test_login_stores_digest_and_expiry() {
        let h = harness();
        let now = h.clock.now();

        let pair = h.protocol.login("u1").await.unwrap();
        let record = h.sessions.load("u1").await.unwrap().expect("session saved");

        assert_eq!(record.refresh_token_digest, pair.refresh_token.digest());
        assert_eq!(record.expires_at, now + Duration::hours(5));
        assert_eq!(pair.refresh_expires_at, record.expires_at);
        assert_eq!(pair.access_token.expires_at(), now + Duration::minutes(30));
    }

    #[tokio::test]
    async fn test_second_login_invalidates_previous_refresh_token() {
        let h = harness();

        let first = h.protocol.login("u1").await.unwrap();
        let second = h.protocol.login("u1").await.unwrap();

        assert!(matches!(
            refresh(&h, &first).await,
            Err(RotationError::InvalidRefreshToken)
        ));
        assert!(refresh(&h, &second).await.is_ok());
    }

    #[tokio::test]
    async fn test_login_unknown_subject() {
        let h = harness();

        assert!(matches!(
            h.protocol.login("nobody").await,
            Err(RotationError::UnknownSubject)
        ));
        assert_eq!(h.sessions.load("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_refresh_works_with_expired_access_token() {
        let h = harness();
        let pair = h.protocol.login("u1").await.unwrap();

        h.clock.advance(Duration::hours(1));
        assert!(h.protocol.authenticate(pair.access_token.as_str()).is_err());
        assert!(refresh(&h, &pair).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_expiry_boundary() {
        let h = harness();
        let pair = h.protocol.login("u1").await.unwrap();

        h.clock.advance(Duration::hours(5) - Duration::seconds(1));
        assert!(refresh(&h, &pair).await.is_ok());

        let h = harness();
        let pair = h.protocol.login("u1").await.unwrap();
        h.clock.advance(Duration::hours(5));
        assert!(matches!(
            refresh(&h, &pair).await,
            Err(RotationError::InvalidRefreshToken)
        ));

        h.clock.advance(Duration::seconds(1));
        assert!(matches!(
            refresh(&h, &pair).await,
            Err(RotationError::InvalidRefreshToken)
        ));
    }

    #[tokio::test]
    async fn test_expired_session_is_left_in_place() {
        let h = harness();
        let pair = h.protocol.login("u1").await.unwrap();
        let before = h.sessions.load("u1").await.unwrap();

        h.clock.advance(Duration::hours(6));
        assert!(refresh(&h, &pair).await.is_err());
        assert_eq!(h.sessions.load("u1").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_wrong_signature_leaves_session_untouched() {
        let h = harness();
        let pair = h.protocol.login("u1").await.unwrap();
        let before = h.sessions.load("u1").await.unwrap();

        let now = h.clock.now().timestamp();
        let forged = encode(
            &Header::default(),
            &serde_json::json!({
                "sub": "u1",
                "iss": "test-issuer",
                "aud": "test-audience",
                "iat": now,
                "exp": now + 1800,
            }),
            &EncodingKey::from_secret(b"attacker-secret-that-is-also-32-bytes-long"),
        )
        .unwrap();

        let result = h
            .protocol
            .refresh(&forged, pair.refresh_token.as_str())
            .await;

        assert!(matches!(
            result,
            Err(RotationError::InvalidAccessToken(CodecError::InvalidSignature))
        ));
        assert_eq!(h.sessions.load("u1").await.unwrap(), before);
        assert!(refresh(&h, &pair).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_subject_is_malformed_claims() {
        let h = harness();
        let now = h.clock.now().timestamp();
        let token = encode(
            &Header::default(),
            &serde_json::json!({
                "iss": "test-issuer",
                "aud": "test-audience",
                "iat": now,
                "exp": now + 1800,
            }),
            &EncodingKey::from_secret(test_jwt_settings().secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            h.protocol.refresh(&token, "whatever").await,
            Err(RotationError::MalformedClaims(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_expiry_is_invalid_access_token() {
        let h = harness();
        let pair = h.protocol.login("u1").await.unwrap();
        let now = h.clock.now().timestamp();
        let token = encode(
            &Header::default(),
            &serde_json::json!({
                "sub": "u1",
                "iss": "test-issuer",
                "aud": "test-audience",
                "iat": now,
            }),
            &EncodingKey::from_secret(test_jwt_settings().secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            h.protocol.refresh(&token, pair.refresh_token.as_str()).await,
            Err(RotationError::InvalidAccessToken(CodecError::MissingClaim(_)))
        ));
    }

    #[tokio::test]
    async fn test_refresh_with_another_subjects_token_fails() {
        let h = harness();
        let u1 = h.protocol.login("u1").await.unwrap();
        let u2 = h.protocol.login("u2").await.unwrap();

        let result = h
            .protocol
            .refresh(u1.access_token.as_str(), u2.refresh_token.as_str())
            .await;

        assert!(matches!(result, Err(RotationError::InvalidRefreshToken)));
        assert!(refresh(&h, &u1).await.is_ok());
        assert!(refresh(&h, &u2).await.is_ok());
    }

    #[tokio::test]
    async fn test_logout_invalidates_refresh_token() {
        let h = harness();
        let pair = h.protocol.login("u1").await.unwrap();

        h.protocol.logout("u1").await.unwrap();

        assert!(matches!(
            refresh(&h, &pair).await,
            Err(RotationError::InvalidRefreshToken)
        ));
    }

    #[tokio::test]
    async fn test_refresh_for_deleted_subject_fails() {
        let h = harness();
        let pair = h.protocol.login("u1").await.unwrap();

        h.identities.remove("u1");

        assert!(matches!(
            refresh(&h, &pair).await,
            Err(RotationError::InvalidRefreshToken)
        ));
    }

    #[tokio::test]
    async fn test_refresh_picks_up_new_roles() {
        let h = harness();
        let pair = h.protocol.login("u1").await.unwrap();

        h.identities.insert(IdentityClaims::new(
            "u1",
            "Ursula K.",
            vec!["Member".to_string(), "Admin".to_string()],
        ));
        let rotated = refresh(&h, &pair).await.unwrap();
        let claims = h
            .protocol
            .authenticate(rotated.access_token.as_str())
            .unwrap();

        assert_eq!(claims.display_name, "Ursula K.");
        assert!(claims.has_role("Admin"));
    }

    /// Returns the session as it looked before a concurrent rotation
    struct StaleReads {
        inner: InMemorySessionStore,
        snapshot: Option<SessionRecord>,
    }

    #[async_trait]
    impl SessionStore for StaleReads {
        async fn load(&self, _subject_id: &str) -> Result<Option<SessionRecord>, StoreError> {
            Ok(self.snapshot.clone())
        }

        async fn save(&self, subject_id: &str, record: SessionRecord) -> Result<(), StoreError> {
            self.inner.save(subject_id, record).await
        }

        async fn clear(&self, subject_id: &str) -> Result<(), StoreError> {
            self.inner.clear(subject_id).await
        }

        fn supports_compare_and_save(&self) -> bool {
            true
        }

        async fn compare_and_save(
            &self,
            subject_id: &str,
            expected_digest: &str,
            record: SessionRecord,
        ) -> Result<(), StoreError> {
            self.inner
                .compare_and_save(subject_id, expected_digest, record)
                .await
        }
    }

    async fn racing_refresh(strict: bool) -> Result<TokenPair, RotationError> {
        let h = harness();
        let first = h.protocol.login("u1").await.unwrap();
        let snapshot = h.sessions.load("u1").await.unwrap();

        // The other racer rotates first.
        refresh(&h, &first).await.unwrap();

        let loser = RotationProtocol::new(
            AccessTokenCodec::from_settings(
                SigningKey::from_settings(&test_jwt_settings()).unwrap(),
                &test_jwt_settings(),
            )
            .unwrap(),
            Arc::new(StaleReads {
                inner: h.sessions.clone(),
                snapshot,
            }),
            Arc::new(h.identities.clone()),
            Duration::hours(5),
        )
        .with_clock(Arc::new(h.clock.clone()))
        .with_strict_rotation(strict)
        .unwrap();

        refresh_with(&loser, &first).await
    }

    async fn refresh_with(
        protocol: &RotationProtocol,
        pair: &TokenPair,
    ) -> Result<TokenPair, RotationError> {
        protocol
            .refresh(pair.access_token.as_str(), pair.refresh_token.as_str())
            .await
    }

    #[tokio::test]
    async fn test_strict_rotation_rejects_losing_racer() {
        assert!(matches!(
            racing_refresh(true).await,
            Err(RotationError::InvalidRefreshToken)
        ));
    }

    #[tokio::test]
    async fn test_default_rotation_is_last_write_wins() {
        assert!(racing_refresh(false).await.is_ok());
    }

    struct NoCasStore;

    #[async_trait]
    impl SessionStore for NoCasStore {
        async fn load(&self, _subject_id: &str) -> Result<Option<SessionRecord>, StoreError> {
            Ok(None)
        }

        async fn save(&self, _subject_id: &str, _record: SessionRecord) -> Result<(), StoreError> {
            Ok(())
        }

        async fn clear(&self, _subject_id: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_strict_rotation_needs_compare_and_save() {
        let mut settings = test_jwt_settings();
        settings.strict_rotation = true;

        let result = RotationProtocol::from_settings(
            &settings,
            Arc::new(NoCasStore),
            Arc::new(InMemoryIdentityDirectory::new()),
        );
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_short_secret_fails_construction() {
        let mut settings = test_jwt_settings();
        settings.secret = "short".to_string();

        let result = RotationProtocol::from_settings(
            &settings,
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryIdentityDirectory::new()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unrepresentable_ttl_fails_construction() {
        let mut settings = test_jwt_settings();
        settings.refresh_token_expiry = i64::MAX / 10;

        let result = RotationProtocol::from_settings(
            &settings,
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryIdentityDirectory::new()),
        );
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[tokio::test]
    async fn test_expiry_overflow_is_an_issuance_error() {
        let h = harness();
        let protocol = RotationProtocol::new(
            AccessTokenCodec::from_settings(
                SigningKey::from_settings(&test_jwt_settings()).unwrap(),
                &test_jwt_settings(),
            )
            .unwrap(),
            Arc::new(h.sessions.clone()),
            Arc::new(h.identities.clone()),
            Duration::MAX,
        )
        .with_clock(Arc::new(h.clock.clone()));

        assert!(matches!(
            protocol.login("u1").await,
            Err(RotationError::Issuance(_))
        ));
        assert_eq!(h.sessions.load("u1").await.unwrap(), None);
    }

    /// Never answers `save` in time
    struct SlowSaves {
        inner: InMemorySessionStore,
    }

    #[async_trait]
    impl SessionStore for SlowSaves {
        async fn load(&self, subject_id: &str) -> Result<Option<SessionRecord>, StoreError> {
            self.inner.load(subject_id).await
        }

        async fn save(&self, subject_id: &str, record: SessionRecord) -> Result<(), StoreError> {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            self.inner.save(subject_id, record).await
        }

        async fn clear(&self, subject_id: &str) -> Result<(), StoreError> {
            self.inner.clear(subject_id).await
        }
    }

    #[tokio::test]
    async fn test_save_timeout_is_a_failure() {
        let h = harness();
        let pair = h.protocol.login("u1").await.unwrap();

        let slow = RotationProtocol::new(
            AccessTokenCodec::from_settings(
                SigningKey::from_settings(&test_jwt_settings()).unwrap(),
                &test_jwt_settings(),
            )
            .unwrap(),
            Arc::new(SlowSaves {
                inner: h.sessions.clone(),
            }),
            Arc::new(h.identities.clone()),
            Duration::hours(5),
        )
        .with_clock(Arc::new(h.clock.clone()))
        .with_store_timeout(std::time::Duration::from_millis(20));

        let result = refresh_with(&slow, &pair).await;

        match result {
            Err(e @ RotationError::StoreUnavailable(StoreError::Timeout(_))) => {
                assert!(e.is_retryable())
            }
            other => panic!("expected a store timeout, got {:?}", other),
        }
        // The timed-out write was cancelled, the old session still rotates.
        assert!(refresh(&h, &pair).await.is_ok());
    }

    #[tokio::test]
    async fn test_authenticate_classifies_errors() {
        let h = harness();
        let pair = h.protocol.login("u1").await.unwrap();

        let claims = h.protocol.authenticate(pair.access_token.as_str()).unwrap();
        assert_eq!(claims.subject_id, "u1");

        assert!(matches!(
            h.protocol.authenticate("not-a-token"),
            Err(RotationError::InvalidAccessToken(CodecError::Malformed(_)))
        ));

        h.clock.advance(Duration::minutes(30));
        assert!(matches!(
            h.protocol.authenticate(pair.access_token.as_str()),
            Err(RotationError::InvalidAccessToken(CodecError::Expired))
        ));
    }
}
