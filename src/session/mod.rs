/// Session Store Adapter
///
/// The rotation protocol persists one session record per subject through
/// this contract. Storage itself belongs to the host application.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;

pub use memory::InMemorySessionStore;
pub use postgres::PgSessionStore;

/// Current refresh token (as a digest) and its expiry for one subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub refresh_token_digest: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(refresh_token_digest: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            refresh_token_digest: refresh_token_digest.into(),
            expires_at,
        }
    }

    /// Live strictly before `expires_at`
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Persistence for session records
///
/// Each write must be atomic, and a subject must be able to read its own
/// writes within one request. Concurrent writers for the same subject are
/// last-write-wins unless the store implements `compare_and_save`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// `None` when the subject has no session
    async fn load(&self, subject_id: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// Replace whatever session the subject had
    async fn save(&self, subject_id: &str, record: SessionRecord) -> Result<(), StoreError>;

    /// Drop the subject's session; clearing an absent session is not an error
    async fn clear(&self, subject_id: &str) -> Result<(), StoreError>;

    fn supports_compare_and_save(&self) -> bool {
        false
    }

    /// Replace the session only if its digest still equals `expected_digest`
    ///
    /// # Errors
    /// `StoreError::Conflict` when the stored session changed or vanished
    async fn compare_and_save(
        &self,
        subject_id: &str,
        expected_digest: &str,
        record: SessionRecord,
    ) -> Result<(), StoreError> {
        let _ = (subject_id, expected_digest, record);
        Err(StoreError::Unsupported)
    }
}
