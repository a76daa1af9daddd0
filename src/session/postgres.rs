use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{SessionRecord, SessionStore};
use crate::error::StoreError;

/// PostgreSQL-backed session store (`user_sessions` table)
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unavailable(err: sqlx::Error) -> StoreError {
    tracing::error!(error = %err, "Session store query failed");
    StoreError::Unavailable(err.to_string())
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn load(&self, subject_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let row = sqlx::query_as::<_, (String, DateTime<Utc>)>(
            r#"
            SELECT refresh_token_hash, refresh_token_expiry
            FROM user_sessions
            WHERE user_id = $1
            "#,
        )
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(row.map(|(digest, expires_at)| SessionRecord::new(digest, expires_at)))
    }

    async fn save(&self, subject_id: &str, record: SessionRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO user_sessions (user_id, refresh_token_hash, refresh_token_expiry, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET refresh_token_hash = EXCLUDED.refresh_token_hash,
                refresh_token_expiry = EXCLUDED.refresh_token_expiry,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(subject_id)
        .bind(&record.refresh_token_digest)
        .bind(record.expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn clear(&self, subject_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM user_sessions WHERE user_id = $1")
            .bind(subject_id)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(())
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
        let result = sqlx::query(
            r#"
            UPDATE user_sessions
            SET refresh_token_hash = $3,
                refresh_token_expiry = $4,
                updated_at = $5
            WHERE user_id = $1 AND refresh_token_hash = $2
            "#,
        )
        .bind(subject_id)
        .bind(expected_digest)
        .bind(&record.refresh_token_digest)
        .bind(record.expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict);
        }

        Ok(())
    }
}
