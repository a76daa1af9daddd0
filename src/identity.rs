/// Identity Resolution
///
/// Looks up the current display name and roles for a subject each time a
/// token is minted. Nothing here is cached by the core.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::IdentityClaims;
use crate::error::StoreError;

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `None` when the subject is not a known user
    async fn resolve(&self, subject_id: &str) -> Result<Option<IdentityClaims>, StoreError>;
}

/// Identity directory kept in process memory
#[derive(Clone, Default)]
pub struct InMemoryIdentityDirectory {
    users: Arc<RwLock<HashMap<String, IdentityClaims>>>,
}

impl InMemoryIdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, identity: IdentityClaims) {
        if let Ok(mut users) = self.users.write() {
            users.insert(identity.subject_id.clone(), identity);
        }
    }

    pub fn remove(&self, subject_id: &str) {
        if let Ok(mut users) = self.users.write() {
            users.remove(subject_id);
        }
    }
}

#[async_trait]
impl IdentityResolver for InMemoryIdentityDirectory {
    async fn resolve(&self, subject_id: &str) -> Result<Option<IdentityClaims>, StoreError> {
        let users = self
            .users
            .read()
            .map_err(|_| StoreError::Unavailable("identity map lock poisoned".to_string()))?;
        Ok(users.get(subject_id).cloned())
    }
}

/// Reads `users` and `user_roles` from PostgreSQL
#[derive(Clone)]
pub struct PgIdentityDirectory {
    pool: PgPool,
}

impl PgIdentityDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityResolver for PgIdentityDirectory {
    async fn resolve(&self, subject_id: &str) -> Result<Option<IdentityClaims>, StoreError> {
        let unavailable = |e: sqlx::Error| StoreError::Unavailable(e.to_string());

        let display_name = sqlx::query_scalar::<_, String>(
            "SELECT display_name FROM users WHERE id = $1",
        )
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        let Some(display_name) = display_name else {
            return Ok(None);
        };

        let roles = sqlx::query_scalar::<_, String>(
            "SELECT role FROM user_roles WHERE user_id = $1 ORDER BY role",
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(Some(IdentityClaims::new(subject_id, display_name, roles)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_known_and_unknown() {
        let directory = InMemoryIdentityDirectory::new();
        directory.insert(IdentityClaims::new("u1", "Ursula", vec!["Member".to_string()]));

        let found = directory.resolve("u1").await.unwrap().expect("known subject");
        assert_eq!(found.display_name, "Ursula");
        assert_eq!(directory.resolve("u2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove() {
        let directory = InMemoryIdentityDirectory::new();
        directory.insert(IdentityClaims::new("u1", "Ursula", vec![]));
        directory.remove("u1");

        assert_eq!(directory.resolve("u1").await.unwrap(), None);
    }
}
