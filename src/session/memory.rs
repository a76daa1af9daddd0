use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{SessionRecord, SessionStore};
use crate::error::StoreError;

/// Session store kept in process memory
///
/// Clones share the same map.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<String, SessionRecord>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> Result<MutexGuard<'_, HashMap<String, SessionRecord>>, StoreError> {
        self.sessions
            .lock()
            .map_err(|_| StoreError::Unavailable("session map lock poisoned".to_string()))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, subject_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.sessions()?.get(subject_id).cloned())
    }

    async fn save(&self, subject_id: &str, record: SessionRecord) -> Result<(), StoreError> {
        self.sessions()?.insert(subject_id.to_string(), record);
        Ok(())
    }

    async fn clear(&self, subject_id: &str) -> Result<(), StoreError> {
        self.sessions()?.remove(subject_id);
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
        let mut sessions = self.sessions()?;
        match sessions.get_mut(subject_id) {
            Some(current) if current.refresh_token_digest == expected_digest => {
                *current = record;
                Ok(())
            }
            _ => Err(StoreError::Conflict),
        }
    }
}
