//! In-memory device session repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use socialhub_core::result::AppResult;
use socialhub_entity::session::{DeviceSession, RefreshRotation, UpsertDeviceSession};

use crate::repositories::SessionRepository;

/// Sessions keyed by `(user_id, device_id)`.
#[derive(Debug, Default)]
pub struct MemorySessionRepository {
    sessions: RwLock<HashMap<(Uuid, String), DeviceSession>>,
}

impl MemorySessionRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no sessions are stored.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn find_by_user_and_device(
        &self,
        user_id: Uuid,
        device_id: &str,
    ) -> AppResult<Option<DeviceSession>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&(user_id, device_id.to_string())).cloned())
    }

    async fn find_by_refresh_token(
        &self,
        device_id: &str,
        refresh_token: &str,
    ) -> AppResult<Option<DeviceSession>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .values()
            .find(|s| s.device_id == device_id && s.refresh_token == refresh_token)
            .cloned())
    }

    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<DeviceSession>> {
        let sessions = self.sessions.read().await;
        let mut found: Vec<DeviceSession> = sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.last_active.cmp(&a.last_active));
        Ok(found)
    }

    async fn upsert(&self, data: &UpsertDeviceSession) -> AppResult<DeviceSession> {
        let mut sessions = self.sessions.write().await;
        let key = (data.user_id, data.device_id.clone());
        let id = sessions
            .get(&key)
            .map(|existing| existing.id)
            .unwrap_or_else(Uuid::new_v4);

        let session = DeviceSession {
            id,
            user_id: data.user_id,
            device_id: data.device_id.clone(),
            ip_address: data.ip_address.clone(),
            refresh_token: data.refresh_token.clone(),
            secret_key: data.secret_key.clone(),
            expired_at: data.expired_at,
            created_at: data.logged_in_at,
            last_active: data.logged_in_at,
        };
        sessions.insert(key, session.clone());
        Ok(session)
    }

    async fn update_refresh(
        &self,
        session_id: Uuid,
        expected_refresh_token: &str,
        rotation: &RefreshRotation,
    ) -> AppResult<bool> {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions
            .values_mut()
            .find(|s| s.id == session_id && s.refresh_token == expected_refresh_token)
        else {
            return Ok(false);
        };

        session.refresh_token = rotation.refresh_token.clone();
        session.secret_key = rotation.secret_key.clone();
        session.expired_at = rotation.expired_at;
        session.last_active = rotation.rotated_at;
        Ok(true)
    }

    async fn delete(&self, user_id: Uuid, device_id: &str) -> AppResult<u64> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions
            .remove(&(user_id, device_id.to_string()))
            .map_or(0, |_| 1))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn upsert_data(user_id: Uuid, device_id: &str, token: &str, now: DateTime<Utc>) -> UpsertDeviceSession {
        UpsertDeviceSession {
            user_id,
            device_id: device_id.to_string(),
            ip_address: Some("10.0.0.1".to_string()),
            refresh_token: token.to_string(),
            secret_key: "ABCDEFGHIJKLMNOP".to_string(),
            expired_at: now + Duration::days(30),
            logged_in_at: now,
        }
    }

    #[tokio::test]
    async fn test_upsert_keeps_id_per_device() {
        let repo = MemorySessionRepository::new();
        let user = Uuid::new_v4();
        let now = Utc::now();

        let first = repo.upsert(&upsert_data(user, "d1", "t1", now)).await.unwrap();
        let second = repo.upsert(&upsert_data(user, "d1", "t2", now)).await.unwrap();
        let other = repo.upsert(&upsert_data(user, "d2", "t3", now)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_ne!(first.id, other.id);
        assert_eq!(second.refresh_token, "t2");
        assert_eq!(repo.len().await, 2);
    }

    #[tokio::test]
    async fn test_update_refresh_requires_current_token() {
        let repo = MemorySessionRepository::new();
        let user = Uuid::new_v4();
        let now = Utc::now();
        let session = repo.upsert(&upsert_data(user, "d1", "t1", now)).await.unwrap();

        let rotation = RefreshRotation {
            refresh_token: "t2".to_string(),
            secret_key: "QRSTUVWXYZ012345".to_string(),
            expired_at: now + Duration::days(30),
            rotated_at: now + Duration::minutes(1),
        };

        assert!(repo.update_refresh(session.id, "t1", &rotation).await.unwrap());
        assert!(!repo.update_refresh(session.id, "t1", &rotation).await.unwrap());

        let stored = repo.find_by_refresh_token("d1", "t2").await.unwrap().unwrap();
        assert_eq!(stored.last_active, now + Duration::minutes(1));
        assert!(repo.find_by_refresh_token("d1", "t1").await.unwrap().is_none());
        assert!(repo.find_by_refresh_token("d2", "t2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_and_delete_expired() {
        let repo = MemorySessionRepository::new();
        let user = Uuid::new_v4();
        let now = Utc::now();

        let mut stale = upsert_data(user, "old", "t-old", now);
        stale.expired_at = now;
        repo.upsert(&stale).await.unwrap();
        repo.upsert(&upsert_data(user, "d1", "t1", now)).await.unwrap();

        assert_eq!(repo.delete_expired(now).await.unwrap(), 1);
        assert_eq!(repo.delete(user, "d1").await.unwrap(), 1);
        assert_eq!(repo.delete(user, "d1").await.unwrap(), 0);
        assert!(repo.is_empty().await);
    }
}
