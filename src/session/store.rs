//! In-memory session store
//!
//! Sessions live only in this process. Expired records behave as absent:
//! lookups delete them lazily and a background sweep reaps the rest.

use crate::types::Session;
use chrono::Utc;
use rand::RngCore;
use rand::rngs::OsRng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Random bytes in a session id
pub const SESSION_ID_BYTES: usize = 32;

/// Generate an unguessable session id
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Session map type
pub type SessionMap = HashMap<String, Session>;

/// Process-local session store
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<SessionMap>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Live session by id; an expired record is removed and reported absent
    pub async fn get(&self, session_id: &str) -> Option<Session> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                None => return None,
                Some(session) if !session.is_expired_at(now) => return Some(session.clone()),
                Some(_) => {}
            }
        }

        let mut sessions = self.sessions.write().await;
        // Re-check: a refresh may have re-stamped it between the two locks
        match sessions.get(session_id) {
            Some(session) if !session.is_expired_at(now) => Some(session.clone()),
            Some(_) => {
                sessions.remove(session_id);
                debug!(session_id, "Removed expired session on lookup");
                None
            }
            None => None,
        }
    }

    /// Insert or replace a session
    pub async fn insert(&self, session: Session) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.session_id.clone(), session);
    }

    /// Replace a session only if a record with its id is still stored
    pub async fn replace(&self, session: Session) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&session.session_id) {
            Some(slot) => {
                *slot = session;
                true
            }
            None => false,
        }
    }

    /// Remove a session, returning it if it was present
    pub async fn remove(&self, session_id: &str) -> Option<Session> {
        self.sessions.write().await.remove(session_id)
    }

    /// Remove every session belonging to a source
    pub async fn remove_for_source(&self, source_id: &str) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.source_id != source_id);
        before - sessions.len()
    }

    /// Remove every expired session and return how many were removed
    pub async fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        before - sessions.len()
    }

    /// Number of stored records, expired ones included until swept
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Number of unexpired sessions
    pub async fn live_count(&self) -> usize {
        let now = Utc::now();
        self.sessions
            .read()
            .await
            .values()
            .filter(|session| !session.is_expired_at(now))
            .count()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Spawn the periodic expiry sweep
    pub fn start_cleanup(self: &Arc<Self>, interval: Duration) -> CleanupHandle {
        let token = CancellationToken::new();
        let store = Arc::clone(self);
        let child = token.child_token();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = child.cancelled() => {
                        debug!("Session cleanup task stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = store.cleanup_expired().await;
                        if removed > 0 {
                            info!(removed, "Cleaned up expired sessions");
                        } else {
                            debug!("No expired sessions to clean up");
                        }
                    }
                }
            }
        });

        info!(interval_secs = interval.as_secs(), "Session cleanup task started");
        CleanupHandle {
            token,
            handle: Some(handle),
        }
    }
}

/// Handle to the background sweep; dropping it cancels the task
#[derive(Debug)]
pub struct CleanupHandle {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl CleanupHandle {
    /// Cancel the sweep and wait for it to finish
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            tracing::warn!(error = %e, "Session cleanup task ended abnormally");
        }
    }

    /// Whether the sweep has been cancelled
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for CleanupHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionData;
    use chrono::Duration as ChronoDuration;

    fn session(source_id: &str, ttl_secs: i64) -> Session {
        Session::new(
            generate_session_id(),
            source_id,
            SessionData::Basic {
                token: "dTpw".to_string(),
            },
            Utc::now() + ChronoDuration::seconds(ttl_secs),
        )
    }

    #[test]
    fn test_session_ids_are_unique_hex() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), SESSION_ID_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_insert_get_remove() {
        let store = SessionStore::new();
        let session = session("s1", 60);
        let id = session.session_id.clone();

        store.insert(session).await;
        assert_eq!(store.get(&id).await.unwrap().source_id, "s1");
        assert!(store.remove(&id).await.is_some());
        assert!(store.remove(&id).await.is_none());
        assert!(store.get(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_lookup_deletes() {
        let store = SessionStore::new();
        let expired = session("s1", -1);
        let id = expired.session_id.clone();
        store.insert(expired).await;
        assert_eq!(store.len().await, 1);

        assert!(store.get(&id).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_cleanup_counts_only_expired() {
        let store = SessionStore::new();
        store.insert(session("s1", -5)).await;
        store.insert(session("s1", -1)).await;
        store.insert(session("s2", 60)).await;

        assert_eq!(store.live_count().await, 1);
        assert_eq!(store.cleanup_expired().await, 2);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.cleanup_expired().await, 0);
    }

    #[tokio::test]
    async fn test_replace_requires_existing_record() {
        let store = SessionStore::new();
        let mut session = session("s1", 60);
        assert!(!store.replace(session.clone()).await);

        store.insert(session.clone()).await;
        session.refreshed_at = Some(Utc::now());
        assert!(store.replace(session.clone()).await);
        assert!(store.get(&session.session_id).await.unwrap().refreshed_at.is_some());
    }

    #[tokio::test]
    async fn test_remove_for_source() {
        let store = SessionStore::new();
        store.insert(session("s1", 60)).await;
        store.insert(session("s1", 60)).await;
        store.insert(session("s2", 60)).await;

        assert_eq!(store.remove_for_source("s1").await, 2);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweep() {
        let store = Arc::new(SessionStore::new());
        store.insert(session("s1", -1)).await;

        let handle = store.start_cleanup(Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(store.is_empty().await);

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_drop_cancels_sweep() {
        let store = Arc::new(SessionStore::new());
        let handle = store.start_cleanup(Duration::from_secs(60));
        let token = handle.token.clone();
        drop(handle);
        assert!(token.is_cancelled());
    }
}
