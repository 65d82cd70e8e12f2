//! Per-user wizard sessions
//!
//! Each session owns one [`WizardState`] behind its own async mutex, so a
//! session handles one action at a time while different sessions run in
//! parallel. Idle sessions are pruned lazily whenever a session is created.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hildegard_common::time;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::wizard::WizardState;

#[derive(Debug)]
pub struct Session {
    pub wizard: WizardState,
    pub last_active: DateTime<Utc>,
}

impl Session {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            wizard: WizardState::new(),
            last_active: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_active = time::now();
    }

    fn is_idle(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        match (now - self.last_active).to_std() {
            Ok(idle) => idle > timeout,
            Err(_) => false,
        }
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Start a fresh wizard, pruning idle sessions first
    pub async fn create(&self) -> (Uuid, SessionHandle) {
        let now = time::now();
        let pruned = self.prune(now).await;
        if pruned > 0 {
            info!(pruned, "Discarded idle sessions");
        }

        let id = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(Session::new(now)));
        self.sessions.write().await.insert(id, handle.clone());
        debug!(session = %id, "Session created");
        (id, handle)
    }

    pub async fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            debug!(session = %id, "Session discarded");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop sessions idle longer than the timeout; returns how many went
    ///
    /// Sessions busy with an action are skipped.
    pub async fn prune(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => !session.is_idle(now, self.idle_timeout),
            Err(_) => true,
        });
        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_get_remove() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (id, _) = store.create().await;

        assert!(store.get(&id).await.is_some());
        assert_eq!(store.len().await, 1);
        assert!(store.remove(&id).await);
        assert!(store.get(&id).await.is_none());
        assert!(!store.remove(&id).await);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (_, first) = store.create().await;
        let (_, second) = store.create().await;

        first.lock().await.wizard.set_date(
            chrono::NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        )
        .unwrap();

        assert!(second.lock().await.wizard.liturgy_date().is_none());
    }

    #[tokio::test]
    async fn test_prune_drops_idle_sessions() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (idle, handle) = store.create().await;
        let (active, _) = store.create().await;
        handle.lock().await.last_active = time::now() - chrono::Duration::seconds(120);

        let pruned = store.prune(time::now()).await;

        assert_eq!(pruned, 1);
        assert!(store.get(&idle).await.is_none());
        assert!(store.get(&active).await.is_some());
    }

    #[tokio::test]
    async fn test_prune_skips_busy_sessions() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (id, handle) = store.create().await;
        let mut session = handle.lock().await;
        session.last_active = time::now() - chrono::Duration::seconds(120);

        assert_eq!(store.prune(time::now()).await, 0);
        drop(session);
        assert!(store.get(&id).await.is_some());
    }
}
