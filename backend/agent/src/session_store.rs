//! Session storage.
//!
//! Every session sits behind its own async mutex. Callers hold the lock for
//! the duration of a request, so overlapping requests on one session run one
//! after another while different sessions proceed independently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use tripforge_core::{Session, SessionId, TripError};

pub type SessionHandle = Arc<Mutex<Session>>;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create an empty session and return its id.
    async fn create(&self) -> SessionId;

    /// Shared handle to an existing session.
    async fn get(&self, id: &str) -> Result<SessionHandle, TripError>;

    /// Drop a session. Returns whether it existed.
    async fn remove(&self, id: &str) -> bool;

    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop sessions not updated within `max_idle`. Returns how many were dropped.
    async fn evict_idle(&self, max_idle: Duration) -> usize;
}

/// Process-local store. Sessions are lost on restart.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, SessionHandle>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self) -> SessionId {
        let session = Session::new();
        let id = session.id.clone();
        let mut w = self.sessions.write().await;
        w.insert(id.clone(), Arc::new(Mutex::new(session)));
        debug!(session_id = %id, total = w.len(), "Session created");
        id
    }

    async fn get(&self, id: &str) -> Result<SessionHandle, TripError> {
        let r = self.sessions.read().await;
        r.get(id)
            .cloned()
            .ok_or_else(|| TripError::SessionNotFound(id.to_string()))
    }

    async fn remove(&self, id: &str) -> bool {
        let mut w = self.sessions.write().await;
        w.remove(id).is_some()
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn evict_idle(&self, max_idle: Duration) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(max_idle)
            .ok()
            .and_then(|idle| Utc::now().checked_sub_signed(idle))
        else {
            return 0;
        };

        let mut w = self.sessions.write().await;
        let before = w.len();
        // A session whose lock is held is serving a request right now.
        w.retain(|_, handle| match handle.try_lock() {
            Ok(session) => session.updated_at > cutoff,
            Err(_) => true,
        });
        before - w.len()
    }
}

/// Periodically evict idle sessions until the returned task is aborted.
pub fn spawn_reaper(store: Arc<dyn SessionStore>, max_idle: Duration) -> JoinHandle<()> {
    let period = max_idle.clamp(Duration::from_secs(1), Duration::from_secs(60));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let evicted = store.evict_idle(max_idle).await;
            if evicted > 0 {
                let remaining = store.len().await;
                info!(evicted, remaining, "Evicted idle sessions");
            }
        }
    })
}
