use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::storage::types::interview_session::InterviewSession;

/// Process-wide map of session id to interview state.
///
/// Each session sits behind its own mutex: two answers racing on the same id
/// serialize on that lock, while sessions with distinct ids proceed fully in
/// parallel. Completed sessions are evicted lazily once they outlive the TTL;
/// the source system never evicted at all, which leaked sessions for the
/// process lifetime.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<InterviewSession>>>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn insert(&self, session: InterviewSession) -> Arc<Mutex<InterviewSession>> {
        let id = session.id.clone();
        let handle = Arc::new(Mutex::new(session));
        let mut sessions = self.sessions.write().await;
        Self::prune_expired(&mut sessions, self.ttl);
        sessions.insert(id, Arc::clone(&handle));
        handle
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Mutex<InterviewSession>>> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Removes completed sessions older than the TTL. Sessions whose lock is
    /// held are in use and skipped.
    fn prune_expired(
        sessions: &mut HashMap<String, Arc<Mutex<InterviewSession>>>,
        ttl: Duration,
    ) {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::hours(1));
        let now = Utc::now();
        sessions.retain(|id, handle| {
            let Ok(session) = handle.try_lock() else {
                return true;
            };
            let expired = session.is_complete() && session.updated_at + ttl < now;
            if expired {
                debug!(session_id = %id, "evicting expired interview session");
            }
            !expired
        });
    }
}
