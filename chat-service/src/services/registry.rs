//! Per-visitor model sessions keyed by session identity.

use super::providers::ChatProvider;
use super::session::ModelSession;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// A live session. The async mutex serialises sends within one session.
pub struct SessionHandle {
    session: tokio::sync::Mutex<ModelSession>,
    last_seen: Mutex<Instant>,
}

impl SessionHandle {
    fn new(session: ModelSession) -> Self {
        Self {
            session: tokio::sync::Mutex::new(session),
            last_seen: Mutex::new(Instant::now()),
        }
    }

    pub fn session(&self) -> &tokio::sync::Mutex<ModelSession> {
        &self.session
    }

    /// Mark the session as just used.
    pub fn touch(&self) {
        if let Ok(mut last_seen) = self.last_seen.lock() {
            *last_seen = Instant::now();
        }
    }

    fn idle_for(&self) -> Duration {
        self.last_seen
            .lock()
            .map(|last_seen| last_seen.elapsed())
            .unwrap_or_default()
    }
}

pub struct SessionRegistry {
    sessions: DashMap<String, Arc<SessionHandle>>,
    provider: Arc<dyn ChatProvider>,
    idle_ttl: Duration,
}

impl SessionRegistry {
    pub fn new(provider: Arc<dyn ChatProvider>, idle_ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            provider,
            idle_ttl,
        }
    }

    /// Session for `session_id`, created on first contact.
    pub fn get_or_create(&self, session_id: &str) -> Arc<SessionHandle> {
        let handle = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::info!(session_id = %session_id, "Starting model session");
                Arc::new(SessionHandle::new(ModelSession::new(self.provider.clone())))
            })
            .value()
            .clone();
        handle.touch();
        handle
    }

    /// Existing session for `session_id`, without creating one.
    pub fn get(&self, session_id: &str) -> Option<Arc<SessionHandle>> {
        let handle = self.sessions.get(session_id).map(|entry| entry.value().clone())?;
        handle.touch();
        Some(handle)
    }

    /// Drop a session explicitly. Returns whether it existed.
    pub fn end(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// Remove sessions idle longer than the TTL and return their ids.
    /// A session with a send in flight holds its lock and is never idle.
    pub fn evict_idle(&self) -> Vec<String> {
        let mut evicted = Vec::new();
        self.sessions.retain(|session_id, handle| {
            let busy = handle.session.try_lock().is_err();
            let keep = busy || handle.idle_for() <= self.idle_ttl;
            if !keep {
                evicted.push(session_id.clone());
            }
            keep
        });

        if !evicted.is_empty() {
            tracing::info!(count = evicted.len(), "Evicted idle model sessions");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
