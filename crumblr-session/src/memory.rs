//! In-memory session store
//!
//! Uses DashMap for thread-safe concurrent access. Suitable for single-instance
//! deployments or testing. Each session lives in one map shard, so the entry
//! API gives `get_or_insert` its create-only-if-absent guarantee.

use crate::error::{SessionError, SessionResult};
use crate::traits::SessionStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use tracing::{debug, trace};

/// In-memory session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, HashMap<String, String>>,
}

impl MemorySessionStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        debug!("Creating new in-memory session store");
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Get the number of live sessions (for monitoring)
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn check_id(session_id: &str) -> SessionResult<()> {
        if session_id.is_empty() {
            return Err(SessionError::InvalidSessionId(
                "session id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session_id: &str, key: &str) -> SessionResult<Option<String>> {
        Self::check_id(session_id)?;
        trace!(session_id = %session_id, key = %key, "Session get");
        Ok(self
            .sessions
            .get(session_id)
            .and_then(|data| data.get(key).cloned()))
    }

    async fn set(&self, session_id: &str, key: &str, value: String) -> SessionResult<()> {
        Self::check_id(session_id)?;
        trace!(session_id = %session_id, key = %key, "Session set");
        self.sessions
            .entry(session_id.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn get_or_insert(
        &self,
        session_id: &str,
        key: &str,
        value: String,
    ) -> SessionResult<String> {
        Self::check_id(session_id)?;
        let mut data = self.sessions.entry(session_id.to_string()).or_default();
        let live = data.entry(key.to_string()).or_insert(value).clone();
        trace!(session_id = %session_id, key = %key, "Session get_or_insert");
        Ok(live)
    }

    async fn remove(&self, session_id: &str, key: &str) -> SessionResult<Option<String>> {
        Self::check_id(session_id)?;
        Ok(self
            .sessions
            .get_mut(session_id)
            .and_then(|mut data| data.remove(key)))
    }

    async fn reset(&self, session_id: &str) -> SessionResult<()> {
        Self::check_id(session_id)?;
        debug!(session_id = %session_id, "Resetting session");
        self.sessions.remove(session_id);
        Ok(())
    }
}
