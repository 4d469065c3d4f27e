//! Lazily created per-session secrets.

use crate::error::Result;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use crumblr_session::SessionStore;
use rand::RngCore;
use std::sync::Arc;
use tracing::debug;

/// Generate a random secret of `length` bytes, URL-safe base64 encoded.
pub fn generate_secret(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Reads and materializes the secret stored in each session.
#[derive(Clone)]
pub struct SessionSecrets {
    store: Arc<dyn SessionStore>,
    key: String,
    length: usize,
}

impl SessionSecrets {
    pub fn new(store: Arc<dyn SessionStore>, key: impl Into<String>, length: usize) -> Self {
        Self {
            store,
            key: key.into(),
            length,
        }
    }

    /// The session's secret, creating and persisting one if it has none yet.
    ///
    /// Concurrent first calls for one session all return the same value.
    pub async fn ensure(&self, session_id: &str) -> Result<String> {
        if let Some(secret) = self.store.get(session_id, &self.key).await? {
            return Ok(secret);
        }

        let candidate = generate_secret(self.length);
        let live = self
            .store
            .get_or_insert(session_id, &self.key, candidate)
            .await?;
        debug!(session_id = %session_id, key = %self.key, "Materialized session secret");
        Ok(live)
    }

    /// The session's secret if one exists.
    pub async fn peek(&self, session_id: &str) -> Result<Option<String>> {
        Ok(self.store.get(session_id, &self.key).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crumblr_session::MemorySessionStore;

    #[test]
    fn test_generated_secret_length() {
        // 32 bytes -> 43 base64 characters without padding
        assert_eq!(generate_secret(32).len(), 43);
        assert_eq!(generate_secret(6).len(), 8);
        assert_ne!(generate_secret(32), generate_secret(32));
    }

    #[tokio::test]
    async fn test_secret_created_once() {
        let store = Arc::new(MemorySessionStore::new());
        let secrets = SessionSecrets::new(store.clone(), "_csrf_token", 32);

        assert_eq!(secrets.peek("S1").await.unwrap(), None);
        let first = secrets.ensure("S1").await.unwrap();
        let second = secrets.ensure("S1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(secrets.peek("S1").await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_existing_secret_kept() {
        let store = Arc::new(MemorySessionStore::new());
        store
            .set("S1", "_csrf_token", "abc123".to_string())
            .await
            .unwrap();
        let secrets = SessionSecrets::new(store, "_csrf_token", 32);

        assert_eq!(secrets.ensure("S1").await.unwrap(), "abc123");
    }

    #[tokio::test]
    async fn test_reset_yields_new_secret() {
        let store = Arc::new(MemorySessionStore::new());
        let secrets = SessionSecrets::new(store.clone(), "_csrf_token", 32);

        let before = secrets.ensure("S1").await.unwrap();
        store.reset("S1").await.unwrap();
        let after = secrets.ensure("S1").await.unwrap();

        assert_ne!(before, after);
    }
}
