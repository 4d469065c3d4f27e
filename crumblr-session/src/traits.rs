//! Session store trait definition.

use crate::error::SessionResult;
use async_trait::async_trait;

/// Session store trait for different storage backends.
///
/// Values are plain strings keyed by `(session_id, key)`. The host web
/// framework owns the session lifecycle; Crumblr only reads, writes, and
/// resets.
///
/// # Atomicity
///
/// Implementations must make [`get_or_insert`](SessionStore::get_or_insert)
/// atomic with respect to other calls for the same session and key. This is
/// the only write Crumblr performs concurrently, and it is what keeps two
/// racing requests from producing two different live session secrets.
///
/// # Examples
///
/// ```ignore
/// use crumblr_session::{SessionStore, SessionResult};
///
/// async fn example(store: &impl SessionStore) -> SessionResult<()> {
///     store.set("sid", "user_id", "123".to_string()).await?;
///     let value = store.get("sid", "user_id").await?;
///     assert_eq!(value.as_deref(), Some("123"));
///     store.reset("sid").await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Get a session value by key.
    ///
    /// Returns `Ok(None)` when either the session or the key is unknown.
    async fn get(&self, session_id: &str, key: &str) -> SessionResult<Option<String>>;

    /// Set a session value by key, creating the session if needed.
    async fn set(&self, session_id: &str, key: &str, value: String) -> SessionResult<()>;

    /// Store `value` under `key` only if nothing is stored there yet.
    ///
    /// Returns whichever value is live after the call: the existing one if
    /// another writer got there first, otherwise `value`.
    async fn get_or_insert(
        &self,
        session_id: &str,
        key: &str,
        value: String,
    ) -> SessionResult<String>;

    /// Remove a session value by key, returning the previous value.
    async fn remove(&self, session_id: &str, key: &str) -> SessionResult<Option<String>>;

    /// Discard every value held by the session.
    async fn reset(&self, session_id: &str) -> SessionResult<()>;

    /// Check if a key exists in the session.
    async fn contains(&self, session_id: &str, key: &str) -> SessionResult<bool> {
        Ok(self.get(session_id, key).await?.is_some())
    }
}

/// Generate a new unique session ID.
pub fn generate_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }
}
