//! User-facing warnings carried to the next page.

use crate::error::Result;
use async_trait::async_trait;
use crumblr_session::SessionStore;
use std::sync::Arc;

/// Where recovery leaves its user-facing warning.
#[async_trait]
pub trait FlashSink: Send + Sync {
    async fn set_warning(&self, session_id: &str, message: &str) -> Result<()>;
}

/// Flash warnings kept in the session store.
#[derive(Clone)]
pub struct SessionFlash {
    store: Arc<dyn SessionStore>,
    key: String,
}

impl SessionFlash {
    pub const DEFAULT_KEY: &'static str = "_flash_warning";

    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            key: Self::DEFAULT_KEY.to_string(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Read and clear the pending warning.
    pub async fn take_warning(&self, session_id: &str) -> Result<Option<String>> {
        Ok(self.store.remove(session_id, &self.key).await?)
    }
}

#[async_trait]
impl FlashSink for SessionFlash {
    async fn set_warning(&self, session_id: &str, message: &str) -> Result<()> {
        self.store
            .set(session_id, &self.key, message.to_string())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crumblr_session::MemorySessionStore;

    #[tokio::test]
    async fn test_warning_is_taken_once() {
        let flash = SessionFlash::new(Arc::new(MemorySessionStore::new()));

        flash.set_warning("S1", "Slow poke!").await.unwrap();
        assert_eq!(flash.take_warning("S1").await.unwrap().as_deref(), Some("Slow poke!"));
        assert_eq!(flash.take_warning("S1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_custom_key() {
        let store = Arc::new(MemorySessionStore::new());
        let flash = SessionFlash::new(store.clone()).with_key("flash.warning");

        flash.set_warning("S1", "hi").await.unwrap();
        assert_eq!(
            store.get("S1", "flash.warning").await.unwrap().as_deref(),
            Some("hi")
        );
    }
}
