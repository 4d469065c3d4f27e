use std::fmt;

/// Everything a crumb digest is bound to.
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationContext {
    /// Client address as seen by the host
    pub remote_address: String,

    /// Session identifier
    pub session_id: String,

    /// Per-session random secret
    pub session_secret: String,

    /// Protection scope
    pub scope: String,
}

impl VerificationContext {
    pub fn new(
        remote_address: impl Into<String>,
        session_id: impl Into<String>,
        session_secret: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            remote_address: remote_address.into(),
            session_id: session_id.into(),
            session_secret: session_secret.into(),
            scope: scope.into(),
        }
    }

    pub fn with_remote_address(mut self, remote_address: impl Into<String>) -> Self {
        self.remote_address = remote_address.into();
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_session_secret(mut self, session_secret: impl Into<String>) -> Self {
        self.session_secret = session_secret.into();
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }
}

// The secret must never end up in logs.
impl fmt::Debug for VerificationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationContext")
            .field("remote_address", &self.remote_address)
            .field("session_id", &self.session_id)
            .field("session_secret", &"[redacted]")
            .field("scope", &self.scope)
            .finish()
    }
}
