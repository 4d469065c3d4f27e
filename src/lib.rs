// Crumblr - timestamp-bound request forgery protection
//
// This library issues signed crumbs bound to a client, a session and a scope,
// verifies them on state-changing requests, and decides how to recover when
// verification fails.

// Re-export the protocol
pub use crumblr_csrf::*;

// Re-export the session collaborator
pub use crumblr_session;
pub use crumblr_session::{MemorySessionStore, SessionError, SessionStore};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CrumbConfig,
        CrumbError,
        CrumbMiddleware,
        Disposition,
        FlashSink,
        FormRequest,
        IssuedToken,
        MemorySessionStore,
        RequestAccessor,
        RequestFilter,
        SessionStore,
        TokenFormat,
        TokenMemo,
        VerificationOutcome,
    };
}
