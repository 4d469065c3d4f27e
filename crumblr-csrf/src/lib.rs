//! # Crumblr Request Forgery Protection
//!
//! Stateless, timestamp-bound crumbs for protecting state-changing requests.
//!
//! ## Features
//!
//! - **Bound Tokens** - SHA-256 digest over client address, timestamp, session id, scope and a per-session secret
//! - **Freshness Window** - Authentic crumbs expire after a configurable window
//! - **Scopes** - Endpoints sharing a scope accept each other's crumbs
//! - **Two Encodings** - Split `_crumb`/`_timestamp` fields or a single composite `_token`
//! - **Header Fallback** - `X-CSRF-Token` is tried when the form field fails
//! - **Recovery Policy** - Redirect back with a warning, or reset the session and fail
//!
//! ## Quick Start
//!
//! ```rust
//! use crumblr_csrf::{CrumbConfig, CrumbMiddleware, FormRequest, TokenMemo};
//! use crumblr_session::MemorySessionStore;
//! use std::sync::Arc;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let store = Arc::new(MemorySessionStore::new());
//! let crumbs = CrumbMiddleware::new(CrumbConfig::new("OrdersController"), store).unwrap();
//!
//! // Rendering the form
//! let page = FormRequest::get("127.0.0.1").with_session("S1");
//! let memo = TokenMemo::new();
//! let token = crumbs.render_token(&page, &memo).await.unwrap();
//!
//! // Receiving the submission
//! let submit = FormRequest::post("127.0.0.1")
//!     .with_session("S1")
//!     .with_param("_token", token.composite());
//! assert!(crumbs.check(&submit).await.unwrap().is_allowed());
//! # });
//! ```
//!
//! ## Verification
//!
//! ```rust
//! use crumblr_csrf::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let config = Arc::new(CrumbConfig::new("OrdersController").with_window(Duration::from_secs(900)));
//! let verifier = TokenVerifier::new(config);
//! let ctx = VerificationContext::new("127.0.0.1", "S1", "abc123", "OrdersController");
//!
//! let token = verifier.issuer().issue(1_000_000_000, &ctx);
//! let presented = PresentedToken::from_composite(&token.composite());
//!
//! assert_eq!(verifier.check(&presented, &ctx, 1_000_000_500), VerificationOutcome::Valid);
//! assert_eq!(
//!     verifier.check(&presented, &ctx, 1_000_001_000),
//!     VerificationOutcome::ExpiredButAuthentic
//! );
//! ```

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod flash;
pub mod issuer;
pub mod middleware;
pub mod recovery;
pub mod request;
pub mod secret;
pub mod token;
pub mod verifier;
pub mod view;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{CrumbConfig, CrumbSettings, TokenFormat};
pub use context::VerificationContext;
pub use error::{CrumbError, Result};
pub use flash::{FlashSink, SessionFlash};
pub use issuer::{TokenIssuer, TokenMemo};
pub use middleware::{CrumbMiddleware, Disposition, RequestFilter};
pub use recovery::{RecoveryAction, RecoveryPolicy};
pub use request::{FormRequest, RequestAccessor};
pub use secret::{SessionSecrets, generate_secret};
pub use token::{IssuedToken, PresentedToken, TokenSource};
pub use verifier::{TokenVerifier, Verification, VerificationOutcome};
