//! # Crumblr Session State
//!
//! The session-state collaborator used by Crumblr request forgery protection.
//!
//! Crumblr only needs three things from a session: read a value, write a
//! value, and throw the whole session away. On top of that it needs one atomic
//! primitive, [`SessionStore::get_or_insert`], so that two concurrent requests
//! materializing the per-session secret for the first time converge on a
//! single live value.
//!
//! ## Quick Start
//!
//! ```rust
//! use crumblr_session::{MemorySessionStore, SessionStore, generate_session_id};
//!
//! # tokio_test_block_on(async {
//! let store = MemorySessionStore::new();
//! let sid = generate_session_id();
//!
//! let first = store.get_or_insert(&sid, "_csrf_token", "abc123".to_string()).await.unwrap();
//! let second = store.get_or_insert(&sid, "_csrf_token", "zzz999".to_string()).await.unwrap();
//! assert_eq!(first, second);
//!
//! store.reset(&sid).await.unwrap();
//! assert_eq!(store.get(&sid, "_csrf_token").await.unwrap(), None);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{SessionError, SessionResult};
pub use memory::MemorySessionStore;
pub use traits::{SessionStore, generate_session_id};
