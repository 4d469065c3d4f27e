use crate::config::CrumbConfig;
use crate::context::VerificationContext;
use crate::token::{IssuedToken, format_stamp};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// Computes crumb digests.
///
/// The digest covers, in this order: remote address, fixed-width timestamp,
/// session id, scope (unless disabled), session secret. Issuance and
/// verification must agree on the order, so it is not configurable.
#[derive(Debug, Clone, Copy)]
pub struct TokenIssuer {
    include_scope: bool,
}

impl TokenIssuer {
    pub fn new(config: &CrumbConfig) -> Self {
        Self {
            include_scope: config.include_scope,
        }
    }

    /// An issuer that leaves the scope out of the digest.
    pub fn unscoped() -> Self {
        Self {
            include_scope: false,
        }
    }

    /// Lowercase hex SHA-256 digest binding `timestamp` to `ctx`.
    ///
    /// # Examples
    ///
    /// ```
    /// use crumblr_csrf::{CrumbConfig, TokenIssuer, VerificationContext};
    ///
    /// let issuer = TokenIssuer::new(&CrumbConfig::new("OrdersController"));
    /// let ctx = VerificationContext::new("127.0.0.1", "S1", "abc123", "OrdersController");
    ///
    /// let digest = issuer.digest(1_000_000_000, &ctx);
    /// assert_eq!(digest.len(), 64);
    /// assert_eq!(digest, issuer.digest(1_000_000_000, &ctx));
    /// ```
    pub fn digest(&self, timestamp: u64, ctx: &VerificationContext) -> String {
        let mut hasher = Sha256::new();
        hasher.update(ctx.remote_address.as_bytes());
        hasher.update(format_stamp(timestamp).as_bytes());
        hasher.update(ctx.session_id.as_bytes());
        if self.include_scope {
            hasher.update(ctx.scope.as_bytes());
        }
        hasher.update(ctx.session_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Issue a crumb for `timestamp`.
    pub fn issue(&self, timestamp: u64, ctx: &VerificationContext) -> IssuedToken {
        IssuedToken::new(timestamp, self.digest(timestamp, ctx))
    }
}

/// Holds the crumb rendered for one request.
///
/// Create one per request. The first render fixes the timestamp; later
/// renders in the same request return the same crumb, so a page embedding it
/// twice stays consistent.
#[derive(Debug, Default)]
pub struct TokenMemo {
    slot: OnceLock<IssuedToken>,
}

impl TokenMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// The memoized crumb, issuing it with `issue` on first use.
    pub fn get_or_issue(&self, issue: impl FnOnce() -> IssuedToken) -> &IssuedToken {
        self.slot.get_or_init(issue)
    }

    /// The memoized crumb, if one was rendered.
    pub fn get(&self) -> Option<&IssuedToken> {
        self.slot.get()
    }
}

/// Constant-time string comparison
pub(crate) fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.bytes().zip(b.bytes()) {
        result |= byte_a ^ byte_b;
    }

    result == 0
}
