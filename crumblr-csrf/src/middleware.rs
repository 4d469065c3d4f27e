use crate::clock::{Clock, SystemClock};
use crate::config::CrumbConfig;
use crate::context::VerificationContext;
use crate::error::{CrumbError, Result};
use crate::flash::{FlashSink, SessionFlash};
use crate::issuer::{TokenIssuer, TokenMemo};
use crate::recovery::{RecoveryAction, RecoveryPolicy};
use crate::request::RequestAccessor;
use crate::secret::SessionSecrets;
use crate::token::IssuedToken;
use crate::verifier::{TokenVerifier, Verification};
use crate::view;
use async_trait::async_trait;
use crumblr_session::SessionStore;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Status used when a request is failed outright.
pub const REJECTION_STATUS: u16 = 404;

/// What the host should do with a request after the crumb check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Hand the request to its handler
    Proceed,
    /// Redirect to `location`; a warning has been flashed
    Redirect { location: String },
    /// Fail with a routing-class error; the session has been reset
    Reject { status: u16, message: String },
}

impl Disposition {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Proceed)
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Redirect { location } => Some(location.as_str()),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Proceed => None,
            Self::Redirect { .. } => Some(302),
            Self::Reject { status, .. } => Some(*status),
        }
    }
}

/// A step the host runs before handing a request to its handler.
#[async_trait]
pub trait RequestFilter: Send + Sync {
    async fn filter(&self, request: &(dyn RequestAccessor + Sync)) -> Result<Disposition>;
}

/// Crumb protection for one scope of endpoints.
///
/// Construct once at startup per scope and share it; register it with the
/// host as a [`RequestFilter`] and use it from views to render crumbs.
#[derive(Clone)]
pub struct CrumbMiddleware {
    config: Arc<CrumbConfig>,
    verifier: TokenVerifier,
    policy: RecoveryPolicy,
    secrets: SessionSecrets,
    store: Arc<dyn SessionStore>,
    flash: Arc<dyn FlashSink>,
    clock: Arc<dyn Clock>,
}

impl CrumbMiddleware {
    /// Create new crumb middleware
    ///
    /// Warnings are flashed into `store` unless another sink is set with
    /// [`with_flash`](Self::with_flash).
    pub fn new(config: CrumbConfig, store: Arc<dyn SessionStore>) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);

        debug!(
            scope = %config.scope,
            window_secs = config.window_secs(),
            format = ?config.format,
            "Creating crumb middleware"
        );

        Ok(Self {
            verifier: TokenVerifier::new(config.clone()),
            policy: RecoveryPolicy::new(&config),
            secrets: SessionSecrets::new(store.clone(), &config.secret_key, config.secret_length),
            flash: Arc::new(SessionFlash::new(store.clone())),
            store,
            clock: Arc::new(SystemClock),
            config,
        })
    }

    /// Use a different flash sink
    pub fn with_flash(mut self, flash: Arc<dyn FlashSink>) -> Self {
        self.flash = flash;
        self
    }

    /// Use a different clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &CrumbConfig {
        &self.config
    }

    pub fn issuer(&self) -> &TokenIssuer {
        self.verifier.issuer()
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Assemble the verification context for `request`, creating the
    /// session secret on first use.
    pub async fn context_for<R>(&self, request: &R) -> Result<VerificationContext>
    where
        R: RequestAccessor + ?Sized,
    {
        let session_id = request
            .session_id()
            .filter(|sid| !sid.is_empty())
            .ok_or_else(|| {
                CrumbError::SessionSecretUnavailable("request has no session".to_string())
            })?;

        let secret = self.secrets.ensure(session_id).await?;
        trace!(session_id = %session_id, scope = %self.config.scope, "Resolved crumb context");

        Ok(VerificationContext::new(
            request.remote_address(),
            session_id,
            secret,
            self.config.scope.as_str(),
        ))
    }

    /// Digest for `timestamp` in the context of `request`.
    pub async fn issue<R>(&self, timestamp: u64, request: &R) -> Result<String>
    where
        R: RequestAccessor + ?Sized,
    {
        let ctx = self.context_for(request).await?;
        Ok(self.issuer().digest(timestamp, &ctx))
    }

    /// The crumb for the current request, stamped now.
    ///
    /// Every call sharing `memo` returns the same crumb.
    pub async fn render_token<R>(&self, request: &R, memo: &TokenMemo) -> Result<IssuedToken>
    where
        R: RequestAccessor + ?Sized,
    {
        if let Some(token) = memo.get() {
            return Ok(token.clone());
        }

        let ctx = self.context_for(request).await?;
        let now = self.clock.now();
        let token = memo.get_or_issue(|| self.issuer().issue(now, &ctx));
        debug!(scope = %ctx.scope, stamped_at = token.timestamp, "Issued crumb");
        Ok(token.clone())
    }

    /// Hidden form inputs carrying the current request's crumb.
    pub async fn hidden_fields<R>(&self, request: &R, memo: &TokenMemo) -> Result<String>
    where
        R: RequestAccessor + ?Sized,
    {
        let token = self.render_token(request, memo).await?;
        Ok(view::hidden_fields(&token, &self.config))
    }

    /// Verify `request` without acting on the outcome.
    pub async fn verify<R>(&self, request: &R) -> Result<Verification>
    where
        R: RequestAccessor + ?Sized,
    {
        if !self.verifier.needs_verification(request.method()) {
            return Ok(Verification::passed());
        }

        let ctx = self.context_for(request).await?;
        Ok(self.verifier.verify(request, &ctx, self.clock.now()))
    }

    /// Verify `request` and carry out the recovery its outcome calls for.
    pub async fn check<R>(&self, request: &R) -> Result<Disposition>
    where
        R: RequestAccessor + ?Sized,
    {
        if !self.verifier.needs_verification(request.method()) {
            trace!(method = %request.method(), "Crumb check skipped");
            return Ok(Disposition::Proceed);
        }

        let ctx = match self.context_for(request).await {
            Ok(ctx) => ctx,
            Err(CrumbError::SessionSecretUnavailable(reason)) => {
                warn!(
                    remote_ip = %request.remote_address(),
                    scope = %self.config.scope,
                    reason = %reason,
                    "Crumb check without session secret"
                );
                return Ok(self.reject());
            }
            Err(e) => return Err(e),
        };

        let verification = self.verifier.verify(request, &ctx, self.clock.now());
        if verification.is_valid() {
            trace!(session_id = %ctx.session_id, source = ?verification.source, "Crumb accepted");
            return Ok(Disposition::Proceed);
        }

        self.log_failure(&verification, &ctx);
        let action = self.policy.recover(verification.outcome, request.referer());
        self.apply(action, &ctx.session_id).await
    }

    async fn apply(&self, action: RecoveryAction, session_id: &str) -> Result<Disposition> {
        match action {
            RecoveryAction::Proceed => Ok(Disposition::Proceed),
            RecoveryAction::Redirect { location, warning } => {
                self.flash.set_warning(session_id, &warning).await?;
                debug!(location = %location, "Redirecting after crumb failure");
                Ok(Disposition::Redirect { location })
            }
            RecoveryAction::ResetAndFail { message } => {
                self.store.reset(session_id).await?;
                debug!(session_id = %session_id, "Session reset after crumb failure");
                Ok(Disposition::Reject {
                    status: REJECTION_STATUS,
                    message,
                })
            }
        }
    }

    fn reject(&self) -> Disposition {
        Disposition::Reject {
            status: REJECTION_STATUS,
            message: self.config.rejection_message.clone(),
        }
    }

    fn log_failure(&self, verification: &Verification, ctx: &VerificationContext) {
        let label = self
            .verifier
            .failure_label(verification)
            .unwrap_or_default();
        let (token, stamp, expected) = match &verification.presented {
            Some(presented) => (
                format!("{}{}", presented.stamp, presented.digest),
                presented.stamp.clone(),
                presented
                    .timestamp()
                    .map(|ts| self.issuer().digest(ts, ctx))
                    .unwrap_or_default(),
            ),
            None => Default::default(),
        };

        warn!(
            outcome = %verification.outcome,
            source = ?verification.source,
            token = %token,
            timestamp = %stamp,
            remote_ip = %ctx.remote_address,
            session_id = %ctx.session_id,
            scope = %ctx.scope,
            hexdigest = %expected,
            "{}",
            label
        );
    }
}

#[async_trait]
impl RequestFilter for CrumbMiddleware {
    async fn filter(&self, request: &(dyn RequestAccessor + Sync)) -> Result<Disposition> {
        self.check(request).await
    }
}
