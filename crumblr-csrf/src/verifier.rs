use crate::config::{CrumbConfig, TokenFormat};
use crate::context::VerificationContext;
use crate::error::CrumbError;
use crate::issuer::{TokenIssuer, constant_time_eq};
use crate::request::RequestAccessor;
use crate::token::{PresentedToken, TokenSource};
use std::fmt;
use std::sync::Arc;

/// Result of checking one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Authentic and fresh, or not subject to checking
    Valid,
    /// Authentic but issued longer than the window ago
    ExpiredButAuthentic,
    /// Digest doesn't match the request's context
    TamperedOrMismatched,
    /// No crumb at all
    Missing,
}

impl VerificationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationOutcome::Valid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationOutcome::Valid => "valid",
            VerificationOutcome::ExpiredButAuthentic => "expired",
            VerificationOutcome::TamperedOrMismatched => "tampered",
            VerificationOutcome::Missing => "missing",
        }
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome plus what it was decided on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub outcome: VerificationOutcome,

    /// Carrier of the crumb the outcome was decided on
    pub source: Option<TokenSource>,

    /// That crumb, as received
    pub presented: Option<PresentedToken>,
}

impl Verification {
    /// A request that was never subject to checking.
    pub fn passed() -> Self {
        Self {
            outcome: VerificationOutcome::Valid,
            source: None,
            presented: None,
        }
    }

    fn missing() -> Self {
        Self {
            outcome: VerificationOutcome::Missing,
            source: None,
            presented: None,
        }
    }

    fn decided(outcome: VerificationOutcome, source: TokenSource, token: PresentedToken) -> Self {
        Self {
            outcome,
            source: Some(source),
            presented: Some(token),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.outcome.is_valid()
    }
}

/// Decides whether a request carries an acceptable crumb.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    config: Arc<CrumbConfig>,
    issuer: TokenIssuer,
}

impl TokenVerifier {
    pub fn new(config: Arc<CrumbConfig>) -> Self {
        let issuer = TokenIssuer::new(&config);
        Self { config, issuer }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Whether a request with `method` has to carry a crumb.
    pub fn needs_verification(&self, method: &str) -> bool {
        self.config.enabled && !self.config.is_safe_method(method)
    }

    /// Whether a crumb stamped at `stamped_at` is still fresh at `now`.
    pub fn within_window(&self, stamped_at: u64, now: u64) -> bool {
        stamped_at.saturating_add(self.config.window_secs()) > now
    }

    /// Check a single presented crumb against `ctx`.
    ///
    /// A bad digest is reported as tampering whatever its timestamp says; the
    /// window only matters once the digest matched.
    pub fn check(
        &self,
        token: &PresentedToken,
        ctx: &VerificationContext,
        now: u64,
    ) -> VerificationOutcome {
        let Some(stamped_at) = token.timestamp() else {
            return VerificationOutcome::TamperedOrMismatched;
        };

        let expected = self.issuer.digest(stamped_at, ctx);
        if !constant_time_eq(&token.digest, &expected) {
            return VerificationOutcome::TamperedOrMismatched;
        }

        if self.within_window(stamped_at, now) {
            VerificationOutcome::Valid
        } else {
            VerificationOutcome::ExpiredButAuthentic
        }
    }

    /// Verify a request.
    ///
    /// Safe methods pass untouched. Otherwise the parameter crumb is checked
    /// first; when it is absent or its digest doesn't match, the header crumb
    /// gets a chance. An authentic but stale parameter crumb is final.
    pub fn verify<R>(&self, request: &R, ctx: &VerificationContext, now: u64) -> Verification
    where
        R: RequestAccessor + ?Sized,
    {
        if !self.needs_verification(request.method()) {
            return Verification::passed();
        }

        let primary = self.parameter_token(request);
        if let Some(token) = &primary {
            let outcome = self.check(token, ctx, now);
            if outcome != VerificationOutcome::TamperedOrMismatched {
                return Verification::decided(outcome, TokenSource::Parameter, token.clone());
            }
        }

        match (self.header_token(request), primary) {
            (Some(token), _) => {
                let outcome = self.check(&token, ctx, now);
                Verification::decided(outcome, TokenSource::Header, token)
            }
            (None, Some(token)) => Verification::decided(
                VerificationOutcome::TamperedOrMismatched,
                TokenSource::Parameter,
                token,
            ),
            (None, None) => Verification::missing(),
        }
    }

    /// The taxonomy error for a failed verification.
    pub fn error_for(&self, verification: &Verification) -> Option<CrumbError> {
        match verification.outcome {
            VerificationOutcome::Valid => None,
            VerificationOutcome::Missing => Some(CrumbError::MissingFields(self.expected_fields())),
            VerificationOutcome::TamperedOrMismatched => Some(CrumbError::DigestMismatch),
            VerificationOutcome::ExpiredButAuthentic => Some(CrumbError::TimestampExpired {
                stamped_at: verification
                    .presented
                    .as_ref()
                    .and_then(PresentedToken::timestamp)
                    .unwrap_or_default(),
                window_secs: self.config.window_secs(),
            }),
        }
    }

    /// Short label naming what failed, for the log.
    pub fn failure_label(&self, verification: &Verification) -> Option<String> {
        let label = match (verification.outcome, verification.source) {
            (VerificationOutcome::Valid, _) => return None,
            (VerificationOutcome::Missing, _) => format!("Missing {}", self.expected_fields()),
            (VerificationOutcome::ExpiredButAuthentic, _) => {
                "Authenticity token outside time window".to_string()
            }
            (_, Some(TokenSource::Header)) => format!("Invalid {} header", self.config.header_name),
            (_, _) => format!("Invalid {}", self.primary_field()),
        };
        Some(label)
    }

    fn primary_field(&self) -> &str {
        match self.config.format {
            TokenFormat::Split => &self.config.crumb_field,
            TokenFormat::Composite => &self.config.token_field,
        }
    }

    fn expected_fields(&self) -> String {
        match self.config.format {
            TokenFormat::Split => format!(
                "{} and {}",
                self.config.crumb_field, self.config.timestamp_field
            ),
            TokenFormat::Composite => self.config.token_field.clone(),
        }
    }

    fn parameter_token<R>(&self, request: &R) -> Option<PresentedToken>
    where
        R: RequestAccessor + ?Sized,
    {
        match self.config.format {
            TokenFormat::Split => {
                let digest = non_empty(request.param(&self.config.crumb_field))?;
                let stamp = non_empty(request.param(&self.config.timestamp_field))?;
                Some(PresentedToken::from_parts(digest, stamp))
            }
            TokenFormat::Composite => non_empty(request.param(&self.config.token_field))
                .map(PresentedToken::from_composite),
        }
    }

    fn header_token<R>(&self, request: &R) -> Option<PresentedToken>
    where
        R: RequestAccessor + ?Sized,
    {
        non_empty(request.header(&self.config.header_name)).map(PresentedToken::from_composite)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::FormRequest;
    use crate::token::format_stamp;
    use std::time::Duration;

    const T0: u64 = 1_000_000_000;

    fn ctx() -> VerificationContext {
        VerificationContext::new("127.0.0.1", "S1", "abc123", "OrdersController")
    }

    fn verifier(config: CrumbConfig) -> TokenVerifier {
        TokenVerifier::new(Arc::new(config))
    }

    fn composite() -> TokenVerifier {
        verifier(CrumbConfig::new("OrdersController").with_window(Duration::from_secs(900)))
    }

    fn split() -> TokenVerifier {
        verifier(CrumbConfig::simple("OrdersController"))
    }

    fn flip_last(digest: &str) -> String {
        let mut chars: Vec<char> = digest.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == '0' { '1' } else { '0' };
        chars.into_iter().collect()
    }

    #[test]
    fn test_window_scenario() {
        let v = composite();
        let token = v.issuer().issue(T0, &ctx());
        let presented = PresentedToken::from_composite(&token.composite());

        assert_eq!(v.check(&presented, &ctx(), T0 + 500), VerificationOutcome::Valid);
        assert_eq!(
            v.check(&presented, &ctx(), T0 + 1000),
            VerificationOutcome::ExpiredButAuthentic
        );
    }

    #[test]
    fn test_eleven_digit_timestamp_verifies() {
        let v = composite();
        let issued_at = 10_000_000_000;
        let token = v.issuer().issue(issued_at, &ctx()).composite();
        let req = FormRequest::post("127.0.0.1").with_param("_token", token);

        assert_eq!(
            v.verify(&req, &ctx(), issued_at + 1).outcome,
            VerificationOutcome::Valid
        );
    }

    #[test]
    fn test_window_boundary_is_exclusive() {
        let v = composite();
        assert!(v.within_window(T0, T0 + 899));
        assert!(!v.within_window(T0, T0 + 900));
        assert!(v.within_window(u64::MAX, u64::MAX - 1));
    }

    #[test]
    fn test_altered_digest_is_tamper_even_when_fresh() {
        let v = composite();
        let token = v.issuer().issue(T0, &ctx());
        let forged = PresentedToken::from_parts(flip_last(&token.digest), token.stamp());

        assert_eq!(
            v.check(&forged, &ctx(), T0 + 1),
            VerificationOutcome::TamperedOrMismatched
        );
        assert_eq!(
            v.check(&forged, &ctx(), T0 + 100_000),
            VerificationOutcome::TamperedOrMismatched
        );
    }

    #[test]
    fn test_context_change_is_tamper() {
        let v = composite();
        let token = PresentedToken::from_composite(&v.issuer().issue(T0, &ctx()).composite());

        for changed in [
            ctx().with_remote_address("10.0.0.1"),
            ctx().with_session_id("S2"),
            ctx().with_scope("InvoicesController"),
            ctx().with_session_secret("zzz999"),
        ] {
            assert_eq!(
                v.check(&token, &changed, T0 + 1),
                VerificationOutcome::TamperedOrMismatched
            );
        }
    }

    #[test]
    fn test_shifted_timestamp_is_tamper() {
        let v = composite();
        let token = v.issuer().issue(T0, &ctx());
        let replayed = PresentedToken::from_parts(token.digest.clone(), format_stamp(T0 + 3000));

        assert_eq!(
            v.check(&replayed, &ctx(), T0 + 3001),
            VerificationOutcome::TamperedOrMismatched
        );
    }

    #[test]
    fn test_safe_methods_always_pass() {
        let v = composite();
        for method in ["GET", "HEAD", "OPTIONS", "get"] {
            let req = FormRequest::new(method, "127.0.0.1").with_param("_token", "garbage");
            assert_eq!(v.verify(&req, &ctx(), T0), Verification::passed());
        }
    }

    #[test]
    fn test_disabled_protection_passes_unsafe_methods() {
        let v = verifier(CrumbConfig::new("OrdersController").with_enabled(false));
        let req = FormRequest::post("127.0.0.1");
        assert!(v.verify(&req, &ctx(), T0).is_valid());
    }

    #[test]
    fn test_composite_parameter() {
        let v = composite();
        let token = v.issuer().issue(T0, &ctx()).composite();
        let req = FormRequest::post("127.0.0.1").with_param("_token", token);

        let result = v.verify(&req, &ctx(), T0 + 10);
        assert_eq!(result.outcome, VerificationOutcome::Valid);
        assert_eq!(result.source, Some(TokenSource::Parameter));
    }

    #[test]
    fn test_header_fallback_after_bad_parameter() {
        let v = composite();
        let token = v.issuer().issue(T0, &ctx()).composite();
        let req = FormRequest::post("127.0.0.1")
            .with_param("_token", format_stamp(T0))
            .with_header("X-CSRF-Token", token);

        let result = v.verify(&req, &ctx(), T0 + 10);
        assert_eq!(result.outcome, VerificationOutcome::Valid);
        assert_eq!(result.source, Some(TokenSource::Header));
    }

    #[test]
    fn test_header_used_when_parameter_empty() {
        let v = composite();
        let token = v.issuer().issue(T0, &ctx()).composite();
        let req = FormRequest::post("127.0.0.1")
            .with_param("_token", "")
            .with_header("x-csrf-token", token);

        assert!(v.verify(&req, &ctx(), T0 + 10).is_valid());
    }

    #[test]
    fn test_expired_parameter_does_not_consult_header() {
        let v = composite();
        let stale = v.issuer().issue(T0, &ctx()).composite();
        let fresh = v.issuer().issue(T0 + 2000, &ctx()).composite();
        let req = FormRequest::post("127.0.0.1")
            .with_param("_token", stale)
            .with_header("X-CSRF-Token", fresh);

        let result = v.verify(&req, &ctx(), T0 + 2001);
        assert_eq!(result.outcome, VerificationOutcome::ExpiredButAuthentic);
        assert_eq!(result.source, Some(TokenSource::Parameter));
    }

    #[test]
    fn test_bad_parameter_and_bad_header() {
        let v = composite();
        let req = FormRequest::post("127.0.0.1")
            .with_param("_token", format_stamp(T0))
            .with_header("X-CSRF-Token", format_stamp(T0));

        let result = v.verify(&req, &ctx(), T0);
        assert_eq!(result.outcome, VerificationOutcome::TamperedOrMismatched);
        assert_eq!(result.source, Some(TokenSource::Header));
        assert_eq!(
            v.failure_label(&result).as_deref(),
            Some("Invalid X-CSRF-Token header")
        );
    }

    #[test]
    fn test_bad_parameter_without_header() {
        let v = composite();
        let req = FormRequest::post("127.0.0.1").with_param("_token", format_stamp(T0));

        let result = v.verify(&req, &ctx(), T0);
        assert_eq!(result.outcome, VerificationOutcome::TamperedOrMismatched);
        assert_eq!(result.source, Some(TokenSource::Parameter));
        assert_eq!(v.failure_label(&result).as_deref(), Some("Invalid _token"));
        assert!(matches!(v.error_for(&result), Some(CrumbError::DigestMismatch)));
    }

    #[test]
    fn test_nothing_presented_is_missing() {
        let v = composite();
        let result = v.verify(&FormRequest::post("127.0.0.1"), &ctx(), T0);

        assert_eq!(result.outcome, VerificationOutcome::Missing);
        assert_eq!(v.failure_label(&result).as_deref(), Some("Missing _token"));
        assert!(matches!(v.error_for(&result), Some(CrumbError::MissingFields(_))));
    }

    #[test]
    fn test_split_fields() {
        let v = split();
        let token = v.issuer().issue(T0, &ctx());
        let req = FormRequest::post("127.0.0.1")
            .with_param("_crumb", token.digest.clone())
            .with_param("_timestamp", T0.to_string());

        assert!(v.verify(&req, &ctx(), T0 + 899).is_valid());

        let late = v.verify(&req, &ctx(), T0 + 900);
        assert_eq!(late.outcome, VerificationOutcome::ExpiredButAuthentic);
        assert!(matches!(
            v.error_for(&late),
            Some(CrumbError::TimestampExpired { stamped_at: T0, window_secs: 900 })
        ));
    }

    #[test]
    fn test_split_missing_either_field() {
        let v = split();
        let token = v.issuer().issue(T0, &ctx());

        let no_stamp = FormRequest::post("127.0.0.1").with_param("_crumb", token.digest.clone());
        let no_crumb = FormRequest::post("127.0.0.1").with_param("_timestamp", T0.to_string());

        assert_eq!(v.verify(&no_stamp, &ctx(), T0).outcome, VerificationOutcome::Missing);
        assert_eq!(v.verify(&no_crumb, &ctx(), T0).outcome, VerificationOutcome::Missing);
    }

    #[test]
    fn test_split_garbage_timestamp_is_tamper() {
        let v = split();
        let token = v.issuer().issue(T0, &ctx());
        let req = FormRequest::post("127.0.0.1")
            .with_param("_crumb", token.digest)
            .with_param("_timestamp", "yesterday");

        assert_eq!(
            v.verify(&req, &ctx(), T0).outcome,
            VerificationOutcome::TamperedOrMismatched
        );
    }

    #[test]
    fn test_split_accepts_composite_header() {
        let v = split();
        let token = v.issuer().issue(T0, &ctx()).composite();
        let req = FormRequest::new("DELETE", "127.0.0.1").with_header("X-CSRF-Token", token);

        let result = v.verify(&req, &ctx(), T0 + 1);
        assert!(result.is_valid());
        assert_eq!(result.source, Some(TokenSource::Header));
    }
}
