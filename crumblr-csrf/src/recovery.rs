//! What happens to a request whose crumb didn't check out.

use crate::config::CrumbConfig;
use crate::verifier::VerificationOutcome;

/// Action chosen for a verification outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Let the request through
    Proceed,
    /// Send the client back to the page it came from with a warning
    Redirect {
        /// Referring page
        location: String,
        /// User-facing flash message
        warning: String,
    },
    /// Reset the session and fail the request with a routing-class error
    ResetAndFail {
        /// Response body
        message: String,
    },
}

impl RecoveryAction {
    pub fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed)
    }

    pub fn resets_session(&self) -> bool {
        matches!(self, Self::ResetAndFail { .. })
    }
}

/// Maps outcomes to recovery actions.
///
/// Failures that come with a referrer are redirected back there; the page
/// re-renders with a fresh crumb. Failures without one, and missing crumbs
/// in any case, reset the session and fail hard.
#[derive(Debug, Clone)]
pub struct RecoveryPolicy {
    timed_out_message: String,
    invalid_message: String,
    rejection_message: String,
}

impl RecoveryPolicy {
    pub fn new(config: &CrumbConfig) -> Self {
        Self {
            timed_out_message: config.timed_out_message.clone(),
            invalid_message: config.invalid_message.clone(),
            rejection_message: config.rejection_message.clone(),
        }
    }

    /// Choose the action for `outcome`.
    ///
    /// ```
    /// use crumblr_csrf::{CrumbConfig, RecoveryAction, RecoveryPolicy, VerificationOutcome};
    ///
    /// let policy = RecoveryPolicy::new(&CrumbConfig::default());
    ///
    /// assert_eq!(policy.recover(VerificationOutcome::Valid, None), RecoveryAction::Proceed);
    /// assert!(policy
    ///     .recover(VerificationOutcome::Missing, Some("http://app.test/form"))
    ///     .resets_session());
    /// ```
    pub fn recover(&self, outcome: VerificationOutcome, referer: Option<&str>) -> RecoveryAction {
        let warning = match outcome {
            VerificationOutcome::Valid => return RecoveryAction::Proceed,
            VerificationOutcome::Missing => return self.reset_and_fail(),
            VerificationOutcome::ExpiredButAuthentic => &self.timed_out_message,
            VerificationOutcome::TamperedOrMismatched => &self.invalid_message,
        };

        match referer.filter(|r| !r.is_empty()) {
            Some(location) => RecoveryAction::Redirect {
                location: location.to_string(),
                warning: warning.clone(),
            },
            None => self.reset_and_fail(),
        }
    }

    fn reset_and_fail(&self) -> RecoveryAction {
        RecoveryAction::ResetAndFail {
            message: self.rejection_message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_INVALID_MESSAGE, DEFAULT_TIMED_OUT_MESSAGE};

    const REFERER: &str = "http://app.test/orders/new";

    fn policy() -> RecoveryPolicy {
        RecoveryPolicy::new(&CrumbConfig::new("Orders"))
    }

    #[test]
    fn test_valid_proceeds() {
        assert!(policy().recover(VerificationOutcome::Valid, Some(REFERER)).is_proceed());
        assert!(policy().recover(VerificationOutcome::Valid, None).is_proceed());
    }

    #[test]
    fn test_expired_redirects_with_timed_out_message() {
        assert_eq!(
            policy().recover(VerificationOutcome::ExpiredButAuthentic, Some(REFERER)),
            RecoveryAction::Redirect {
                location: REFERER.to_string(),
                warning: DEFAULT_TIMED_OUT_MESSAGE.to_string(),
            }
        );
    }

    #[test]
    fn test_tampered_redirects_with_invalid_message() {
        assert_eq!(
            policy().recover(VerificationOutcome::TamperedOrMismatched, Some(REFERER)),
            RecoveryAction::Redirect {
                location: REFERER.to_string(),
                warning: DEFAULT_INVALID_MESSAGE.to_string(),
            }
        );
    }

    #[test]
    fn test_no_referer_resets() {
        for outcome in [
            VerificationOutcome::ExpiredButAuthentic,
            VerificationOutcome::TamperedOrMismatched,
            VerificationOutcome::Missing,
        ] {
            assert_eq!(
                policy().recover(outcome, None),
                RecoveryAction::ResetAndFail {
                    message: "Invalid crumb".to_string()
                }
            );
            assert!(policy().recover(outcome, Some("")).resets_session());
        }
    }

    #[test]
    fn test_missing_ignores_referer() {
        assert!(policy()
            .recover(VerificationOutcome::Missing, Some(REFERER))
            .resets_session());
    }

    #[test]
    fn test_custom_messages() {
        let config = CrumbConfig::new("Orders")
            .with_timed_out_message("Slow poke!")
            .with_rejection_message("Not found");
        let policy = RecoveryPolicy::new(&config);

        assert_eq!(
            policy.recover(VerificationOutcome::ExpiredButAuthentic, Some(REFERER)),
            RecoveryAction::Redirect {
                location: REFERER.to_string(),
                warning: "Slow poke!".to_string(),
            }
        );
        assert_eq!(
            policy.recover(VerificationOutcome::Missing, None),
            RecoveryAction::ResetAndFail {
                message: "Not found".to_string()
            }
        );
    }
}
