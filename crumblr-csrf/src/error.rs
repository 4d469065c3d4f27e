use crumblr_session::SessionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrumbError {
    #[error("Missing crumb fields: {0}")]
    MissingFields(String),

    #[error("Crumb stamped at {stamped_at} is outside the {window_secs}s window")]
    TimestampExpired { stamped_at: u64, window_secs: u64 },

    #[error("Crumb digest mismatch")]
    DigestMismatch,

    #[error("Session secret unavailable: {0}")]
    SessionSecretUnavailable(String),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Query encoding error: {0}")]
    UrlEncode(#[from] serde_urlencoded::ser::Error),
}

impl CrumbError {
    /// Whether this error belongs to the verification taxonomy, as opposed
    /// to an infrastructure or configuration problem.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            CrumbError::MissingFields(_)
                | CrumbError::TimestampExpired { .. }
                | CrumbError::DigestMismatch
                | CrumbError::SessionSecretUnavailable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CrumbError>;
