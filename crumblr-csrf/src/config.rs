use crate::error::{CrumbError, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

/// Default message flashed when an authentic crumb arrives too late.
pub const DEFAULT_TIMED_OUT_MESSAGE: &str = "Form submission timed out. Please resubmit.";

/// Default message flashed when a crumb doesn't validate.
pub const DEFAULT_INVALID_MESSAGE: &str = "Possible form data tampering. Please resubmit.";

/// Minimum number of random bytes in a session secret.
pub const MIN_SECRET_LENGTH: usize = 6;

/// How a crumb travels inside a form or query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenFormat {
    /// Digest and timestamp in two separate fields (`_crumb`, `_timestamp`)
    Split,
    /// Fixed-width timestamp followed by the digest in one field (`_token`)
    Composite,
}

/// Crumb protection configuration for one scope of endpoints.
///
/// Built once at startup and shared by reference; nothing here changes while
/// requests are being served.
#[derive(Debug, Clone)]
pub struct CrumbConfig {
    /// Endpoints sharing a scope accept each other's crumbs
    pub scope: String,

    /// How long a crumb stays fresh after issuance
    pub window: Duration,

    /// Flash message for authentic but expired crumbs
    pub timed_out_message: String,

    /// Flash message for crumbs that don't validate
    pub invalid_message: String,

    /// Body returned when a request is rejected outright
    pub rejection_message: String,

    /// Form encoding
    pub format: TokenFormat,

    /// Whether the scope is mixed into the digest
    pub include_scope: bool,

    /// Whether unsafe requests are checked at all
    pub enabled: bool,

    /// Form field carrying a composite token
    pub token_field: String,

    /// Form field carrying a split digest
    pub crumb_field: String,

    /// Form field carrying a split timestamp
    pub timestamp_field: String,

    /// Header carrying a composite token
    pub header_name: String,

    /// Session key holding the per-session secret
    pub secret_key: String,

    /// Random bytes in a freshly generated session secret
    pub secret_length: usize,

    /// Methods that are never checked
    pub safe_methods: Vec<String>,
}

impl CrumbConfig {
    /// Extended configuration: composite `_token`, 1 hour window, scope in the digest.
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            window: Duration::from_secs(3600),
            timed_out_message: DEFAULT_TIMED_OUT_MESSAGE.to_string(),
            invalid_message: DEFAULT_INVALID_MESSAGE.to_string(),
            rejection_message: "Invalid crumb".to_string(),
            format: TokenFormat::Composite,
            include_scope: true,
            enabled: true,
            token_field: "_token".to_string(),
            crumb_field: "_crumb".to_string(),
            timestamp_field: "_timestamp".to_string(),
            header_name: "X-CSRF-Token".to_string(),
            secret_key: "_csrf_token".to_string(),
            secret_length: 32,
            safe_methods: vec!["GET".to_string(), "HEAD".to_string(), "OPTIONS".to_string()],
        }
    }

    /// Simple configuration: `_crumb` + `_timestamp`, 15 minute window, no scope in the digest.
    pub fn simple(scope: impl Into<String>) -> Self {
        Self::new(scope)
            .with_format(TokenFormat::Split)
            .with_window(Duration::from_secs(15 * 60))
            .with_scope_in_digest(false)
    }

    /// Extended configuration scoped to the unqualified name of `T`.
    ///
    /// ```rust
    /// use crumblr_csrf::CrumbConfig;
    ///
    /// struct OrdersController;
    ///
    /// let config = CrumbConfig::for_consumer::<OrdersController>();
    /// assert_eq!(config.scope, "OrdersController");
    /// ```
    pub fn for_consumer<T: ?Sized>() -> Self {
        Self::new(consumer_name::<T>())
    }

    /// Set scope
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Set freshness window
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Set timed-out flash message
    pub fn with_timed_out_message(mut self, message: impl Into<String>) -> Self {
        self.timed_out_message = message.into();
        self
    }

    /// Set invalid-crumb flash message
    pub fn with_invalid_message(mut self, message: impl Into<String>) -> Self {
        self.invalid_message = message.into();
        self
    }

    /// Set rejection body
    pub fn with_rejection_message(mut self, message: impl Into<String>) -> Self {
        self.rejection_message = message.into();
        self
    }

    /// Set form encoding
    pub fn with_format(mut self, format: TokenFormat) -> Self {
        self.format = format;
        self
    }

    /// Mix the scope into the digest or not
    pub fn with_scope_in_digest(mut self, include: bool) -> Self {
        self.include_scope = include;
        self
    }

    /// Turn protection on or off
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set composite token field name
    pub fn with_token_field(mut self, name: impl Into<String>) -> Self {
        self.token_field = name.into();
        self
    }

    /// Set split digest field name
    pub fn with_crumb_field(mut self, name: impl Into<String>) -> Self {
        self.crumb_field = name.into();
        self
    }

    /// Set split timestamp field name
    pub fn with_timestamp_field(mut self, name: impl Into<String>) -> Self {
        self.timestamp_field = name.into();
        self
    }

    /// Set header name
    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    /// Set session key for the secret
    pub fn with_secret_key(mut self, key: impl Into<String>) -> Self {
        self.secret_key = key.into();
        self
    }

    /// Set secret length in bytes
    pub fn with_secret_length(mut self, length: usize) -> Self {
        self.secret_length = length;
        self
    }

    /// Replace safe methods
    pub fn with_safe_methods(mut self, methods: Vec<String>) -> Self {
        self.safe_methods = methods;
        self
    }

    /// Window length in whole seconds
    pub fn window_secs(&self) -> u64 {
        self.window.as_secs()
    }

    /// Whether `method` skips verification
    pub fn is_safe_method(&self, method: &str) -> bool {
        self.safe_methods
            .iter()
            .any(|safe| safe.eq_ignore_ascii_case(method))
    }

    /// Check the configuration for values that would break issuance or verification.
    pub fn validate(&self) -> Result<()> {
        if self.secret_length < MIN_SECRET_LENGTH {
            return Err(CrumbError::Config(format!(
                "Session secret must be at least {} bytes",
                MIN_SECRET_LENGTH
            )));
        }

        if self.window_secs() == 0 {
            return Err(CrumbError::Config(
                "Window must be at least one second".to_string(),
            ));
        }

        let names = [
            ("token_field", &self.token_field),
            ("crumb_field", &self.crumb_field),
            ("timestamp_field", &self.timestamp_field),
            ("header_name", &self.header_name),
            ("secret_key", &self.secret_key),
        ];
        for (what, value) in names {
            if value.is_empty() {
                return Err(CrumbError::Config(format!("{} must not be empty", what)));
            }
        }

        if self.crumb_field == self.timestamp_field {
            return Err(CrumbError::Config(
                "crumb_field and timestamp_field must differ".to_string(),
            ));
        }

        Ok(())
    }

    /// Load a configuration from TOML text.
    ///
    /// Keys left out keep the defaults of [`CrumbConfig::new`], or of
    /// [`CrumbConfig::simple`] when `format = "split"`.
    ///
    /// ```rust
    /// use crumblr_csrf::{CrumbConfig, TokenFormat};
    ///
    /// let config = CrumbConfig::from_toml_str(r#"
    ///     scope = "Checkout"
    ///     window_secs = 600
    /// "#).unwrap();
    ///
    /// assert_eq!(config.scope, "Checkout");
    /// assert_eq!(config.window_secs(), 600);
    /// assert_eq!(config.format, TokenFormat::Composite);
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let settings: CrumbSettings = toml::from_str(source)?;
        let config = settings.into_config();
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            CrumbError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&source)
    }

    /// Apply `CRUMBLR_*` environment overrides.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| env::var(format!("{}_{}", ENV_PREFIX, key)).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(scope) = lookup("SCOPE") {
            self.scope = scope;
        }
        if let Some(secs) = lookup("WINDOW_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                CrumbError::Config(format!("{}_WINDOW_SECS is not a number: {}", ENV_PREFIX, secs))
            })?;
            self.window = Duration::from_secs(secs);
        }
        if let Some(message) = lookup("TIMED_OUT_MSG") {
            self.timed_out_message = message;
        }
        if let Some(message) = lookup("INVALID_MSG") {
            self.invalid_message = message;
        }
        if let Some(enabled) = lookup("ENABLED") {
            self.enabled = match enabled.trim().to_ascii_lowercase().as_str() {
                "1" | "true" => true,
                "0" | "false" => false,
                _ => {
                    return Err(CrumbError::Config(format!(
                        "{}_ENABLED must be true or false: {}",
                        ENV_PREFIX, enabled
                    )));
                }
            };
        }
        self.validate()?;
        Ok(self)
    }
}

impl Default for CrumbConfig {
    fn default() -> Self {
        Self::new("")
    }
}

const ENV_PREFIX: &str = "CRUMBLR";

/// File representation of [`CrumbConfig`].
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrumbSettings {
    pub scope: Option<String>,
    pub window_secs: Option<u64>,
    pub timed_out_message: Option<String>,
    pub invalid_message: Option<String>,
    pub rejection_message: Option<String>,
    pub format: Option<TokenFormat>,
    pub include_scope: Option<bool>,
    pub enabled: Option<bool>,
    pub token_field: Option<String>,
    pub crumb_field: Option<String>,
    pub timestamp_field: Option<String>,
    pub header_name: Option<String>,
    pub secret_key: Option<String>,
    pub secret_length: Option<usize>,
    pub safe_methods: Option<Vec<String>>,
}

impl CrumbSettings {
    pub fn into_config(self) -> CrumbConfig {
        let scope = self.scope.unwrap_or_default();
        let mut config = match self.format {
            Some(TokenFormat::Split) => CrumbConfig::simple(scope),
            _ => CrumbConfig::new(scope),
        };

        if let Some(secs) = self.window_secs {
            config.window = Duration::from_secs(secs);
        }
        if let Some(v) = self.timed_out_message {
            config.timed_out_message = v;
        }
        if let Some(v) = self.invalid_message {
            config.invalid_message = v;
        }
        if let Some(v) = self.rejection_message {
            config.rejection_message = v;
        }
        if let Some(v) = self.include_scope {
            config.include_scope = v;
        }
        if let Some(v) = self.enabled {
            config.enabled = v;
        }
        if let Some(v) = self.token_field {
            config.token_field = v;
        }
        if let Some(v) = self.crumb_field {
            config.crumb_field = v;
        }
        if let Some(v) = self.timestamp_field {
            config.timestamp_field = v;
        }
        if let Some(v) = self.header_name {
            config.header_name = v;
        }
        if let Some(v) = self.secret_key {
            config.secret_key = v;
        }
        if let Some(v) = self.secret_length {
            config.secret_length = v;
        }
        if let Some(v) = self.safe_methods {
            config.safe_methods = v;
        }
        config
    }
}

fn consumer_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    // Strip generic arguments before taking the last path segment.
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}
