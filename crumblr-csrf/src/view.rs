//! Markup and query helpers for embedding crumbs in pages.
//!
//! ```rust
//! use crumblr_csrf::{CrumbConfig, IssuedToken, view};
//!
//! let config = CrumbConfig::simple("Orders");
//! let token = IssuedToken::new(1_000_000_000, "d1gest");
//!
//! let html = view::crumb_tags(&token, &config);
//! assert!(html.contains(r#"name="_crumb" value="d1gest""#));
//! assert!(html.contains(r#"name="_timestamp" value="1000000000""#));
//! ```

use crate::config::{CrumbConfig, TokenFormat};
use crate::error::Result;
use crate::token::IssuedToken;

/// Two hidden inputs: digest and timestamp.
pub fn crumb_tags(token: &IssuedToken, config: &CrumbConfig) -> String {
    format!(
        "\n{}\n{}",
        hidden_input(&config.crumb_field, &token.digest),
        hidden_input(&config.timestamp_field, &token.stamp())
    )
}

/// One hidden input holding the composite token.
pub fn token_tag(token: &IssuedToken, config: &CrumbConfig) -> String {
    hidden_input(&config.token_field, &token.composite())
}

/// Hidden inputs in whichever encoding `config` uses.
pub fn hidden_fields(token: &IssuedToken, config: &CrumbConfig) -> String {
    match config.format {
        TokenFormat::Split => crumb_tags(token, config),
        TokenFormat::Composite => token_tag(token, config),
    }
}

/// A `<meta>` tag carrying the composite token for scripts that submit
/// through the header carrier.
pub fn meta_tag(token: &IssuedToken, config: &CrumbConfig) -> String {
    format!(
        r#"<meta name="{}" content="{}"/>"#,
        escape_attr(&config.header_name),
        escape_attr(&token.composite())
    )
}

/// Query parameters for links that can't use a form post.
pub fn crumb_params(token: &IssuedToken, config: &CrumbConfig) -> Vec<(String, String)> {
    match config.format {
        TokenFormat::Split => vec![
            (config.crumb_field.clone(), token.digest.clone()),
            (config.timestamp_field.clone(), token.stamp()),
        ],
        TokenFormat::Composite => vec![(config.token_field.clone(), token.composite())],
    }
}

/// [`crumb_params`] as a URL-encoded query string.
pub fn crumb_query(token: &IssuedToken, config: &CrumbConfig) -> Result<String> {
    Ok(serde_urlencoded::to_string(crumb_params(token, config))?)
}

fn hidden_input(name: &str, value: &str) -> String {
    format!(
        r#"<input type="hidden" name="{}" value="{}"/>"#,
        escape_attr(name),
        escape_attr(value)
    )
}

fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            c => escaped.push(c),
        }
    }
    escaped
}
