//! Read-only view of the incoming request.

use std::collections::HashMap;

/// What crumb verification needs to know about a request.
///
/// Implement this for the host framework's request type.
pub trait RequestAccessor {
    /// Client address
    fn remote_address(&self) -> &str;

    /// HTTP method
    fn method(&self) -> &str;

    /// Form or query parameter
    fn param(&self, name: &str) -> Option<&str>;

    /// Header, looked up case-insensitively
    fn header(&self, name: &str) -> Option<&str>;

    /// Session identifier, if the request belongs to a session
    fn session_id(&self) -> Option<&str>;

    /// The page the request came from
    fn referer(&self) -> Option<&str> {
        self.header("Referer")
    }
}

/// A plain request value, for hosts that decode requests themselves and for tests.
#[derive(Debug, Clone, Default)]
pub struct FormRequest {
    pub method: String,
    pub remote_address: String,
    pub session_id: Option<String>,
    pub params: HashMap<String, String>,
    headers: HashMap<String, String>,
}

impl FormRequest {
    pub fn new(method: impl Into<String>, remote_address: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            remote_address: remote_address.into(),
            ..Self::default()
        }
    }

    pub fn get(remote_address: impl Into<String>) -> Self {
        Self::new("GET", remote_address)
    }

    pub fn post(remote_address: impl Into<String>) -> Self {
        Self::new("POST", remote_address)
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Merge parameters from an `application/x-www-form-urlencoded` body.
    ///
    /// Bodies that don't decode are ignored.
    pub fn with_form_body(self, body: &[u8]) -> Self {
        match serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) {
            Ok(pairs) => self.with_params(pairs),
            Err(_) => self,
        }
    }

    /// Merge parameters from a query string (without the leading `?`).
    pub fn with_query(self, query: &str) -> Self {
        self.with_form_body(query.as_bytes())
    }
}

impl RequestAccessor for FormRequest {
    fn remote_address(&self) -> &str {
        &self.remote_address
    }

    fn method(&self) -> &str {
        &self.method
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }
}
