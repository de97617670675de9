use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tokio_util::sync::CancellationToken;

use crate::{config::parse_header, Result};

/// Per-call overrides for a single request.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    /// Extra headers; these win over client defaults on a name collision.
    pub headers: HeaderMap,
    /// Aborts the in-flight attempt (and any pending retry) when fired.
    pub cancel: Option<CancellationToken>,
    /// Overrides the client's per-attempt timeout.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header for this call, replacing any earlier value for `name`.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Like [`RequestOptions::header`], parsing `name` and `value` first.
    pub fn try_header(self, name: &str, value: &str) -> Result<Self> {
        let (name, value) = parse_header(name, value)?;
        Ok(self.header(name, value))
    }

    /// Cancels the call, including any pending retry, when `token` fires.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Overrides the per-attempt timeout for this call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
