use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE,
};

use crate::{retry::RetryPolicy, DeereError};

/// Media type the Deere platform expects in `Accept` and `Content-Type`.
pub const VENDOR_MEDIA_TYPE: &str = "application/vnd.deere.axiom.v3+json";

/// Named Deere API environment.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Environment {
    Production,
    #[default]
    Sandbox,
    Partner,
    Cert,
    Qa,
}

impl Environment {
    /// Returns the fixed platform base URL for this environment.
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Production => "https://api.deere.com/platform",
            Self::Sandbox => "https://sandboxapi.deere.com/platform",
            Self::Partner => "https://partnerapi.deere.com/platform",
            Self::Cert => "https://apicert.deere.com/platform",
            Self::Qa => "https://apiqa.tal.deere.com/platform",
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Sandbox => "sandbox",
            Self::Partner => "partner",
            Self::Cert => "cert",
            Self::Qa => "qa",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "sandbox" => Ok(Self::Sandbox),
            "partner" => Ok(Self::Partner),
            "cert" => Ok(Self::Cert),
            "qa" => Ok(Self::Qa),
            other => Err(format!("unknown Deere environment '{other}'")),
        }
    }
}

/// Configures HTTP timeout and retry behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Seed for backoff jitter. `None` draws a fresh seed for every call.
    pub jitter_seed: Option<u64>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_retries: 3,
            jitter_seed: None,
        }
    }
}

/// Effective settings derived from the client builder inputs.
#[derive(Clone, Debug)]
pub(crate) struct ResolvedConfig {
    pub(crate) base_url: String,
    /// Vendor media type, caller defaults, then `Authorization`.
    pub(crate) default_headers: HeaderMap,
    /// Set when the access token cannot be sent as a header value.
    pub(crate) invalid_token: bool,
    pub(crate) timeout: Duration,
    pub(crate) retry: RetryPolicy,
    pub(crate) jitter_seed: Option<u64>,
}

impl ResolvedConfig {
    pub(crate) fn resolve(
        access_token: &str,
        environment: Option<Environment>,
        base_url: Option<&str>,
        default_headers: &HeaderMap,
        options: &ClientOptions,
    ) -> Self {
        let base_url = match base_url {
            Some(url) => url.to_owned(),
            None => environment.unwrap_or_default().base_url().to_owned(),
        };

        let mut vendor = HeaderMap::new();
        vendor.insert(ACCEPT, HeaderValue::from_static(VENDOR_MEDIA_TYPE));
        vendor.insert(CONTENT_TYPE, HeaderValue::from_static(VENDOR_MEDIA_TYPE));
        let mut headers = merge_headers(&vendor, default_headers);

        let invalid_token = match HeaderValue::from_str(&format!("Bearer {access_token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
                false
            }
            Err(_) => true,
        };

        Self {
            base_url,
            default_headers: headers,
            invalid_token,
            timeout: Duration::from_millis(options.timeout_ms),
            retry: RetryPolicy::new(options.max_retries),
            jitter_seed: options.jitter_seed,
        }
    }

    /// Resolves `path` against the base URL unless it is already absolute.
    pub(crate) fn resolve_url(&self, path: &str) -> String {
        if is_absolute_url(path) {
            path.to_owned()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }
}

pub(crate) fn is_absolute_url(value: &str) -> bool {
    let has_prefix = |prefix: &str| {
        value
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };
    has_prefix("http://") || has_prefix("https://")
}

/// Overlays `overlay` on `base`; overlay entries replace same-named ones.
pub(crate) fn merge_headers(base: &HeaderMap, overlay: &HeaderMap) -> HeaderMap {
    let mut merged = base.clone();
    for (name, value) in overlay {
        merged.insert(name.clone(), value.clone());
    }
    merged
}

/// Parses a caller-supplied header pair.
pub(crate) fn parse_header(
    name: &str,
    value: &str,
) -> Result<(HeaderName, HeaderValue), DeereError> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|err| DeereError::InvalidHeader(format!("name '{name}': {err}")))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|err| DeereError::InvalidHeader(format!("value for '{name}': {err}")))?;
    Ok((header_name, header_value))
}
