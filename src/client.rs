use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

use crate::{
    classify::{classify_response, retry_after_secs},
    config::{merge_headers, parse_header, ResolvedConfig},
    paginate::Paginator,
    transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse},
    ClientOptions, DeereError, Environment, LinkTarget, RequestOptions, ResponseBody, Result,
    RetryPolicy, TransportError,
};

#[derive(Clone)]
/// HTTP client for the Deere platform API.
///
/// Every verb call runs through one retry loop: each attempt is bounded by
/// its own timeout, retryable statuses (429, 500, 502, 503, 504), timeouts
/// and network failures are retried with backoff, and everything else is
/// surfaced as a [`DeereError`].
pub struct DeereClient {
    transport: Arc<dyn Transport>,
    access_token: String,
    environment: Option<Environment>,
    base_url: Option<String>,
    default_headers: HeaderMap,
    options: ClientOptions,
    pub(crate) config: ResolvedConfig,
}

impl fmt::Debug for DeereClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeereClient")
            .field("base_url", &self.config.base_url)
            .field("access_token", &"<redacted>")
            .field("default_headers", &self.default_headers)
            .field("options", &self.options)
            .finish()
    }
}

enum Attempt {
    Response(TransportResponse),
    Failed(TransportError),
    TimedOut,
    Cancelled,
}

impl DeereClient {
    /// Creates a client for the sandbox environment with default options.
    ///
    /// The token is sent as `Authorization: Bearer <token>`. A token that is
    /// not a valid header value fails every call with
    /// [`DeereError::InvalidHeader`] before any request is sent.
    pub fn new(access_token: impl Into<String>) -> Self {
        let access_token = access_token.into();
        let options = ClientOptions::default();
        let default_headers = HeaderMap::new();
        Self {
            transport: Arc::new(ReqwestTransport::default()),
            config: ResolvedConfig::resolve(&access_token, None, None, &default_headers, &options),
            access_token,
            environment: None,
            base_url: None,
            default_headers,
            options,
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `DEERE_ACCESS_TOKEN` — OAuth access token (required)
    /// - `DEERE_ENVIRONMENT` — `production`, `sandbox`, `partner`, `cert` or `qa`
    /// - `DEERE_BASE_URL` — explicit base URL, wins over `DEERE_ENVIRONMENT`
    ///
    /// # Example
    ///
    /// ```no_run
    /// use deere_http::DeereClient;
    ///
    /// let client = DeereClient::from_env().expect("missing DEERE_* env vars");
    /// ```
    pub fn from_env() -> std::result::Result<Self, String> {
        let token = std::env::var("DEERE_ACCESS_TOKEN")
            .map_err(|_| "missing DEERE_ACCESS_TOKEN environment variable".to_owned())?;
        if token.trim().is_empty() {
            return Err("DEERE_ACCESS_TOKEN is set but empty".to_owned());
        }

        let mut client = Self::new(token);
        if let Ok(environment) = std::env::var("DEERE_ENVIRONMENT") {
            client = client.with_environment(environment.parse()?);
        }
        if let Ok(base_url) = std::env::var("DEERE_BASE_URL") {
            if !base_url.trim().is_empty() {
                client = client.with_base_url(base_url.trim());
            }
        }
        Ok(client)
    }

    /// Targets one of the fixed Deere environments.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self.reresolve()
    }

    /// Targets an explicit base URL; takes precedence over any environment.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self.reresolve()
    }

    /// Adds a header sent with every request, replacing the vendor default
    /// of the same name.
    pub fn with_default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.insert(name, value);
        self.reresolve()
    }

    /// Like [`DeereClient::with_default_header`], parsing `name` and `value` first.
    pub fn try_default_header(self, name: &str, value: &str) -> Result<Self> {
        let (name, value) = parse_header(name, value)?;
        Ok(self.with_default_header(name, value))
    }

    /// Replaces the HTTP backend.
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Applies client options such as timeout and retry behavior.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self.reresolve()
    }

    fn reresolve(mut self) -> Self {
        self.config = ResolvedConfig::resolve(
            &self.access_token,
            self.environment,
            self.base_url.as_deref(),
            &self.default_headers,
            &self.options,
        );
        self
    }

    /// Base URL that relative paths are joined to.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Retry policy derived from [`ClientOptions::max_retries`].
    pub fn retry_policy(&self) -> RetryPolicy {
        self.config.retry
    }

    /// Sends a GET request and decodes the response into `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: Option<&RequestOptions>,
    ) -> Result<T> {
        self.call(Method::GET, path, None::<&()>, options).await
    }

    /// Sends `body` as JSON with POST and decodes the response into `T`.
    pub async fn post<T, B>(&self, path: &str, body: &B, options: Option<&RequestOptions>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.call(Method::POST, path, Some(body), options).await
    }

    /// Sends `body` as JSON with PUT and decodes the response into `T`.
    pub async fn put<T, B>(&self, path: &str, body: &B, options: Option<&RequestOptions>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.call(Method::PUT, path, Some(body), options).await
    }

    /// Sends `body` as JSON with PATCH and decodes the response into `T`.
    pub async fn patch<T, B>(&self, path: &str, body: &B, options: Option<&RequestOptions>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.call(Method::PATCH, path, Some(body), options).await
    }

    /// Sends a DELETE request; use `()` or `Option<T>` for empty replies.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: Option<&RequestOptions>,
    ) -> Result<T> {
        self.call(Method::DELETE, path, None::<&()>, options).await
    }

    /// Follows a HAL link (or bare URI) with a GET request.
    ///
    /// Absolute URIs are used as-is; anything else is joined to the base URL.
    pub async fn follow_link<'a, T: DeserializeOwned>(
        &self,
        link: impl Into<LinkTarget<'a>>,
        options: Option<&RequestOptions>,
    ) -> Result<T> {
        let target = link.into();
        self.call(Method::GET, target.uri(), None::<&()>, options).await
    }

    /// Returns a cursor over the pages of a listing endpoint.
    ///
    /// Pages are fetched one at a time, following `nextPage` links.
    pub fn paginate<T: DeserializeOwned>(
        &self,
        path: &str,
        options: Option<&RequestOptions>,
    ) -> Paginator<'_, T> {
        Paginator::new(
            self,
            self.config.resolve_url(path),
            options.cloned().unwrap_or_default(),
        )
    }

    /// Collects every item of a listing endpoint, in page order.
    pub async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        options: Option<&RequestOptions>,
    ) -> Result<Vec<T>> {
        self.paginate(path, options).collect_all().await
    }

    /// Executes one logical request and returns the undecoded body.
    ///
    /// `path` may be relative to the base URL or an absolute URL.
    pub async fn execute<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: Option<&RequestOptions>,
    ) -> Result<ResponseBody>
    where
        B: Serialize + ?Sized,
    {
        let body = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(DeereError::Encode)?;
        let url = self.config.resolve_url(path);
        let default_options = RequestOptions::default();
        self.send_with_retry(method, url, body, options.unwrap_or(&default_options))
            .await
    }

    async fn call<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: Option<&RequestOptions>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.execute(method, path, body, options).await?;
        decode_typed(response)
    }

    pub(crate) async fn get_url<T: DeserializeOwned>(
        &self,
        url: String,
        options: &RequestOptions,
    ) -> Result<T> {
        let response = self.send_with_retry(Method::GET, url, None, options).await?;
        decode_typed(response)
    }

    async fn send_with_retry(
        &self,
        method: Method,
        url: String,
        body: Option<Vec<u8>>,
        options: &RequestOptions,
    ) -> Result<ResponseBody> {
        let policy = self.config.retry;
        let max_attempts = policy.max_attempts();
        let attempt_timeout = options.timeout.unwrap_or(self.config.timeout);
        let cancel = options.cancel.as_ref();
        let mut rng = match self.config.jitter_seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };

        if self.config.invalid_token {
            return Err(DeereError::InvalidHeader(
                "access token is not a valid Authorization value".to_owned(),
            ));
        }
        let headers = merge_headers(&self.config.default_headers, &options.headers);

        let mut attempt = 0usize;
        loop {
            let has_budget = attempt + 1 < max_attempts;
            let request = TransportRequest {
                method: method.clone(),
                url: url.clone(),
                headers: headers.clone(),
                body: body.clone(),
            };

            match self.run_attempt(request, attempt_timeout, cancel).await {
                Attempt::Response(response) if response.is_success() => {
                    return decode_success(response);
                }
                Attempt::Response(response) => {
                    if RetryPolicy::is_retryable_status(response.status) && has_budget {
                        let retry_after = if response.status == 429 {
                            retry_after_secs(&response)
                        } else {
                            None
                        };
                        let delay = policy.delay(attempt, retry_after, &mut rng);

                        #[cfg(feature = "tracing")]
                        tracing::debug!(
                            %method, %url, attempt, status = response.status,
                            "retrying request after {} ms", delay.as_millis()
                        );

                        wait_before_retry(delay, cancel).await?;
                        attempt += 1;
                        continue;
                    }

                    let err = classify_response(&response);

                    #[cfg(feature = "tracing")]
                    tracing::warn!(%method, %url, attempt, error = %err, "request failed");

                    return Err(err);
                }
                Attempt::TimedOut => {
                    if has_budget {
                        let delay = policy.delay(attempt, None, &mut rng);

                        #[cfg(feature = "tracing")]
                        tracing::debug!(
                            %method, %url, attempt,
                            "attempt timed out, retrying after {} ms", delay.as_millis()
                        );

                        wait_before_retry(delay, cancel).await?;
                        attempt += 1;
                        continue;
                    }

                    #[cfg(feature = "tracing")]
                    tracing::warn!(%method, %url, attempt, "request timed out");

                    return Err(DeereError::Timeout);
                }
                Attempt::Failed(err) => {
                    if err.is_network() && has_budget {
                        let delay = policy.delay(attempt, None, &mut rng);

                        #[cfg(feature = "tracing")]
                        tracing::debug!(
                            %method, %url, attempt, error = %err,
                            "network failure, retrying after {} ms", delay.as_millis()
                        );

                        wait_before_retry(delay, cancel).await?;
                        attempt += 1;
                        continue;
                    }

                    #[cfg(feature = "tracing")]
                    tracing::warn!(%method, %url, attempt, error = %err, "transport failed");

                    return Err(DeereError::Transport(err));
                }
                Attempt::Cancelled => return Err(DeereError::Cancelled),
            }
        }
    }

    /// Runs one attempt; the first of timeout, cancellation or completion wins.
    async fn run_attempt(
        &self,
        request: TransportRequest,
        attempt_timeout: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Attempt {
        if cancel.is_some_and(|token| token.is_cancelled()) {
            return Attempt::Cancelled;
        }

        let exchange = timeout(attempt_timeout, self.transport.send(request));
        let outcome = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Attempt::Cancelled,
                outcome = exchange => outcome,
            },
            None => exchange.await,
        };

        match outcome {
            Ok(Ok(response)) => Attempt::Response(response),
            Ok(Err(err)) => Attempt::Failed(err),
            Err(_elapsed) => Attempt::TimedOut,
        }
    }
}

/// Sleeps for the backoff delay unless the caller cancels first.
async fn wait_before_retry(delay: Duration, cancel: Option<&CancellationToken>) -> Result<()> {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(DeereError::Cancelled),
            _ = sleep(delay) => Ok(()),
        },
        None => {
            sleep(delay).await;
            Ok(())
        }
    }
}

fn decode_success(response: TransportResponse) -> Result<ResponseBody> {
    let zero_length = response
        .header("content-length")
        .is_some_and(|value| value.trim() == "0");
    if response.status == 204 || zero_length || response.body.is_empty() {
        return Ok(ResponseBody::Empty);
    }

    let content_type = response
        .header("content-type")
        .unwrap_or_default()
        .to_ascii_lowercase();
    if content_type.contains("application/json") || content_type.contains("application/vnd.deere") {
        return serde_json::from_str(&response.body)
            .map(ResponseBody::Json)
            .map_err(|err| {
                DeereError::Decode(format!(
                    "invalid JSON response: {err}; body: {}",
                    response.body
                ))
            });
    }

    Ok(ResponseBody::Text(response.body))
}

fn decode_typed<T: DeserializeOwned>(body: ResponseBody) -> Result<T> {
    body.decode()
        .map_err(|err| DeereError::Decode(format!("unexpected response shape: {err}")))
}
