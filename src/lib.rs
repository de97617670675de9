//! `deere-http` is an async HTTP client core for the John Deere
//! Operations Center API.
//!
//! Requests go through a single executor with per-attempt timeouts,
//! caller cancellation, retry with full-jitter backoff and typed errors:
//! - [`DeereClient::get`], [`DeereClient::post`], [`DeereClient::put`],
//!   [`DeereClient::patch`], [`DeereClient::delete`]
//! - [`DeereClient::paginate`] and [`DeereClient::get_all`] for listings
//! - [`DeereClient::follow_link`] for HAL links

mod classify;
mod client;
mod config;
mod error;
mod options;
mod paginate;
mod retry;
mod transport;
mod types;

pub use client::DeereClient;
pub use config::{ClientOptions, Environment, VENDOR_MEDIA_TYPE};
pub use error::{BoxError, DeereError, ErrorBody, TransportError};
pub use options::RequestOptions;
pub use paginate::Paginator;
pub use retry::{RetryPolicy, BASE_DELAY, MAX_DELAY, RETRYABLE_STATUS_CODES};
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
pub use types::{Link, LinkTarget, PaginatedResponse, ResponseBody, NEXT_PAGE_REL};

pub use reqwest::Method;
pub use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, DeereError>;
