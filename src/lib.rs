//! `fetch-retry-http` wraps a single outgoing HTTP request in a bounded
//! retry loop: per-attempt timeout, optional pacing between attempts, a
//! policy deciding which responses count as failures, and a hook that can
//! rewrite the request before the next attempt.
//!
//! The entry points are [`RetryClient::fetch`] and the one-shot [`fetch`].
//!
//! ```no_run
//! use fetch_retry_http::{fetch, FetchOptions, ResponsePolicy};
//!
//! # async fn run() -> fetch_retry_http::Result<()> {
//! let response = fetch(
//!     "https://example.com/health",
//!     FetchOptions::default()
//!         .with_retry(3)
//!         .with_pause_ms(250)
//!         .retry_on_response(ResponsePolicy::ServerErrors),
//! )
//! .await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod options;
mod policy;

pub use client::{fetch, RetryClient};
pub use error::FetchError;
pub use options::{
    BeforeRetryHook, FetchOptions, RedirectMode, RequestOverride, DEFAULT_RETRY,
    DEFAULT_TIMEOUT_MS,
};
pub use policy::ResponsePolicy;

pub type Result<T> = std::result::Result<T, FetchError>;
