use std::fmt;
use std::sync::Arc;

use reqwest::{Response, StatusCode};

/// Decides whether a received response counts as a failed attempt.
///
/// The policy only ever runs on responses that actually arrived; transport
/// failures and timeouts are always retryable and never consult it.
#[derive(Clone, Default)]
pub enum ResponsePolicy {
    /// Retry when the status is a server error (500 and above).
    #[default]
    ServerErrors,
    /// Never retry on a received response: every response, including 5xx,
    /// is returned to the caller as a final result.
    Never,
    /// Caller-supplied predicate; `true` marks the response as retryable.
    Custom(Arc<dyn Fn(&Response) -> bool + Send + Sync>),
}

impl ResponsePolicy {
    /// Wraps a predicate over the received response.
    ///
    /// # Example
    ///
    /// ```
    /// use fetch_retry_http::ResponsePolicy;
    ///
    /// let policy = ResponsePolicy::custom(|response| response.status().as_u16() == 429);
    /// ```
    pub fn custom(predicate: impl Fn(&Response) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(predicate))
    }

    pub(crate) fn wants_retry(&self, response: &Response) -> bool {
        match self {
            Self::ServerErrors => is_server_error(response.status()),
            Self::Never => false,
            Self::Custom(predicate) => predicate(response),
        }
    }
}

impl fmt::Debug for ResponsePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServerErrors => f.write_str("ServerErrors"),
            Self::Never => f.write_str("Never"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

fn is_server_error(status: StatusCode) -> bool {
    status.as_u16() >= 500
}
