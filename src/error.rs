/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Invalid call configuration, detected before any request is sent.
    #[error("configuration error: {0}")]
    Config(String),
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// The per-attempt deadline elapsed before a response arrived.
    #[error("attempt timed out after {timeout_ms} ms")]
    Timeout {
        /// Deadline that was exceeded, in milliseconds.
        timeout_ms: u64,
    },
    /// A response arrived but the response policy classified it as a failed
    /// attempt. Carries the status metadata for inspection by a
    /// before-retry hook.
    #[error("response code: {status}")]
    Status {
        /// Numeric HTTP status of the rejected response.
        status: u16,
        /// Canonical reason phrase, empty when the status has none.
        status_text: String,
    },
}

impl FetchError {
    /// Status code of the rejected response, when the failure carries one.
    ///
    /// Transport and timeout failures have no response and return `None`.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the attempt was cut short by the per-attempt deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
