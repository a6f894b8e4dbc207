use std::fmt;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;

use crate::{FetchError, ResponsePolicy, Result};

/// Additional attempts beyond the first when none are configured.
pub const DEFAULT_RETRY: u32 = 2;

/// Per-attempt deadline when none is configured, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;

/// Redirect handling for a call.
///
/// `Manual` is the default: redirect responses are returned to the caller
/// instead of being followed, so the redirect target stays visible.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RedirectMode {
    /// Return 3xx responses as-is.
    #[default]
    Manual,
    /// Follow up to 10 redirect hops before giving up.
    Follow,
}

/// Partial request configuration returned by a before-retry hook.
///
/// Merging is shallow: a present field replaces the corresponding field of
/// the next attempt's request wholesale. In particular a present `headers`
/// replaces the entire header map, it is not merged key by key.
#[derive(Clone, Debug, Default)]
pub struct RequestOverride {
    /// Replacement HTTP method.
    pub method: Option<Method>,
    /// Replacement header map.
    pub headers: Option<HeaderMap>,
    /// Replacement request body.
    pub body: Option<Vec<u8>>,
    /// Replacement connection agent for subsequent attempts.
    pub agent: Option<reqwest::Client>,
    /// Replacement redirect mode.
    pub redirect: Option<RedirectMode>,
}

/// Hook invoked after every failed attempt, including the last one.
///
/// Receives the 1-based count of attempts consumed so far and the failure
/// that consumed the most recent attempt. Returning `Some` override rewrites
/// the request used by the next attempt, e.g. to rotate credentials or to
/// swap the connection agent after a proxy failure.
pub type BeforeRetryHook = Arc<dyn Fn(u32, &FetchError) -> Option<RequestOverride> + Send + Sync>;

/// Per-call request and retry configuration.
///
/// Fields are public; the `with_*` builders exist for call-site ergonomics.
#[derive(Clone)]
pub struct FetchOptions {
    /// HTTP method, GET when unset.
    pub method: Method,
    /// Request headers. Name matching is case-insensitive.
    pub headers: HeaderMap,
    /// Request body bytes, none when unset.
    pub body: Option<Vec<u8>>,
    /// Connection agent for this call, overriding the executor's transport.
    /// The agent's own redirect policy applies while it is in effect.
    pub agent: Option<reqwest::Client>,
    /// Redirect handling, [`RedirectMode::Manual`] when unset.
    pub redirect: RedirectMode,
    /// Additional attempts beyond the first. Zero still sends once.
    pub retry: u32,
    /// Per-attempt deadline in milliseconds. The in-flight send is aborted
    /// when it elapses and the attempt counts as consumed.
    pub timeout_ms: u64,
    /// Pause between a failed attempt and the next, in milliseconds.
    /// Never applied after the final failure.
    pub pause_ms: Option<u64>,
    /// Policy deciding whether a received response is a failed attempt.
    pub retry_on_response: ResponsePolicy,
    /// Hook invoked between attempts, see [`BeforeRetryHook`].
    pub before_retry: Option<BeforeRetryHook>,
    /// Suppress per-attempt diagnostic events.
    pub silent: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            agent: None,
            redirect: RedirectMode::default(),
            retry: DEFAULT_RETRY,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            pause_ms: None,
            retry_on_response: ResponsePolicy::default(),
            before_retry: None,
            silent: false,
        }
    }
}

impl FetchOptions {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Appends one request header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replaces the whole header map.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Routes the call through a caller-supplied `reqwest` client.
    pub fn with_agent(mut self, agent: reqwest::Client) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Sets redirect handling.
    pub fn with_redirect(mut self, redirect: RedirectMode) -> Self {
        self.redirect = redirect;
        self
    }

    /// Sets the number of additional attempts beyond the first.
    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the per-attempt deadline in milliseconds.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Sets the pause between attempts in milliseconds.
    pub fn with_pause_ms(mut self, pause_ms: u64) -> Self {
        self.pause_ms = Some(pause_ms);
        self
    }

    /// Sets the response retry policy.
    pub fn retry_on_response(mut self, policy: ResponsePolicy) -> Self {
        self.retry_on_response = policy;
        self
    }

    /// Installs a before-retry hook.
    pub fn before_retry(
        mut self,
        hook: impl Fn(u32, &FetchError) -> Option<RequestOverride> + Send + Sync + 'static,
    ) -> Self {
        self.before_retry = Some(Arc::new(hook));
        self
    }

    /// Suppresses per-attempt diagnostic events.
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(FetchError::Config(
                "timeout_ms must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .field("agent", &self.agent.is_some())
            .field("redirect", &self.redirect)
            .field("retry", &self.retry)
            .field("timeout_ms", &self.timeout_ms)
            .field("pause_ms", &self.pause_ms)
            .field("retry_on_response", &self.retry_on_response)
            .field("before_retry", &self.before_retry.is_some())
            .field("silent", &self.silent)
            .finish()
    }
}
