use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{redirect, Client, Method, Response, Url};
use tokio::time::{sleep, timeout};

use crate::{
    options::{FetchOptions, RedirectMode, RequestOverride},
    FetchError, Result,
};

/// Redirect hop limit applied when a call opts into [`RedirectMode::Follow`].
const MAX_REDIRECTS: usize = 10;

/// Executor for a single resilient HTTP request.
///
/// Attempts run strictly in sequence: each failure is folded into the retry
/// decision before the next attempt's request is built, so a before-retry
/// override always reaches the very next send. The executor is cheap to
/// clone and safe to share between concurrent calls; all per-call state is
/// confined to the [`RetryClient::fetch`] future.
#[derive(Clone, Debug)]
pub struct RetryClient {
    http: Client,
}

impl RetryClient {
    /// Creates an executor whose transport does not follow redirects.
    ///
    /// Redirect responses are returned to the caller so the target stays
    /// visible; opt into following per call with [`RedirectMode::Follow`].
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .map_err(FetchError::Transport)?;
        Ok(Self { http })
    }

    /// Wraps an existing `reqwest` client.
    ///
    /// The client's own redirect policy stays in effect for calls that do
    /// not request [`RedirectMode::Follow`]; the manual-redirect safety
    /// default only applies to transports built by [`RetryClient::new`].
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    /// Sends a request to `url` with bounded retries and returns the first
    /// response accepted by the response policy, or the last observed
    /// failure once attempts are exhausted.
    ///
    /// A retry count of zero performs exactly one attempt. Responses the
    /// policy accepts are returned as-is, whatever their status code;
    /// callers inspect the status themselves if they care.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fetch_retry_http::{FetchOptions, RetryClient};
    ///
    /// # async fn run() -> fetch_retry_http::Result<()> {
    /// let client = RetryClient::new()?;
    /// let response = client
    ///     .fetch("https://example.com/health", FetchOptions::default().with_retry(3))
    ///     .await?;
    /// println!("{}", response.status());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fetch(&self, url: impl AsRef<str>, options: FetchOptions) -> Result<Response> {
        let url = url.as_ref();
        let url: Url = url
            .parse()
            .map_err(|err| FetchError::Config(format!("invalid url '{url}': {err}")))?;
        options.validate()?;

        let mut state = AttemptState {
            method: options.method.clone(),
            headers: options.headers.clone(),
            body: options.body.clone(),
            agent: options.agent.clone(),
            redirect: options.redirect,
        };
        // Built on first use when a call without an agent asks to follow
        // redirects, then reused across attempts.
        let mut follow_cache: Option<Client> = None;

        let mut attempts_left = options.retry.saturating_add(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            #[cfg(feature = "tracing")]
            if !options.silent {
                tracing::debug!(attempt, url = %url, "sending request");
            }

            let transport = self.resolve_transport(&state, &mut follow_cache)?;
            let error = match send_attempt(&transport, &url, &state, options.timeout_ms).await {
                Ok(response) => {
                    if !options.retry_on_response.wants_retry(&response) {
                        return Ok(response);
                    }
                    let status = response.status();
                    FetchError::Status {
                        status: status.as_u16(),
                        status_text: status.canonical_reason().unwrap_or_default().to_owned(),
                    }
                }
                Err(error) => error,
            };

            attempts_left -= 1;

            #[cfg(feature = "tracing")]
            if !options.silent {
                tracing::debug!(attempt, remaining = attempts_left, error = %error, "attempt failed");
            }

            // Invoked even after the final failure, matching the hook's
            // 1-based attempt count contract; the override is then moot.
            if let Some(hook) = &options.before_retry {
                if let Some(patch) = hook(attempt, &error) {
                    state = state.merged(patch);
                }
            }

            if attempts_left == 0 {
                return Err(error);
            }

            if let Some(pause_ms) = options.pause_ms {
                #[cfg(feature = "tracing")]
                if !options.silent {
                    tracing::debug!(pause_ms, "pausing before next attempt");
                }
                sleep(Duration::from_millis(pause_ms)).await;
            }
        }
    }

    fn resolve_transport(
        &self,
        state: &AttemptState,
        follow_cache: &mut Option<Client>,
    ) -> Result<Client> {
        if let Some(agent) = &state.agent {
            return Ok(agent.clone());
        }
        match state.redirect {
            RedirectMode::Manual => Ok(self.http.clone()),
            RedirectMode::Follow => match follow_cache {
                Some(client) => Ok(client.clone()),
                None => {
                    let client = Client::builder()
                        .redirect(redirect::Policy::limited(MAX_REDIRECTS))
                        .build()
                        .map_err(FetchError::Transport)?;
                    *follow_cache = Some(client.clone());
                    Ok(client)
                }
            },
        }
    }
}

/// One-shot convenience wrapper around [`RetryClient::fetch`].
///
/// Builds a fresh executor per call; prefer holding a [`RetryClient`] when
/// issuing many calls so the connection pool is reused.
///
/// # Example
///
/// ```no_run
/// use fetch_retry_http::{fetch, FetchOptions};
///
/// # async fn run() -> fetch_retry_http::Result<()> {
/// let response = fetch("https://example.com", FetchOptions::default()).await?;
/// println!("{} {}", response.status(), response.url());
/// # Ok(())
/// # }
/// ```
pub async fn fetch(url: impl AsRef<str>, options: FetchOptions) -> Result<Response> {
    RetryClient::new()?.fetch(url, options).await
}

/// Request snapshot for one attempt. Rebuilt as a new value whenever a
/// before-retry override merges, so per-call state stays isolated.
#[derive(Clone, Debug)]
struct AttemptState {
    method: Method,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    agent: Option<Client>,
    redirect: RedirectMode,
}

impl AttemptState {
    /// Shallow merge: present override fields replace this state's fields
    /// wholesale.
    fn merged(mut self, patch: RequestOverride) -> Self {
        if let Some(method) = patch.method {
            self.method = method;
        }
        if let Some(headers) = patch.headers {
            self.headers = headers;
        }
        if let Some(body) = patch.body {
            self.body = Some(body);
        }
        if let Some(agent) = patch.agent {
            self.agent = Some(agent);
        }
        if let Some(redirect) = patch.redirect {
            self.redirect = redirect;
        }
        self
    }
}

async fn send_attempt(
    transport: &Client,
    url: &Url,
    state: &AttemptState,
    timeout_ms: u64,
) -> Result<Response> {
    let mut request = transport
        .request(state.method.clone(), url.clone())
        .headers(state.headers.clone());
    if let Some(body) = &state.body {
        request = request.body(body.clone());
    }

    // The deadline future owns the in-flight send: dropping it on expiry
    // aborts the request, and no timer survives the attempt on any path.
    // Each attempt arms a fresh deadline.
    match timeout(Duration::from_millis(timeout_ms), request.send()).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(error)) => Err(FetchError::Transport(error)),
        Err(_) => Err(FetchError::Timeout { timeout_ms }),
    }
}
