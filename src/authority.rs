//! Request/response calls to the authoritative game service.

use async_trait::async_trait;
use derive_setters::Setters;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use strictly_wordgrid::{
    Glyph, LettersRequest, LettersResponse, ValidationRequest, ValidationResponse, Verdict,
};
use tracing::{debug, error, info, instrument, warn};

const VALIDATE_PATH: &str = "validate_board";
const LETTERS_PATH: &str = "get_letters";

/// The calls a session makes against the authority.
#[async_trait]
pub trait Authority: Send + Sync {
    /// Asks the authority whether the staged move forms valid words.
    async fn validate_move(&self, request: &ValidationRequest) -> Result<Verdict, AuthorityError>;

    /// Draws replenishment tiles for the local player.
    async fn request_tiles(&self, request: LettersRequest) -> Result<Vec<Glyph>, AuthorityError>;
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Setters)]
#[setters(prefix = "with_")]
pub struct RetryPolicy {
    /// Attempts per call, first one included.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on the delay between retries.
    pub max_backoff: Duration,
    /// Also retry calls that are not safe to repeat once they reached the server.
    pub retry_non_idempotent: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
            retry_non_idempotent: false,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Error from a call to the authority.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum AuthorityError {
    /// The call could not complete: connection, timeout or server error.
    #[display("Authority unreachable after {attempts} attempt(s): {message}")]
    Network {
        /// Attempts made.
        attempts: u32,
        /// Last failure.
        message: String,
    },

    /// The authority refused the request.
    #[display("Authority answered {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The response body was not what the protocol promises.
    #[display("Malformed authority response: {}", _0)]
    Decode(String),

    /// The configured base URL is unusable.
    #[display("Invalid authority URL: {}", _0)]
    InvalidUrl(String),
}

impl std::error::Error for AuthorityError {}

impl AuthorityError {
    /// Whether trying again later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AuthorityError::Network { .. } => true,
            AuthorityError::Status { status, .. } => *status >= 500,
            AuthorityError::Decode(_) | AuthorityError::InvalidUrl(_) => false,
        }
    }
}

/// Whether repeating a call is harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Idempotency {
    Idempotent,
    NonIdempotent,
}

/// [`Authority`] over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpAuthority {
    client: reqwest::Client,
    base_url: reqwest::Url,
    retry: RetryPolicy,
}

impl HttpAuthority {
    /// Creates a client for the authority at `base_url`.
    ///
    /// # Errors
    ///
    /// [`AuthorityError::InvalidUrl`] if the URL does not parse or is not
    /// http(s); [`AuthorityError::Network`] if the HTTP client cannot be built.
    #[instrument(skip(retry))]
    pub fn new(
        base_url: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, AuthorityError> {
        // A trailing slash makes `join` append rather than replace the last segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = reqwest::Url::parse(&normalized)
            .map_err(|e| AuthorityError::InvalidUrl(format!("{normalized}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(AuthorityError::InvalidUrl(format!(
                "unsupported scheme {}",
                base_url.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthorityError::Network {
                attempts: 0,
                message: e.to_string(),
            })?;

        info!(url = %base_url, "Authority client ready");
        Ok(Self {
            client,
            base_url,
            retry,
        })
    }

    /// Base URL calls are made against.
    pub fn base_url(&self) -> &reqwest::Url {
        &self.base_url
    }

    #[instrument(skip(self, body), fields(url = %self.base_url))]
    async fn post_json<B, R>(
        &self,
        path: &str,
        body: &B,
        idempotency: Idempotency,
    ) -> Result<R, AuthorityError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| AuthorityError::InvalidUrl(e.to_string()))?;
        let may_repeat =
            idempotency == Idempotency::Idempotent || self.retry.retry_non_idempotent;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let last = attempt >= self.retry.max_attempts;
            debug!(attempt, path, "Sending authority request");

            match self.client.post(url.clone()).json(body).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<R>().await.map_err(|e| {
                            error!(error = %e, "Failed to decode authority response");
                            AuthorityError::Decode(e.to_string())
                        });
                    }
                    let body = response.text().await.unwrap_or_default();
                    if status.is_server_error() && may_repeat && !last {
                        let delay = self.retry.backoff(attempt);
                        warn!(status = status.as_u16(), ?delay, "Authority server error, retrying");
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    if status.is_server_error() {
                        return Err(AuthorityError::Network {
                            attempts: attempt,
                            message: format!("{status}: {body}"),
                        });
                    }
                    return Err(AuthorityError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(e) => {
                    // A refused connection never reached the server, so even
                    // non-idempotent calls are safe to repeat.
                    let repeatable = may_repeat || e.is_connect();
                    if repeatable && !last {
                        let delay = self.retry.backoff(attempt);
                        warn!(error = %e, ?delay, "Authority request failed, retrying");
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    error!(error = %e, attempts = attempt, "Authority request failed");
                    return Err(AuthorityError::Network {
                        attempts: attempt,
                        message: e.to_string(),
                    });
                }
            }
        }
    }
}

#[async_trait]
impl Authority for HttpAuthority {
    #[instrument(skip(self, request), fields(placed = request.placed_letters.len()))]
    async fn validate_move(&self, request: &ValidationRequest) -> Result<Verdict, AuthorityError> {
        let response: ValidationResponse = self
            .post_json(VALIDATE_PATH, request, Idempotency::Idempotent)
            .await?;
        info!(verdict = ?response.message, "Move validated");
        Ok(response.message)
    }

    #[instrument(skip(self))]
    async fn request_tiles(&self, request: LettersRequest) -> Result<Vec<Glyph>, AuthorityError> {
        let response: LettersResponse = self
            .post_json(LETTERS_PATH, &request, Idempotency::NonIdempotent)
            .await?;
        info!(count = response.letters.len(), "Received replenishment tiles");
        Ok(response.letters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default()
            .with_initial_backoff(Duration::from_millis(100))
            .with_max_backoff(Duration::from_millis(350));
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(350));
        assert_eq!(policy.backoff(40), Duration::from_millis(350));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let err = HttpAuthority::new("ftp://example.com", Duration::from_secs(1), RetryPolicy::default())
            .unwrap_err();
        assert!(matches!(err, AuthorityError::InvalidUrl(_)));
    }

    #[test]
    fn test_base_url_gains_trailing_slash() {
        let authority = HttpAuthority::new(
            "http://127.0.0.1:5000/api",
            Duration::from_secs(1),
            RetryPolicy::default(),
        )
        .unwrap();
        assert_eq!(authority.base_url().as_str(), "http://127.0.0.1:5000/api/");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(AuthorityError::Network { attempts: 3, message: "timeout".into() }.is_retryable());
        assert!(AuthorityError::Status { status: 503, body: String::new() }.is_retryable());
        assert!(!AuthorityError::Status { status: 400, body: String::new() }.is_retryable());
        assert!(!AuthorityError::Decode("eof".into()).is_retryable());
    }
}
