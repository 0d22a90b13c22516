//! Rate-limited HTTP plumbing shared by the source clients
//!
//! Each client owns one `SourceHttp`. Requests are spaced by a per-source
//! minimum interval, bounded by the configured timeout, and retried a bounded
//! number of times on transient failures.

use crate::config::HttpSettings;
use crate::error::SourceError;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;
use url::Url;

pub struct SourceHttp {
    name: &'static str,
    client: Client,
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
    attempts: u32,
    backoff: Duration,
}

impl SourceHttp {
    pub fn new(
        name: &'static str,
        settings: &HttpSettings,
        min_interval: Duration,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(concat!("compound-resolver/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            name,
            client,
            last_request: Mutex::new(None),
            min_interval,
            attempts: settings.attempts.max(1),
            backoff: settings.retry_backoff(),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Enforce rate limiting between requests
    async fn rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Send a request, retrying transport errors and 429/5xx responses
    async fn execute<F>(&self, build: F) -> Result<(StatusCode, String), SourceError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut attempt = 1;
        loop {
            self.rate_limit().await;

            let outcome = match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    response
                        .text()
                        .await
                        .map(|body| (status, body))
                        .map_err(SourceError::from)
                }
                Err(e) => Err(SourceError::from(e)),
            };

            let retryable = match &outcome {
                Ok((status, _)) => {
                    *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
                }
                Err(e) => e.is_transient(),
            };

            if !retryable || attempt >= self.attempts {
                return outcome;
            }

            tracing::debug!(
                source = self.name,
                attempt,
                "Transient failure, retrying after {:?}",
                self.backoff
            );
            sleep(self.backoff).await;
            attempt += 1;
        }
    }

    /// GET a JSON document. `Ok(None)` on 404.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<Option<T>, SourceError> {
        let (status, body) = self.execute(|| self.client.get(url.clone())).await?;
        decode_json(status, &body)
    }

    /// POST a JSON body and return the raw status and body
    pub async fn post_json_raw<B: Serialize + Sync>(
        &self,
        url: &Url,
        payload: &B,
    ) -> Result<(StatusCode, String), SourceError> {
        self.execute(|| self.client.post(url.clone()).json(payload))
            .await
    }
}

/// Map a response into `Ok(None)` (404), an error (other non-success) or a decoded body
pub fn decode_json<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<Option<T>, SourceError> {
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        });
    }
    Ok(Some(serde_json::from_str(body)?))
}

/// Join path segments onto a base URL, percent-encoding each segment
pub fn endpoint(base: &str, segments: &[&str]) -> Result<Url, SourceError> {
    let mut url = Url::parse(base.trim_end_matches('/'))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| SourceError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}
