//! Weather conditions endpoint client
//!
//! This module performs the primary HTTP fetch of the pipeline: a single GET
//! against the provider's conditions endpoint, returning the complete raw
//! body. Parsing is a separate concern (see [`crate::data::observation`]).

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use tracing::debug;

use crate::data::Position;
use crate::error::FetchError;

/// Complete response body of a conditions fetch
///
/// Owned transiently: handed to the parser and then released.
#[derive(Debug, Clone)]
pub struct RawPayload {
    /// The fully drained response body
    pub bytes: Vec<u8>,
    /// Content-Type header of the response, if present
    pub content_type: Option<String>,
}

/// Builds the provider conditions URL for a position
///
/// Latitude and longitude are formatted with `f64`'s `Display`, which always
/// uses `.` as the decimal separator regardless of locale.
pub fn conditions_url(host: &str, api_key: &str, position: Position) -> String {
    format!(
        "http://{}/api/{}/conditions/q/{},{}.json",
        host, api_key, position.latitude, position.longitude
    )
}

/// Client for fetching raw conditions payloads
#[derive(Debug, Clone)]
pub struct ConditionsClient {
    client: Client,
}

impl ConditionsClient {
    /// Creates a new client with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::transport)?;
        Ok(Self { client })
    }

    /// Creates a client around an existing reqwest `Client`
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Performs a single GET and returns the complete body
    ///
    /// A malformed URL fails fast with `InvalidUrl` before any network I/O.
    /// Connection failure, a non-2xx status, and a truncated body are all
    /// reported as `Transport` with an embedded cause. The body is fully
    /// drained on every path, so the underlying connection is always
    /// released back to the pool.
    pub async fn fetch(&self, url: &str) -> Result<RawPayload, FetchError> {
        let url = Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::transport)?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        // Drain before the status check so the connection is reusable even
        // on the error path.
        let bytes = response
            .bytes()
            .await
            .map_err(FetchError::transport)?
            .to_vec();

        if !status.is_success() {
            return Err(FetchError::transport(format!(
                "conditions request failed with status {}: {}",
                status,
                truncate_body(&bytes),
            )));
        }

        debug!(
            bytes = bytes.len(),
            content_type = content_type.as_deref().unwrap_or("unknown"),
            "conditions payload received"
        );

        Ok(RawPayload {
            bytes,
            content_type,
        })
    }
}

/// Renders at most the first 200 bytes of a body for error messages
fn truncate_body(bytes: &[u8]) -> String {
    const MAX: usize = 200;
    let text = String::from_utf8_lossy(bytes);
    if text.len() > MAX {
        format!("{}...", &text[..MAX])
    } else {
        text.to_string()
    }
}
