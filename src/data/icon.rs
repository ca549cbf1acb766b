//! Weather icon fetching and decoding
//!
//! Fetches the icon URL extracted from a parsed observation and decodes the
//! bytes into a displayable bitmap. Decode failure is distinguished from
//! transport failure so the presentation layer can show a placeholder icon
//! specifically when the image itself is corrupt.

use std::time::Duration;

use image::RgbaImage;
use reqwest::{Client, Url};
use tracing::debug;

use crate::error::FetchError;

/// A decoded weather icon, owned until handed to the presentation sink
#[derive(Debug, Clone)]
pub struct IconAsset {
    /// Decoded RGBA pixel data
    pub image: RgbaImage,
}

impl IconAsset {
    /// Icon width in pixels
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Icon height in pixels
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Client for fetching and decoding weather icons
#[derive(Debug, Clone)]
pub struct IconClient {
    client: Client,
}

impl IconClient {
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

    /// Fetches the icon at `url` and decodes it
    ///
    /// Transport failures (connection, non-2xx, truncation) are reported as
    /// `Transport`; bytes that arrive intact but do not decode as an image
    /// are reported as `Decode`.
    pub async fn fetch(&self, url: &str) -> Result<IconAsset, FetchError> {
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
        let bytes = response.bytes().await.map_err(FetchError::transport)?;

        if !status.is_success() {
            return Err(FetchError::transport(format!(
                "icon request failed with status {status}"
            )));
        }

        let icon = decode_icon(&bytes)?;
        debug!(
            width = icon.width(),
            height = icon.height(),
            "icon decoded"
        );
        Ok(icon)
    }
}

/// Decodes raw image bytes into an [`IconAsset`]
///
/// The image format is guessed from the bytes; provider icons are typically
/// GIF or PNG.
pub fn decode_icon(bytes: &[u8]) -> Result<IconAsset, FetchError> {
    let image = image::load_from_memory(bytes)
        .map_err(|_| FetchError::Decode)?
        .to_rgba8();
    Ok(IconAsset { image })
}
