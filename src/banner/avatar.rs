//! Avatar acquisition.
//!
//! One HTTP GET per render with a caller-supplied timeout and no retries. A
//! non-2xx status, a transport error, an oversized or undecodable body, or an
//! elapsed timeout all surface as a typed [`FetchError`].

use super::canvas::decode_image;
use super::error::FetchError;
use crate::constants::MAX_AVATAR_BYTES;
use async_trait::async_trait;
use image::DynamicImage;
use std::time::Duration;

/// Raw avatar bytes and their decoded raster.
#[derive(Clone)]
pub struct AvatarImage {
    pub bytes: Vec<u8>,
    pub image: DynamicImage,
}

impl std::fmt::Debug for AvatarImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvatarImage")
            .field("bytes", &self.bytes.len())
            .field("dimensions", &(self.image.width(), self.image.height()))
            .finish()
    }
}

impl AvatarImage {
    /// Decode `bytes` into an avatar.
    pub fn decode(bytes: Vec<u8>) -> Result<Self, FetchError> {
        let image = decode_image(&bytes).map_err(|e| FetchError::decode(e.to_string()))?;
        Ok(Self { bytes, image })
    }
}

/// Source of member avatars.
#[async_trait]
pub trait AvatarFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<AvatarImage, FetchError>;
}

/// `reqwest`-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpAvatarFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpAvatarFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("imgwelcome/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::http(None, format!("failed to create HTTP client: {e}")))?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            max_bytes: MAX_AVATAR_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http(
                Some(status.as_u16()),
                format!("avatar request returned {status}"),
            ));
        }

        if let Some(length) = response.content_length() {
            if length as usize > self.max_bytes {
                return Err(FetchError::decode(format!(
                    "avatar body of {length} bytes exceeds limit of {}",
                    self.max_bytes
                )));
            }
        }

        let body = response.bytes().await.map_err(classify)?;
        if body.len() > self.max_bytes {
            return Err(FetchError::decode(format!(
                "avatar body of {} bytes exceeds limit of {}",
                body.len(),
                self.max_bytes
            )));
        }

        Ok(body.to_vec())
    }
}

#[async_trait]
impl AvatarFetcher for HttpAvatarFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<AvatarImage, FetchError> {
        let bytes = tokio::time::timeout(timeout, self.download(url))
            .await
            .map_err(|_| {
                FetchError::timeout(format!("no avatar after {}ms", timeout.as_millis()))
            })??;

        tokio::task::spawn_blocking(move || AvatarImage::decode(bytes))
            .await
            .map_err(|e| FetchError::decode(format!("decode task failed: {e}")))?
    }
}

fn classify(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::timeout(error.to_string())
    } else {
        FetchError::http(error.status().map(|s| s.as_u16()), error.to_string())
    }
}
