//! Remote image loading with ordered fallbacks
//!
//! A load walks `Direct -> BufferedFetch -> Relay` and stops at the first tier
//! that yields a decoded image. Every failure is absorbed: the caller gets
//! either pixels or `LoadedImage::Unavailable`, never an error.
//!
//! The buffered tier touches the filesystem, so its write and decode run on
//! tokio's blocking pool.

use std::io::Write;

use async_trait::async_trait;
use image::{ImageFormat, ImageReader, RgbaImage};
use thiserror::Error;

pub const DEFAULT_RELAY_BASE: &str = "https://images.weserv.nl/";

/// Edge length the relay is asked to cover-fit images to
const RELAY_SIZE: u32 = 512;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("buffer error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("no decoder for content type {0:?}")]
    UnknownFormat(Option<String>),

    #[error("decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Raw response body plus its declared content type
#[derive(Debug, Clone)]
pub struct FetchedBytes {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedBytes, FetchError>;
}

#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedBytes, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16() });
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
        let bytes = response.bytes().await?.to_vec();
        Ok(FetchedBytes { content_type, bytes })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTier {
    /// Decode the response in memory using its declared content type
    Direct,
    /// Spill the bytes to a temporary file and sniff the format from them
    BufferedFetch,
    /// Ask the public relay for a 512x512 cover-fit copy
    Relay,
}

#[derive(Debug)]
pub enum LoadedImage {
    Decoded { image: RgbaImage, tier: LoadTier },
    Unavailable,
}

impl LoadedImage {
    pub fn image(&self) -> Option<&RgbaImage> {
        match self {
            LoadedImage::Decoded { image, .. } => Some(image),
            LoadedImage::Unavailable => None,
        }
    }

    pub fn tier(&self) -> Option<LoadTier> {
        match self {
            LoadedImage::Decoded { tier, .. } => Some(*tier),
            LoadedImage::Unavailable => None,
        }
    }
}

enum LoadState {
    Direct,
    BufferedFetch,
    Relay,
    Resolved(RgbaImage, LoadTier),
    Unavailable,
}

pub struct ImageLoader<F = HttpFetcher> {
    fetcher: F,
    relay_base: String,
}

impl<F: ImageFetcher> ImageLoader<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            relay_base: DEFAULT_RELAY_BASE.to_string(),
        }
    }

    pub fn with_relay_base(mut self, relay_base: impl Into<String>) -> Self {
        self.relay_base = relay_base.into();
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Relay URL for `url`: scheme stripped, percent-encoded, 512x512 cover fit
    pub fn relay_url(&self, url: &str) -> String {
        format!(
            "{}?url={}&w={}&h={}&fit=cover",
            self.relay_base,
            urlencoding::encode(strip_scheme(url)),
            RELAY_SIZE,
            RELAY_SIZE
        )
    }

    pub async fn load(&self, url: Option<&str>) -> LoadedImage {
        let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
            return LoadedImage::Unavailable;
        };

        let mut state = LoadState::Direct;
        loop {
            state = match state {
                LoadState::Direct => match self.load_direct(url).await {
                    Ok(image) => LoadState::Resolved(image, LoadTier::Direct),
                    Err(e) => {
                        tracing::debug!(url, error = %e, "Direct image load failed");
                        LoadState::BufferedFetch
                    }
                },
                LoadState::BufferedFetch => match self.load_buffered(url).await {
                    Ok(image) => LoadState::Resolved(image, LoadTier::BufferedFetch),
                    Err(e) => {
                        tracing::debug!(url, error = %e, "Buffered image load failed");
                        LoadState::Relay
                    }
                },
                LoadState::Relay => match self.load_relay(url).await {
                    Ok(image) => LoadState::Resolved(image, LoadTier::Relay),
                    Err(e) => {
                        tracing::debug!(url, error = %e, "Relay image load failed");
                        LoadState::Unavailable
                    }
                },
                LoadState::Resolved(image, tier) => {
                    tracing::debug!(url, ?tier, "Image loaded");
                    return LoadedImage::Decoded { image, tier };
                }
                LoadState::Unavailable => {
                    tracing::debug!(url, "Image unavailable, placeholder will be drawn");
                    return LoadedImage::Unavailable;
                }
            };
        }
    }

    async fn load_direct(&self, url: &str) -> Result<RgbaImage, FetchError> {
        let fetched = self.fetcher.fetch(url).await?;
        let format = fetched
            .content_type
            .as_deref()
            .and_then(ImageFormat::from_mime_type)
            .ok_or_else(|| FetchError::UnknownFormat(fetched.content_type.clone()))?;
        Ok(image::load_from_memory_with_format(&fetched.bytes, format)?.to_rgba8())
    }

    async fn load_buffered(&self, url: &str) -> Result<RgbaImage, FetchError> {
        let fetched = self.fetcher.fetch(url).await?;
        tokio::task::spawn_blocking(move || decode_buffered(&fetched.bytes)).await?
    }

    async fn load_relay(&self, url: &str) -> Result<RgbaImage, FetchError> {
        let fetched = self.fetcher.fetch(&self.relay_url(url)).await?;
        Ok(image::load_from_memory(&fetched.bytes)?.to_rgba8())
    }
}

/// Spill `bytes` to a temporary file and decode it with the sniffed format
fn decode_buffered(bytes: &[u8]) -> Result<RgbaImage, FetchError> {
    let mut buffer = tempfile::NamedTempFile::new()?;
    buffer.write_all(bytes)?;
    buffer.flush()?;

    let decoded = ImageReader::open(buffer.path())
        .and_then(|reader| reader.with_guessed_format())
        .map_err(FetchError::from)
        .and_then(|reader| reader.decode().map_err(FetchError::from));
    // The temp file is removed here, before the outcome is inspected
    drop(buffer);

    Ok(decoded?.to_rgba8())
}

fn strip_scheme(url: &str) -> &str {
    for scheme in ["https://", "http://"] {
        if let Some(prefix) = url.get(..scheme.len()) {
            if prefix.eq_ignore_ascii_case(scheme) {
                return &url[scheme.len()..];
            }
        }
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scheme_case_insensitively() {
        assert_eq!(strip_scheme("https://cdn.example/a.jpg"), "cdn.example/a.jpg");
        assert_eq!(strip_scheme("HTTP://cdn.example/a.jpg"), "cdn.example/a.jpg");
        assert_eq!(strip_scheme("cdn.example/a.jpg"), "cdn.example/a.jpg");
    }

    #[test]
    fn buffered_decode_sniffs_format() {
        let image = RgbaImage::from_pixel(3, 2, image::Rgba([9, 8, 7, 255]));
        let mut png = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let decoded = decode_buffered(&png).unwrap();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert!(matches!(decode_buffered(b"not an image"), Err(FetchError::Decode(_))));
    }
}
