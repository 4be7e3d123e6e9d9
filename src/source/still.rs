//! Still-image providers: local files and http(s) downloads.
//!
//! Decoding goes through the `image` crate and always lands in RGB8, so
//! palette, grey and alpha inputs all arrive as plain [`Frame`]s.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{FrameSource, blocking};
use crate::error::{ProjectorError, ProjectorResult};
use crate::frame::Frame;

/// Network timeout for remote images.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Decode an encoded image (PNG, JPEG, ...) into an RGB frame.
pub fn decode_bytes(origin: &str, bytes: &[u8]) -> ProjectorResult<Frame> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| ProjectorError::source_unavailable(origin, format!("decode failed: {}", e)))?;
    Frame::from_image(decoded.to_rgb8())
}

/// Image file on disk. Re-read on every acquisition so edits show up in loops.
#[derive(Debug, Clone)]
pub struct LocalImageSource {
    path: PathBuf,
}

impl LocalImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FrameSource for LocalImageSource {
    async fn acquire(&mut self) -> ProjectorResult<Frame> {
        let path = self.path.clone();
        let origin = self.name();
        let label = origin.clone();
        blocking(&label, move || {
            let bytes = std::fs::read(&path)
                .map_err(|e| ProjectorError::source_unavailable(origin.clone(), e))?;
            let frame = decode_bytes(&origin, &bytes)?;
            info!(
                "Loaded {} ({}x{})",
                path.display(),
                frame.width(),
                frame.height()
            );
            Ok(frame)
        })
        .await
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}

/// Image fetched over http(s).
#[derive(Debug, Clone)]
pub struct RemoteImageSource {
    url: String,
    client: reqwest::Client,
}

impl RemoteImageSource {
    /// Fails with `SourceUnavailable` when the HTTP client cannot be set up.
    pub fn new(url: impl Into<String>) -> ProjectorResult<Self> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| ProjectorError::source_unavailable(url.as_str(), e))?;
        Ok(Self { url, client })
    }

    async fn download(&self) -> Result<Vec<u8>, reqwest::Error> {
        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl FrameSource for RemoteImageSource {
    async fn acquire(&mut self) -> ProjectorResult<Frame> {
        debug!("Downloading {}", self.url);
        let bytes = self
            .download()
            .await
            .map_err(|e| ProjectorError::source_unavailable(self.url.clone(), e))?;
        info!("Downloaded {} bytes from {}", bytes.len(), self.url);

        let origin = self.url.clone();
        blocking(&self.url, move || decode_bytes(&origin, &bytes)).await
    }

    fn name(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &std::path::Path, w: u32, h: u32) -> PathBuf {
        let path = dir.join("fixture.png");
        let img = image::RgbImage::from_fn(w, h, |x, y| image::Rgb([x as u8, y as u8, 200]));
        img.save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn test_local_png_loads_as_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), 12, 7);
        let mut source = LocalImageSource::new(&path);
        let frame = source.acquire().await.unwrap();
        assert_eq!((frame.width(), frame.height()), (12, 7));
        assert_eq!(frame.pixel(3, 5), [3, 5, 200]);
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let mut source = LocalImageSource::new("/no/such/picture.png");
        assert!(matches!(
            source.acquire().await,
            Err(ProjectorError::SourceUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_refused_download_is_unavailable() {
        let mut source = RemoteImageSource::new("http://127.0.0.1:1/frame.png").unwrap();
        assert_eq!(source.name(), "http://127.0.0.1:1/frame.png");
        assert!(matches!(
            source.acquire().await,
            Err(ProjectorError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_garbage_does_not_decode() {
        let err = decode_bytes("blob", b"definitely not an image").unwrap_err();
        assert!(matches!(err, ProjectorError::SourceUnavailable { .. }));
    }
}
