//! Linux framebuffer capture (`/dev/fb0`).
//!
//! The device is mapped read-only and the visible area is copied out as RGB.
//! Geometry is supplied by the caller; the fbdev ioctls are not queried.
//! A read that comes back entirely zero is treated as "nothing to show"
//! (blank console, compositor owning the screen) so a fallback provider can
//! take over.

use std::fs::File;
use std::path::PathBuf;

use async_trait::async_trait;
use memmap2::MmapOptions;
use tracing::trace;

use super::{FrameSource, blocking};
use crate::error::{ProjectorError, ProjectorResult};
use crate::frame::{CHANNELS, Frame, check_dimensions};

pub const DEFAULT_FRAMEBUFFER: &str = "/dev/fb0";

/// Pixel format of the framebuffer memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PixelLayout {
    /// 24bpp, bytes R G B
    Rgb24,
    /// 32bpp, bytes B G R X
    Bgra32,
}

impl PixelLayout {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Rgb24 => 3,
            PixelLayout::Bgra32 => 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FramebufferSource {
    path: PathBuf,
    width: u32,
    height: u32,
    layout: PixelLayout,
}

impl FramebufferSource {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32, layout: PixelLayout) -> Self {
        Self {
            path: path.into(),
            width,
            height,
            layout,
        }
    }

    fn read(&self) -> ProjectorResult<Frame> {
        check_dimensions(self.width, self.height)?;
        let origin = self.name();
        let len = self.width as usize * self.height as usize * self.layout.bytes_per_pixel();

        let file = File::open(&self.path)
            .map_err(|e| ProjectorError::source_unavailable(origin.clone(), e))?;
        let actual = file
            .metadata()
            .map(|m| m.len())
            .map_err(|e| ProjectorError::source_unavailable(origin.clone(), e))?;
        // Device nodes report zero length; only regular files can be checked up front.
        if actual != 0 && actual < len as u64 {
            return Err(ProjectorError::source_unavailable(
                origin,
                format!("insufficient data: {} bytes, need {}", actual, len),
            ));
        }

        // SAFETY: read-only mapping; concurrent writers only change pixel values.
        let map = unsafe { MmapOptions::new().len(len).map(&file) }
            .map_err(|e| ProjectorError::source_unavailable(origin.clone(), e))?;

        if map.iter().all(|&b| b == 0) {
            return Err(ProjectorError::source_unavailable(origin, "framebuffer is blank"));
        }

        let rgb = match self.layout {
            PixelLayout::Rgb24 => map.to_vec(),
            PixelLayout::Bgra32 => {
                let mut out = Vec::with_capacity(self.width as usize * self.height as usize * CHANNELS);
                for px in map.chunks_exact(4) {
                    out.extend_from_slice(&[px[2], px[1], px[0]]);
                }
                out
            }
        };
        trace!("Read {} bytes from {}", len, self.path.display());
        Frame::from_rgb(self.width, self.height, rgb)
    }
}

#[async_trait]
impl FrameSource for FramebufferSource {
    async fn acquire(&mut self) -> ProjectorResult<Frame> {
        let this = self.clone();
        blocking(&self.name(), move || this.read()).await
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fake_fb(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_bgra_is_swizzled() {
        let fb = fake_fb(&[30, 20, 10, 255, 3, 2, 1, 0]);
        let mut source = FramebufferSource::new(fb.path(), 2, 1, PixelLayout::Bgra32);
        let frame = source.acquire().await.unwrap();
        assert_eq!(frame.as_bytes(), &[10, 20, 30, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_rgb24_passes_through() {
        let fb = fake_fb(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
        let mut source = FramebufferSource::new(fb.path(), 2, 2, PixelLayout::Rgb24);
        let frame = source.acquire().await.unwrap();
        assert_eq!(frame.pixel(1, 1), [10, 11, 12]);
    }

    #[tokio::test]
    async fn test_blank_and_short_reads_are_unavailable() {
        let blank = fake_fb(&[0; 12]);
        let mut source = FramebufferSource::new(blank.path(), 2, 2, PixelLayout::Rgb24);
        assert!(matches!(
            source.acquire().await,
            Err(ProjectorError::SourceUnavailable { .. })
        ));

        let short = fake_fb(&[9; 5]);
        let mut source = FramebufferSource::new(short.path(), 2, 2, PixelLayout::Rgb24);
        assert!(matches!(
            source.acquire().await,
            Err(ProjectorError::SourceUnavailable { .. })
        ));
    }
}
