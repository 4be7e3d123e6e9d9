//! # Frame
//!
//! An immutable, tightly packed RGB8 pixel grid. Channel 0 is red, 1 is green,
//! 2 is blue. Pixel data sits behind an `Arc`, so handing a frame to the resize
//! cache or to several trials never copies it.

use std::sync::Arc;

use frame_scale::plan::Size;

use crate::error::{ProjectorError, ProjectorResult};

/// Bytes per pixel in a frame and in the encoded device format.
pub const CHANNELS: usize = 3;

/// Rectangular RGB8 pixel grid tagged with its dimensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Arc<Vec<u8>>,
}

impl Frame {
    /// Wrap row-major RGB bytes. Fails on a zero side or a length that is not
    /// `width * height * 3`.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> ProjectorResult<Self> {
        check_dimensions(width, height)?;
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(ProjectorError::config(
                "frame",
                format!(
                    "{}x{} RGB frame needs {} bytes, got {}",
                    width,
                    height,
                    expected,
                    data.len()
                ),
            ));
        }
        Ok(Self {
            width,
            height,
            data: Arc::new(data),
        })
    }

    /// Frame of a single colour.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> ProjectorResult<Self> {
        check_dimensions(width, height)?;
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * CHANNELS)
            .collect();
        Self::from_rgb(width, height, data)
    }

    /// All-black frame, used as the letterbox canvas.
    pub fn black(width: u32, height: u32) -> ProjectorResult<Self> {
        Self::filled(width, height, [0, 0, 0])
    }

    /// Build a frame by evaluating `f(x, y)` for every pixel in row-major order.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> [u8; 3],
    ) -> ProjectorResult<Self> {
        check_dimensions(width, height)?;
        let mut data = Vec::with_capacity(width as usize * height as usize * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self::from_rgb(width, height, data)
    }

    /// Take ownership of a decoded `image` buffer.
    pub fn from_image(image: image::RgbImage) -> ProjectorResult<Self> {
        let (width, height) = image.dimensions();
        Self::from_rgb(width, height, image.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size {
            w: self.width,
            h: self.height,
        }
    }

    /// Packed RGB bytes, `width * 3` per row.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Packed RGB bytes of row `y`.
    pub fn row(&self, y: u32) -> &[u8] {
        let pitch = self.width as usize * CHANNELS;
        let start = y as usize * pitch;
        &self.data[start..start + pitch]
    }

    /// RGB value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

pub(crate) fn check_dimensions(width: u32, height: u32) -> ProjectorResult<()> {
    if width == 0 || height == 0 {
        return Err(ProjectorError::InvalidDimensions { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_sides() {
        assert!(matches!(
            Frame::black(0, 10),
            Err(ProjectorError::InvalidDimensions { width: 0, height: 10 })
        ));
        assert!(Frame::from_rgb(3, 0, Vec::new()).is_err());
    }

    #[test]
    fn rejects_wrong_length() {
        let err = Frame::from_rgb(2, 2, vec![0; 11]).unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn from_fn_is_row_major() {
        let frame = Frame::from_fn(3, 2, |x, y| [x as u8, y as u8, 7]).unwrap();
        assert_eq!(frame.pixel(2, 1), [2, 1, 7]);
        assert_eq!(frame.row(1), &[0, 1, 7, 1, 1, 7, 2, 1, 7]);
    }

    #[test]
    fn clones_share_pixels() {
        let frame = Frame::filled(4, 4, [1, 2, 3]).unwrap();
        let copy = frame.clone();
        assert!(std::ptr::eq(frame.as_bytes(), copy.as_bytes()));
    }
}
