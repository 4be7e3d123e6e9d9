//! # Row-Stride Encoder
//!
//! Converts a device-sized [`Frame`] into the flat byte layout the projector
//! driver reads:
//!
//! ```text
//! row r: [ r*S            .. r*S + 3W )  pixel bytes, permuted per channel order
//!        [ r*S + 3W       .. (r+1)*S  )  zero padding
//! total: S * H bytes
//! ```
//!
//! The total length is load-bearing: the driver consumes exactly `S * H` bytes
//! and a short or long buffer shears every following row.

use tracing::trace;

use crate::config::{ChannelOrder, EncodingConfig};
use crate::error::{ProjectorError, ProjectorResult};
use crate::frame::{CHANNELS, Frame};

/// Encoded device frame. Length is always `stride * height`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedBuffer {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    stride: usize,
}

impl EncodedBuffer {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Zero bytes at the end of every row.
    pub fn padding(&self) -> usize {
        self.stride - self.width as usize * CHANNELS
    }

    /// The full `stride` bytes of row `r`.
    pub fn row(&self, r: u32) -> &[u8] {
        let start = r as usize * self.stride;
        &self.bytes[start..start + self.stride]
    }

    /// Pixel bytes of row `r`, without padding.
    pub fn row_pixels(&self, r: u32) -> &[u8] {
        &self.row(r)[..self.width as usize * CHANNELS]
    }

    /// Padding bytes of row `r`.
    pub fn row_padding(&self, r: u32) -> &[u8] {
        &self.row(r)[self.width as usize * CHANNELS..]
    }

    /// Reinterpret the buffer as a frame, assuming it was written with `order`.
    pub fn decode(&self, order: ChannelOrder) -> ProjectorResult<Frame> {
        let inverse = order.inverse();
        let mut data = Vec::with_capacity(self.width as usize * self.height as usize * CHANNELS);
        for r in 0..self.height {
            for px in self.row_pixels(r).chunks_exact(CHANNELS) {
                data.extend_from_slice(&inverse.apply([px[0], px[1], px[2]]));
            }
        }
        Frame::from_rgb(self.width, self.height, data)
    }
}

impl AsRef<[u8]> for EncodedBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Encode `frame` with the layout in `config`.
///
/// Fails with `DimensionMismatch` when the frame is not `config.width x
/// config.height`, and with `InvalidStride` when `config.stride < 3 * width`.
pub fn encode(frame: &Frame, config: &EncodingConfig) -> ProjectorResult<EncodedBuffer> {
    if frame.width() != config.width || frame.height() != config.height {
        return Err(ProjectorError::DimensionMismatch {
            expected_width: config.width,
            expected_height: config.height,
            actual_width: frame.width(),
            actual_height: frame.height(),
        });
    }
    config.validate()?;

    let row_bytes = config.row_bytes();
    let mut bytes = vec![0u8; config.buffer_len()];
    for (y, dst_row) in bytes.chunks_exact_mut(config.stride).enumerate() {
        let src = frame.row(y as u32);
        let dst = &mut dst_row[..row_bytes];
        if config.channel_order == ChannelOrder::IDENTITY {
            dst.copy_from_slice(src);
        } else {
            for (d, s) in dst.chunks_exact_mut(CHANNELS).zip(src.chunks_exact(CHANNELS)) {
                d.copy_from_slice(&config.channel_order.apply([s[0], s[1], s[2]]));
            }
        }
    }
    trace!("Encoded {} ({} bytes)", config, bytes.len());

    Ok(EncodedBuffer {
        bytes,
        width: config.width,
        height: config.height,
        stride: config.stride,
    })
}
