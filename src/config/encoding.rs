//! # Encoding Configuration
//!
//! The parameters that define the device framebuffer layout:
//!
//! | Parameter | Type | Constraint | Description |
//! |-----------|------|------------|-------------|
//! | `width` | `u32` | > 0 | Pixels per row on the device |
//! | `height` | `u32` | > 0 | Rows on the device |
//! | `stride` | `usize` | >= 3 * width, stride * height <= 64 MiB | Bytes allocated per row |
//! | `channel_order` | `ChannelOrder` | bijection | Source channel written at each byte slot |
//! | `fit` | `FitPolicy` | - | How the source is mapped onto width x height |
//!
//! The hardware never documented these values, so every variant of the old
//! tooling carried a different guess. They are data here, never code forks.
//!
//! ## Examples
//!
//! ```rust
//! use stride_projector::config::{ChannelOrder, EncodingConfig, FitPolicy};
//!
//! let config = EncodingConfig::default();
//! assert_eq!((config.width, config.height, config.stride), (800, 600, 2560));
//! assert_eq!(config.channel_order, ChannelOrder::REVERSE);
//! assert_eq!(config.padding(), 160);
//! assert_eq!(config.buffer_len(), 1_536_000);
//!
//! let odd = EncodingConfig::new(800, 600, 2562, ChannelOrder::IDENTITY, FitPolicy::AspectFit).unwrap();
//! assert_eq!(odd.padding(), 162);
//! ```

use std::fmt;
use std::str::FromStr;

use frame_scale::plan::AspectMode;
use serde::{Deserialize, Serialize};

use crate::error::{ProjectorError, ProjectorResult};
use crate::frame::CHANNELS;

/// Largest encoded frame accepted. Real layouts sit near 1.5 MiB.
pub const MAX_BUFFER_LEN: usize = 64 * 1024 * 1024;

/// Permutation from output byte position to source channel.
///
/// `indices()[i]` names the source channel (0 = red, 1 = green, 2 = blue)
/// written at byte `i` of each encoded pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ChannelOrderRepr", into = "ChannelOrderRepr")]
pub struct ChannelOrder([u8; 3]);

impl ChannelOrder {
    /// RGB.
    pub const IDENTITY: Self = Self([0, 1, 2]);
    /// BGR.
    pub const REVERSE: Self = Self([2, 1, 0]);
    /// Every permutation of three channels, identity first.
    pub const ALL: [Self; 6] = [
        Self([0, 1, 2]),
        Self([0, 2, 1]),
        Self([1, 0, 2]),
        Self([1, 2, 0]),
        Self([2, 0, 1]),
        Self([2, 1, 0]),
    ];

    /// Validate an explicit permutation.
    pub fn new(indices: [u8; 3]) -> ProjectorResult<Self> {
        let mut seen = [false; 3];
        for &i in &indices {
            if i > 2 || seen[i as usize] {
                return Err(ProjectorError::config(
                    "channel_order",
                    format!("{:?} is not a permutation of [0, 1, 2]", indices),
                ));
            }
            seen[i as usize] = true;
        }
        Ok(Self(indices))
    }

    pub fn indices(self) -> [u8; 3] {
        self.0
    }

    /// Reorder one RGB pixel into output byte order.
    #[inline]
    pub fn apply(self, rgb: [u8; 3]) -> [u8; 3] {
        [
            rgb[self.0[0] as usize],
            rgb[self.0[1] as usize],
            rgb[self.0[2] as usize],
        ]
    }

    /// The permutation that undoes this one.
    pub fn inverse(self) -> Self {
        let mut inv = [0u8; 3];
        for (pos, &src) in self.0.iter().enumerate() {
            inv[src as usize] = pos as u8;
        }
        Self(inv)
    }

    /// Lower-case channel letters in output order, e.g. `"bgr"`.
    pub fn name(self) -> String {
        self.0.iter().map(|&i| ['r', 'g', 'b'][i as usize]).collect()
    }
}

impl fmt::Display for ChannelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for ChannelOrder {
    type Err = ProjectorError;

    /// Accepts `identity`, `reverse`, or any arrangement of the letters `r`, `g`, `b`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "identity" => return Ok(Self::IDENTITY),
            "reverse" => return Ok(Self::REVERSE),
            _ => {}
        }
        if lower.len() != 3 {
            return Err(ProjectorError::config(
                "channel_order",
                format!("'{}' is not rgb, bgr, identity, reverse or a 3-letter permutation", s),
            ));
        }
        let mut indices = [0u8; 3];
        for (slot, c) in indices.iter_mut().zip(lower.chars()) {
            *slot = match c {
                'r' => 0,
                'g' => 1,
                'b' => 2,
                _ => {
                    return Err(ProjectorError::config(
                        "channel_order",
                        format!("unknown channel letter '{}' in '{}'", c, s),
                    ));
                }
            };
        }
        Self::new(indices)
    }
}

/// On-disk forms of a channel order: a name or explicit indices.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ChannelOrderRepr {
    Name(String),
    Indices([u8; 3]),
}

impl TryFrom<ChannelOrderRepr> for ChannelOrder {
    type Error = ProjectorError;

    fn try_from(repr: ChannelOrderRepr) -> Result<Self, Self::Error> {
        match repr {
            ChannelOrderRepr::Name(name) => name.parse(),
            ChannelOrderRepr::Indices(indices) => Self::new(indices),
        }
    }
}

impl From<ChannelOrder> for ChannelOrderRepr {
    fn from(order: ChannelOrder) -> Self {
        ChannelOrderRepr::Name(order.name())
    }
}

/// Resize policy for mapping a source frame onto the device resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum FitPolicy {
    /// Stretch to the target, aspect ratio ignored.
    #[default]
    #[serde(rename = "exact", alias = "Exact-fit", alias = "ExactFit", alias = "exact-fit")]
    #[value(name = "exact")]
    ExactFit,
    /// Scale uniformly, centre, and fill the border with black.
    #[serde(rename = "aspect", alias = "Aspect-fit", alias = "AspectFit", alias = "aspect-fit")]
    #[value(name = "aspect")]
    AspectFit,
}

impl FitPolicy {
    pub fn aspect_mode(self) -> AspectMode {
        match self {
            FitPolicy::ExactFit => AspectMode::Stretch,
            FitPolicy::AspectFit => AspectMode::Letterbox,
        }
    }
}

impl fmt::Display for FitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitPolicy::ExactFit => f.write_str("exact"),
            FitPolicy::AspectFit => f.write_str("aspect"),
        }
    }
}

/// A complete candidate (or confirmed) device framebuffer layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EncodingConfig {
    pub width: u32,
    pub height: u32,
    pub stride: usize,
    pub channel_order: ChannelOrder,
    pub fit: FitPolicy,
}

impl Default for EncodingConfig {
    /// The most commonly confirmed layout: 800x600, 2560 bytes per row, BGR,
    /// stretched.
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            stride: 2560,
            channel_order: ChannelOrder::REVERSE,
            fit: FitPolicy::ExactFit,
        }
    }
}

impl EncodingConfig {
    /// Creates a validated configuration.
    pub fn new(
        width: u32,
        height: u32,
        stride: usize,
        channel_order: ChannelOrder,
        fit: FitPolicy,
    ) -> ProjectorResult<Self> {
        let config = Self {
            width,
            height,
            stride,
            channel_order,
            fit,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks positive dimensions, `stride >= 3 * width` and that one
    /// encoded frame fits in [`MAX_BUFFER_LEN`].
    pub fn validate(&self) -> ProjectorResult<()> {
        crate::frame::check_dimensions(self.width, self.height)?;
        if self.stride < self.row_bytes() {
            return Err(ProjectorError::InvalidStride {
                stride: self.stride,
                width: self.width,
                minimum: self.row_bytes(),
            });
        }
        match self.stride.checked_mul(self.height as usize) {
            Some(len) if len <= MAX_BUFFER_LEN => Ok(()),
            _ => Err(ProjectorError::config(
                "stride",
                format!(
                    "{} bytes x {} rows exceeds the {} byte frame limit",
                    self.stride, self.height, MAX_BUFFER_LEN
                ),
            )),
        }
    }

    /// Bytes of pixel data per row.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// Zero bytes appended to each row.
    pub fn padding(&self) -> usize {
        self.stride.saturating_sub(self.row_bytes())
    }

    /// Exact encoded frame length. Saturates for layouts `validate` rejects.
    pub fn buffer_len(&self) -> usize {
        self.stride.saturating_mul(self.height as usize)
    }
}

impl fmt::Display for EncodingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} stride={} pad={} order={} fit={}",
            self.width,
            self.height,
            self.stride,
            self.padding(),
            self.channel_order,
            self.fit
        )
    }
}

/// Smallest multiple of `alignment` holding one packed row, plus `extra_blocks`
/// further blocks: `ceil(3w / a) * a + k * a`.
pub fn aligned_stride(width: u32, alignment: usize, extra_blocks: usize) -> usize {
    let row = width as usize * CHANNELS;
    row.div_ceil(alignment) * alignment + extra_blocks * alignment
}
