//! # Stride Projector
//!
//! Pushes pictures to a USB projector whose kernel driver reads raw frames
//! from a file, and finds out empirically what byte layout that driver
//! actually expects.
//!
//! ## Architecture
//!
//! ```text
//! source -> Frame -> Compositor -> device-sized Frame -> encoder -> EncodedBuffer -> sink
//!                        ^                                  ^
//!                        |                                  |
//!                 (width, height, fit)          (stride, channel order)
//! ```
//!
//! - `frame`: immutable RGB8 pixel grid
//! - `compositor`: exact-fit and aspect-fit resizing onto the device resolution
//! - `encoder`: row-stride encoding with zero padding and channel permutation
//! - `calibration`: candidate sweep with a human (or heuristic) picking the winner
//! - `config`: encoding layout plus the JSON store for the calibrated layout
//! - `source` / `sink`: the ends of the pipeline
//! - `display`: single-shot and mirroring loops for normal operation
//!
//! ## Example
//!
//! ```rust
//! use stride_projector::{EncodingConfig, Frame, encode, resize};
//!
//! # fn main() -> Result<(), stride_projector::ProjectorError> {
//! let config = EncodingConfig::default(); // 800x600, stride 2560, BGR
//! let picture = Frame::filled(1920, 1080, [255, 0, 0])?;
//! let fitted = resize(&picture, config.width, config.height, config.fit)?;
//! let buffer = encode(&fitted, &config)?;
//! assert_eq!(buffer.len(), 2560 * 600);
//! assert_eq!(&buffer.as_bytes()[..3], &[0, 0, 255]);
//! # Ok(())
//! # }
//! ```

pub mod calibration;
pub mod compositor;
pub mod config;
pub mod display;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod logging;
pub mod shutdown;
pub mod sink;
pub mod source;

/// Re-export error types for convenience
pub use error::{HasSeverity, ProjectorError, ProjectorResult, Recoverable};

pub use compositor::{Compositor, Offset, resize};
pub use config::{ChannelOrder, ConfigStore, EncodingConfig, FitPolicy};
pub use encoder::{EncodedBuffer, encode};
pub use frame::Frame;
pub use frame_scale::plan::Filter;
pub use shutdown::Shutdown;
pub use sink::{DeviceSink, FileSink};
