//! # Configuration Module
//!
//! Encoding layout parameters and the store that persists the calibrated layout.

pub mod encoding;
pub mod store;

pub use encoding::{ChannelOrder, EncodingConfig, FitPolicy, MAX_BUFFER_LEN, aligned_stride};
pub use store::{ConfigStore, DEFAULT_CONFIG_FILE};
