// SPDX-License-Identifier: MIT
//! # frame-scale: Fixed-Canvas RGB Scaling for Projector Framebuffers
//!
//! This crate turns an arbitrarily sized RGB8 image into an RGB8 image of an exact
//! target size, either stretched to fill it or letterboxed inside it. The output is
//! always tightly packed (`width * 3` bytes per row); row padding for the device is
//! applied later by the caller's encoder.
//!
//! ## Key Components
//!
//! - [`plan`]: Output geometry computation (`build_plan`) for stretch and letterbox fits
//! - [`cpu`]: SIMD resampling on `fast_image_resize`, plus a clipped blit for offsets
//!
//! ## Usage Example
//!
//! ```rust
//! use frame_scale::cpu::scale_rgb_cpu;
//! use frame_scale::plan::{build_plan, AspectMode, Filter, Size};
//!
//! let input = Size { w: 1920, h: 1080 };
//! let target = Size { w: 800, h: 600 };
//! let plan = build_plan(input, target, AspectMode::Letterbox);
//! assert_eq!(plan.dst_roi, Some((0, 75, 800, 450)));
//!
//! let src = vec![200u8; 1920 * 1080 * 3];
//! let mut dst = vec![0u8; 800 * 600 * 3];
//! let mut resizer = fast_image_resize::Resizer::new();
//! scale_rgb_cpu(&mut resizer, &src, input, &plan, Filter::Bilinear, &mut dst).unwrap();
//! ```

pub mod cpu;
pub mod plan;
