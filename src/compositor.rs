//! # Compositor
//!
//! Maps a source [`Frame`] of any size onto an exact device resolution.
//!
//! - `ExactFit` stretches the source over the whole target.
//! - `AspectFit` scales by `min(W / srcW, H / srcH)`, rounds the scaled size,
//!   centres it with floor division and leaves a black border.
//!
//! Resampling runs on `frame-scale` (fast_image_resize). The filter is a
//! tunable, not part of the layout contract.

use fast_image_resize::Resizer;
use frame_scale::cpu::{blit_rgb, scale_rgb_cpu};
use frame_scale::plan::{Filter, Size, build_plan};
use tracing::debug;

use crate::config::FitPolicy;
use crate::error::ProjectorResult;
use crate::frame::{CHANNELS, Frame, check_dimensions};

/// Manual size correction applied inside the device canvas.
///
/// The picture is fitted into `(W + dx) x (H + dy)` and that box is centred on
/// the `W x H` canvas. Negative values shrink the picture and add a black margin,
/// positive values enlarge it and crop at the right and bottom edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

impl Offset {
    pub fn is_zero(self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

/// Stateful resizer. Reusing one across calls keeps fast_image_resize's
/// scratch buffers warm.
pub struct Compositor {
    resizer: Resizer,
    filter: Filter,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(Filter::default())
    }
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor").field("filter", &self.filter).finish()
    }
}

impl Compositor {
    pub fn new(filter: Filter) -> Self {
        Self {
            resizer: Resizer::new(),
            filter,
        }
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// Produce a new frame of exactly `target_w x target_h`.
    pub fn resize(
        &mut self,
        frame: &Frame,
        target_w: u32,
        target_h: u32,
        fit: FitPolicy,
    ) -> ProjectorResult<Frame> {
        check_dimensions(target_w, target_h)?;
        let target = Size {
            w: target_w,
            h: target_h,
        };
        let plan = build_plan(frame.size(), target, fit.aspect_mode());
        debug!(
            "Resizing {}x{} -> {}x{} ({}, content {:?})",
            frame.width(),
            frame.height(),
            target_w,
            target_h,
            fit,
            plan.content()
        );

        let mut out = vec![0u8; target.area() * CHANNELS];
        scale_rgb_cpu(
            &mut self.resizer,
            frame.as_bytes(),
            frame.size(),
            &plan,
            self.filter,
            &mut out,
        )?;
        Frame::from_rgb(target_w, target_h, out)
    }

    /// [`resize`](Self::resize) with a manual size correction.
    pub fn resize_with_offset(
        &mut self,
        frame: &Frame,
        target_w: u32,
        target_h: u32,
        fit: FitPolicy,
        offset: Offset,
    ) -> ProjectorResult<Frame> {
        check_dimensions(target_w, target_h)?;
        if offset.is_zero() {
            return self.resize(frame, target_w, target_h, fit);
        }

        let inner_w = (i64::from(target_w) + i64::from(offset.dx)).max(1);
        let inner_h = (i64::from(target_h) + i64::from(offset.dy)).max(1);
        let inner = self.resize(frame, inner_w as u32, inner_h as u32, fit)?;

        let x = ((i64::from(target_w) - inner_w) / 2).max(0) as u32;
        let y = ((i64::from(target_h) - inner_h) / 2).max(0) as u32;
        let canvas_size = Size {
            w: target_w,
            h: target_h,
        };
        let mut canvas = vec![0u8; canvas_size.area() * CHANNELS];
        blit_rgb(inner.as_bytes(), inner.size(), &mut canvas, canvas_size, x, y);
        Frame::from_rgb(target_w, target_h, canvas)
    }
}

/// One-shot resize with the default filter.
pub fn resize(frame: &Frame, target_w: u32, target_h: u32, fit: FitPolicy) -> ProjectorResult<Frame> {
    Compositor::default().resize(frame, target_w, target_h, fit)
}
