// SPDX-License-Identifier: MIT
//! # Scaling Plan Computation
//!
//! Computes where the scaled source lands inside a fixed output canvas.
//!
//! - **Stretch**: the source fills the whole canvas, aspect ratio ignored.
//! - **Letterbox**: the source is scaled uniformly by
//!   `min(out.w / in.w, out.h / in.h)`, rounded to whole pixels and centred with
//!   floor division. The uncovered border is left for the caller to fill.
//!
//! Unlike a thumbnailing plan, letterboxing here scales up as well as down: the
//! projector canvas is fixed, so a small source must grow to meet it.

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    /// Number of pixels covered by this size.
    pub fn area(self) -> usize {
        self.w as usize * self.h as usize
    }
}

/// Defines how aspect ratio differences are handled during scaling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AspectMode {
    /// Stretch/squeeze the source to exactly match the canvas.
    Stretch,
    /// Keep the source aspect ratio and centre it; border stays background.
    Letterbox,
}

/// Resampling kernel used by the CPU scaler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Filter {
    /// Lanczos3 convolution. Sharpest, slowest.
    #[default]
    Lanczos3,
    /// Bilinear convolution.
    Bilinear,
    /// Nearest neighbour. Fast path for live mirroring.
    Nearest,
}

/// Complete scaling plan computed from input parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScalePlan {
    /// Original input dimensions
    pub input: Size,
    /// Final canvas dimensions
    pub out: Size,
    /// Aspect ratio handling strategy
    pub aspect: AspectMode,
    /// Sub-rectangle `(x, y, width, height)` receiving the scaled source when it
    /// does not cover the whole canvas.
    pub dst_roi: Option<(u32, u32, u32, u32)>,
}

impl ScalePlan {
    /// Size of the region the source is resampled into.
    pub fn content(&self) -> Size {
        match self.dst_roi {
            Some((_, _, w, h)) => Size { w, h },
            None => self.out,
        }
    }

    /// True when the source maps one-to-one onto the canvas.
    pub fn is_identity(&self) -> bool {
        self.dst_roi.is_none() && self.input == self.out
    }
}

/// Compute a scaling plan for placing `input` onto an `out` canvas.
///
/// Both sizes must be non-zero; callers validate dimensions before planning.
pub fn build_plan(input: Size, out: Size, aspect: AspectMode) -> ScalePlan {
    match aspect {
        AspectMode::Stretch => ScalePlan {
            input,
            out,
            aspect,
            dst_roi: None,
        },
        AspectMode::Letterbox => {
            let (rw, rh) = fit_within(input, out);
            let dst_roi = if (rw, rh) == (out.w, out.h) {
                None
            } else {
                Some(((out.w - rw) / 2, (out.h - rh) / 2, rw, rh))
            };
            ScalePlan {
                input,
                out,
                aspect,
                dst_roi,
            }
        }
    }
}

/// Fit `input` within `box_` preserving aspect ratio, scaling up or down.
fn fit_within(input: Size, box_: Size) -> (u32, u32) {
    let (w, h) = (input.w as f64, input.h as f64);
    let (bw, bh) = (box_.w as f64, box_.h as f64);
    let s = (bw / w).min(bh / h);
    (
        ((w * s).round() as u32).clamp(1, box_.w),
        ((h * s).round() as u32).clamp(1, box_.h),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letterbox_full_hd_into_svga() {
        let plan = build_plan(
            Size { w: 1920, h: 1080 },
            Size { w: 800, h: 600 },
            AspectMode::Letterbox,
        );
        assert_eq!(plan.dst_roi, Some((0, 75, 800, 450)));
        assert_eq!(plan.content(), Size { w: 800, h: 450 });
    }

    #[test]
    fn letterbox_pillarboxes_tall_sources() {
        let plan = build_plan(
            Size { w: 300, h: 600 },
            Size { w: 800, h: 600 },
            AspectMode::Letterbox,
        );
        assert_eq!(plan.dst_roi, Some((250, 0, 300, 600)));
    }

    #[test]
    fn letterbox_scales_up_small_sources() {
        let plan = build_plan(
            Size { w: 80, h: 60 },
            Size { w: 800, h: 600 },
            AspectMode::Letterbox,
        );
        assert_eq!(plan.dst_roi, None);
        assert!(!plan.is_identity());
    }

    #[test]
    fn same_size_is_identity_for_both_modes() {
        let size = Size { w: 640, h: 480 };
        assert!(build_plan(size, size, AspectMode::Letterbox).is_identity());
        assert!(build_plan(size, size, AspectMode::Stretch).is_identity());
    }

    #[test]
    fn stretch_never_letterboxes() {
        let plan = build_plan(
            Size { w: 1920, h: 1080 },
            Size { w: 720, h: 480 },
            AspectMode::Stretch,
        );
        assert_eq!(plan.dst_roi, None);
        assert_eq!(plan.content(), Size { w: 720, h: 480 });
    }
}
