// SPDX-License-Identifier: MIT
// CPU scaler built on fast_image_resize (SIMD-accelerated).
// RGB8 in → RGB8 out, direct write into caller-provided dst buffer.

use fast_image_resize as fir;
use fir::images::{TypedCroppedImageMut, TypedImage, TypedImageRef};
use fir::pixels::U8x3;
use fir::{FilterType, ResizeAlg, ResizeOptions, Resizer};

use crate::plan::{Filter, ScalePlan, Size};

const BYTES_PER_PIXEL: usize = 3;

#[derive(Debug)]
pub enum ScaleError {
    SourceLengthMismatch { expected: usize, actual: usize },
    BufferTooSmall { needed: usize, actual: usize },
    Fir(fir::ResizeError),
    ImageBuf(fir::ImageBufferError),
    Crop(fir::CropBoxError),
}

impl From<fir::ResizeError> for ScaleError { fn from(e: fir::ResizeError) -> Self { Self::Fir(e) } }
impl From<fir::ImageBufferError> for ScaleError { fn from(e: fir::ImageBufferError) -> Self { Self::ImageBuf(e) } }
impl From<fir::CropBoxError> for ScaleError { fn from(e: fir::CropBoxError) -> Self { Self::Crop(e) } }

impl std::fmt::Display for ScaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleError::SourceLengthMismatch { expected, actual } => {
                write!(f, "Source buffer holds {} bytes, expected {}", actual, expected)
            }
            ScaleError::BufferTooSmall { needed, actual } => {
                write!(f, "Output buffer too small: {} bytes, need {}", actual, needed)
            }
            ScaleError::Fir(e) => write!(f, "Fast image resize error: {}", e),
            ScaleError::ImageBuf(e) => write!(f, "Image buffer error: {}", e),
            ScaleError::Crop(e) => write!(f, "Crop error: {}", e),
        }
    }
}

impl std::error::Error for ScaleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScaleError::Fir(e) => Some(e),
            ScaleError::ImageBuf(e) => Some(e),
            ScaleError::Crop(e) => Some(e),
            _ => None,
        }
    }
}

impl Filter {
    fn resize_alg(self) -> ResizeAlg {
        match self {
            Filter::Lanczos3 => ResizeAlg::Convolution(FilterType::Lanczos3),
            Filter::Bilinear => ResizeAlg::Convolution(FilterType::Bilinear),
            Filter::Nearest => ResizeAlg::Nearest,
        }
    }
}

/// Main scaling entry point.
///
/// `src_rgb` must be tightly packed (`src.w * 3` bytes per row). `dst` must hold at
/// least `plan.out.w * plan.out.h * 3` bytes. With a letterbox ROI the border is
/// cleared to black before the resize writes the content region.
pub fn scale_rgb_cpu(
    resizer: &mut Resizer,
    src_rgb: &[u8],
    src: Size,
    plan: &ScalePlan,
    filter: Filter,
    dst: &mut [u8],
) -> Result<(), ScaleError> {
    let src_len = src.area() * BYTES_PER_PIXEL;
    if src_rgb.len() != src_len {
        return Err(ScaleError::SourceLengthMismatch {
            expected: src_len,
            actual: src_rgb.len(),
        });
    }
    let dst_len = plan.out.area() * BYTES_PER_PIXEL;
    if dst.len() < dst_len {
        return Err(ScaleError::BufferTooSmall {
            needed: dst_len,
            actual: dst.len(),
        });
    }
    let dst = &mut dst[..dst_len];

    // Same geometry: resampling would only add filter ringing.
    if plan.is_identity() && src == plan.input {
        dst.copy_from_slice(src_rgb);
        return Ok(());
    }

    let src_view = TypedImageRef::<U8x3>::from_buffer(src.w, src.h, src_rgb)?;
    let opts = ResizeOptions::new().resize_alg(filter.resize_alg());

    match plan.dst_roi {
        Some((x, y, w, h)) => {
            dst.fill(0);
            let mut dst_image = TypedImage::<U8x3>::from_buffer(plan.out.w, plan.out.h, dst)?;
            let mut roi = TypedCroppedImageMut::from_ref(&mut dst_image, x, y, w, h)?;
            resizer.resize_typed::<U8x3>(&src_view, &mut roi, &opts)?;
        }
        None => {
            let mut dst_image = TypedImage::<U8x3>::from_buffer(plan.out.w, plan.out.h, dst)?;
            resizer.resize_typed::<U8x3>(&src_view, &mut dst_image, &opts)?;
        }
    }

    Ok(())
}

/// Copy a tightly packed RGB image onto a tightly packed canvas at `(x, y)`,
/// clipping whatever falls past the right or bottom edge.
pub fn blit_rgb(src: &[u8], src_size: Size, canvas: &mut [u8], canvas_size: Size, x: u32, y: u32) {
    if x >= canvas_size.w || y >= canvas_size.h {
        return;
    }
    let cols = src_size.w.min(canvas_size.w - x) as usize;
    let rows = src_size.h.min(canvas_size.h - y) as usize;
    let src_pitch = src_size.w as usize * BYTES_PER_PIXEL;
    let dst_pitch = canvas_size.w as usize * BYTES_PER_PIXEL;
    let run = cols * BYTES_PER_PIXEL;
    for r in 0..rows {
        let s = r * src_pitch;
        let d = (y as usize + r) * dst_pitch + x as usize * BYTES_PER_PIXEL;
        canvas[d..d + run].copy_from_slice(&src[s..s + run]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{build_plan, AspectMode};

    fn solid(size: Size, rgb: [u8; 3]) -> Vec<u8> {
        rgb.iter().copied().cycle().take(size.area() * 3).collect()
    }

    #[test]
    fn identity_plan_copies_bytes() {
        let size = Size { w: 4, h: 3 };
        let src: Vec<u8> = (0..36u8).collect();
        let plan = build_plan(size, size, AspectMode::Letterbox);
        let mut dst = vec![0u8; 36];
        scale_rgb_cpu(&mut Resizer::new(), &src, size, &plan, Filter::Lanczos3, &mut dst).unwrap();
        assert_eq!(src, dst);
    }

    #[test]
    fn letterbox_border_is_black() {
        let input = Size { w: 32, h: 16 };
        let out = Size { w: 32, h: 32 };
        let src = solid(input, [255, 255, 255]);
        let plan = build_plan(input, out, AspectMode::Letterbox);
        assert_eq!(plan.dst_roi, Some((0, 8, 32, 16)));
        let mut dst = vec![7u8; out.area() * 3];
        scale_rgb_cpu(&mut Resizer::new(), &src, input, &plan, Filter::Nearest, &mut dst).unwrap();

        let row = |r: usize| &dst[r * 96..(r + 1) * 96];
        assert!(row(0).iter().all(|&b| b == 0));
        assert!(row(7).iter().all(|&b| b == 0));
        assert!(row(8).iter().all(|&b| b == 255));
        assert!(row(23).iter().all(|&b| b == 255));
        assert!(row(24).iter().all(|&b| b == 0));
    }

    #[test]
    fn rejects_short_destination() {
        let input = Size { w: 8, h: 8 };
        let plan = build_plan(input, Size { w: 4, h: 4 }, AspectMode::Stretch);
        let mut dst = vec![0u8; 10];
        let err = scale_rgb_cpu(&mut Resizer::new(), &solid(input, [1, 2, 3]), input, &plan, Filter::Bilinear, &mut dst)
            .unwrap_err();
        assert!(matches!(err, ScaleError::BufferTooSmall { needed: 48, actual: 10 }));
    }

    #[test]
    fn blit_clips_at_canvas_edges() {
        let src = solid(Size { w: 3, h: 3 }, [9, 9, 9]);
        let canvas_size = Size { w: 4, h: 4 };
        let mut canvas = vec![0u8; canvas_size.area() * 3];
        blit_rgb(&src, Size { w: 3, h: 3 }, &mut canvas, canvas_size, 2, 2);
        let px = |x: usize, y: usize| canvas[(y * 4 + x) * 3];
        assert_eq!(px(1, 1), 0);
        assert_eq!(px(2, 2), 9);
        assert_eq!(px(3, 3), 9);
        assert_eq!(px(3, 1), 0);
    }
}
