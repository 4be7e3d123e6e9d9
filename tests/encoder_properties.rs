//! Byte-layout properties of the row-stride encoder

mod common;

use common::test_frames::{full_hd_white, gradient};
use stride_projector::compositor::Compositor;
use stride_projector::config::{ChannelOrder, EncodingConfig, FitPolicy};
use stride_projector::error::ProjectorError;
use stride_projector::{Filter, Frame, encode, resize};

fn layout(width: u32, height: u32, stride: usize, order: ChannelOrder) -> EncodingConfig {
    EncodingConfig {
        width,
        height,
        stride,
        channel_order: order,
        fit: FitPolicy::ExactFit,
    }
}

#[test]
fn test_length_is_stride_times_height() {
    for (w, h, stride) in [(800, 600, 2400), (640, 480, 2048), (7, 3, 64), (1, 1, 3)] {
        for order in ChannelOrder::ALL {
            let config = layout(w, h, stride, order);
            let buffer = encode(&gradient(w, h), &config).unwrap();
            assert_eq!(buffer.len(), stride * h as usize, "{}", config);
        }
    }
}

#[test]
fn test_800x600_stride_2560_scenario() {
    let config = EncodingConfig::default();
    assert_eq!(config.padding(), 160);
    let buffer = encode(&gradient(800, 600), &config).unwrap();
    assert_eq!(buffer.len(), 1_536_000);
    assert_eq!(buffer.padding(), 160);
}

#[test]
fn test_800x600_stride_2562_scenario() {
    let config = layout(800, 600, 2562, ChannelOrder::REVERSE);
    let buffer = encode(&gradient(800, 600), &config).unwrap();
    assert_eq!(config.padding(), 162);
    assert_eq!(buffer.len(), 1_537_200);
}

#[test]
fn test_every_row_ends_in_zero_padding() {
    let frame = Frame::filled(33, 17, [255, 255, 255]).unwrap();
    let config = layout(33, 17, 128, ChannelOrder::REVERSE);
    let buffer = encode(&frame, &config).unwrap();
    for r in 0..17 {
        assert!(buffer.row_pixels(r).iter().all(|&b| b == 255), "row {}", r);
        assert!(buffer.row_padding(r).iter().all(|&b| b == 0), "row {}", r);
        assert_eq!(buffer.row_padding(r).len(), 128 - 99);
    }
}

#[test]
fn test_identity_without_padding_is_the_frame() {
    let frame = gradient(31, 9);
    let buffer = encode(&frame, &layout(31, 9, 93, ChannelOrder::IDENTITY)).unwrap();
    assert_eq!(buffer.as_bytes(), frame.as_bytes());
    assert_eq!(buffer.decode(ChannelOrder::IDENTITY).unwrap(), frame);
}

#[test]
fn test_reverse_twice_restores_channel_order() {
    let frame = gradient(12, 5);
    let buffer = encode(&frame, &layout(12, 5, 40, ChannelOrder::REVERSE)).unwrap();
    assert_eq!(ChannelOrder::REVERSE.inverse(), ChannelOrder::REVERSE);
    assert_eq!(buffer.decode(ChannelOrder::REVERSE).unwrap(), frame);
    let px = &buffer.row_pixels(2)[9..12];
    let original = frame.pixel(3, 2);
    assert_eq!(px, &[original[2], original[1], original[0]]);
}

#[test]
fn test_stride_boundary() {
    let frame = gradient(800, 2);
    assert!(matches!(
        encode(&frame, &layout(800, 2, 2399, ChannelOrder::IDENTITY)),
        Err(ProjectorError::InvalidStride {
            stride: 2399,
            minimum: 2400,
            ..
        })
    ));
    let exact = encode(&frame, &layout(800, 2, 2400, ChannelOrder::IDENTITY)).unwrap();
    assert_eq!(exact.padding(), 0);
    assert_eq!(exact.len(), 4800);
}

#[test]
fn test_mismatched_frame_is_reported_before_stride() {
    let err = encode(&gradient(10, 10), &layout(800, 600, 1, ChannelOrder::IDENTITY)).unwrap_err();
    assert!(matches!(err, ProjectorError::DimensionMismatch { .. }));
}

#[test]
fn test_aspect_fit_same_size_is_pixel_identical() {
    let frame = gradient(800, 600);
    assert_eq!(resize(&frame, 800, 600, FitPolicy::AspectFit).unwrap(), frame);
}

#[test]
fn test_aspect_fit_full_hd_letterbox() {
    let fitted = Compositor::new(Filter::Nearest)
        .resize(&full_hd_white(), 800, 600, FitPolicy::AspectFit)
        .unwrap();
    for x in [0, 400, 799] {
        assert_eq!(fitted.pixel(x, 74), [0, 0, 0]);
        assert_eq!(fitted.pixel(x, 75), [255, 255, 255]);
        assert_eq!(fitted.pixel(x, 524), [255, 255, 255]);
        assert_eq!(fitted.pixel(x, 525), [0, 0, 0]);
    }
    let buffer = encode(&fitted, &EncodingConfig::default()).unwrap();
    assert!(buffer.row_pixels(0).iter().all(|&b| b == 0));
    assert!(buffer.row_pixels(300).iter().all(|&b| b == 255));
}
