// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use idscan::constants::{capture, file_formats, timing, zoom};

#[test]
fn test_zoom_range() {
    // Zoom spans 1x to 3x in whole steps
    assert_eq!(zoom::MIN, 1.0);
    assert_eq!(zoom::MAX, 3.0);
    assert!(zoom::DEFAULT >= zoom::MIN && zoom::DEFAULT <= zoom::MAX);
    let steps = (zoom::MAX - zoom::MIN) / zoom::STEP;
    assert!((steps - steps.round()).abs() < 1e-4);
}

#[test]
fn test_capture_target_is_hd() {
    assert_eq!((capture::TARGET_WIDTH, capture::TARGET_HEIGHT), (1280, 720));
}

#[test]
fn test_frame_rate_bounds() {
    assert!(timing::DEFAULT_FRAME_RATE <= timing::MAX_FRAME_RATE);
    assert!(!timing::SINK_READY_TIMEOUT.is_zero());
}

#[test]
fn test_image_extensions() {
    assert!(file_formats::is_image_extension("png"));
    assert!(file_formats::is_image_extension("jpg"));
    assert!(!file_formats::is_image_extension("mp4"));
    // Extensions are expected lowercase
    assert!(!file_formats::is_image_extension("PNG"));
}
