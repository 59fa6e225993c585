// SPDX-License-Identifier: GPL-3.0-only

//! Frame sampler
//!
//! Copies the frame currently shown by the video sink into a fresh RGBA
//! raster at the video's native resolution. The on-screen zoom never
//! reaches this code.

use crate::app::frame_processor::types::RasterBuffer;
use crate::backends::camera::VideoSink;
use crate::backends::camera::types::{CameraFrame, PixelFormat};
use image::RgbaImage;
use tracing::trace;

/// Samples frames from a video sink
#[derive(Debug, Default)]
pub struct FrameSampler {
    last_sequence: Option<u64>,
    sampled: u64,
}

impl FrameSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the sink's current frame into a raster buffer
    ///
    /// Returns `None` while the sink reports no dimensions or no frame.
    pub fn sample(&mut self, sink: &dyn VideoSink) -> Option<RasterBuffer> {
        let size = sink.intrinsic_size()?;
        if size.is_empty() {
            trace!("Video sink has no dimensions yet");
            return None;
        }

        let frame = sink.current_frame()?;
        let raster = raster_from_frame(&frame)?;

        if self.last_sequence == Some(frame.sequence) {
            trace!(sequence = frame.sequence, "Sampling a repeated frame");
        }
        self.last_sequence = Some(frame.sequence);
        self.sampled += 1;

        Some(raster)
    }

    /// Number of frames sampled so far
    pub fn sampled(&self) -> u64 {
        self.sampled
    }
}

/// Convert a camera frame to an RGBA raster of the same dimensions
///
/// Returns `None` if the frame data is shorter than its dimensions claim.
pub fn raster_from_frame(frame: &CameraFrame) -> Option<RasterBuffer> {
    if frame.width == 0 || frame.height == 0 {
        return None;
    }

    let rgba = match frame.format {
        PixelFormat::RGBA => copy_rgba_without_stride(frame),
        PixelFormat::BGRA => {
            let mut data = copy_rgba_without_stride(frame);
            for px in data.chunks_exact_mut(4) {
                px.swap(0, 2);
            }
            data
        }
        PixelFormat::Gray8 => expand_gray(frame),
    };

    let image = RgbaImage::from_raw(frame.width, frame.height, rgba)?;
    Some(RasterBuffer::new(image, frame.sequence).with_captured_at(frame.captured_at))
}

/// Copy 4-byte-per-pixel frame data without stride padding
fn copy_rgba_without_stride(frame: &CameraFrame) -> Vec<u8> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let stride = frame.stride as usize;

    let mut result = Vec::with_capacity(width * height * 4);

    for y in 0..height {
        let row_start = y * stride;
        let row_end = row_start + width * 4;
        if row_end <= frame.data.len() {
            result.extend_from_slice(&frame.data[row_start..row_end]);
        }
    }

    result
}

/// Expand an 8-bit grayscale frame to RGBA, dropping stride padding
fn expand_gray(frame: &CameraFrame) -> Vec<u8> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let stride = frame.stride as usize;

    let mut result = Vec::with_capacity(width * height * 4);

    for y in 0..height {
        let row_start = y * stride;
        let row_end = row_start + width;
        if let Some(row) = frame.data.get(row_start..row_end) {
            for &v in row {
                result.extend_from_slice(&[v, v, v, 255]);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    fn frame(width: u32, height: u32, stride: u32, format: PixelFormat, data: Vec<u8>) -> CameraFrame {
        CameraFrame {
            width,
            height,
            data: Arc::from(data),
            format,
            stride,
            sequence: 3,
            captured_at: Instant::now(),
        }
    }

    #[test]
    fn test_copy_rgba_without_stride() {
        // 2x2 RGBA frame with 2 bytes of stride padding per row
        let data: Vec<u8> = vec![
            255, 0, 0, 255, // Red pixel
            0, 255, 0, 255, // Green pixel
            0, 0,           // stride padding
            0, 0, 255, 255, // Blue pixel
            255, 255, 255, 255, // White pixel
            0, 0,           // stride padding
        ];

        let raster = raster_from_frame(&frame(2, 2, 10, PixelFormat::RGBA, data)).unwrap();
        let raw = raster.image().as_raw();
        assert_eq!(raw.len(), 16);
        assert_eq!(&raw[0..4], &[255, 0, 0, 255]);
        assert_eq!(&raw[4..8], &[0, 255, 0, 255]);
        assert_eq!(&raw[8..12], &[0, 0, 255, 255]);
        assert_eq!(&raw[12..16], &[255, 255, 255, 255]);
        assert_eq!(raster.frame_sequence, 3);
    }

    #[test]
    fn test_raster_keeps_capture_time() {
        let source = frame(1, 1, 4, PixelFormat::RGBA, vec![0, 0, 0, 255]);
        let raster = raster_from_frame(&source).unwrap();
        assert_eq!(raster.captured_at, source.captured_at);
    }

    #[test]
    fn test_bgra_is_swizzled() {
        let raster = raster_from_frame(&frame(1, 1, 4, PixelFormat::BGRA, vec![10, 20, 30, 255])).unwrap();
        assert_eq!(raster.image().as_raw().as_slice(), &[30, 20, 10, 255]);
    }

    #[test]
    fn test_gray_is_expanded() {
        let data = vec![7, 9, 0, 11, 13, 0]; // 2x2 with one byte padding
        let raster = raster_from_frame(&frame(2, 2, 3, PixelFormat::Gray8, data)).unwrap();
        assert_eq!(raster.width(), 2);
        assert_eq!(raster.height(), 2);
        assert_eq!(&raster.image().as_raw()[12..16], &[13, 13, 13, 255]);
    }

    #[test]
    fn test_truncated_frame_is_rejected() {
        let raster = raster_from_frame(&frame(4, 4, 16, PixelFormat::RGBA, vec![0; 20]));
        assert!(raster.is_none());
    }
}
