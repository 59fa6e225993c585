// SPDX-License-Identifier: GPL-3.0-only

//! Core types for frame processing results
//!
//! These types describe the raster handed to the decoders and what comes
//! back out of them.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Barcode symbologies printed on ID cards
///
/// Only linear formats are decoded; the serialized names match the format
/// strings used by host barcode detectors (`code_128`, `ean_13`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
    #[serde(rename = "code_128")]
    Code128,
    #[serde(rename = "code_39")]
    Code39,
    #[serde(rename = "ean_13")]
    Ean13,
    #[serde(rename = "ean_8")]
    Ean8,
    UpcA,
    UpcE,
}

impl Symbology {
    /// Every supported symbology, in detection preference order
    pub const ALL: [Symbology; 6] = [
        Symbology::Code128,
        Symbology::Code39,
        Symbology::Ean13,
        Symbology::Ean8,
        Symbology::UpcA,
        Symbology::UpcE,
    ];

    /// Host detector format name
    pub fn format_name(&self) -> &'static str {
        match self {
            Symbology::Code128 => "code_128",
            Symbology::Code39 => "code_39",
            Symbology::Ean13 => "ean_13",
            Symbology::Ean8 => "ean_8",
            Symbology::UpcA => "upc_a",
            Symbology::UpcE => "upc_e",
        }
    }

    /// Parse a host detector format name
    pub fn from_format_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.format_name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for Symbology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Symbology::Code128 => "Code 128",
            Symbology::Code39 => "Code 39",
            Symbology::Ean13 => "EAN-13",
            Symbology::Ean8 => "EAN-8",
            Symbology::UpcA => "UPC-A",
            Symbology::UpcE => "UPC-E",
        };
        write!(f, "{}", name)
    }
}

/// A rectangular region within a frame
///
/// Coordinates are normalized (0.0 to 1.0) relative to the frame dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl FrameRegion {
    /// Create a frame region from pixel coordinates
    pub fn from_pixels(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        Self {
            x: x as f32 / frame_width as f32,
            y: y as f32 / frame_height as f32,
            width: width as f32 / frame_width as f32,
            height: height as f32 / frame_height as f32,
        }
    }
}

/// Off-screen snapshot of one video frame
///
/// Always RGBA at the native resolution of the video, never the on-screen
/// (zoomed) size.
#[derive(Debug, Clone)]
pub struct RasterBuffer {
    image: RgbaImage,
    /// Sequence number of the sampled frame
    pub frame_sequence: u64,
    /// When the camera captured the source frame
    pub captured_at: Instant,
}

impl RasterBuffer {
    pub fn new(image: RgbaImage, frame_sequence: u64) -> Self {
        Self {
            image,
            frame_sequence,
            captured_at: Instant::now(),
        }
    }

    /// Carry the capture time of the source frame
    pub fn with_captured_at(mut self, captured_at: Instant) -> Self {
        self.captured_at = captured_at;
        self
    }

    /// Time elapsed since the source frame was captured
    pub fn frame_age(&self) -> Duration {
        self.captured_at.elapsed()
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// RGBA pixels
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Rec. 601 luma plane, row-major, one byte per pixel
    pub fn to_luma(&self) -> Vec<u8> {
        self.image
            .pixels()
            .map(|p| {
                let [r, g, b, _] = p.0;
                ((299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000) as u8
            })
            .collect()
    }
}

/// Which decode path produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecoderKind {
    /// Host-provided barcode detector
    Native,
    /// Built-in multi-format reader
    Software,
}

impl std::fmt::Display for DecoderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecoderKind::Native => write!(f, "native"),
            DecoderKind::Software => write!(f, "software"),
        }
    }
}

/// A candidate reported by a host barcode detector
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedBarcode {
    /// Decoded payload
    pub raw_value: String,
    /// Symbology reported by the detector, if it maps to a known one
    pub format: Option<Symbology>,
}

impl DetectedBarcode {
    pub fn new(raw_value: impl Into<String>, format: Option<Symbology>) -> Self {
        Self {
            raw_value: raw_value.into(),
            format,
        }
    }
}

/// The single decoded value of a scan session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedResult {
    value: String,
    symbology: Option<Symbology>,
    decoder: DecoderKind,
    frame_sequence: u64,
}

impl DecodedResult {
    pub fn new(
        value: impl Into<String>,
        symbology: Option<Symbology>,
        decoder: DecoderKind,
        frame_sequence: u64,
    ) -> Self {
        Self {
            value: value.into(),
            symbology,
            decoder,
            frame_sequence,
        }
    }

    /// The raw decoded payload
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }

    pub fn symbology(&self) -> Option<Symbology> {
        self.symbology
    }

    pub fn decoder(&self) -> DecoderKind {
        self.decoder
    }

    /// Sequence number of the frame the value was decoded from
    pub fn frame_sequence(&self) -> u64 {
        self.frame_sequence
    }
}

impl std::fmt::Display for DecodedResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbology_format_names_roundtrip() {
        for symbology in Symbology::ALL {
            assert_eq!(Symbology::from_format_name(symbology.format_name()), Some(symbology));
        }
        assert_eq!(Symbology::from_format_name("qr_code"), None);
        assert_eq!(Symbology::from_format_name("CODE_128"), Some(Symbology::Code128));
    }

    #[test]
    fn test_symbology_serde_names() {
        let json = serde_json::to_string(&Symbology::ALL).unwrap();
        assert_eq!(
            json,
            r#"["code_128","code_39","ean_13","ean_8","upc_a","upc_e"]"#
        );
    }

    #[test]
    fn test_luma_conversion() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, image::Rgba([255, 255, 255, 255]));
        image.put_pixel(1, 0, image::Rgba([0, 0, 0, 255]));
        let raster = RasterBuffer::new(image, 7);

        assert_eq!(raster.to_luma(), vec![255, 0]);
        assert_eq!(raster.frame_sequence, 7);
    }

    #[test]
    fn test_frame_age_counts_from_capture() {
        let captured = Instant::now() - Duration::from_millis(250);
        let raster = RasterBuffer::new(RgbaImage::new(1, 1), 0).with_captured_at(captured);

        assert_eq!(raster.captured_at, captured);
        assert!(raster.frame_age() >= Duration::from_millis(250));
    }

    #[test]
    fn test_frame_region_from_pixels() {
        let region = FrameRegion::from_pixels(160, 120, 320, 240, 640, 480);
        assert_eq!(region.x, 0.25);
        assert_eq!(region.width, 0.5);
    }
}
