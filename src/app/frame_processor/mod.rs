// SPDX-License-Identifier: GPL-3.0-only

//! Frame processor module
//!
//! Sampling of video frames into raster buffers and the barcode decode
//! strategies that consume them.

pub mod sampler;
pub mod tasks;
pub mod types;

pub use sampler::FrameSampler;
pub use tasks::{
    BarcodeDecoder, DecodeOutcome, NativeBarcodeDetector, NativeDetector, SoftwareDetector,
    select_decoder,
};
pub use types::{
    DecodedResult, DecoderKind, DetectedBarcode, FrameRegion, RasterBuffer, Symbology,
};
