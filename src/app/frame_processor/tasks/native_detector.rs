// SPDX-License-Identifier: GPL-3.0-only

//! Native barcode detection
//!
//! Some hosts ship a (possibly hardware accelerated) barcode detector. When
//! one is present it is tried instead of the software reader.

use super::{BarcodeDecoder, DecodeOutcome};
use crate::app::frame_processor::types::{
    DecodedResult, DecoderKind, DetectedBarcode, RasterBuffer, Symbology,
};
use crate::errors::DecodeError;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::trace;

/// Host-provided barcode detection capability
///
/// Its absence is a supported configuration: hosts without one simply pass
/// `None` and the software reader is used.
pub trait NativeBarcodeDetector: Send + Sync {
    /// Symbologies the host detector can read
    fn supported_formats(&self) -> Vec<Symbology>;

    /// Detect barcodes of the given formats in a raster
    ///
    /// An empty vector means no barcode was found.
    fn detect(
        &self,
        raster: Arc<RasterBuffer>,
        formats: Arc<[Symbology]>,
    ) -> BoxFuture<'static, Result<Vec<DetectedBarcode>, DecodeError>>;
}

/// Decoder backed by the host's native detector
pub struct NativeDetector {
    detector: Arc<dyn NativeBarcodeDetector>,
    formats: Arc<[Symbology]>,
}

impl NativeDetector {
    /// Restrict the host detector to the requested symbologies
    ///
    /// Returns `None` if it supports none of them.
    pub fn probe(detector: Arc<dyn NativeBarcodeDetector>, requested: &[Symbology]) -> Option<Self> {
        let supported = detector.supported_formats();
        let formats: Vec<Symbology> = requested
            .iter()
            .copied()
            .filter(|s| supported.contains(s))
            .collect();

        if formats.is_empty() {
            return None;
        }

        Some(Self {
            detector,
            formats: formats.into(),
        })
    }
}

impl BarcodeDecoder for NativeDetector {
    fn kind(&self) -> DecoderKind {
        DecoderKind::Native
    }

    fn symbologies(&self) -> &[Symbology] {
        &self.formats
    }

    fn decode(&self, raster: Arc<RasterBuffer>) -> BoxFuture<'static, DecodeOutcome> {
        let sequence = raster.frame_sequence;
        let detection = self.detector.detect(raster, Arc::clone(&self.formats));

        async move {
            let candidates = detection.await?;
            trace!(count = candidates.len(), sequence, "Native detection complete");

            Ok(candidates.into_iter().next().map(|barcode| {
                DecodedResult::new(barcode.raw_value, barcode.format, DecoderKind::Native, sequence)
            }))
        }
        .boxed()
    }
}
