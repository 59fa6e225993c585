// SPDX-License-Identifier: GPL-3.0-only

//! Software barcode decoding
//!
//! This module implements linear barcode decoding with the rxing
//! multi-format reader. Frames are converted to a luma plane and decoded
//! on the blocking thread pool, one frame at a time.

use super::{BarcodeDecoder, DecodeOutcome};
use crate::app::frame_processor::types::{DecodedResult, DecoderKind, RasterBuffer, Symbology};
use crate::errors::DecodeError;
use futures::FutureExt;
use futures::future::BoxFuture;
use rxing::{BarcodeFormat, DecodeHintType, DecodeHintValue, DecodingHintDictionary, Exceptions};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Software multi-format reader
///
/// Built once per session; every decode reuses the same configuration.
#[derive(Clone)]
pub struct SoftwareDetector {
    formats: Arc<[Symbology]>,
    hints: Arc<DecodingHintDictionary>,
}

impl SoftwareDetector {
    /// Load the reader for the given symbologies
    pub fn load(symbologies: &[Symbology]) -> Self {
        let possible: HashSet<BarcodeFormat> =
            symbologies.iter().copied().map(format_from_symbology).collect();

        let mut hints = DecodingHintDictionary::new();
        hints.insert(
            DecodeHintType::POSSIBLE_FORMATS,
            DecodeHintValue::PossibleFormats(possible),
        );

        info!(formats = ?symbologies, "Loaded software barcode reader");
        Self {
            formats: Arc::from(symbologies),
            hints: Arc::new(hints),
        }
    }

    /// Decode a raster on the current thread
    pub fn decode_blocking(&self, raster: &RasterBuffer) -> DecodeOutcome {
        decode_sync(raster, &self.formats, &self.hints)
    }
}

impl std::fmt::Debug for SoftwareDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftwareDetector")
            .field("formats", &self.formats)
            .field("hints", &self.hints.len())
            .finish()
    }
}

impl BarcodeDecoder for SoftwareDetector {
    fn kind(&self) -> DecoderKind {
        DecoderKind::Software
    }

    fn symbologies(&self) -> &[Symbology] {
        &self.formats
    }

    fn decode(&self, raster: Arc<RasterBuffer>) -> BoxFuture<'static, DecodeOutcome> {
        let formats = Arc::clone(&self.formats);
        let hints = Arc::clone(&self.hints);

        // Run decoding in a blocking task to avoid stalling the async runtime
        async move {
            tokio::task::spawn_blocking(move || decode_sync(&raster, &formats, &hints))
                .await
                .unwrap_or_else(|e| Err(DecodeError::TaskFailed(e.to_string())))
        }
        .boxed()
    }
}

/// Synchronous decode (runs in blocking task)
fn decode_sync(
    raster: &RasterBuffer,
    formats: &[Symbology],
    hints: &DecodingHintDictionary,
) -> DecodeOutcome {
    let start = std::time::Instant::now();
    let width = raster.width();
    let height = raster.height();

    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidBuffer(format!(
            "empty raster {}x{}",
            width, height
        )));
    }

    let luma = raster.to_luma();
    // The reader may record state in the hints it is given
    let mut hints = hints.clone();

    match rxing::helpers::detect_in_luma_with_hints(luma, width, height, None, &mut hints) {
        Ok(result) => {
            let symbology = symbology_from_format(result.getBarcodeFormat());
            match symbology {
                Some(s) if formats.contains(&s) => {
                    debug!(
                        symbology = %s,
                        sequence = raster.frame_sequence,
                        decode_ms = start.elapsed().as_millis() as u64,
                        frame_age_ms = raster.frame_age().as_millis() as u64,
                        "Software reader decoded barcode"
                    );
                    Ok(Some(DecodedResult::new(
                        result.getText(),
                        Some(s),
                        DecoderKind::Software,
                        raster.frame_sequence,
                    )))
                }
                _ => {
                    trace!(
                        format = ?result.getBarcodeFormat(),
                        "Ignoring barcode of unrequested format"
                    );
                    Ok(None)
                }
            }
        }
        Err(Exceptions::NotFoundException(_)) => {
            trace!(
                sequence = raster.frame_sequence,
                decode_ms = start.elapsed().as_millis() as u64,
                "No barcode in frame"
            );
            Ok(None)
        }
        Err(e) => Err(DecodeError::Fault(e.to_string())),
    }
}

/// Map an rxing format onto a supported symbology
fn symbology_from_format(format: &BarcodeFormat) -> Option<Symbology> {
    match format {
        BarcodeFormat::CODE_128 => Some(Symbology::Code128),
        BarcodeFormat::CODE_39 => Some(Symbology::Code39),
        BarcodeFormat::EAN_13 => Some(Symbology::Ean13),
        BarcodeFormat::EAN_8 => Some(Symbology::Ean8),
        BarcodeFormat::UPC_A => Some(Symbology::UpcA),
        BarcodeFormat::UPC_E => Some(Symbology::UpcE),
        _ => None,
    }
}

/// Map a symbology onto the rxing format that reads it
fn format_from_symbology(symbology: Symbology) -> BarcodeFormat {
    match symbology {
        Symbology::Code128 => BarcodeFormat::CODE_128,
        Symbology::Code39 => BarcodeFormat::CODE_39,
        Symbology::Ean13 => BarcodeFormat::EAN_13,
        Symbology::Ean8 => BarcodeFormat::EAN_8,
        Symbology::UpcA => BarcodeFormat::UPC_A,
        Symbology::UpcE => BarcodeFormat::UPC_E,
    }
}
