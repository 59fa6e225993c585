// SPDX-License-Identifier: GPL-3.0-only

//! Barcode decode strategies
//!
//! Two interchangeable decoders sit behind [`BarcodeDecoder`]: the host's
//! native detector, when it has one, and the built-in software reader.
//! The choice is made once per session by [`select_decoder`].

pub mod native_detector;
pub mod software_detector;

pub use native_detector::{NativeBarcodeDetector, NativeDetector};
pub use software_detector::SoftwareDetector;

use crate::app::frame_processor::types::{DecodedResult, DecoderKind, RasterBuffer, Symbology};
use crate::errors::DecodeError;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::info;

/// Outcome of one decode attempt
///
/// `Ok(None)` means no barcode was found in the frame, which is the
/// common case and not an error.
pub type DecodeOutcome = Result<Option<DecodedResult>, DecodeError>;

/// A decode strategy
pub trait BarcodeDecoder: Send + Sync {
    /// Which path this decoder implements
    fn kind(&self) -> DecoderKind;

    /// Symbologies this decoder will report
    fn symbologies(&self) -> &[Symbology];

    /// Decode one raster
    fn decode(&self, raster: Arc<RasterBuffer>) -> BoxFuture<'static, DecodeOutcome>;
}

/// Pick the decode strategy for a session
///
/// The native detector is used when the host provides one, it supports at
/// least one requested symbology and `prefer_native` is set. Otherwise the
/// software reader is loaded.
pub fn select_decoder(
    native: Option<Arc<dyn NativeBarcodeDetector>>,
    symbologies: &[Symbology],
    prefer_native: bool,
) -> Box<dyn BarcodeDecoder> {
    if prefer_native && let Some(detector) = native {
        match NativeDetector::probe(detector, symbologies) {
            Some(native) => {
                info!(formats = ?native.symbologies(), "Using native barcode detector");
                return Box::new(native);
            }
            None => {
                info!("Native barcode detector supports none of the requested formats");
            }
        }
    }

    Box::new(SoftwareDetector::load(symbologies))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::frame_processor::types::DetectedBarcode;
    use futures::FutureExt;

    struct Ean13Only;

    impl NativeBarcodeDetector for Ean13Only {
        fn supported_formats(&self) -> Vec<Symbology> {
            vec![Symbology::Ean13]
        }

        fn detect(
            &self,
            _raster: Arc<RasterBuffer>,
            _formats: Arc<[Symbology]>,
        ) -> BoxFuture<'static, Result<Vec<DetectedBarcode>, DecodeError>> {
            async { Ok(Vec::new()) }.boxed()
        }
    }

    #[test]
    fn test_software_without_native() {
        let decoder = select_decoder(None, &Symbology::ALL, true);
        assert_eq!(decoder.kind(), DecoderKind::Software);
    }

    #[test]
    fn test_native_when_available() {
        let decoder = select_decoder(Some(Arc::new(Ean13Only)), &Symbology::ALL, true);
        assert_eq!(decoder.kind(), DecoderKind::Native);
        assert_eq!(decoder.symbologies(), &[Symbology::Ean13]);
    }

    #[test]
    fn test_native_without_overlap_falls_back() {
        let decoder = select_decoder(Some(Arc::new(Ean13Only)), &[Symbology::Code128], true);
        assert_eq!(decoder.kind(), DecoderKind::Software);
    }

    #[test]
    fn test_prefer_native_off_forces_software() {
        let decoder = select_decoder(Some(Arc::new(Ean13Only)), &Symbology::ALL, false);
        assert_eq!(decoder.kind(), DecoderKind::Software);
    }
}
