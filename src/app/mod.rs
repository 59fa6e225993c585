// SPDX-License-Identifier: MPL-2.0

//! Scanning application layer
//!
//! # Architecture
//!
//! - `session`: Session task, [`BarcodeScanner`] and [`ScanHandle`]
//! - `state`: Session phases and the observable snapshot
//! - `frame_processor`: Frame sampling and decode strategies
//! - `presentation`: Zoom and overlay text derived from snapshots

pub mod frame_processor;
pub mod presentation;
pub mod session;
pub mod state;

pub use presentation::{PreviewTransform, ScanOverlay, ZoomBounds, ZoomLevel};
pub use session::{BarcodeScanner, DetectedCallback, ScanHandle, ScanHost};
pub use state::{LoopStats, ScanPhase, SessionSnapshot};
