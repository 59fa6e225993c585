// SPDX-License-Identifier: MPL-2.0

//! idscan - Camera-based barcode scanning for ID and registration labels
//!
//! This library opens a camera, samples its frames and decodes the first
//! linear barcode it sees, then releases the camera and hands the value to
//! the caller.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Scan session, frame sampling, decode strategies, presentation
//! - [`backends`]: Capture device and video sink abstraction, virtual camera
//! - [`config`]: User configuration handling
//! - [`errors`]: Error types
//!
//! # Example
//!
//! ```ignore
//! let scanner = BarcodeScanner::new(|result| println!("{}", result));
//! let handle = scanner.start(ScanHost::new(backend, sink, clock));
//! let snapshot = handle.finished().await;
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used types
pub use app::frame_processor::{DecodedResult, DecoderKind, Symbology};
pub use app::{BarcodeScanner, ScanHandle, ScanHost, ScanPhase, SessionSnapshot};
pub use config::ScannerConfig;
pub use errors::{AppError, AppResult, DecodeError, ScanError};
