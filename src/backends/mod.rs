// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera capture
//!
//! The host platform implements the traits in [`camera`]; the crate only
//! talks to capture hardware through them.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                Scan Session                  │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌──────────────────┐  ┌──────────────────┐ │
//! │  │ Camera traits    │  │ Virtual Camera   │ │
//! │  │ (host-provided)  │  │ (image files)    │ │
//! │  └──────────────────┘  └──────────────────┘ │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Capture/sink traits, frame clock and the session manager
//! - [`virtual_camera`]: Still images played back as a camera feed

pub mod camera;
pub mod virtual_camera;
