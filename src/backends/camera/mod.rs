// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! The scanner never talks to a camera directly. The host supplies three
//! collaborators behind traits:
//!
//! ```text
//! ┌──────────────────────┐
//! │  ScanSession (app)   │
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │ CameraSessionManager │  ← acquisition fallback, exclusive ownership, release
//! └──────┬────────┬──────┘
//!        │        │
//!        ▼        ▼
//! ┌────────────┐ ┌───────────┐   ┌────────────┐
//! │CaptureBack-│ │ VideoSink │   │ FrameClock │  ← one tick per repaint
//! │    end     │ └───────────┘   └────────────┘
//! └────────────┘
//! ```

pub mod frame_loop;
pub mod manager;
pub mod types;

pub use frame_loop::{DisplayClock, FrameClock, ImmediateClock, LoopAction};
pub use manager::{CameraSessionManager, StreamReleaser};
pub use types::*;

use futures::future::BoxFuture;

/// Capture-device acquisition API
///
/// Implementations may suspend for as long as the platform takes to
/// resolve a permission prompt.
pub trait CaptureBackend: Send + Sync {
    /// Request a stream matching `constraints`
    fn acquire<'a>(
        &'a self,
        constraints: &'a StreamConstraints,
    ) -> BoxFuture<'a, Result<MediaStream, AcquireError>>;

    /// Backend name (for logging)
    fn name(&self) -> &str;
}

/// A renderable video sink bound to a media stream
///
/// The sink reports the intrinsic pixel dimensions of the video once frames
/// arrive, and exposes the frame it is currently presenting.
pub trait VideoSink: Send {
    /// Bind the stream to the sink
    fn attach(&mut self, stream: &MediaStream) -> Result<(), SinkError>;

    /// Start playback and resolve once the sink is ready to produce frames
    fn wait_ready(&mut self) -> BoxFuture<'_, Result<(), SinkError>>;

    /// Intrinsic video dimensions, `None` until the first frame is known
    fn intrinsic_size(&self) -> Option<Resolution>;

    /// The frame currently presented by the sink
    fn current_frame(&self) -> Option<CameraFrame>;

    /// Unbind the stream
    fn detach(&mut self);
}
