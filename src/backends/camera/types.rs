// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Which way the requested camera should face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Front camera (selfie)
    User,
    /// Rear camera, pointing away from the user (default for ID cards)
    #[default]
    Environment,
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacingMode::User => write!(f, "user"),
            FacingMode::Environment => write!(f, "environment"),
        }
    }
}

/// Pixel dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Constraints passed to a capture backend when requesting a stream
///
/// Both fields are preferences: a backend may pick the closest match.
/// An empty constraint set means "any available camera".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamConstraints {
    /// Preferred facing direction
    pub facing_mode: Option<FacingMode>,
    /// Ideal capture resolution
    pub ideal_resolution: Option<Resolution>,
}

impl StreamConstraints {
    /// Preferred request: a camera facing the given way at the given resolution
    pub fn preferred(facing_mode: FacingMode, resolution: Resolution) -> Self {
        Self {
            facing_mode: Some(facing_mode),
            ideal_resolution: Some(resolution),
        }
    }

    /// Minimal unconstrained request
    pub fn any() -> Self {
        Self::default()
    }

    /// True if this is the unconstrained request
    pub fn is_unconstrained(&self) -> bool {
        self.facing_mode.is_none() && self.ideal_resolution.is_none()
    }
}

impl std::fmt::Display for StreamConstraints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.facing_mode, self.ideal_resolution) {
            (None, None) => write!(f, "any camera"),
            (Some(facing), None) => write!(f, "{} camera", facing),
            (None, Some(res)) => write!(f, "any camera @ {}", res),
            (Some(facing), Some(res)) => write!(f, "{} camera @ {}", facing, res),
        }
    }
}

/// Pixel format of frames delivered by a video sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    /// This is the canonical format of the raster handed to decoders
    RGBA,
    /// BGRA - 32-bit with alpha (B G R A byte order)
    BGRA,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
}

impl PixelFormat {
    /// Bytes per pixel
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::RGBA | Self::BGRA => 4,
            Self::Gray8 => 1,
        }
    }
}

/// A single frame as currently displayed by a video sink
///
/// `width`/`height` are the intrinsic (native) dimensions of the video,
/// independent of how large the preview is drawn on screen.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Pixel data, `stride` bytes per row
    pub data: Arc<[u8]>,
    /// Pixel format of the data
    pub format: PixelFormat,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// Monotonic frame counter assigned by the sink
    pub sequence: u64,
    /// Timestamp when frame was captured (for latency diagnostics)
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a tightly packed frame (stride = width * bytes per pixel)
    pub fn packed(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width * format.bytes_per_pixel() as u32,
            data: Arc::from(data),
            format,
            sequence: 0,
            captured_at: Instant::now(),
        }
    }

    /// Native resolution of this frame
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

/// One track of a media stream
///
/// Tracks are stopped independently; stopping releases the underlying
/// device for that track.
pub trait MediaTrack: Send {
    /// Track identifier (for logging)
    fn id(&self) -> &str;

    /// Stop the track and release its device. Must tolerate repeated calls.
    fn stop(&mut self);

    /// Whether the track is still delivering media
    fn is_live(&self) -> bool;
}

/// A live media stream returned by a capture backend
pub struct MediaStream {
    id: String,
    tracks: Vec<Box<dyn MediaTrack>>,
}

impl MediaStream {
    pub fn new(id: impl Into<String>, tracks: Vec<Box<dyn MediaTrack>>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// True while at least one track is live
    pub fn is_active(&self) -> bool {
        self.tracks.iter().any(|t| t.is_live())
    }

    /// Stop every live track, returning how many were stopped
    pub fn stop_all_tracks(&mut self) -> usize {
        let mut stopped = 0;
        for track in self.tracks.iter_mut().filter(|t| t.is_live()) {
            track.stop();
            stopped += 1;
        }
        stopped
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("tracks", &self.tracks.len())
            .field("active", &self.is_active())
            .finish()
    }
}

/// Why a capture backend refused a stream request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcquireErrorKind {
    /// The user or platform denied camera access
    NotAllowed,
    /// No camera matching the request exists
    NotFound,
    /// The camera exists but could not be opened (already in use)
    NotReadable,
    /// The camera cannot satisfy the requested constraints
    Overconstrained,
    /// Anything else
    Other,
}

/// Error returned by [`CaptureBackend::acquire`](super::CaptureBackend::acquire)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquireError {
    pub kind: AcquireErrorKind,
    pub message: String,
}

impl AcquireError {
    pub fn new(kind: AcquireErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for AcquireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            AcquireErrorKind::NotAllowed => "not allowed",
            AcquireErrorKind::NotFound => "not found",
            AcquireErrorKind::NotReadable => "not readable",
            AcquireErrorKind::Overconstrained => "overconstrained",
            AcquireErrorKind::Other => "error",
        };
        write!(f, "Camera {}: {}", kind, self.message)
    }
}

impl std::error::Error for AcquireError {}

/// Video sink failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The sink failed to load the stream
    LoadFailed(String),
    /// The sink is not bound to a stream
    NotAttached,
    /// The sink did not become ready in time
    Timeout,
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::LoadFailed(msg) => write!(f, "Video failed to load: {}", msg),
            SinkError::NotAttached => write!(f, "Video sink has no stream attached"),
            SinkError::Timeout => write!(f, "Timed out waiting for video"),
        }
    }
}

impl std::error::Error for SinkError {}
