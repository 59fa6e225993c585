// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera: still images played back as a camera feed
//!
//! ```text
//! image files ──► CameraFrame list
//!                      │
//!        ┌─────────────┴─────────────┐
//!        ▼                           ▼
//! FileCaptureBackend          FilePlaybackSink
//! (hands out one track)       (one frame per read, in order)
//! ```
//!
//! Backend and sink share the playback state, so stopping the track also
//! stops frame delivery. Used by the CLI and by the integration tests.

mod file_source;

pub use file_source::{collect_image_paths, frame_from_image, is_supported_image, load_image_as_frame};

use crate::backends::camera::types::*;
use crate::backends::camera::{CaptureBackend, VideoSink};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, info};

/// State shared by the backend, its tracks and the sink
struct Playback {
    frames: Vec<CameraFrame>,
    facing: FacingMode,
    repeat: bool,
    failure: Option<AcquireErrorKind>,
    /// Number of frames handed out so far
    cursor: AtomicU64,
    track_live: AtomicBool,
    acquisitions: AtomicUsize,
    releases: AtomicUsize,
}

impl Playback {
    /// Frame at the given read position, honoring the repeat mode
    fn frame_at(&self, position: u64) -> Option<&CameraFrame> {
        let len = self.frames.len() as u64;
        if len == 0 {
            return None;
        }
        let index = if self.repeat {
            position % len
        } else {
            position.min(len - 1)
        };
        self.frames.get(index as usize)
    }
}

/// A camera that plays a fixed list of frames
#[derive(Clone)]
pub struct FileCamera {
    playback: Arc<Playback>,
}

impl FileCamera {
    /// Camera facing the environment that loops over `frames`
    pub fn new(frames: Vec<CameraFrame>) -> Self {
        Self::build(frames, FacingMode::Environment, true, None)
    }

    /// Load every image in `paths`, in order
    pub fn open(paths: &[impl AsRef<Path>]) -> Result<Self, SinkError> {
        let frames = paths
            .iter()
            .map(|p| load_image_as_frame(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        info!(frames = frames.len(), "Virtual camera loaded");
        Ok(Self::new(frames))
    }

    /// Report the given facing direction to constraint checks
    pub fn facing(self, facing: FacingMode) -> Self {
        self.rebuild(|p| p.facing = facing)
    }

    /// Hold the last frame instead of looping
    pub fn hold_last_frame(self) -> Self {
        self.rebuild(|p| p.repeat = false)
    }

    /// Refuse every acquisition with the given error
    pub fn failing(self, kind: AcquireErrorKind) -> Self {
        self.rebuild(|p| p.failure = Some(kind))
    }

    fn build(
        frames: Vec<CameraFrame>,
        facing: FacingMode,
        repeat: bool,
        failure: Option<AcquireErrorKind>,
    ) -> Self {
        Self {
            playback: Arc::new(Playback {
                frames,
                facing,
                repeat,
                failure,
                cursor: AtomicU64::new(0),
                track_live: AtomicBool::new(false),
                acquisitions: AtomicUsize::new(0),
                releases: AtomicUsize::new(0),
            }),
        }
    }

    fn rebuild(self, change: impl FnOnce(&mut PlaybackSettings)) -> Self {
        let p = &self.playback;
        let mut settings = PlaybackSettings {
            facing: p.facing,
            repeat: p.repeat,
            failure: p.failure,
        };
        change(&mut settings);
        Self::build(
            p.frames.clone(),
            settings.facing,
            settings.repeat,
            settings.failure,
        )
    }

    /// Capture backend half of the camera
    pub fn backend(&self) -> Arc<dyn CaptureBackend> {
        Arc::new(FileCaptureBackend {
            playback: Arc::clone(&self.playback),
        })
    }

    /// Video sink half of the camera
    pub fn sink(&self) -> Box<dyn VideoSink> {
        Box::new(FilePlaybackSink {
            playback: Arc::clone(&self.playback),
            attached: false,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.playback.frames.len()
    }

    /// Frames handed to the sink so far
    pub fn frames_read(&self) -> u64 {
        self.playback.cursor.load(Ordering::SeqCst)
    }

    /// Streams successfully acquired
    pub fn acquisitions(&self) -> usize {
        self.playback.acquisitions.load(Ordering::SeqCst)
    }

    /// Tracks stopped
    pub fn releases(&self) -> usize {
        self.playback.releases.load(Ordering::SeqCst)
    }

    /// Whether a track is currently live
    pub fn is_streaming(&self) -> bool {
        self.playback.track_live.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for FileCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCamera")
            .field("frames", &self.frame_count())
            .field("facing", &self.playback.facing)
            .field("repeat", &self.playback.repeat)
            .field("streaming", &self.is_streaming())
            .finish()
    }
}

struct PlaybackSettings {
    facing: FacingMode,
    repeat: bool,
    failure: Option<AcquireErrorKind>,
}

struct FileCaptureBackend {
    playback: Arc<Playback>,
}

impl FileCaptureBackend {
    fn check(&self, constraints: &StreamConstraints) -> Result<(), AcquireError> {
        let p = &self.playback;
        if let Some(kind) = p.failure {
            return Err(AcquireError::new(kind, "virtual camera configured to fail"));
        }
        if p.frames.is_empty() {
            return Err(AcquireError::new(
                AcquireErrorKind::NotFound,
                "virtual camera has no frames",
            ));
        }
        if let Some(facing) = constraints.facing_mode
            && facing != p.facing
        {
            return Err(AcquireError::new(
                AcquireErrorKind::Overconstrained,
                format!("no camera facing {}", facing),
            ));
        }
        if p.track_live.load(Ordering::SeqCst) {
            return Err(AcquireError::new(
                AcquireErrorKind::NotReadable,
                "virtual camera already in use",
            ));
        }
        Ok(())
    }
}

impl CaptureBackend for FileCaptureBackend {
    fn acquire<'a>(
        &'a self,
        constraints: &'a StreamConstraints,
    ) -> BoxFuture<'a, Result<MediaStream, AcquireError>> {
        async move {
            self.check(constraints)?;

            let p = &self.playback;
            p.track_live.store(true, Ordering::SeqCst);
            p.cursor.store(0, Ordering::SeqCst);
            p.acquisitions.fetch_add(1, Ordering::SeqCst);
            debug!(constraints = %constraints, "Virtual camera stream opened");

            let track = FileTrack {
                playback: Arc::clone(p),
            };
            Ok(MediaStream::new(
                "virtual-camera",
                vec![Box::new(track) as Box<dyn MediaTrack>],
            ))
        }
        .boxed()
    }

    fn name(&self) -> &str {
        "virtual-camera"
    }
}

struct FileTrack {
    playback: Arc<Playback>,
}

impl MediaTrack for FileTrack {
    fn id(&self) -> &str {
        "virtual-video"
    }

    fn stop(&mut self) {
        if self.playback.track_live.swap(false, Ordering::SeqCst) {
            self.playback.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_live(&self) -> bool {
        self.playback.track_live.load(Ordering::SeqCst)
    }
}

struct FilePlaybackSink {
    playback: Arc<Playback>,
    attached: bool,
}

impl FilePlaybackSink {
    fn streaming(&self) -> bool {
        self.attached && self.playback.track_live.load(Ordering::SeqCst)
    }
}

impl VideoSink for FilePlaybackSink {
    fn attach(&mut self, stream: &MediaStream) -> Result<(), SinkError> {
        if !stream.is_active() {
            return Err(SinkError::LoadFailed("stream has no live tracks".into()));
        }
        self.attached = true;
        Ok(())
    }

    fn wait_ready(&mut self) -> BoxFuture<'_, Result<(), SinkError>> {
        let result = if self.streaming() {
            Ok(())
        } else {
            Err(SinkError::NotAttached)
        };
        futures::future::ready(result).boxed()
    }

    fn intrinsic_size(&self) -> Option<Resolution> {
        if !self.streaming() {
            return None;
        }
        let position = self.playback.cursor.load(Ordering::SeqCst);
        self.playback.frame_at(position).map(CameraFrame::resolution)
    }

    fn current_frame(&self) -> Option<CameraFrame> {
        if !self.streaming() {
            return None;
        }
        let position = self.playback.cursor.fetch_add(1, Ordering::SeqCst);
        let mut frame = self.playback.frame_at(position)?.clone();
        frame.sequence = position;
        Some(frame)
    }

    fn detach(&mut self) {
        self.attached = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(width: u32, height: u32, value: u8) -> CameraFrame {
        CameraFrame::packed(
            width,
            height,
            PixelFormat::Gray8,
            vec![value; (width * height) as usize],
        )
    }

    #[tokio::test]
    async fn test_wrong_facing_is_overconstrained() {
        let camera = FileCamera::new(vec![gray(4, 4, 0)]).facing(FacingMode::User);
        let backend = camera.backend();

        let preferred =
            StreamConstraints::preferred(FacingMode::Environment, Resolution::new(1280, 720));
        let err = backend.acquire(&preferred).await.unwrap_err();
        assert_eq!(err.kind, AcquireErrorKind::Overconstrained);

        let stream = backend.acquire(&StreamConstraints::any()).await.unwrap();
        assert!(stream.is_active());
    }

    #[tokio::test]
    async fn test_empty_camera_not_found() {
        let camera = FileCamera::new(Vec::new());
        let err = camera
            .backend()
            .acquire(&StreamConstraints::any())
            .await
            .unwrap_err();
        assert_eq!(err.kind, AcquireErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_sink_plays_frames_in_order() {
        let camera = FileCamera::new(vec![gray(2, 2, 1), gray(3, 3, 2)]);
        let mut stream = camera
            .backend()
            .acquire(&StreamConstraints::any())
            .await
            .unwrap();
        let mut sink = camera.sink();
        sink.attach(&stream).unwrap();
        sink.wait_ready().await.unwrap();

        assert_eq!(sink.intrinsic_size(), Some(Resolution::new(2, 2)));
        let values: Vec<u8> = (0..3)
            .filter_map(|_| sink.current_frame())
            .map(|f| f.data[0])
            .collect();
        assert_eq!(values, vec![1, 2, 1]);
        assert_eq!(camera.frames_read(), 3);

        assert_eq!(stream.stop_all_tracks(), 1);
        assert!(sink.current_frame().is_none());
        assert_eq!(camera.releases(), 1);
    }

    #[tokio::test]
    async fn test_hold_last_frame() {
        let camera = FileCamera::new(vec![gray(2, 2, 1), gray(2, 2, 2)]).hold_last_frame();
        let stream = camera
            .backend()
            .acquire(&StreamConstraints::any())
            .await
            .unwrap();
        let mut sink = camera.sink();
        sink.attach(&stream).unwrap();

        let values: Vec<u8> = (0..4)
            .filter_map(|_| sink.current_frame())
            .map(|f| f.data[0])
            .collect();
        assert_eq!(values, vec![1, 2, 2, 2]);
    }

    #[tokio::test]
    async fn test_second_acquire_while_live_is_busy() {
        let camera = FileCamera::new(vec![gray(2, 2, 0)]);
        let backend = camera.backend();
        let _stream = backend.acquire(&StreamConstraints::any()).await.unwrap();
        let err = backend.acquire(&StreamConstraints::any()).await.unwrap_err();
        assert_eq!(err.kind, AcquireErrorKind::NotReadable);
    }

    #[tokio::test]
    async fn test_failing_camera() {
        let camera = FileCamera::new(vec![gray(2, 2, 0)]).failing(AcquireErrorKind::NotAllowed);
        let err = camera
            .backend()
            .acquire(&StreamConstraints::any())
            .await
            .unwrap_err();
        assert_eq!(err.kind, AcquireErrorKind::NotAllowed);
        assert_eq!(camera.acquisitions(), 0);
    }
}
