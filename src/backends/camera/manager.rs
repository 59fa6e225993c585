// SPDX-License-Identifier: GPL-3.0-only

//! Camera session manager
//!
//! The manager provides:
//! - Stream acquisition with a single fallback to "any available camera"
//! - Binding the stream to the video sink and waiting for it to be ready
//! - Exclusive ownership of the stream and idempotent release

use super::types::*;
use super::{CaptureBackend, VideoSink};
use crate::errors::ScanError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Shared slot for the stream held by a [`CameraSessionManager`]
///
/// Clones refer to the same slot, so the device can be released from
/// outside the task that drives the manager.
#[derive(Clone, Default)]
pub struct StreamReleaser {
    slot: Arc<Mutex<Option<MediaStream>>>,
}

impl StreamReleaser {
    fn lock(&self) -> MutexGuard<'_, Option<MediaStream>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn hold(&self, stream: MediaStream) {
        *self.lock() = Some(stream);
    }

    /// Stop every track of the held stream
    ///
    /// Returns the number of tracks stopped by this call; later calls
    /// return 0.
    pub fn release(&self) -> usize {
        let Some(mut stream) = self.lock().take() else {
            return 0;
        };

        let stopped = stream.stop_all_tracks();
        info!(stream = stream.id(), stopped, "Camera stream released");
        stopped
    }

    /// Whether a stream is currently held
    pub fn is_holding(&self) -> bool {
        self.lock().is_some()
    }
}

impl std::fmt::Debug for StreamReleaser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamReleaser")
            .field("stream", &*self.lock())
            .finish()
    }
}

/// Owns the capture device for one scan session
///
/// At most one stream is held at any instant. [`stop`](Self::stop) is safe
/// to call any number of times and also runs on drop, so the device is
/// released on every exit path.
pub struct CameraSessionManager {
    backend: Arc<dyn CaptureBackend>,
    sink: Box<dyn VideoSink>,
    preferred: StreamConstraints,
    ready_timeout: Duration,
    stream: StreamReleaser,
    attached: bool,
}

impl CameraSessionManager {
    /// Create a manager
    ///
    /// # Arguments
    /// * `backend` - Capture-device acquisition API
    /// * `sink` - Video sink the stream is rendered into
    /// * `preferred` - Constraints for the first acquisition attempt
    /// * `ready_timeout` - Upper bound on waiting for the sink
    pub fn new(
        backend: Arc<dyn CaptureBackend>,
        sink: Box<dyn VideoSink>,
        preferred: StreamConstraints,
        ready_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            sink,
            preferred,
            ready_timeout,
            stream: StreamReleaser::default(),
            attached: false,
        }
    }

    /// Acquire a stream and wait until the sink produces frames
    ///
    /// Calling `start` while a stream is already held is a no-op.
    pub async fn start(&mut self) -> Result<(), ScanError> {
        if self.stream.is_holding() {
            debug!("Camera already started");
            return Ok(());
        }

        let stream = acquire_with_fallback(self.backend.as_ref(), &self.preferred).await?;
        info!(
            backend = self.backend.name(),
            stream = stream.id(),
            tracks = stream.track_count(),
            "Camera stream acquired"
        );

        let attached = self.sink.attach(&stream);
        // Held before waiting so a failed wait still releases the tracks
        self.stream.hold(stream);
        if let Err(e) = attached {
            self.stop();
            return Err(e.into());
        }
        self.attached = true;

        let ready = tokio::time::timeout(self.ready_timeout, self.sink.wait_ready()).await;
        let result = match ready {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(SinkError::Timeout),
        };

        if let Err(e) = result {
            warn!(error = %e, "Video sink failed to become ready");
            self.stop();
            return Err(e.into());
        }

        debug!(size = ?self.sink.intrinsic_size(), "Video sink ready");
        Ok(())
    }

    /// Release the stream: detach the sink and stop every track
    ///
    /// Returns the number of tracks stopped by this call; later calls
    /// return 0, as do calls after a [`StreamReleaser`] got there first.
    pub fn stop(&mut self) -> usize {
        if self.attached {
            self.sink.detach();
            self.attached = false;
        }
        self.stream.release()
    }

    /// Handle that releases this manager's stream without borrowing it
    pub fn releaser(&self) -> StreamReleaser {
        self.stream.clone()
    }

    /// Whether a stream is currently held
    pub fn is_active(&self) -> bool {
        self.stream.is_holding()
    }

    /// The video sink the stream is bound to
    pub fn sink(&self) -> &dyn VideoSink {
        self.sink.as_ref()
    }
}

/// Request the preferred stream, retrying once with "any camera"
///
/// The final error decides the classification.
async fn acquire_with_fallback(
    backend: &dyn CaptureBackend,
    preferred: &StreamConstraints,
) -> Result<MediaStream, ScanError> {
    match backend.acquire(preferred).await {
        Ok(stream) => Ok(stream),
        Err(first) => {
            debug!(
                error = %first,
                constraints = %preferred,
                "Preferred camera request failed, retrying with any camera"
            );
            let any = StreamConstraints::any();
            backend.acquire(&any).await.map_err(|e| {
                warn!(error = %e, "Camera acquisition failed");
                ScanError::from(&e)
            })
        }
    }
}

impl Drop for CameraSessionManager {
    fn drop(&mut self) {
        if self.attached || self.stream.is_holding() {
            debug!("CameraSessionManager dropped, releasing stream");
            self.stop();
        }
    }
}

impl std::fmt::Debug for CameraSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSessionManager")
            .field("backend", &self.backend.name())
            .field("preferred", &self.preferred)
            .field("stream", &self.stream)
            .field("attached", &self.attached)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use futures::future::BoxFuture;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct Track {
        live: Arc<AtomicBool>,
        stops: Arc<AtomicUsize>,
    }

    impl MediaTrack for Track {
        fn id(&self) -> &str {
            "video0"
        }

        fn stop(&mut self) {
            self.live.store(false, Ordering::SeqCst);
            self.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn is_live(&self) -> bool {
            self.live.load(Ordering::SeqCst)
        }
    }

    /// Backend answering each request from a scripted list of outcomes
    struct ScriptedBackend {
        outcomes: Mutex<Vec<Result<(), AcquireErrorKind>>>,
        requests: Mutex<Vec<StreamConstraints>>,
        stops: Arc<AtomicUsize>,
    }

    impl ScriptedBackend {
        fn new(outcomes: Vec<Result<(), AcquireErrorKind>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                requests: Mutex::new(Vec::new()),
                stops: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl CaptureBackend for ScriptedBackend {
        fn acquire<'a>(
            &'a self,
            constraints: &'a StreamConstraints,
        ) -> BoxFuture<'a, Result<MediaStream, AcquireError>> {
            self.requests.lock().unwrap().push(*constraints);
            let outcome = self.outcomes.lock().unwrap().remove(0);
            let stops = Arc::clone(&self.stops);
            async move {
                match outcome {
                    Ok(()) => Ok(MediaStream::new(
                        "stream",
                        vec![Box::new(Track {
                            live: Arc::new(AtomicBool::new(true)),
                            stops,
                        }) as Box<dyn MediaTrack>],
                    )),
                    Err(kind) => Err(AcquireError::new(kind, "scripted")),
                }
            }
            .boxed()
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct Sink {
        ready: Option<Result<(), SinkError>>,
        attached: bool,
    }

    impl VideoSink for Sink {
        fn attach(&mut self, _stream: &MediaStream) -> Result<(), SinkError> {
            self.attached = true;
            Ok(())
        }

        fn wait_ready(&mut self) -> BoxFuture<'_, Result<(), SinkError>> {
            match self.ready.clone() {
                Some(result) => async move { result }.boxed(),
                None => futures::future::pending().boxed(),
            }
        }

        fn intrinsic_size(&self) -> Option<Resolution> {
            self.attached.then(|| Resolution::new(640, 480))
        }

        fn current_frame(&self) -> Option<CameraFrame> {
            None
        }

        fn detach(&mut self) {
            self.attached = false;
        }
    }

    fn manager(backend: Arc<ScriptedBackend>, ready: Option<Result<(), SinkError>>) -> CameraSessionManager {
        CameraSessionManager::new(
            backend,
            Box::new(Sink {
                ready,
                attached: false,
            }),
            StreamConstraints::preferred(FacingMode::Environment, Resolution::new(1280, 720)),
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn test_fallback_to_any_camera() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Err(AcquireErrorKind::Overconstrained),
            Ok(()),
        ]));
        let mut mgr = manager(Arc::clone(&backend), Some(Ok(())));

        mgr.start().await.unwrap();
        assert!(mgr.is_active());

        let requests = backend.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 2);
        assert!(!requests[0].is_unconstrained());
        assert!(requests[1].is_unconstrained());
    }

    #[tokio::test]
    async fn test_classifies_final_error() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Err(AcquireErrorKind::Overconstrained),
            Err(AcquireErrorKind::NotReadable),
        ]));
        let mut mgr = manager(backend, Some(Ok(())));

        let err = mgr.start().await.unwrap_err();
        assert_eq!(err.classification(), "device-busy");
        assert!(!mgr.is_active());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let backend = Arc::new(ScriptedBackend::new(vec![Ok(())]));
        let mut mgr = manager(Arc::clone(&backend), Some(Ok(())));
        mgr.start().await.unwrap();

        assert_eq!(mgr.stop(), 1);
        assert_eq!(mgr.stop(), 0);
        drop(mgr);
        assert_eq!(backend.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sink_timeout_releases_stream() {
        let backend = Arc::new(ScriptedBackend::new(vec![Ok(())]));
        let mut mgr = manager(Arc::clone(&backend), None);

        let err = mgr.start().await.unwrap_err();
        assert_eq!(err.classification(), "video-unavailable");
        assert!(!mgr.is_active());
        assert_eq!(backend.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sink_error_releases_stream() {
        let backend = Arc::new(ScriptedBackend::new(vec![Ok(())]));
        let mut mgr = manager(
            Arc::clone(&backend),
            Some(Err(SinkError::LoadFailed("decoder".into()))),
        );

        let err = mgr.start().await.unwrap_err();
        assert_eq!(err.classification(), "video-unavailable");
        assert_eq!(backend.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_releaser_stops_tracks_from_outside() {
        let backend = Arc::new(ScriptedBackend::new(vec![Ok(())]));
        let mut mgr = manager(Arc::clone(&backend), Some(Ok(())));
        mgr.start().await.unwrap();

        let releaser = mgr.releaser();
        assert!(releaser.is_holding());
        assert_eq!(releaser.release(), 1);
        assert_eq!(backend.stops.load(Ordering::SeqCst), 1);
        assert!(!mgr.is_active());

        // The manager still detaches the sink but has no tracks left to stop
        assert!(mgr.sink().intrinsic_size().is_some());
        assert_eq!(mgr.stop(), 0);
        assert!(mgr.sink().intrinsic_size().is_none());
        assert_eq!(releaser.release(), 0);
        assert_eq!(backend.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_twice_holds_one_stream() {
        let backend = Arc::new(ScriptedBackend::new(vec![Ok(())]));
        let mut mgr = manager(Arc::clone(&backend), Some(Ok(())));
        mgr.start().await.unwrap();
        mgr.start().await.unwrap();
        assert_eq!(backend.requests.lock().unwrap().len(), 1);
    }
}
