// SPDX-License-Identifier: GPL-3.0-only

//! Scan session: camera bring-up and the cooperative detection loop
//!
//! ```text
//! BarcodeScanner::start
//!        │
//!        ▼
//! ┌──────────────────┐  acquire + sink ready   ┌──────────────────┐
//! │ Initializing     │ ──────────────────────► │ Scanning         │
//! └──────────────────┘                         └──────────────────┘
//!        │ camera error                           │ tick: sample ─► decode
//!        ▼                                        ▼ first result
//!     Failed                                   Detected ─► release camera ─► callback
//! ```
//!
//! One tokio task drives a session. It suspends only on device
//! acquisition, sink readiness, the frame clock and the decoder; each of
//! those waits races the cancellation signal. [`ScanHandle::stop`] stops
//! the camera tracks before it returns; the task itself winds down at its
//! next suspension point.

use crate::app::frame_processor::{
    BarcodeDecoder, DecodedResult, FrameSampler, NativeBarcodeDetector, select_decoder,
};
use crate::app::presentation::{ScanOverlay, ZoomLevel};
use crate::app::state::{ScanPhase, SessionSnapshot};
use crate::backends::camera::{
    CameraSessionManager, CaptureBackend, FrameClock, LoopAction, StreamReleaser, VideoSink,
};
use crate::config::ScannerConfig;
use crate::errors::ScanError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, trace, warn};
use uuid::Uuid;

/// Invoked exactly once with the first decoded barcode
pub type DetectedCallback = Box<dyn FnOnce(DecodedResult) + Send + 'static>;

/// Platform services a session runs against
pub struct ScanHost {
    pub capture: Arc<dyn CaptureBackend>,
    pub sink: Box<dyn VideoSink>,
    pub clock: Arc<dyn FrameClock>,
    pub native_detector: Option<Arc<dyn NativeBarcodeDetector>>,
}

impl ScanHost {
    /// Host without a native barcode detector
    pub fn new(
        capture: Arc<dyn CaptureBackend>,
        sink: Box<dyn VideoSink>,
        clock: Arc<dyn FrameClock>,
    ) -> Self {
        Self {
            capture,
            sink,
            clock,
            native_detector: None,
        }
    }

    pub fn with_native_detector(mut self, detector: Arc<dyn NativeBarcodeDetector>) -> Self {
        self.native_detector = Some(detector);
        self
    }
}

/// Entry point: configure a scanner, then start a session
pub struct BarcodeScanner {
    on_detected: DetectedCallback,
    config: ScannerConfig,
}

impl BarcodeScanner {
    pub fn new<F>(on_detected: F) -> Self
    where
        F: FnOnce(DecodedResult) + Send + 'static,
    {
        Self {
            on_detected: Box::new(on_detected),
            config: ScannerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ScannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Spawn the session task
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self, host: ScanHost) -> ScanHandle {
        let id = Uuid::new_v4();
        let zoom = ZoomLevel::new(self.config.effective_zoom_bounds());
        let (snapshot, snapshots) = watch::channel(SessionSnapshot::new(id, zoom));

        let camera = CameraSessionManager::new(
            host.capture,
            host.sink,
            self.config.preferred_constraints(),
            self.config.ready_timeout(),
        );
        let shared = Arc::new(Shared {
            live: AtomicBool::new(true),
            snapshot,
            camera: camera.releaser(),
        });

        let task = SessionTask {
            shared: Arc::clone(&shared),
            camera,
            clock: host.clock,
            native_detector: host.native_detector,
            config: self.config,
            on_detected: Some(self.on_detected),
        };

        let span = info_span!("scan_session", session_id = %id);
        let join = tokio::spawn(task.run().instrument(span));
        info!(session_id = %id, "Scan session started");

        ScanHandle {
            id,
            shared,
            snapshots,
            task: Some(join),
        }
    }
}

/// State shared between the session task and its handle
struct Shared {
    /// Cleared exactly once, by whoever tears the session down first
    live: AtomicBool,
    snapshot: watch::Sender<SessionSnapshot>,
    camera: StreamReleaser,
}

impl Shared {
    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Claim teardown; true only for the first caller
    fn claim(&self) -> bool {
        self.live
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn update(&self, modify: impl FnOnce(&mut SessionSnapshot) -> bool) {
        self.snapshot.send_if_modified(modify);
    }

    fn count(&self, modify: impl FnOnce(&mut SessionSnapshot)) {
        self.snapshot.send_modify(modify);
    }

    /// Tear down after an external stop
    ///
    /// The camera tracks are stopped before this returns.
    fn cancel(&self) -> bool {
        if !self.claim() {
            return false;
        }
        let stopped = self.camera.release();
        debug!(stopped, "Camera released on stop");
        self.snapshot.send_modify(|s| s.live = false);
        true
    }
}

/// Resolves once the session is no longer live
async fn cancelled(rx: &mut watch::Receiver<SessionSnapshot>) {
    // A closed channel also ends the wait
    let _ = rx.wait_for(|s| !s.live).await;
}

struct SessionTask {
    shared: Arc<Shared>,
    camera: CameraSessionManager,
    clock: Arc<dyn FrameClock>,
    native_detector: Option<Arc<dyn NativeBarcodeDetector>>,
    config: ScannerConfig,
    on_detected: Option<DetectedCallback>,
}

impl SessionTask {
    async fn run(mut self) {
        let mut cancel = self.shared.snapshot.subscribe();

        let started = tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => None,
            result = self.camera.start() => Some(result),
        };

        match started {
            None => debug!("Session stopped during camera start"),
            Some(Err(error)) => self.fail(error),
            Some(Ok(())) if !self.shared.is_live() => {
                debug!("Session stopped while the camera came up");
            }
            Some(Ok(())) => self.scan(&mut cancel).await,
        }

        self.camera.stop();
    }

    fn fail(&mut self, error: ScanError) {
        self.camera.stop();
        if !self.shared.claim() {
            debug!(error = %error, "Camera error after session was stopped");
            return;
        }
        warn!(
            classification = error.classification(),
            error = %error,
            "Scan session failed"
        );
        self.shared.update(|s| {
            s.live = false;
            s.fail(error);
            true
        });
    }

    async fn scan(&mut self, cancel: &mut watch::Receiver<SessionSnapshot>) {
        let decoder = select_decoder(
            self.native_detector.take(),
            &self.config.effective_symbologies(),
            self.config.prefer_native,
        );
        let kind = decoder.kind();
        self.shared.update(|s| {
            s.decoder = Some(kind);
            s.transition(ScanPhase::Scanning)
        });
        info!(decoder = %kind, "Scanning for barcode");

        let mut sampler = FrameSampler::new();
        let mut tick: u64 = 0;
        loop {
            if !self.shared.is_live() {
                break;
            }

            self.shared.count(|s| s.stats.ticks_scheduled += 1);
            let fired = tokio::select! {
                biased;
                _ = cancelled(cancel) => false,
                _ = self.clock.request_frame() => true,
            };
            if !fired {
                break;
            }

            tick += 1;
            match self.tick(tick, &mut sampler, decoder.as_ref(), cancel).await {
                LoopAction::Continue => {}
                LoopAction::Stop => break,
            }
        }

        debug!(ticks = tick, sampled = sampler.sampled(), "Detection loop ended");
    }

    async fn tick(
        &mut self,
        tick: u64,
        sampler: &mut FrameSampler,
        decoder: &dyn BarcodeDecoder,
        cancel: &mut watch::Receiver<SessionSnapshot>,
    ) -> LoopAction {
        if !self.shared.is_live() {
            return LoopAction::Stop;
        }
        self.shared.count(|s| s.stats.ticks_run += 1);

        let Some(raster) = sampler.sample(self.camera.sink()) else {
            trace!(tick, "No frame available");
            return LoopAction::Continue;
        };

        self.shared.count(|s| s.stats.decode_attempts += 1);
        let outcome = tokio::select! {
            biased;
            _ = cancelled(cancel) => return LoopAction::Stop,
            outcome = decoder.decode(Arc::new(raster)) => outcome,
        };

        if !self.shared.is_live() {
            debug!(tick, "Discarding decode outcome after stop");
            return LoopAction::Stop;
        }

        match outcome {
            Ok(Some(result)) => {
                self.detected(tick, result);
                LoopAction::Stop
            }
            Ok(None) => LoopAction::Continue,
            Err(error) => {
                debug!(tick, error = %error, "Decode attempt failed");
                self.shared.count(|s| s.stats.decode_faults += 1);
                LoopAction::Continue
            }
        }
    }

    fn detected(&mut self, tick: u64, result: DecodedResult) {
        if !self.shared.claim() {
            debug!(tick, "Session stopped before detection was reported");
            return;
        }
        self.shared.update(|s| {
            s.live = false;
            s.transition(ScanPhase::Detected);
            true
        });
        self.camera.stop();

        info!(
            tick,
            decoder = %result.decoder(),
            symbology = ?result.symbology(),
            "Barcode detected"
        );
        if let Some(on_detected) = self.on_detected.take() {
            on_detected(result);
        }
    }
}

/// Handle to a running session
///
/// Dropping the handle stops the session.
pub struct ScanHandle {
    id: Uuid,
    shared: Arc<Shared>,
    snapshots: watch::Receiver<SessionSnapshot>,
    task: Option<JoinHandle<()>>,
}

impl ScanHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> ScanPhase {
        self.shared.snapshot.borrow().phase
    }

    pub fn is_live(&self) -> bool {
        self.shared.is_live()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshot.borrow().clone()
    }

    /// Receiver that observes every snapshot change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// What the scanning UI should currently show
    pub fn overlay(&self) -> ScanOverlay {
        ScanOverlay::from_snapshot(&self.shared.snapshot.borrow())
    }

    /// Set the preview zoom; returns the applied factor
    pub fn set_zoom(&self, factor: f32) -> f32 {
        self.modify_zoom(|zoom| zoom.set(factor))
    }

    pub fn zoom_in(&self) -> f32 {
        self.modify_zoom(ZoomLevel::zoom_in)
    }

    pub fn zoom_out(&self) -> f32 {
        self.modify_zoom(ZoomLevel::zoom_out)
    }

    pub fn reset_zoom(&self) -> f32 {
        self.modify_zoom(ZoomLevel::reset)
    }

    /// Zoom is frozen once the session has been torn down
    fn modify_zoom(&self, change: impl FnOnce(&mut ZoomLevel) -> f32) -> f32 {
        let mut applied = self.shared.snapshot.borrow().zoom.factor();
        self.shared.update(|s| {
            if !s.live {
                return false;
            }
            let before = s.zoom;
            applied = change(&mut s.zoom);
            s.zoom != before
        });
        applied
    }

    /// Stop the session and release the camera
    ///
    /// Safe to call any number of times. Returns true for the call that
    /// actually stopped the session.
    pub fn stop(&self) -> bool {
        let stopped = self.shared.cancel();
        if stopped {
            info!(session_id = %self.id, phase = %self.phase(), "Scan session stopped");
        }
        stopped
    }

    /// Wait for the session task to exit and return the final snapshot
    ///
    /// Does not stop the session; a session that never detects anything
    /// keeps scanning until [`stop`](Self::stop) is called elsewhere.
    pub async fn finished(mut self) -> SessionSnapshot {
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!(session_id = %self.id, error = %e, "Scan session task ended abnormally");
        }
        self.snapshot()
    }
}

impl Drop for ScanHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for ScanHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanHandle")
            .field("id", &self.id)
            .field("phase", &self.phase())
            .field("live", &self.is_live())
            .finish()
    }
}
