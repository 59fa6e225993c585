// SPDX-License-Identifier: GPL-3.0-only

//! Scan session state
//!
//! The session is an explicit finite-state object. The presentation layer
//! only observes [`SessionSnapshot`]s; it never drives the loop.

use crate::app::frame_processor::types::DecoderKind;
use crate::app::presentation::ZoomLevel;
use crate::errors::ScanError;
use uuid::Uuid;

/// Lifecycle phase of a scan session
///
/// ```text
/// Initializing ──► Scanning ──► Detected
///      │              │
///      └──────────────┴──► Failed
/// ```
///
/// `Detected` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScanPhase {
    /// Acquiring the camera and waiting for video
    #[default]
    Initializing,
    /// Detection loop running
    Scanning,
    /// A barcode was decoded; the loop has stopped
    Detected,
    /// A fatal camera error ended the session
    Failed,
}

impl ScanPhase {
    /// Whether the phase ends the session
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanPhase::Detected | ScanPhase::Failed)
    }

    /// Whether moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: ScanPhase) -> bool {
        match (self, next) {
            (ScanPhase::Initializing, ScanPhase::Scanning) => true,
            (ScanPhase::Scanning, ScanPhase::Detected) => true,
            (ScanPhase::Initializing | ScanPhase::Scanning, ScanPhase::Failed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanPhase::Initializing => write!(f, "initializing"),
            ScanPhase::Scanning => write!(f, "scanning"),
            ScanPhase::Detected => write!(f, "detected"),
            ScanPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Counters kept by the detection loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopStats {
    /// Frame requests issued to the frame clock
    pub ticks_scheduled: u64,
    /// Ticks whose body ran
    pub ticks_run: u64,
    /// Rasters handed to the decoder
    pub decode_attempts: u64,
    /// Decode attempts that failed with a fault
    pub decode_faults: u64,
}

/// Observable view of a scan session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Session identifier (for logs and UI keys)
    pub id: Uuid,
    pub phase: ScanPhase,
    /// Preview zoom; visual only
    pub zoom: ZoomLevel,
    /// Classification of the failure in the `Failed` phase
    pub error: Option<ScanError>,
    /// False once the session has been torn down
    pub live: bool,
    /// Decode path chosen at session start
    pub decoder: Option<DecoderKind>,
    pub stats: LoopStats,
}

impl SessionSnapshot {
    pub fn new(id: Uuid, zoom: ZoomLevel) -> Self {
        Self {
            id,
            phase: ScanPhase::Initializing,
            zoom,
            error: None,
            live: true,
            decoder: None,
            stats: LoopStats::default(),
        }
    }

    /// Apply a phase transition
    ///
    /// Returns false and leaves the snapshot untouched if the transition is
    /// not allowed.
    pub fn transition(&mut self, next: ScanPhase) -> bool {
        if !self.phase.can_transition_to(next) {
            return false;
        }
        self.phase = next;
        true
    }

    /// Move to `Failed` with the given classification
    pub fn fail(&mut self, error: ScanError) -> bool {
        if !self.transition(ScanPhase::Failed) {
            return false;
        }
        self.error = Some(error);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot::new(Uuid::new_v4(), ZoomLevel::default())
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut s = snapshot();
        assert!(s.transition(ScanPhase::Scanning));
        assert!(s.transition(ScanPhase::Detected));
        assert!(s.phase.is_terminal());
    }

    #[test]
    fn test_transitions_are_monotonic() {
        let mut s = snapshot();
        assert!(!s.transition(ScanPhase::Detected));
        assert!(s.transition(ScanPhase::Scanning));
        assert!(!s.transition(ScanPhase::Initializing));
        assert!(!s.transition(ScanPhase::Scanning));
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut s = snapshot();
        assert!(s.fail(ScanError::DeviceBusy("busy".into())));
        assert_eq!(s.phase, ScanPhase::Failed);
        assert!(!s.transition(ScanPhase::Scanning));
        assert!(!s.fail(ScanError::Unknown("again".into())));
        assert_eq!(s.error.as_ref().map(|e| e.classification()), Some("device-busy"));
    }

    #[test]
    fn test_detected_cannot_fail() {
        let mut s = snapshot();
        s.transition(ScanPhase::Scanning);
        s.transition(ScanPhase::Detected);
        assert!(!s.fail(ScanError::Unknown("late".into())));
        assert!(s.error.is_none());
    }
}
