// SPDX-License-Identifier: GPL-3.0-only

//! Preview presentation: zoom and scanning overlay
//!
//! Zoom is applied to the on-screen preview only. Nothing here feeds back
//! into frame sampling, so decode results do not depend on it.

use crate::app::frame_processor::types::FrameRegion;
use crate::app::state::{ScanPhase, SessionSnapshot};
use crate::constants::zoom;
use serde::{Deserialize, Serialize};

/// Allowed zoom range, always inside [1.0, 3.0]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomBounds {
    pub min: f32,
    pub max: f32,
}

impl ZoomBounds {
    /// Create bounds, clamped to the supported range and put in order
    pub fn new(min: f32, max: f32) -> Self {
        let clamp = |v: f32| {
            if v.is_finite() {
                v.clamp(zoom::MIN, zoom::MAX)
            } else {
                zoom::MIN
            }
        };
        let (a, b) = (clamp(min), clamp(max));
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    fn min_steps(&self) -> u32 {
        (self.min / zoom::STEP).round() as u32
    }

    fn max_steps(&self) -> u32 {
        (self.max / zoom::STEP).round() as u32
    }
}

impl Default for ZoomBounds {
    fn default() -> Self {
        Self {
            min: zoom::MIN,
            max: zoom::MAX,
        }
    }
}

/// Current zoom factor, stored in whole 0.1 steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomLevel {
    steps: u32,
    min_steps: u32,
    max_steps: u32,
}

impl ZoomLevel {
    /// Default zoom within the given bounds
    pub fn new(bounds: ZoomBounds) -> Self {
        let mut level = Self {
            steps: 0,
            min_steps: bounds.min_steps(),
            max_steps: bounds.max_steps(),
        };
        level.set(zoom::DEFAULT);
        level
    }

    /// Zoom factor (1.0 = no magnification)
    pub fn factor(&self) -> f32 {
        self.steps as f32 * zoom::STEP
    }

    /// Set the factor, clamped to the bounds and rounded to a 0.1 step
    ///
    /// Non-finite input is ignored. Returns the applied factor.
    pub fn set(&mut self, factor: f32) -> f32 {
        if factor.is_finite() {
            let steps = (factor / zoom::STEP).round().max(0.0) as u32;
            self.steps = steps.clamp(self.min_steps, self.max_steps);
        }
        self.factor()
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.steps = (self.steps + 1).min(self.max_steps);
        self.factor()
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.steps = self.steps.saturating_sub(1).max(self.min_steps);
        self.factor()
    }

    pub fn reset(&mut self) -> f32 {
        self.set(zoom::DEFAULT)
    }

    /// Whether the preview is magnified
    pub fn is_magnified(&self) -> bool {
        self.steps > (zoom::MIN / zoom::STEP).round() as u32
    }

    /// Preview transform for this zoom level
    pub fn transform(&self) -> PreviewTransform {
        PreviewTransform {
            scale: self.factor(),
        }
    }

    /// Slider label, e.g. `Zoom: 1.5x (for small barcodes)`
    pub fn label(&self) -> String {
        if self.is_magnified() {
            format!("Zoom: {:.1}x (for small barcodes)", self.factor())
        } else {
            format!("Zoom: {:.1}x", self.factor())
        }
    }
}

impl Default for ZoomLevel {
    fn default() -> Self {
        Self::new(ZoomBounds::default())
    }
}

/// Centre-anchored scale applied to the preview surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewTransform {
    pub scale: f32,
}

impl PreviewTransform {
    /// Part of the video that stays visible when the scaled preview is
    /// clipped to its original box
    pub fn visible_region(&self) -> FrameRegion {
        let size = 1.0 / self.scale.max(1.0);
        let offset = (1.0 - size) / 2.0;
        FrameRegion {
            x: offset,
            y: offset,
            width: size,
            height: size,
        }
    }

    /// Size of the preview box after scaling
    pub fn scaled_size(&self, width: f32, height: f32) -> (f32, f32) {
        (width * self.scale, height * self.scale)
    }
}

/// What the scanning UI should show for a session snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOverlay {
    /// Main status line
    pub headline: String,
    /// Secondary guidance lines
    pub hints: Vec<String>,
    /// Show the "initializing" spinner
    pub show_spinner: bool,
    /// Show the targeting frame and scanning indicator
    pub show_scan_frame: bool,
    /// Show the zoom slider
    pub show_zoom_controls: bool,
    /// Zoom slider label
    pub zoom_label: String,
}

impl ScanOverlay {
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        let zoom_label = snapshot.zoom.label();

        match snapshot.phase {
            ScanPhase::Initializing => Self {
                headline: "Starting camera...".into(),
                hints: vec!["Please allow camera permissions".into()],
                show_spinner: true,
                show_scan_frame: false,
                show_zoom_controls: true,
                zoom_label,
            },
            ScanPhase::Scanning => Self {
                headline: "Scanning for barcode...".into(),
                hints: vec![
                    "Use zoom for small barcodes • Keep barcode horizontal".into(),
                    "Make sure the barcode is well-lit and in focus".into(),
                ],
                show_spinner: false,
                show_scan_frame: snapshot.live,
                show_zoom_controls: true,
                zoom_label,
            },
            ScanPhase::Detected => Self {
                headline: "Barcode detected".into(),
                hints: Vec::new(),
                show_spinner: false,
                show_scan_frame: false,
                show_zoom_controls: false,
                zoom_label,
            },
            ScanPhase::Failed => {
                let (headline, hints) = match &snapshot.error {
                    Some(error) => (
                        error.user_message().to_string(),
                        error.recovery_steps().iter().map(|s| s.to_string()).collect(),
                    ),
                    None => ("Failed to access camera.".to_string(), Vec::new()),
                };
                Self {
                    headline,
                    hints,
                    show_spinner: false,
                    show_scan_frame: false,
                    show_zoom_controls: false,
                    zoom_label,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_defaults_to_one() {
        let zoom = ZoomLevel::default();
        assert_eq!(zoom.factor(), 1.0);
        assert!(!zoom.is_magnified());
        assert_eq!(zoom.label(), "Zoom: 1.0x");
    }

    #[test]
    fn test_zoom_clamps_to_bounds() {
        let mut zoom = ZoomLevel::default();
        assert_eq!(zoom.set(5.0), 3.0);
        assert_eq!(zoom.set(0.2), 1.0);
        assert_eq!(zoom.set(f32::NAN), 1.0);
    }

    #[test]
    fn test_zoom_rounds_to_steps() {
        let mut zoom = ZoomLevel::default();
        zoom.set(1.54);
        assert_eq!(zoom.label(), "Zoom: 1.5x (for small barcodes)");
        zoom.zoom_in();
        assert!((zoom.factor() - 1.6).abs() < 1e-6);
        zoom.reset();
        assert_eq!(zoom.factor(), 1.0);
        zoom.zoom_out();
        assert_eq!(zoom.factor(), 1.0);
    }

    #[test]
    fn test_custom_bounds() {
        let bounds = ZoomBounds::new(2.5, 1.5);
        assert_eq!(bounds, ZoomBounds { min: 1.5, max: 2.5 });
        let mut zoom = ZoomLevel::new(bounds);
        assert!((zoom.factor() - 1.5).abs() < 1e-6);
        assert!((zoom.set(9.0) - 2.5).abs() < 1e-6);

        let wide = ZoomBounds::new(0.5, 10.0);
        assert_eq!(wide, ZoomBounds::default());
    }

    #[test]
    fn test_visible_region_shrinks_with_zoom() {
        let region = PreviewTransform { scale: 2.0 }.visible_region();
        assert_eq!(region.width, 0.5);
        assert_eq!(region.x, 0.25);
        assert_eq!(PreviewTransform { scale: 2.0 }.scaled_size(100.0, 50.0), (200.0, 100.0));
    }
}
