// SPDX-License-Identifier: GPL-3.0-only

//! Scanner configuration
//!
//! Every field is optional in the JSON file; missing fields take their
//! defaults. The file lives at `$XDG_CONFIG_HOME/idscan/config.json`.

use crate::app::frame_processor::types::Symbology;
use crate::app::presentation::ZoomBounds;
use crate::backends::camera::types::{FacingMode, Resolution, StreamConstraints};
use crate::constants::{self, capture, timing};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Ideal capture resolution for the first camera request
    pub target_resolution: Resolution,
    /// Preferred camera direction for the first camera request
    pub facing_mode: FacingMode,
    /// Symbologies the decoders report; empty means all supported
    pub symbologies: Vec<Symbology>,
    /// Preview zoom range
    pub zoom_bounds: ZoomBounds,
    /// Use the host's native detector when it has one
    pub prefer_native: bool,
    /// How long to wait for the video sink, in milliseconds
    pub ready_timeout_ms: u64,
    /// Frame clock rate for hosts without their own repaint signal
    pub frame_rate: u32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            target_resolution: Resolution::new(capture::TARGET_WIDTH, capture::TARGET_HEIGHT),
            facing_mode: FacingMode::Environment,
            symbologies: Symbology::ALL.to_vec(),
            zoom_bounds: ZoomBounds::default(),
            prefer_native: true,
            ready_timeout_ms: timing::SINK_READY_TIMEOUT.as_millis() as u64,
            frame_rate: timing::DEFAULT_FRAME_RATE,
        }
    }
}

impl ScannerConfig {
    /// Constraints for the first acquisition attempt
    pub fn preferred_constraints(&self) -> StreamConstraints {
        StreamConstraints::preferred(self.facing_mode, self.target_resolution)
    }

    /// Sink readiness timeout
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms.max(1))
    }

    /// Requested symbologies without duplicates, in configured order
    pub fn effective_symbologies(&self) -> Vec<Symbology> {
        let mut out: Vec<Symbology> = Vec::with_capacity(self.symbologies.len());
        for s in &self.symbologies {
            if !out.contains(s) {
                out.push(*s);
            }
        }
        if out.is_empty() {
            out = Symbology::ALL.to_vec();
        }
        out
    }

    /// Zoom bounds normalized into the supported range
    pub fn effective_zoom_bounds(&self) -> ZoomBounds {
        ZoomBounds::new(self.zoom_bounds.min, self.zoom_bounds.max)
    }

    /// Per-user configuration file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(constants::CONFIG_DIR_NAME)
                .join(constants::CONFIG_FILE_NAME)
        })
    }

    /// Load from the per-user location, falling back to defaults when the
    /// file does not exist
    pub fn load() -> AppResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                debug!("No configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from an explicit path
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ScannerConfig = serde_json::from_str(r#"{"prefer_native": false}"#).unwrap();
        assert!(!config.prefer_native);
        assert_eq!(config.target_resolution, Resolution::new(1280, 720));
        assert_eq!(config.symbologies, Symbology::ALL.to_vec());
    }

    #[test]
    fn test_effective_symbologies_dedup_and_default() {
        let mut config = ScannerConfig::default();
        config.symbologies = vec![Symbology::Code39, Symbology::Code39, Symbology::Ean8];
        assert_eq!(
            config.effective_symbologies(),
            vec![Symbology::Code39, Symbology::Ean8]
        );

        config.symbologies.clear();
        assert_eq!(config.effective_symbologies(), Symbology::ALL.to_vec());
    }

    #[test]
    fn test_preferred_constraints() {
        let constraints = ScannerConfig::default().preferred_constraints();
        assert_eq!(constraints.facing_mode, Some(FacingMode::Environment));
        assert_eq!(constraints.ideal_resolution, Some(Resolution::new(1280, 720)));
    }

    #[test]
    fn test_zero_timeout_is_bumped() {
        let config = ScannerConfig {
            ready_timeout_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.ready_timeout(), Duration::from_millis(1));
    }
}
