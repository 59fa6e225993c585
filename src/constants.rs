// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Capture request defaults
pub mod capture {
    /// Ideal capture width requested from the environment-facing camera
    pub const TARGET_WIDTH: u32 = 1280;
    /// Ideal capture height requested from the environment-facing camera
    pub const TARGET_HEIGHT: u32 = 720;
}

/// Detection loop timing
pub mod timing {
    use super::Duration;

    /// Default display refresh rate used by the frame clock
    pub const DEFAULT_FRAME_RATE: u32 = 60;

    /// Upper bound on the frame clock rate
    pub const MAX_FRAME_RATE: u32 = 240;

    /// How long the video sink may take to report that frames are flowing
    pub const SINK_READY_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Presentation zoom bounds
///
/// Zoom is a visual transform on the preview only and never changes the
/// resolution of the raster handed to the decoders.
pub mod zoom {
    /// Smallest allowed zoom factor (no magnification)
    pub const MIN: f32 = 1.0;
    /// Largest allowed zoom factor
    pub const MAX: f32 = 3.0;
    /// Slider / button step
    pub const STEP: f32 = 0.1;
    /// Initial zoom factor of a new session
    pub const DEFAULT: f32 = 1.0;
}

/// File extensions accepted by the virtual camera
pub mod file_formats {
    /// Still image extensions that can be played as camera frames
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp", "gif", "tiff"];

    /// Check if an extension (lowercase, without dot) is a supported image
    pub fn is_image_extension(extension: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&extension)
    }
}

/// Name of the per-user configuration directory and file
pub const CONFIG_DIR_NAME: &str = "idscan";
pub const CONFIG_FILE_NAME: &str = "config.json";
