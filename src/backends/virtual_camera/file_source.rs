// SPDX-License-Identifier: GPL-3.0-only

//! Still image loading for the virtual camera

use crate::backends::camera::types::{CameraFrame, PixelFormat, SinkError};
use crate::constants::file_formats;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Whether the path has a supported image extension
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| file_formats::is_image_extension(&e.to_lowercase()))
        .unwrap_or(false)
}

/// Load an image file as a tightly packed RGBA frame
pub fn load_image_as_frame(path: &Path) -> Result<CameraFrame, SinkError> {
    debug!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        SinkError::LoadFailed(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let frame = frame_from_image(img.to_rgba8());
    info!(
        path = %path.display(),
        width = frame.width,
        height = frame.height,
        "Image loaded"
    );
    Ok(frame)
}

/// Wrap an RGBA image as a camera frame
pub fn frame_from_image(rgba: RgbaImage) -> CameraFrame {
    let width = rgba.width();
    let height = rgba.height();
    CameraFrame::packed(width, height, PixelFormat::RGBA, rgba.into_raw())
}

/// Expand files and directories into a sorted list of image paths
///
/// Directories contribute their supported images (not recursively);
/// explicit files are kept only if they have a supported extension.
pub fn collect_image_paths(input: &[PathBuf]) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for path in input {
        if path.is_dir() {
            let mut found = Vec::new();
            for entry in std::fs::read_dir(path)? {
                let file_path = entry?.path();
                if is_supported_image(&file_path) {
                    found.push(file_path);
                }
            }
            found.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
            paths.extend(found);
        } else if is_supported_image(path) {
            paths.push(path.clone());
        } else {
            debug!(path = %path.display(), "Skipping unsupported file");
        }
    }

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_image(Path::new("a/b/label.PNG")));
        assert!(is_supported_image(Path::new("photo.jpeg")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("no_extension")));
    }

    #[test]
    fn test_frame_from_image_is_packed() {
        let frame = frame_from_image(RgbaImage::new(3, 2));
        assert_eq!(frame.stride, 12);
        assert_eq!(frame.data.len(), 24);
        assert_eq!(frame.format, PixelFormat::RGBA);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = load_image_as_frame(Path::new("/nonexistent/frame.png")).unwrap_err();
        assert!(matches!(err, SinkError::LoadFailed(_)));
    }

    #[test]
    fn test_collect_sorts_directory_entries() {
        let dir = std::env::temp_dir().join(format!("idscan-collect-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["b.png", "a.png", "c.txt"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }

        let paths = collect_image_paths(std::slice::from_ref(&dir)).unwrap();
        let names: Vec<_> = paths
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["a.png", "b.png"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
