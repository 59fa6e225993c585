// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for barcode scanning
//!
//! This module provides command-line functionality for:
//! - Scanning image files played through the virtual camera
//! - Decoding a single image
//! - Showing and initializing the configuration

use idscan::app::frame_processor::sampler::raster_from_frame;
use idscan::app::frame_processor::{DecodedResult, SoftwareDetector};
use idscan::backends::camera::DisplayClock;
use idscan::backends::virtual_camera::{FileCamera, collect_image_paths, load_image_as_frame};
use idscan::{AppError, BarcodeScanner, ScanError, ScanHost, ScanPhase, ScannerConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;

/// Load the configuration from an explicit path or the per-user location
fn load_config(path: Option<&Path>) -> Result<ScannerConfig, AppError> {
    match path {
        Some(path) => ScannerConfig::load_from(path),
        None => ScannerConfig::load(),
    }
}

/// Scan image files played through the virtual camera
pub fn scan_files(
    files: &[PathBuf],
    timeout: Option<u64>,
    config_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;

    let paths = collect_image_paths(files)?;
    if paths.is_empty() {
        return Err("No supported image files given".into());
    }

    let camera = FileCamera::open(paths.as_slice())?.facing(config.facing_mode);
    println!(
        "Playing {} image(s) through the virtual camera",
        camera.frame_count()
    );
    println!("Scanning... (press Ctrl+C to stop)");

    let runtime = tokio::runtime::Runtime::new()?;
    let (phase, detected) = runtime.block_on(run_scan(camera, config, timeout))?;

    match (phase, detected) {
        (_, Some(result)) => {
            print_result(&result);
            Ok(())
        }
        (ScanPhase::Failed, None) => Err("Scan failed".into()),
        _ => Err("No barcode found".into()),
    }
}

/// Run one scan session until detection, failure, Ctrl+C or timeout
async fn run_scan(
    camera: FileCamera,
    config: ScannerConfig,
    timeout: Option<u64>,
) -> Result<(ScanPhase, Option<DecodedResult>), Box<dyn std::error::Error>> {
    let (tx, mut rx) = oneshot::channel();
    let clock = Arc::new(DisplayClock::new(config.frame_rate));
    let host = ScanHost::new(camera.backend(), camera.sink(), clock);

    let handle = BarcodeScanner::new(move |result| {
        forward_result(tx, result);
    })
    .with_config(config)
    .start(host);

    let mut snapshots = handle.subscribe();
    let deadline = async move {
        match timeout {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = snapshots.wait_for(|s| !s.live) => {}
        _ = tokio::signal::ctrl_c() => {
            println!();
            println!("Stopping...");
            handle.stop();
        }
        _ = deadline => {
            println!("Timed out after {} seconds", timeout.unwrap_or_default());
            handle.stop();
        }
    }

    let snapshot = handle.finished().await;
    if let Some(error) = &snapshot.error {
        print_scan_error(error);
    }
    println!(
        "Frames: {} scheduled, {} decoded",
        snapshot.stats.ticks_scheduled, snapshot.stats.decode_attempts
    );

    Ok((snapshot.phase, rx.try_recv().ok()))
}

/// Decode a single image with the software reader
pub fn decode_image(
    path: &Path,
    config_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;

    let frame = load_image_as_frame(path)?;
    println!("Image: {}x{}", frame.width, frame.height);
    let raster = raster_from_frame(&frame).ok_or("Image has no pixel data")?;

    let decoder = SoftwareDetector::load(&config.effective_symbologies());
    match decoder.decode_blocking(&raster)? {
        Some(result) => {
            print_result(&result);
            Ok(())
        }
        None => Err("No barcode found".into()),
    }
}

/// Print the effective configuration, or its location
pub fn show_config(
    config_path: Option<&Path>,
    print_path: bool,
    write: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path
        .map(Path::to_path_buf)
        .or_else(ScannerConfig::default_path);

    if print_path {
        let path = path.ok_or("No configuration directory available")?;
        println!("{}", path.display());
        return Ok(());
    }

    if write {
        let path = path.ok_or("No configuration directory available")?;
        if path.exists() {
            println!("Configuration already exists: {}", path.display());
        } else {
            ScannerConfig::default().save_to(&path)?;
            println!("Wrote default configuration: {}", path.display());
        }
        return Ok(());
    }

    let config = load_config(config_path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Hand a detection to the waiting scan
///
/// Returns false if the scan already gave up on the result.
fn forward_result(tx: oneshot::Sender<DecodedResult>, result: DecodedResult) -> bool {
    match tx.send(result) {
        Ok(()) => true,
        Err(result) => {
            debug!(
                symbology = ?result.symbology(),
                sequence = result.frame_sequence(),
                "Scan stopped waiting, dropping detected barcode"
            );
            false
        }
    }
}

fn print_result(result: &DecodedResult) {
    let symbology = result
        .symbology()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!("Format: {} ({} decoder)", symbology, result.decoder());
    println!("{}", result.as_str());
}

fn print_scan_error(error: &ScanError) {
    println!("{}", error.user_message());
    for step in error.recovery_steps() {
        println!("  - {}", step);
    }
    println!("({}: {})", error.classification(), error.detail());
}

#[cfg(test)]
mod tests {
    use super::*;
    use idscan::{DecoderKind, Symbology};

    fn result() -> DecodedResult {
        DecodedResult::new("REG2024001", Some(Symbology::Code128), DecoderKind::Software, 4)
    }

    #[test]
    fn test_forward_result_reaches_receiver() {
        let (tx, mut rx) = oneshot::channel();
        assert!(forward_result(tx, result()));
        assert_eq!(rx.try_recv().unwrap().as_str(), "REG2024001");
    }

    #[test]
    fn test_forward_result_without_receiver() {
        let (tx, rx) = oneshot::channel();
        drop(rx);
        assert!(!forward_result(tx, result()));
    }
}
