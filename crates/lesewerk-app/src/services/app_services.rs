// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — owns the persisted configuration and runs
// extractions, diagnostics and exports on behalf of the Dioxus UI.
//
// A fresh `ExtractionPipeline` is built from the current config for every
// document, so saved settings take effect on the next run without a restart.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use base64::Engine;
use image::ImageFormat;
use lesewerk_core::AppConfig;
use lesewerk_core::error::Result;
use lesewerk_core::types::{ExtractionProgress, ExtractionResult};
use lesewerk_document::tools::{self, DiagnosticReport};
use lesewerk_document::{ExtractionPipeline, ImageProcessor};
use tracing::{info, warn};

use super::data_dir;

/// Longest edge of the upload preview shown on the Extract page.
const PREVIEW_EDGE: u32 = 480;

/// Shared application services accessible from all Dioxus components via
/// `use_context::<AppServices>()`.
///
/// Cheaply cloneable; clones share the same config.
#[derive(Clone)]
pub struct AppServices {
    data_dir: PathBuf,
    config: Arc<Mutex<AppConfig>>,
}

impl AppServices {
    /// Initialise services from the user's data directory. Call once at startup.
    pub fn init() -> Self {
        Self::with_data_dir(data_dir::data_dir())
    }

    /// Services rooted at an explicit directory.
    pub fn with_data_dir(dir: PathBuf) -> Self {
        info!(path = %dir.display(), "initialising app services");
        let config = load_config(&dir).unwrap_or_default();
        Self {
            data_dir: dir,
            config: Arc::new(Mutex::new(config)),
        }
    }

    fn lock_config(&self) -> MutexGuard<'_, AppConfig> {
        self.config.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // -- Config Persistence --------------------------------------------------

    /// Get a clone of the current config.
    pub fn config(&self) -> AppConfig {
        self.lock_config().clone()
    }

    /// Validate, store and persist the config.
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        config.validate()?;
        *self.lock_config() = config.clone();
        persist_config(&self.data_dir, config)
    }

    // -- Extraction ----------------------------------------------------------

    /// Run one upload through the pipeline. Blocks until done.
    pub fn extract(
        &self,
        name: &str,
        bytes: Vec<u8>,
        progress: &(dyn Fn(ExtractionProgress) + Send + Sync),
    ) -> Result<ExtractionResult> {
        let pipeline = ExtractionPipeline::from_config(self.config())?;
        pipeline.process_upload(name, bytes, progress)
    }

    /// Check that tesseract, its language data and pdftoppm are usable.
    pub fn diagnose(&self) -> DiagnosticReport {
        tools::run_diagnostics(&self.config())
    }

    // -- Export --------------------------------------------------------------

    /// Write the combined text of a result to `path`.
    pub fn export_text(&self, result: &ExtractionResult, path: &Path) -> Result<()> {
        std::fs::write(path, result.combined_text())?;
        info!(path = %path.display(), "text exported");
        Ok(())
    }

    /// Write the full result, including per-page data, as JSON.
    pub fn export_json(&self, result: &ExtractionResult, path: &Path) -> Result<()> {
        std::fs::write(path, result.to_json()?)?;
        info!(path = %path.display(), "JSON exported");
        Ok(())
    }

    /// Path to the data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

/// Downscaled PNG of an uploaded image as a `data:` URL, for `img { src }`.
///
/// `None` when the bytes don't decode; the pipeline reports that properly.
pub fn preview_data_url(bytes: &[u8]) -> Option<String> {
    let image = ImageProcessor::from_bytes(bytes).ok()?.into_dynamic();
    let thumb = image.thumbnail(PREVIEW_EDGE, PREVIEW_EDGE);
    let mut png = Cursor::new(Vec::new());
    thumb.write_to(&mut png, ImageFormat::Png).ok()?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(png.into_inner());
    Some(format!("data:image/png;base64,{encoded}"))
}

/// Suggested export file name, e.g. `scan.pdf` → `scan-ocr.txt`.
pub fn export_file_name(document_name: &str, extension: &str) -> String {
    let stem = Path::new(document_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("lesewerk");
    format!("{stem}-ocr.{extension}")
}

// -- Config file persistence -------------------------------------------------

const CONFIG_FILE: &str = "config.json";

fn load_config(data_dir: &Path) -> Option<AppConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    match AppConfig::from_json(&data) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable config; using defaults");
            None
        }
    }
}

fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    std::fs::write(&path, config.to_json()?)?;
    Ok(())
}
