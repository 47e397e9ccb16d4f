// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pure-Rust OCR engine built on `ocrs`, with neural network models executed
// via `rten`. Only compiled with the `ocrs` feature.
//
// The engine needs two model files in its model directory:
//
// - `text-detection.rten` — locates text regions in the image.
// - `text-recognition.rten` — decodes characters from detected regions.
//
// Running `ocrs-cli` once downloads both into `$XDG_CACHE_HOME/ocrs`
// (typically `~/.cache/ocrs`), which is also the default directory here.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use lesewerk_core::config::AppConfig;
use lesewerk_core::error::{LesewerkError, Result};
use ocrs::{ImageSource, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument};

use super::{OcrEngine, OcrOutput};

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
pub fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Engine wrapping a loaded `ocrs::OcrEngine`.
///
/// Model loading is the expensive step; build once and reuse for every page.
pub struct OcrsEngine {
    engine: ocrs::OcrEngine,
}

impl OcrsEngine {
    /// Load models from `config.ocrs_model_dir`, or the default cache dir.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let dir = config
            .ocrs_model_dir
            .clone()
            .unwrap_or_else(default_model_dir);
        Self::from_model_dir(&dir)
    }

    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub fn from_model_dir(dir: &Path) -> Result<Self> {
        let detection = load_model(&dir.join(DETECTION_MODEL_FILENAME))?;
        let recognition = load_model(&dir.join(RECOGNITION_MODEL_FILENAME))?;

        let engine = ocrs::OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection),
            recognition_model: Some(recognition),
            ..Default::default()
        })
        .map_err(|err| LesewerkError::OcrEngine(format!("failed to initialise ocrs: {err}")))?;

        info!("ocrs engine initialised");
        Ok(Self { engine })
    }
}

fn load_model(path: &Path) -> Result<Model> {
    if !path.exists() {
        return Err(LesewerkError::OcrEngine(format!(
            "ocrs model not found at {}",
            path.display()
        )));
    }
    debug!(path = %path.display(), "Loading ocrs model");
    Model::load_file(path).map_err(|err| {
        LesewerkError::OcrEngine(format!(
            "failed to load ocrs model from {}: {err}",
            path.display()
        ))
    })
}

impl OcrEngine for OcrsEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize(&self, image: &DynamicImage) -> Result<OcrOutput> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            LesewerkError::OcrEngine(format!(
                "failed to create image source ({width}x{height}): {err}"
            ))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| LesewerkError::OcrEngine(format!("ocrs input preparation failed: {err}")))?;
        let text = self
            .engine
            .get_text(&input)
            .map_err(|err| LesewerkError::OcrEngine(format!("ocrs recognition failed: {err}")))?;

        debug!(lines = text.lines().count(), "ocrs recognition complete");
        Ok(OcrOutput::from_text(text.trim_end()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dir_ends_in_ocrs() {
        let dir = default_model_dir();
        assert!(dir.ends_with("ocrs") || dir.ends_with("ocrs-models"));
    }

    #[test]
    fn missing_models_report_model_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = OcrsEngine::from_model_dir(dir.path()).err().unwrap();
        assert!(err.to_string().contains("model not found"));
    }
}
