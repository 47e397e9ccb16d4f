// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR engines — the seam between page images and recognised text.
//
// The default engine shells out to the `tesseract` binary. A pure-Rust
// engine built on `ocrs` is available behind the `ocrs` cargo feature.

pub mod tesseract;

#[cfg(feature = "ocrs")]
pub mod ocrs_engine;

use std::sync::Arc;

use image::DynamicImage;
use lesewerk_core::config::{AppConfig, OcrBackend};
use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::types::OcrWord;

pub use tesseract::TesseractEngine;

#[cfg(feature = "ocrs")]
pub use ocrs_engine::OcrsEngine;

/// What an engine recognised on one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrOutput {
    /// UTF-8 text, lines separated by `\n`.
    pub text: String,
    /// Per-word layout data; empty when the engine does not report it.
    pub words: Vec<OcrWord>,
    /// Mean word confidence (0–100).
    pub mean_confidence: Option<f32>,
}

impl OcrOutput {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Turns one page image into text.
///
/// Implementations must be usable from several threads at once; the
/// pipeline may call `recognize` for different pages concurrently.
pub trait OcrEngine: Send + Sync {
    /// Short identifier for logs and diagnostics.
    fn name(&self) -> &'static str;

    fn recognize(&self, image: &DynamicImage) -> Result<OcrOutput>;
}

/// Build the engine selected in `config`.
pub fn build_engine(config: &AppConfig) -> Result<Arc<dyn OcrEngine>> {
    match config.engine {
        OcrBackend::Tesseract => Ok(Arc::new(TesseractEngine::from_config(config))),
        #[cfg(feature = "ocrs")]
        OcrBackend::Ocrs => Ok(Arc::new(OcrsEngine::from_config(config)?)),
        #[cfg(not(feature = "ocrs"))]
        OcrBackend::Ocrs => Err(LesewerkError::OcrEngine(
            "this build has no ocrs support; rebuild with `--features ocrs` or choose Tesseract"
                .into(),
        )),
    }
}

/// Mean of the given word confidences, ignoring an empty set.
pub(crate) fn mean_confidence(words: &[OcrWord]) -> Option<f32> {
    if words.is_empty() {
        return None;
    }
    let sum: f32 = words.iter().map(|w| w.confidence).sum();
    Some(sum / words.len() as f32)
}
