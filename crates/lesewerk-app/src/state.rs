// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Global application state — reactive signals for the Dioxus UI.

use lesewerk_core::AppConfig;
use lesewerk_core::human_errors::HumanError;
use lesewerk_core::types::{ExtractionProgress, ExtractionResult, MediaType};

use crate::services::app_services::AppServices;

const PDF_EXTENSIONS: &[&str] = &["pdf"];

/// Which kind of upload the file picker offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    #[default]
    Image,
    Pdf,
}

impl SourceKind {
    /// Filter name and extensions for the file dialog.
    pub fn dialog_filter(self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Image => ("Images", MediaType::IMAGE_EXTENSIONS),
            Self::Pdf => ("PDF documents", PDF_EXTENSIONS),
        }
    }
}

/// A file picked by the user but not yet processed.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
    /// `data:` URL of a downscaled copy, for image uploads.
    pub preview: Option<String>,
}

/// Shared state accessible to all pages via `use_context`.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Application settings.
    pub config: AppConfig,
    pub source_kind: SourceKind,
    /// The file waiting to be processed.
    pub loaded: Option<LoadedFile>,
    /// True while an extraction is running; the Process button is disabled.
    pub running: bool,
    pub progress: ExtractionProgress,
    /// Outcome of the last successful run.
    pub result: Option<ExtractionResult>,
    /// Outcome of the last failed run.
    pub error: Option<HumanError>,
    /// Status message for user feedback.
    pub status_message: Option<String>,
}

impl AppState {
    /// Create initial state from the backend services.
    pub fn new(svc: &AppServices) -> Self {
        Self {
            config: svc.config(),
            ..Self::default()
        }
    }

    /// Forget the previous run's output.
    pub fn clear_outcome(&mut self) {
        self.result = None;
        self.error = None;
        self.status_message = None;
        self.progress = ExtractionProgress::default();
    }
}
