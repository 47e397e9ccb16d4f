// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Lesewerk.

use thiserror::Error;

/// Phrase embedded in rasterizer/OCR error details when the external binary
/// could not be launched at all. `human_errors` keys install hints off it.
pub const MISSING_TOOL_MARKER: &str = "is not installed or not on PATH";

/// Top-level error type for all Lesewerk operations.
#[derive(Debug, Error)]
pub enum LesewerkError {
    // -- Intake --
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    // -- Pipeline stages --
    #[error("image preprocessing failed: {0}")]
    Preprocessing(String),

    #[error("PDF rasterization failed: {0}")]
    Rasterization(String),

    #[error("OCR engine failed: {0}")]
    OcrEngine(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Broken pipeline invariant (e.g. a page recorded twice).
    #[error("internal error: {0}")]
    Internal(String),
}

impl LesewerkError {
    /// Build the error for an external binary that could not be spawned.
    ///
    /// PDF tools map to `Rasterization`, everything else to `OcrEngine`.
    pub fn missing_tool(tool: &str, source: &std::io::Error) -> Self {
        let detail = format!("{tool} {MISSING_TOOL_MARKER} ({source})");
        if tool.starts_with("pdf") {
            Self::Rasterization(detail)
        } else {
            Self::OcrEngine(detail)
        }
    }

    /// Whether this error came from a missing external binary.
    pub fn is_missing_tool(&self) -> bool {
        match self {
            Self::Rasterization(detail) | Self::OcrEngine(detail) => {
                detail.contains(MISSING_TOOL_MARKER)
            }
            _ => false,
        }
    }

    /// Short machine-readable kind, used in logs and JSON exports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::Preprocessing(_) => "preprocessing",
            Self::Rasterization(_) => "rasterization",
            Self::OcrEngine(_) => "ocr_engine",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Internal(_) => "internal",
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LesewerkError>;
