// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Lesewerk: uploads, per-page text, and extraction results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    Png,
    Jpeg,
    Bmp,
    Tiff,
    Pdf,
}

impl MediaType {
    /// Every accepted file extension, lowercase, without the dot.
    pub const ACCEPTED_EXTENSIONS: &'static [&'static str] =
        &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "pdf"];

    /// Extensions offered in the image file dialog.
    pub const IMAGE_EXTENSIONS: &'static [&'static str] =
        &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

    /// Infer media type from file extension (case-insensitive, no dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "bmp" => Some(Self::Bmp),
            "tif" | "tiff" => Some(Self::Tiff),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn is_pdf(&self) -> bool {
        matches!(self, Self::Pdf)
    }

    pub fn is_image(&self) -> bool {
        !self.is_pdf()
    }

    /// Short user-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Bmp => "BMP",
            Self::Tiff => "TIFF",
            Self::Pdf => "PDF",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A file accepted by intake. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub id: DocumentId,
    /// Declared filename as supplied by the user.
    pub name: String,
    /// Media type inferred from extension and content signature.
    pub media_type: MediaType,
    /// Raw uploaded bytes.
    pub bytes: Vec<u8>,
    /// SHA-256 of `bytes`, lowercase hex.
    pub sha256: String,
    pub received_at: DateTime<Utc>,
}

impl UploadedDocument {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Inclusive, 1-indexed page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start >= 1 && self.start <= self.end
    }

    /// Number of pages the range selects from a document of `total` pages.
    pub fn clamped_len(&self, total: u32) -> u32 {
        if self.start > total {
            return 0;
        }
        self.end.min(total) - self.start + 1
    }
}

/// Axis-aligned box in page pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// A single recognised word with its confidence (0–100) and location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrWord {
    pub text: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Recognised text for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    /// 0-based position within the processed pages.
    pub index: usize,
    /// 1-based page number in the source document. Differs from `index + 1`
    /// when only a page range was processed.
    pub page_number: u32,
    pub text: String,
    /// Mean word confidence, when the engine reports it.
    pub mean_confidence: Option<f32>,
    /// Per-word layout data; empty unless word data was requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<OcrWord>,
    /// Set when the page failed and was recorded empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl PageText {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// The aggregated outcome of one document. Immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub document_id: DocumentId,
    pub document_name: String,
    pub media_type: MediaType,
    /// Pages in source order; `pages[i].index == i`.
    pub pages: Vec<PageText>,
    pub page_count: usize,
    pub started_at: DateTime<Utc>,
    /// Wall time from the start of processing, decoding and rasterization
    /// included.
    pub elapsed_ms: u64,
    /// Per-page failures recorded under the `RecordEmpty` policy.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ExtractionResult {
    /// Text of every page joined in page order.
    ///
    /// Single images yield the bare text. PDFs get a `--- Page N ---` header
    /// before each page, and pages that produced nothing are marked.
    pub fn combined_text(&self) -> String {
        if self.media_type.is_image() {
            return self
                .pages
                .iter()
                .map(|p| p.text.trim_end())
                .collect::<Vec<_>>()
                .join("\n\n");
        }

        let mut out = String::new();
        for page in &self.pages {
            if page.is_blank() {
                out.push_str(&format!(
                    "--- Page {} (OCR failed or no text detected) ---\n\n",
                    page.page_number
                ));
            } else {
                out.push_str(&format!(
                    "--- Page {} ---\n{}\n\n",
                    page.page_number,
                    page.text.trim_end()
                ));
            }
        }
        out
    }

    /// True when no page produced any text.
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(PageText::is_blank)
    }

    pub fn total_chars(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }

    /// Serialize the full result (including word data) as pretty JSON.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// How the aggregator reacts when OCR fails on a single page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Abort the whole document on the first failing page.
    #[default]
    FailFast,
    /// Record an empty page with a warning and keep going.
    RecordEmpty,
}

/// Pipeline stages for the UI progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// No active run.
    Idle,
    /// Checking extension and content signature.
    Validating,
    /// Rendering PDF pages to images.
    Rasterizing,
    /// Preprocessing + OCR, page by page.
    Recognizing,
    Complete,
    Failed,
}

/// Progress snapshot emitted by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionProgress {
    pub stage: ProcessingStage,
    pub completed_pages: usize,
    pub total_pages: usize,
}

impl ExtractionProgress {
    pub fn new(stage: ProcessingStage, completed_pages: usize, total_pages: usize) -> Self {
        Self {
            stage,
            completed_pages,
            total_pages,
        }
    }

    /// Fraction complete in `0.0..=1.0`; zero when the page count is unknown.
    pub fn fraction(&self) -> f32 {
        if self.total_pages == 0 {
            return 0.0;
        }
        (self.completed_pages as f32 / self.total_pages as f32).clamp(0.0, 1.0)
    }
}

impl Default for ExtractionProgress {
    fn default() -> Self {
        Self::new(ProcessingStage::Idle, 0, 0)
    }
}
