// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// lesewerk-document — the OCR pipeline behind Lesewerk.
//
// Validates uploads, renders PDF pages through Poppler, cleans page images up
// for recognition, runs an OCR engine per page, and aggregates the text in
// page order.

pub mod aggregate;
mod command;
pub mod image;
pub mod intake;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod preprocess;
pub mod tools;

// Re-export the primary types so callers can use `lesewerk_document::FileIntake` etc.
pub use aggregate::{ResultAggregator, RunStart};
pub use image::processor::ImageProcessor;
pub use intake::FileIntake;
pub use ocr::{OcrEngine, OcrOutput, TesseractEngine, build_engine};
pub use pdf::raster::{PageImage, PdfRasterizer, PdftoppmRasterizer, RasterRequest};
pub use pdf::reader::PdfReader;
pub use pipeline::{ExtractionPipeline, ProgressFn, no_progress};
pub use preprocess::Preprocessor;
pub use tools::{DiagnosticReport, StepResult, run_diagnostics};

#[cfg(feature = "ocrs")]
pub use ocr::OcrsEngine;
