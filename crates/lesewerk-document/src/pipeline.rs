// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extraction pipeline — intake, rasterization, preprocessing, OCR and
// aggregation for one document, start to finish.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use lesewerk_core::config::AppConfig;
use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::types::{
    ExtractionProgress, ExtractionResult, FailurePolicy, ProcessingStage, UploadedDocument,
};
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::aggregate::{ResultAggregator, RunStart};
use crate::image::ImageProcessor;
use crate::intake::FileIntake;
use crate::ocr::{self, OcrEngine, OcrOutput};
use crate::pdf::raster::{PageImage, PdfRasterizer, PdftoppmRasterizer, RasterRequest};
use crate::preprocess::Preprocessor;

/// Callback receiving progress snapshots. May be called from worker threads.
pub type ProgressFn<'a> = &'a (dyn Fn(ExtractionProgress) + Send + Sync);

/// Progress callback that discards every update.
pub fn no_progress(_: ExtractionProgress) {}

/// Runs documents through rasterization, preprocessing and OCR.
///
/// Holds no per-document state, so one pipeline can process any number of
/// documents one after another.
pub struct ExtractionPipeline {
    config: AppConfig,
    preprocessor: Preprocessor,
    rasterizer: Arc<dyn PdfRasterizer>,
    engine: Arc<dyn OcrEngine>,
}

impl ExtractionPipeline {
    pub fn new(
        config: AppConfig,
        rasterizer: Arc<dyn PdfRasterizer>,
        engine: Arc<dyn OcrEngine>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            preprocessor: Preprocessor::new(config.preprocess.clone()),
            config,
            rasterizer,
            engine,
        })
    }

    /// Pipeline with `pdftoppm` and the engine chosen in `config`.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let rasterizer = Arc::new(PdftoppmRasterizer::new(config.pdftoppm_binary()));
        let engine = ocr::build_engine(&config)?;
        Self::new(config, rasterizer, engine)
    }

    /// Validate a raw upload, then process it.
    pub fn process_upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
        progress: ProgressFn<'_>,
    ) -> Result<ExtractionResult> {
        let start = RunStart::now();
        progress(ExtractionProgress::new(ProcessingStage::Validating, 0, 0));
        let document = FileIntake::from_config(&self.config)
            .accept(name, bytes)
            .inspect_err(|_| {
                progress(ExtractionProgress::new(ProcessingStage::Failed, 0, 0));
            })?;
        self.process_since(&document, start, progress)
    }

    /// Extract text from an accepted document.
    ///
    /// PDFs are rasterized in full before the first page is recognised.
    /// Progress is reported once rasterization is done and after every page.
    pub fn process(
        &self,
        document: &UploadedDocument,
        progress: ProgressFn<'_>,
    ) -> Result<ExtractionResult> {
        self.process_since(document, RunStart::now(), progress)
    }

    #[instrument(skip_all, fields(id = %document.id, name = %document.name, media_type = %document.media_type))]
    fn process_since(
        &self,
        document: &UploadedDocument,
        start: RunStart,
        progress: ProgressFn<'_>,
    ) -> Result<ExtractionResult> {
        match self.run(document, start, progress) {
            Ok(result) => {
                progress(ExtractionProgress::new(
                    ProcessingStage::Complete,
                    result.page_count,
                    result.page_count,
                ));
                info!(
                    pages = result.page_count,
                    chars = result.total_chars(),
                    warnings = result.warnings.len(),
                    elapsed_ms = result.elapsed_ms,
                    "Extraction complete"
                );
                Ok(result)
            }
            Err(err) => {
                warn!(error = %err, kind = err.kind(), "Extraction failed");
                progress(ExtractionProgress::new(ProcessingStage::Failed, 0, 0));
                Err(err)
            }
        }
    }

    fn run(
        &self,
        document: &UploadedDocument,
        start: RunStart,
        progress: ProgressFn<'_>,
    ) -> Result<ExtractionResult> {
        let pages = self.load_pages(document, progress)?;
        let total = pages.len();
        let page_numbers = check_page_order(&pages)?;

        info!(
            pages = total,
            engine = self.engine.name(),
            parallel = self.config.parallel_pages,
            "Recognising pages"
        );
        progress(ExtractionProgress::new(ProcessingStage::Recognizing, 0, total));

        let policy = self.config.failure_policy;
        let mut aggregator = ResultAggregator::new(document, page_numbers, policy, start);

        if self.config.parallel_pages && total > 1 {
            let fail_fast = policy == FailurePolicy::FailFast;
            let completed = AtomicUsize::new(0);
            // Lowest failed index so far. Pages after it are skipped under FailFast.
            let first_failure = AtomicUsize::new(usize::MAX);
            let outcomes: Vec<(usize, Option<Result<OcrOutput>>)> = pages
                .into_par_iter()
                .map(|page| {
                    let index = page.index;
                    if fail_fast && index > first_failure.load(Ordering::SeqCst) {
                        return (index, None);
                    }
                    let outcome = self.recognize_page(page);
                    if fail_fast && outcome.is_err() {
                        first_failure.fetch_min(index, Ordering::SeqCst);
                    }
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress(ExtractionProgress::new(ProcessingStage::Recognizing, done, total));
                    (index, Some(outcome))
                })
                .collect();
            for (index, outcome) in outcomes {
                let outcome = outcome.ok_or_else(|| {
                    LesewerkError::Internal(format!(
                        "page index {index} skipped with no earlier failure"
                    ))
                })?;
                aggregator.record(index, outcome)?;
            }
        } else {
            for page in pages {
                let index = page.index;
                let outcome = self.recognize_page(page);
                aggregator.record(index, outcome)?;
                progress(ExtractionProgress::new(
                    ProcessingStage::Recognizing,
                    index + 1,
                    total,
                ));
            }
        }

        aggregator.finish()
    }

    /// Decode an image upload or rasterize a PDF into page images.
    fn load_pages(
        &self,
        document: &UploadedDocument,
        progress: ProgressFn<'_>,
    ) -> Result<Vec<PageImage>> {
        if document.media_type.is_pdf() {
            progress(ExtractionProgress::new(ProcessingStage::Rasterizing, 0, 0));
            let request =
                RasterRequest::new(self.config.dpi).with_page_range(self.config.page_range);
            debug!(rasterizer = self.rasterizer.name(), dpi = request.dpi, "Rasterizing PDF");
            return self.rasterizer.rasterize(&document.bytes, &request);
        }

        let image = ImageProcessor::from_bytes(&document.bytes)?.into_dynamic();
        Ok(vec![PageImage::new(0, 1, image)])
    }

    fn recognize_page(&self, page: PageImage) -> Result<OcrOutput> {
        let prepared = self.preprocessor.run(page.image)?;
        self.engine.recognize(&prepared)
    }
}

/// Source page numbers of `pages`, after checking that indices count up from
/// zero and page numbers strictly increase from 1.
fn check_page_order(pages: &[PageImage]) -> Result<Vec<u32>> {
    let mut previous = 0;
    let mut numbers = Vec::with_capacity(pages.len());
    for (position, page) in pages.iter().enumerate() {
        if page.index != position {
            return Err(LesewerkError::Internal(format!(
                "rasterizer returned page index {} at position {position}",
                page.index
            )));
        }
        if page.page_number <= previous {
            return Err(LesewerkError::Internal(format!(
                "rasterizer returned page {} after page {previous}",
                page.page_number
            )));
        }
        previous = page.page_number;
        numbers.push(page.page_number);
    }
    Ok(numbers)
}
