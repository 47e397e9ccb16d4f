// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result aggregation — collects per-page OCR outcomes and assembles the
// final `ExtractionResult`, applying the configured partial-failure policy.

use std::time::Instant;

use chrono::{DateTime, Utc};
use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::types::{
    DocumentId, ExtractionResult, FailurePolicy, MediaType, PageText, UploadedDocument,
};
use tracing::{debug, warn};

use crate::ocr::OcrOutput;

/// When processing of a document began.
#[derive(Debug, Clone, Copy)]
pub struct RunStart {
    pub at: DateTime<Utc>,
    pub clock: Instant,
}

impl RunStart {
    pub fn now() -> Self {
        Self {
            at: Utc::now(),
            clock: Instant::now(),
        }
    }
}

/// Accumulates page results for one document.
///
/// `page_numbers[i]` is the source page number of slot `i`. Pages may be
/// recorded in any order but each index exactly once; `finish` returns them
/// sorted by index and fails if any are missing.
#[derive(Debug)]
pub struct ResultAggregator {
    document_id: DocumentId,
    document_name: String,
    media_type: MediaType,
    policy: FailurePolicy,
    page_numbers: Vec<u32>,
    slots: Vec<Option<PageText>>,
    warnings: Vec<String>,
    start: RunStart,
}

impl ResultAggregator {
    pub fn new(
        document: &UploadedDocument,
        page_numbers: Vec<u32>,
        policy: FailurePolicy,
        start: RunStart,
    ) -> Self {
        Self {
            document_id: document.id,
            document_name: document.name.clone(),
            media_type: document.media_type,
            policy,
            slots: vec![None; page_numbers.len()],
            page_numbers,
            warnings: Vec::new(),
            start,
        }
    }

    /// Record the outcome of OCR on page `index`.
    ///
    /// Under `FailFast` a failed page is returned as the error. Under
    /// `RecordEmpty` it is stored as empty text with a warning.
    pub fn record(&mut self, index: usize, outcome: Result<OcrOutput>) -> Result<()> {
        let slot = self.slots.get(index).ok_or_else(|| {
            LesewerkError::Internal(format!(
                "page index {index} outside document of {} pages",
                self.slots.len()
            ))
        })?;
        let page_number = self.page_numbers[index];
        if slot.is_some() {
            return Err(LesewerkError::Internal(format!(
                "page {page_number} recorded twice"
            )));
        }

        let page = match outcome {
            Ok(output) => {
                debug!(page = page_number, chars = output.text.len(), "Page recorded");
                PageText {
                    index,
                    page_number,
                    text: output.text,
                    mean_confidence: output.mean_confidence,
                    words: output.words,
                    warning: None,
                }
            }
            Err(err) if self.policy == FailurePolicy::FailFast => return Err(err),
            Err(err) => {
                let message = format!("page {page_number}: {err}");
                warn!(page = page_number, error = %err, "Page failed; recording empty text");
                self.warnings.push(message.clone());
                PageText {
                    index,
                    page_number,
                    text: String::new(),
                    mean_confidence: None,
                    words: Vec::new(),
                    warning: Some(message),
                }
            }
        };
        self.slots[index] = Some(page);
        Ok(())
    }

    /// Assemble the final result once every page has been recorded.
    pub fn finish(self) -> Result<ExtractionResult> {
        let page_count = self.slots.len();
        let mut pages = Vec::with_capacity(page_count);
        for (slot, page_number) in self.slots.into_iter().zip(&self.page_numbers) {
            let page = slot.ok_or_else(|| {
                LesewerkError::Internal(format!("page {page_number} was never recorded"))
            })?;
            pages.push(page);
        }

        Ok(ExtractionResult {
            document_id: self.document_id,
            document_name: self.document_name,
            media_type: self.media_type,
            pages,
            page_count,
            started_at: self.start.at,
            elapsed_ms: self.start.clock.elapsed().as_millis() as u64,
            warnings: self.warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> UploadedDocument {
        UploadedDocument {
            id: DocumentId::new(),
            name: "scan.pdf".into(),
            media_type: MediaType::Pdf,
            bytes: b"%PDF-1.7".to_vec(),
            sha256: String::new(),
            received_at: Utc::now(),
        }
    }

    fn aggregator(pages: u32, policy: FailurePolicy) -> ResultAggregator {
        ResultAggregator::new(&document(), (1..=pages).collect(), policy, RunStart::now())
    }

    fn failed() -> Result<OcrOutput> {
        Err(LesewerkError::OcrEngine("tesseract exited with status 1".into()))
    }

    #[test]
    fn out_of_order_pages_are_sorted() {
        let mut agg = aggregator(3, FailurePolicy::FailFast);
        agg.record(2, Ok(OcrOutput::from_text("three"))).unwrap();
        agg.record(0, Ok(OcrOutput::from_text("one"))).unwrap();
        agg.record(1, Ok(OcrOutput::from_text("two"))).unwrap();
        let result = agg.finish().unwrap();
        let texts: Vec<&str> = result.pages.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, ["one", "two", "three"]);
        assert!(result.pages.iter().enumerate().all(|(i, p)| p.index == i));
        assert_eq!(result.page_count, 3);
    }

    #[test]
    fn fail_fast_returns_page_error() {
        let mut agg = aggregator(2, FailurePolicy::FailFast);
        agg.record(0, Ok(OcrOutput::from_text("one"))).unwrap();
        let err = agg.record(1, failed()).unwrap_err();
        assert!(matches!(err, LesewerkError::OcrEngine(_)));
    }

    #[test]
    fn record_empty_keeps_going_with_warning() {
        let mut agg = aggregator(2, FailurePolicy::RecordEmpty);
        agg.record(0, failed()).unwrap();
        agg.record(1, Ok(OcrOutput::from_text("two"))).unwrap();
        let result = agg.finish().unwrap();
        assert_eq!(result.pages.len(), 2);
        assert!(result.pages[0].is_blank());
        assert!(result.pages[0].warning.as_deref().unwrap().starts_with("page 1:"));
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.pages[1].text, "two");
    }

    #[test]
    fn duplicate_page_is_internal_error() {
        let mut agg = aggregator(2, FailurePolicy::FailFast);
        agg.record(0, Ok(OcrOutput::default())).unwrap();
        let err = agg.record(0, Ok(OcrOutput::default())).unwrap_err();
        assert!(matches!(err, LesewerkError::Internal(_)));
        assert!(matches!(
            agg.record(5, Ok(OcrOutput::default())),
            Err(LesewerkError::Internal(_))
        ));
    }

    #[test]
    fn missing_page_is_internal_error() {
        let mut agg = aggregator(2, FailurePolicy::FailFast);
        agg.record(0, Ok(OcrOutput::default())).unwrap();
        assert!(matches!(agg.finish(), Err(LesewerkError::Internal(_))));
    }

    #[test]
    fn source_page_numbers_carried_into_pages_and_warnings() {
        let mut agg = ResultAggregator::new(
            &document(),
            vec![3, 4],
            FailurePolicy::RecordEmpty,
            RunStart::now(),
        );
        agg.record(0, Ok(OcrOutput::from_text("three"))).unwrap();
        agg.record(1, failed()).unwrap();
        let result = agg.finish().unwrap();
        let numbers: Vec<u32> = result.pages.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, [3, 4]);
        assert_eq!(result.pages[1].index, 1);
        assert!(result.warnings[0].starts_with("page 4:"));
    }

    #[test]
    fn elapsed_time_counts_from_run_start() {
        let start = RunStart {
            at: Utc::now() - chrono::Duration::milliseconds(250),
            clock: Instant::now() - std::time::Duration::from_millis(250),
        };
        let mut agg = ResultAggregator::new(&document(), vec![1], FailurePolicy::FailFast, start);
        agg.record(0, Ok(OcrOutput::from_text("one"))).unwrap();
        let result = agg.finish().unwrap();
        assert!(result.elapsed_ms >= 250);
        assert_eq!(result.started_at, start.at);
    }
}
