// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline integration tests. Most run against in-memory rasterizer and OCR
// stand-ins; the `installed_tools` tests exercise real tesseract and pdftoppm
// and return early when either is missing.

use std::io::Cursor;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::{
    AppConfig, ExtractionProgress, FailurePolicy, MediaType, PageRange, ProcessingStage,
};
use lesewerk_document::{
    ExtractionPipeline, OcrEngine, OcrOutput, PageImage, PdfRasterizer, PdftoppmRasterizer,
    RasterRequest, TesseractEngine, no_progress,
};

// ---------------------------------------------------------------------------
// Stand-ins
// ---------------------------------------------------------------------------

/// Source page `n` is rendered `BASE_WIDTH + n - 1` pixels wide so the engine
/// can tell which page it was handed after preprocessing.
const BASE_WIDTH: u32 = 40;

type EventLog = Arc<Mutex<Vec<String>>>;

fn page_image(page_number: u32) -> DynamicImage {
    let width = BASE_WIDTH + page_number - 1;
    DynamicImage::ImageLuma8(GrayImage::from_fn(width, 30, |x, _| {
        if x % 7 == 0 { Luma([20]) } else { Luma([230]) }
    }))
}

/// Document of `pages` pages that honours the requested page range.
struct FakeRasterizer {
    pages: u32,
    delay: Duration,
    log: EventLog,
}

impl PdfRasterizer for FakeRasterizer {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn rasterize(&self, _pdf: &[u8], request: &RasterRequest) -> Result<Vec<PageImage>> {
        std::thread::sleep(self.delay);
        let (first, last) = match request.page_range {
            Some(range) => (range.start, range.end.min(self.pages)),
            None => (1, self.pages),
        };
        let pages: Vec<PageImage> = (first..=last)
            .enumerate()
            .map(|(index, number)| PageImage::new(index, number, page_image(number)))
            .collect();
        self.log
            .lock()
            .unwrap()
            .push(format!("rasterized {}", pages.len()));
        Ok(pages)
    }
}

/// Engine answering `page N` from the image width, optionally failing one page.
struct FakeEngine {
    calls: AtomicUsize,
    fail_pages: Vec<usize>,
    log: EventLog,
}

impl FakeEngine {
    fn new(log: EventLog) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_pages: Vec::new(),
            log,
        }
    }

    fn failing_on(self, page: usize) -> Self {
        self.failing_on_pages(&[page])
    }

    fn failing_on_pages(mut self, pages: &[usize]) -> Self {
        self.fail_pages = pages.to_vec();
        self
    }
}

impl OcrEngine for FakeEngine {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<OcrOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let page = (image.width() - BASE_WIDTH) as usize + 1;
        self.log.lock().unwrap().push(format!("ocr {page}"));
        if self.fail_pages.contains(&page) {
            return Err(LesewerkError::OcrEngine(format!("engine crashed on page {page}")));
        }
        Ok(OcrOutput::from_text(format!("page {page}")))
    }
}

fn pipeline(
    config: AppConfig,
    pages: u32,
    engine: FakeEngine,
    log: &EventLog,
) -> (ExtractionPipeline, Arc<FakeEngine>) {
    slow_pipeline(config, pages, Duration::ZERO, engine, log)
}

fn slow_pipeline(
    config: AppConfig,
    pages: u32,
    delay: Duration,
    engine: FakeEngine,
    log: &EventLog,
) -> (ExtractionPipeline, Arc<FakeEngine>) {
    let engine = Arc::new(engine);
    let rasterizer = Arc::new(FakeRasterizer {
        pages,
        delay,
        log: log.clone(),
    });
    let pipeline = ExtractionPipeline::new(config, rasterizer, engine.clone()).unwrap();
    (pipeline, engine)
}

fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

const PDF_STUB: &[u8] = b"%PDF-1.7\n%stub\n";

// ---------------------------------------------------------------------------
// Pipeline behaviour
// ---------------------------------------------------------------------------

#[test]
fn n_page_pdf_yields_n_ordered_pages() {
    for parallel in [false, true] {
        let log = EventLog::default();
        let config = AppConfig {
            parallel_pages: parallel,
            ..AppConfig::default()
        };
        let (pipeline, _) = pipeline(config, 7, FakeEngine::new(log.clone()), &log);

        let result = pipeline
            .process_upload("report.pdf", PDF_STUB.to_vec(), &no_progress)
            .unwrap();

        assert_eq!(result.media_type, MediaType::Pdf);
        assert_eq!(result.page_count, 7);
        assert_eq!(result.pages.len(), 7);
        for (i, page) in result.pages.iter().enumerate() {
            assert_eq!(page.index, i);
            assert_eq!(page.page_number, i as u32 + 1);
            assert_eq!(page.text, format!("page {}", i + 1), "parallel={parallel}");
        }
    }
}

#[test]
fn page_range_keeps_source_page_numbers() {
    for parallel in [false, true] {
        let log = EventLog::default();
        let config = AppConfig {
            parallel_pages: parallel,
            page_range: Some(PageRange::new(3, 4)),
            ..AppConfig::default()
        };
        let (pipeline, engine) = pipeline(config, 5, FakeEngine::new(log.clone()), &log);

        let result = pipeline
            .process_upload("report.pdf", PDF_STUB.to_vec(), &no_progress)
            .unwrap();

        assert_eq!(result.page_count, 2);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
        let pages: Vec<(usize, u32, &str)> = result
            .pages
            .iter()
            .map(|p| (p.index, p.page_number, p.text.as_str()))
            .collect();
        assert_eq!(pages, [(0, 3, "page 3"), (1, 4, "page 4")], "parallel={parallel}");
        assert_eq!(
            result.combined_text(),
            "--- Page 3 ---\npage 3\n\n--- Page 4 ---\npage 4"
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["pages"][0]["page_number"], 3);
        assert_eq!(json["pages"][1]["page_number"], 4);
    }
}

#[test]
fn three_page_pdf_is_fully_rasterized_before_ocr() {
    let log = EventLog::default();
    let (pipeline, engine) = pipeline(AppConfig::default(), 3, FakeEngine::new(log.clone()), &log);

    pipeline
        .process_upload("three.pdf", PDF_STUB.to_vec(), &no_progress)
        .unwrap();

    let events = log.lock().unwrap().clone();
    assert_eq!(events, ["rasterized 3", "ocr 1", "ocr 2", "ocr 3"]);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 3);
}

#[test]
fn unsupported_extension_never_reaches_ocr() {
    let log = EventLog::default();
    let (pipeline, engine) = pipeline(AppConfig::default(), 1, FakeEngine::new(log.clone()), &log);

    let err = pipeline
        .process_upload("setup.exe", b"MZ\x90\x00\x03".to_vec(), &no_progress)
        .unwrap_err();

    assert!(matches!(err, LesewerkError::UnsupportedFormat(_)));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn fail_fast_aborts_document() {
    let log = EventLog::default();
    let engine = FakeEngine::new(log.clone()).failing_on(2);
    let (pipeline, _) = pipeline(AppConfig::default(), 3, engine, &log);

    let err = pipeline
        .process_upload("doc.pdf", PDF_STUB.to_vec(), &no_progress)
        .unwrap_err();

    assert!(matches!(err, LesewerkError::OcrEngine(_)));
    assert!(err.to_string().contains("page 2"));
}

#[test]
fn parallel_fail_fast_reports_first_failing_page() {
    let config = AppConfig {
        parallel_pages: true,
        ..AppConfig::default()
    };
    for _ in 0..10 {
        let log = EventLog::default();
        let engine = FakeEngine::new(log.clone()).failing_on_pages(&[2, 5]);
        let (pipeline, _) = pipeline(config.clone(), 6, engine, &log);

        let err = pipeline
            .process_upload("doc.pdf", PDF_STUB.to_vec(), &no_progress)
            .unwrap_err();

        assert!(matches!(err, LesewerkError::OcrEngine(_)));
        assert!(err.to_string().contains("page 2"), "reported {err}");
    }
}

#[test]
fn parallel_fail_fast_skips_pages_after_failure() {
    let log = EventLog::default();
    let config = AppConfig {
        parallel_pages: true,
        ..AppConfig::default()
    };
    let engine = FakeEngine::new(log.clone()).failing_on(2);
    let (pipeline, engine) = pipeline(config, 6, engine, &log);
    let single = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap();

    let err = single
        .install(|| pipeline.process_upload("doc.pdf", PDF_STUB.to_vec(), &no_progress))
        .unwrap_err();

    assert!(err.to_string().contains("page 2"));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
}
#[test]
fn record_empty_keeps_other_pages() {
    let log = EventLog::default();
    let config = AppConfig {
        failure_policy: FailurePolicy::RecordEmpty,
        ..AppConfig::default()
    };
    let engine = FakeEngine::new(log.clone()).failing_on(2);
    let (pipeline, _) = pipeline(config, 3, engine, &log);

    let result = pipeline
        .process_upload("doc.pdf", PDF_STUB.to_vec(), &no_progress)
        .unwrap();

    assert_eq!(result.pages.len(), 3);
    assert_eq!(result.pages[0].text, "page 1");
    assert!(result.pages[1].is_blank());
    assert!(result.pages[1].warning.is_some());
    assert_eq!(result.pages[2].text, "page 3");
    assert_eq!(result.warnings.len(), 1);
    assert!(
        result
            .combined_text()
            .contains("--- Page 2 (OCR failed or no text detected) ---")
    );
}

#[test]
fn image_upload_is_a_single_page() {
    let log = EventLog::default();
    let (pipeline, engine) = pipeline(AppConfig::default(), 5, FakeEngine::new(log.clone()), &log);

    let result = pipeline
        .process_upload("scan.png", png_bytes(&page_image(1)), &no_progress)
        .unwrap();

    assert_eq!(result.media_type, MediaType::Png);
    assert_eq!(result.page_count, 1);
    assert_eq!(result.pages[0].page_number, 1);
    assert_eq!(result.combined_text(), "page 1");
    assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    assert!(!log.lock().unwrap().iter().any(|e| e.starts_with("rasterized")));
}

#[test]
fn progress_reported_per_page() {
    let log = EventLog::default();
    let (pipeline, _) = pipeline(AppConfig::default(), 4, FakeEngine::new(log.clone()), &log);
    let updates: Mutex<Vec<ExtractionProgress>> = Mutex::default();
    let record = |p: ExtractionProgress| updates.lock().unwrap().push(p);

    pipeline
        .process_upload("doc.pdf", PDF_STUB.to_vec(), &record)
        .unwrap();

    let updates = updates.into_inner().unwrap();
    let stages: Vec<ProcessingStage> = updates.iter().map(|p| p.stage).collect();
    assert_eq!(stages.first(), Some(&ProcessingStage::Validating));
    assert!(stages.contains(&ProcessingStage::Rasterizing));
    assert_eq!(stages.last(), Some(&ProcessingStage::Complete));
    let per_page: Vec<usize> = updates
        .iter()
        .filter(|p| p.stage == ProcessingStage::Recognizing)
        .map(|p| p.completed_pages)
        .collect();
    assert_eq!(per_page, [0, 1, 2, 3, 4]);
}

#[test]
fn elapsed_time_includes_rasterization() {
    let log = EventLog::default();
    let delay = Duration::from_millis(300);
    let (pipeline, _) = slow_pipeline(
        AppConfig::default(),
        2,
        delay,
        FakeEngine::new(log.clone()),
        &log,
    );

    let before = chrono::Utc::now();
    let result = pipeline
        .process_upload("slow.pdf", PDF_STUB.to_vec(), &no_progress)
        .unwrap();
    let after = chrono::Utc::now();

    assert!(result.elapsed_ms >= delay.as_millis() as u64, "{} ms", result.elapsed_ms);
    assert!(before <= result.started_at && result.started_at <= after);
}

// ---------------------------------------------------------------------------
// Installed tools
// ---------------------------------------------------------------------------

fn tool_available(binary: &str, arg: &str) -> bool {
    Command::new(binary).arg(arg).output().is_ok()
}

/// Build a PDF whose page `n` reads `texts[n]` in large Helvetica.
fn text_pdf(texts: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for text in texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 48.into()]),
                Operation::new("Td", vec![72.into(), 650.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => texts.len() as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

#[test]
fn installed_tools_rasterize_three_pages_in_order() {
    if !tool_available("pdftoppm", "-v") {
        eprintln!("pdftoppm not installed; skipping");
        return;
    }
    let pdf = text_pdf(&["ONE", "TWO", "THREE"]);
    let pages = PdftoppmRasterizer::default()
        .rasterize(&pdf, &RasterRequest::new(100))
        .unwrap();

    assert_eq!(pages.len(), 3);
    for (i, page) in pages.iter().enumerate() {
        assert_eq!(page.index, i);
        assert_eq!(page.page_number, i as u32 + 1);
        // Letter at 100 DPI.
        assert_eq!((page.width(), page.height()), (850, 1100));
    }
}

#[test]
fn installed_tools_rasterize_a_page_range() {
    if !tool_available("pdftoppm", "-v") {
        eprintln!("pdftoppm not installed; skipping");
        return;
    }
    let pdf = text_pdf(&["ONE", "TWO", "THREE", "FOUR"]);
    let request = RasterRequest::new(72).with_page_range(Some(PageRange::new(2, 3)));
    let pages = PdftoppmRasterizer::default().rasterize(&pdf, &request).unwrap();

    let numbering: Vec<(usize, u32)> = pages.iter().map(|p| (p.index, p.page_number)).collect();
    assert_eq!(numbering, [(0, 2), (1, 3)]);
}

#[test]
fn installed_tools_read_hello_png() {
    if !tool_available("pdftoppm", "-v") || !tool_available("tesseract", "--version") {
        eprintln!("tesseract or pdftoppm not installed; skipping");
        return;
    }
    let pdf = text_pdf(&["HELLO"]);
    let rendered = PdftoppmRasterizer::default()
        .rasterize(&pdf, &RasterRequest::new(150))
        .unwrap();
    let png = png_bytes(&rendered[0].image);

    let config = AppConfig::default();
    let pipeline = ExtractionPipeline::new(
        config.clone(),
        Arc::new(PdftoppmRasterizer::default()),
        Arc::new(TesseractEngine::from_config(&config)),
    )
    .unwrap();
    let result = pipeline.process_upload("hello.png", png, &no_progress).unwrap();

    assert_eq!(result.pages.len(), 1);
    let text = result.combined_text();
    assert!(text.to_uppercase().contains("HELLO"), "recognised {text:?}");
}
