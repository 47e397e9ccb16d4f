// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF rasterization — renders every page of a PDF to a raster image through
// Poppler's `pdftoppm`, returning pages in document order.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use lesewerk_core::config::{MAX_DPI, MIN_DPI};
use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::types::PageRange;
use tracing::{debug, info, instrument, warn};

use crate::command::run_tool;
use crate::pdf::reader::PdfReader;

/// Prefix `pdftoppm` uses for its output files (`page-1.png`, `page-02.png`...).
const OUTPUT_PREFIX: &str = "page";

/// One rendered page, owned by the pipeline run that produced it.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 0-based position within the processed page sequence.
    pub index: usize,
    /// 1-based page number in the source document.
    pub page_number: u32,
    pub image: DynamicImage,
}

impl PageImage {
    pub fn new(index: usize, page_number: u32, image: DynamicImage) -> Self {
        Self {
            index,
            page_number,
            image,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Rendering parameters for one rasterization call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterRequest {
    pub dpi: u32,
    pub page_range: Option<PageRange>,
}

impl RasterRequest {
    pub fn new(dpi: u32) -> Self {
        Self {
            dpi,
            page_range: None,
        }
    }

    pub fn with_page_range(mut self, range: Option<PageRange>) -> Self {
        self.page_range = range;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(MIN_DPI..=MAX_DPI).contains(&self.dpi) {
            return Err(LesewerkError::Rasterization(format!(
                "dpi {} outside {MIN_DPI}..={MAX_DPI}",
                self.dpi
            )));
        }
        if let Some(range) = self.page_range
            && !range.is_valid()
        {
            return Err(LesewerkError::Rasterization(format!(
                "invalid page range {}-{}",
                range.start, range.end
            )));
        }
        Ok(())
    }
}

/// Converts PDF bytes into ordered page images.
pub trait PdfRasterizer: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &'static str;

    /// Render the requested pages, first page first.
    fn rasterize(&self, pdf: &[u8], request: &RasterRequest) -> Result<Vec<PageImage>>;
}

/// Rasterizer backed by the `pdftoppm` binary from poppler-utils.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    binary: PathBuf,
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

impl PdftoppmRasterizer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl PdfRasterizer for PdftoppmRasterizer {
    fn name(&self) -> &'static str {
        "pdftoppm"
    }

    #[instrument(skip(self, pdf), fields(pdf_len = pdf.len(), dpi = request.dpi))]
    fn rasterize(&self, pdf: &[u8], request: &RasterRequest) -> Result<Vec<PageImage>> {
        request.validate()?;

        // Structural page count, when lopdf can read the file. Poppler copes
        // with more damage than lopdf does, so an unreadable structure only
        // disables the count check.
        let expected = match PdfReader::from_bytes(pdf) {
            Ok(reader) => {
                let total = reader.page_count() as u32;
                Some(match request.page_range {
                    Some(range) => range.clamped_len(total),
                    None => total,
                })
            }
            Err(err) => {
                warn!(error = %err, "Could not read PDF structure; skipping page count check");
                None
            }
        };
        if expected == Some(0) {
            return Err(LesewerkError::Rasterization(
                "PDF has no pages in the requested range".into(),
            ));
        }

        let scratch = tempfile::Builder::new()
            .prefix("lesewerk-raster")
            .tempdir()?;
        let input_path = scratch.path().join("input.pdf");
        std::fs::write(&input_path, pdf)?;

        let mut args: Vec<OsString> = vec![
            "-r".into(),
            request.dpi.to_string().into(),
            "-png".into(),
        ];
        if let Some(range) = request.page_range {
            args.extend([
                "-f".into(),
                range.start.to_string().into(),
                "-l".into(),
                range.end.to_string().into(),
            ]);
        }
        args.push(input_path.into_os_string());
        args.push(scratch.path().join(OUTPUT_PREFIX).into_os_string());

        run_tool(&self.binary, args, LesewerkError::Rasterization)?;

        let rendered = collect_rendered_pages(scratch.path())?;
        if rendered.is_empty() {
            return Err(LesewerkError::Rasterization(
                "pdftoppm produced no page images".into(),
            ));
        }
        if let Some(expected) = expected
            && rendered.len() != expected as usize
        {
            return Err(LesewerkError::Rasterization(format!(
                "page count mismatch: expected {expected} pages, rendered {}",
                rendered.len()
            )));
        }

        info!(pages = rendered.len(), "PDF rasterized");

        rendered
            .into_iter()
            .enumerate()
            .map(|(index, (page_number, path))| {
                let image = image::open(&path).map_err(|err| {
                    LesewerkError::Rasterization(format!(
                        "failed to decode rendered page {page_number}: {err}"
                    ))
                })?;
                debug!(
                    page_number,
                    width = image.width(),
                    height = image.height(),
                    "Rendered page decoded"
                );
                Ok(PageImage::new(index, page_number, image))
            })
            .collect()
    }
}

/// Find `page-<n>.png` files in `dir`, sorted by page number.
///
/// `pdftoppm` zero-pads numbers to the width of the last page, but sorting
/// on the parsed number keeps the order right regardless of padding.
fn collect_rendered_pages(dir: &Path) -> Result<Vec<(u32, PathBuf)>> {
    let mut pages = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(number) = rendered_page_number(&path) {
            pages.push((number, path));
        }
    }
    pages.sort_by_key(|(number, _)| *number);

    if pages.windows(2).any(|pair| pair[0].0 == pair[1].0) {
        return Err(LesewerkError::Rasterization(
            "pdftoppm produced duplicate page numbers".into(),
        ));
    }
    Ok(pages)
}

/// Parse the page number out of a `page-<n>.png` file name.
fn rendered_page_number(path: &Path) -> Option<u32> {
    if path.extension()? != "png" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let digits = stem.strip_prefix(OUTPUT_PREFIX)?.strip_prefix('-')?;
    digits.parse().ok()
}
