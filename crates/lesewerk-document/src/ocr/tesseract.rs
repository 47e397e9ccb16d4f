// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tesseract engine — runs the `tesseract` CLI on one page at a time.
//
// Plain mode reads text straight from stdout. Word-data mode asks for `tsv`
// output and rebuilds the text from the word rows, so text and per-word
// confidence always agree.

use std::ffi::OsStr;
use std::path::PathBuf;

use image::{DynamicImage, ImageFormat};
use lesewerk_core::config::AppConfig;
use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::types::{BoundingBox, OcrWord};
use tracing::{debug, instrument};

use super::{OcrEngine, OcrOutput, mean_confidence};
use crate::command::run_tool;

/// TSV row level for a single word.
const TSV_WORD_LEVEL: u32 = 5;

/// Engine backed by the `tesseract` binary.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
    language: String,
    page_segmentation_mode: u8,
    dpi: u32,
    word_data: bool,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl TesseractEngine {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            binary: config.tesseract_binary(),
            language: config.language.clone(),
            page_segmentation_mode: config.page_segmentation_mode,
            dpi: config.dpi,
            word_data: config.collect_word_data,
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height(), lang = %self.language))]
    fn recognize(&self, image: &DynamicImage) -> Result<OcrOutput> {
        let scratch = tempfile::Builder::new()
            .prefix("lesewerk-ocr")
            .tempdir()?;
        let input = scratch.path().join("page.png");
        image.save_with_format(&input, ImageFormat::Png).map_err(|err| {
            LesewerkError::OcrEngine(format!("failed to stage page image: {err}"))
        })?;

        let psm = self.page_segmentation_mode.to_string();
        let dpi = self.dpi.to_string();
        let mut args: Vec<&OsStr> = vec![
            input.as_os_str(),
            OsStr::new("stdout"),
            OsStr::new("-l"),
            OsStr::new(&self.language),
            OsStr::new("--psm"),
            OsStr::new(&psm),
            OsStr::new("--dpi"),
            OsStr::new(&dpi),
        ];
        if self.word_data {
            args.push(OsStr::new("tsv"));
        }

        let output = run_tool(&self.binary, args, LesewerkError::OcrEngine)?;
        let stdout = String::from_utf8(output.stdout).map_err(|err| {
            LesewerkError::OcrEngine(format!("tesseract produced non-UTF-8 output: {err}"))
        })?;

        let result = if self.word_data {
            parse_tsv(&stdout)?
        } else {
            OcrOutput::from_text(stdout.trim_end())
        };
        debug!(
            chars = result.text.chars().count(),
            words = result.words.len(),
            confidence = ?result.mean_confidence,
            "Page recognised"
        );
        Ok(result)
    }
}

/// Parse `tesseract ... tsv` output into text plus word data.
///
/// Columns: level, page_num, block_num, par_num, line_num, word_num, left,
/// top, width, height, conf, text. Lines are rebuilt from word rows keyed by
/// (block, paragraph, line); a new paragraph or block starts after a blank
/// line.
pub fn parse_tsv(tsv: &str) -> Result<OcrOutput> {
    let mut words = Vec::new();
    let mut text = String::new();
    let mut current_line: Option<(u32, u32, u32)> = None;

    for (row_number, row) in tsv.lines().enumerate() {
        if row_number == 0 && row.starts_with("level") {
            continue;
        }
        if row.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = row.splitn(12, '\t').collect();
        if fields.len() < 11 {
            return Err(LesewerkError::OcrEngine(format!(
                "malformed tesseract TSV row {}: {row:?}",
                row_number + 1
            )));
        }
        let number = |i: usize| -> Result<u32> {
            fields[i].trim().parse().map_err(|_| {
                LesewerkError::OcrEngine(format!(
                    "malformed tesseract TSV row {}: field {} is {:?}",
                    row_number + 1,
                    i + 1,
                    fields[i]
                ))
            })
        };

        if number(0)? != TSV_WORD_LEVEL {
            continue;
        }
        let word_text = fields.get(11).map(|t| t.trim()).unwrap_or_default();
        if word_text.is_empty() {
            continue;
        }
        let confidence: f32 = fields[10].trim().parse().map_err(|_| {
            LesewerkError::OcrEngine(format!(
                "malformed tesseract TSV row {}: confidence {:?}",
                row_number + 1,
                fields[10]
            ))
        })?;

        let key = (number(2)?, number(3)?, number(4)?);
        match current_line {
            Some(previous) if previous == key => text.push(' '),
            Some((block, par, _)) => {
                text.push('\n');
                if (block, par) != (key.0, key.1) {
                    text.push('\n');
                }
            }
            None => {}
        }
        current_line = Some(key);
        text.push_str(word_text);

        words.push(OcrWord {
            text: word_text.to_owned(),
            confidence: confidence.max(0.0),
            bbox: BoundingBox {
                left: number(6)?,
                top: number(7)?,
                width: number(8)?,
                height: number(9)?,
            },
        });
    }

    Ok(OcrOutput {
        mean_confidence: mean_confidence(&words),
        text,
        words,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t640\t480\t-1\t
2\t1\t1\t0\t0\t0\t36\t92\t570\t80\t-1\t
3\t1\t1\t1\t0\t0\t36\t92\t570\t80\t-1\t
4\t1\t1\t1\t1\t0\t36\t92\t570\t30\t-1\t
5\t1\t1\t1\t1\t1\t36\t92\t120\t30\t95.5\tHello
5\t1\t1\t1\t1\t2\t170\t92\t140\t30\t90.5\tworld
4\t1\t1\t1\t2\t0\t36\t130\t300\t30\t-1\t
5\t1\t1\t1\t2\t1\t36\t130\t300\t30\t80\tagain
5\t1\t2\t1\t1\t1\t36\t300\t100\t30\t70\tNext
";

    #[test]
    fn tsv_rebuilds_lines_and_paragraphs() {
        let out = parse_tsv(SAMPLE_TSV).unwrap();
        assert_eq!(out.text, "Hello world\nagain\n\nNext");
        assert_eq!(out.words.len(), 4);
        assert_eq!(out.words[1].bbox.left, 170);
        assert_eq!(out.mean_confidence, Some((95.5 + 90.5 + 80.0 + 70.0) / 4.0));
    }

    #[test]
    fn tsv_without_words_is_blank() {
        let out = parse_tsv("level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n1\t1\t0\t0\t0\t0\t0\t0\t10\t10\t-1\t\n").unwrap();
        assert!(out.text.is_empty());
        assert_eq!(out.mean_confidence, None);
    }

    #[test]
    fn malformed_tsv_is_engine_error() {
        let err = parse_tsv("5\t1\t1\n").unwrap_err();
        assert!(matches!(err, LesewerkError::OcrEngine(_)));
    }

    #[test]
    fn missing_binary_is_missing_tool() {
        let engine = TesseractEngine {
            binary: "/nonexistent/tesseract".into(),
            ..TesseractEngine::default()
        };
        let page = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(8, 8, image::Luma([255])));
        let err = engine.recognize(&page).unwrap_err();
        assert!(matches!(err, LesewerkError::OcrEngine(_)));
        assert!(err.is_missing_tool());
    }

    #[test]
    fn takes_settings_from_config() {
        let config = AppConfig {
            language: "deu".into(),
            collect_word_data: true,
            ..AppConfig::default()
        };
        let engine = TesseractEngine::from_config(&config);
        assert_eq!(engine.language, "deu");
        assert!(engine.word_data);
        assert_eq!(engine.binary, std::path::Path::new("tesseract"));
    }
}
