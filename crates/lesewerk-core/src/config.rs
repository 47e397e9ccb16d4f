// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{LesewerkError, Result};
use crate::types::{FailurePolicy, PageRange};

/// Lowest and highest rasterization DPI accepted.
pub const MIN_DPI: u32 = 72;
pub const MAX_DPI: u32 = 600;

/// Which OCR engine processes page images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OcrBackend {
    /// The `tesseract` command-line binary.
    #[default]
    Tesseract,
    /// The pure-Rust `ocrs` engine (requires the `ocrs` cargo feature).
    Ocrs,
}

/// Binarization strategy used by the preprocessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThresholdMethod {
    /// Local-mean thresholding; copes with uneven lighting.
    #[default]
    Adaptive,
    /// Single global threshold chosen by Otsu's method.
    Otsu,
}

/// Image preprocessing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// When false, page images go to the OCR engine untouched.
    pub enabled: bool,
    /// Linear contrast factor around mid-grey; 1.0 is a no-op.
    pub contrast: f32,
    /// Median filter radius in pixels; 0 disables denoising.
    pub denoise_radius: u32,
    pub threshold: ThresholdMethod,
    /// Neighbourhood radius for adaptive thresholding.
    pub block_radius: u32,
    /// Constant subtracted from the local mean.
    pub threshold_offset: i32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            contrast: 1.4,
            denoise_radius: 1,
            threshold: ThresholdMethod::Adaptive,
            block_radius: 15,
            threshold_offset: 10,
        }
    }
}

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Rasterization resolution for PDF pages.
    pub dpi: u32,
    /// Tesseract language code(s), e.g. `eng` or `eng+deu`.
    pub language: String,
    /// Tesseract page segmentation mode (0–13).
    pub page_segmentation_mode: u8,
    /// What to do when a single page fails OCR.
    pub failure_policy: FailurePolicy,
    /// Collect per-word confidence and bounding boxes.
    pub collect_word_data: bool,
    /// Run per-page preprocessing and OCR in parallel.
    pub parallel_pages: bool,
    /// Restrict PDF processing to a page range.
    pub page_range: Option<PageRange>,
    /// Uploads larger than this are rejected at intake.
    pub max_upload_bytes: usize,
    /// Explicit path to the `tesseract` binary; PATH lookup when unset.
    pub tesseract_path: Option<PathBuf>,
    /// Explicit path to the `pdftoppm` binary; PATH lookup when unset.
    pub pdftoppm_path: Option<PathBuf>,
    pub engine: OcrBackend,
    /// Directory holding the `ocrs` model files.
    pub ocrs_model_dir: Option<PathBuf>,
    pub preprocess: PreprocessConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            language: "eng".into(),
            page_segmentation_mode: 3,
            failure_policy: FailurePolicy::FailFast,
            collect_word_data: false,
            parallel_pages: false,
            page_range: None,
            max_upload_bytes: 200 * 1024 * 1024,
            tesseract_path: None,
            pdftoppm_path: None,
            engine: OcrBackend::Tesseract,
            ocrs_model_dir: None,
            preprocess: PreprocessConfig::default(),
        }
    }
}

impl AppConfig {
    /// Binary used for OCR, honouring an explicit override.
    pub fn tesseract_binary(&self) -> PathBuf {
        self.tesseract_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("tesseract"))
    }

    /// Binary used for PDF rasterization, honouring an explicit override.
    pub fn pdftoppm_binary(&self) -> PathBuf {
        self.pdftoppm_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("pdftoppm"))
    }

    /// Reject settings the pipeline cannot honour.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_DPI..=MAX_DPI).contains(&self.dpi) {
            return Err(LesewerkError::Config(format!(
                "dpi {} outside {MIN_DPI}..={MAX_DPI}",
                self.dpi
            )));
        }
        let language_ok = !self.language.is_empty()
            && self
                .language
                .split('+')
                .all(|lang| !lang.is_empty() && lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        if !language_ok {
            return Err(LesewerkError::Config(format!(
                "invalid OCR language {:?}",
                self.language
            )));
        }
        if self.page_segmentation_mode > 13 {
            return Err(LesewerkError::Config(format!(
                "page segmentation mode {} outside 0..=13",
                self.page_segmentation_mode
            )));
        }
        if let Some(range) = self.page_range
            && !range.is_valid()
        {
            return Err(LesewerkError::Config(format!(
                "invalid page range {}-{}",
                range.start, range.end
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(LesewerkError::Config("max upload size must be positive".into()));
        }
        let pre = &self.preprocess;
        if !(pre.contrast > 0.0 && pre.contrast <= 4.0) {
            return Err(LesewerkError::Config(format!(
                "contrast factor {} outside (0, 4]",
                pre.contrast
            )));
        }
        if pre.denoise_radius > 5 {
            return Err(LesewerkError::Config(format!(
                "denoise radius {} too large (max 5)",
                pre.denoise_radius
            )));
        }
        if pre.block_radius == 0 || pre.block_radius > 100 {
            return Err(LesewerkError::Config(format!(
                "threshold block radius {} outside 1..=100",
                pre.block_radius
            )));
        }
        Ok(())
    }

    /// Parse a config from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn dpi_out_of_range_rejected() {
        let config = AppConfig {
            dpi: 1200,
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(LesewerkError::Config(_))));
    }

    #[test]
    fn language_must_be_plain_codes() {
        let mut config = AppConfig::default();
        config.language = "eng+deu".into();
        config.validate().unwrap();
        config.language = "eng; rm -rf".into();
        assert!(config.validate().is_err());
        config.language = "eng+".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_page_range_rejected() {
        let config = AppConfig {
            page_range: Some(PageRange::new(5, 2)),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = AppConfig::from_json(r#"{ "dpi": 300, "failure_policy": "RecordEmpty" }"#)
            .unwrap();
        assert_eq!(config.dpi, 300);
        assert_eq!(config.failure_policy, FailurePolicy::RecordEmpty);
        assert_eq!(config.language, "eng");
        assert!(config.preprocess.enabled);
    }

    #[test]
    fn json_round_trip_preserves_overrides() {
        let config = AppConfig {
            tesseract_path: Some(PathBuf::from("/opt/tess/bin/tesseract")),
            collect_word_data: true,
            ..AppConfig::default()
        };
        let back = AppConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn binary_overrides() {
        let config = AppConfig::default();
        assert_eq!(config.tesseract_binary(), PathBuf::from("tesseract"));
        assert_eq!(config.pdftoppm_binary(), PathBuf::from("pdftoppm"));
    }
}
