// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR preprocessing — grayscale, contrast boost, median denoise, and
// binarization, turning an arbitrary page raster into clean black-on-white.

pub mod threshold;

use image::DynamicImage;
use lesewerk_core::config::{PreprocessConfig, ThresholdMethod};
use lesewerk_core::error::{LesewerkError, Result};
use tracing::{debug, instrument};

use crate::image::processor::ImageProcessor;

/// Stateless page normalizer.
///
/// Output is always a binary 8-bit luma image (when enabled). A binary input
/// is already a fixed point and is returned as-is, so running the
/// preprocessor on its own output changes nothing.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Preprocess one decoded page image.
    ///
    /// 1. Grayscale conversion
    /// 2. Contrast enhancement
    /// 3. Median denoise
    /// 4. Adaptive or Otsu binarization
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn run(&self, image: DynamicImage) -> Result<DynamicImage> {
        if image.width() == 0 || image.height() == 0 {
            return Err(LesewerkError::Preprocessing(format!(
                "image has zero dimension ({}x{})",
                image.width(),
                image.height()
            )));
        }
        if !self.config.enabled {
            debug!("Preprocessing disabled; passing image through");
            return Ok(image);
        }

        let gray = ImageProcessor::from_dynamic(image).grayscale().into_dynamic();
        if let Some(luma) = gray.as_luma8()
            && threshold::is_binary(luma)
        {
            debug!("Image already binary; nothing to do");
            return Ok(gray);
        }

        let cleaned = ImageProcessor::from_dynamic(gray)
            .adjust_contrast(self.config.contrast)
            .denoise(self.config.denoise_radius)
            .into_dynamic()
            .to_luma8();

        let binary = match self.config.threshold {
            ThresholdMethod::Adaptive => threshold::binarize_adaptive(
                &cleaned,
                self.config.block_radius,
                self.config.threshold_offset,
            ),
            ThresholdMethod::Otsu => threshold::binarize_otsu(&cleaned),
        };

        debug!(method = ?self.config.threshold, "Preprocessing complete");
        Ok(DynamicImage::ImageLuma8(binary))
    }
}
