// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decoding with orientation normalization, grayscale,
// contrast, and denoising. Operates on in-memory images using the `image` and
// `imageproc` crates.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageDecoder, ImageReader, Luma};
use imageproc::filter::median_filter;
use lesewerk_core::error::LesewerkError;
use tracing::{debug, info, instrument};

/// Image processing pipeline operating on a single in-memory image.
///
/// Each transformation consumes `self` and returns a new `ImageProcessor`
/// wrapping the transformed image, enabling method chaining.
///
/// ```ignore
/// let page = ImageProcessor::from_bytes(&upload)?
///     .grayscale()
///     .adjust_contrast(1.4)
///     .denoise(1)
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode raw encoded bytes (PNG, JPEG, BMP, TIFF).
    ///
    /// EXIF orientation is applied during decoding, so photos taken sideways
    /// come out upright before anything else looks at them.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, LesewerkError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|err| {
                LesewerkError::Preprocessing(format!("failed to read image header: {}", err))
            })?;
        let mut decoder = reader.into_decoder().map_err(|err| {
            LesewerkError::Preprocessing(format!("failed to decode image: {}", err))
        })?;
        let orientation = decoder.orientation().map_err(|err| {
            LesewerkError::Preprocessing(format!("failed to read image orientation: {}", err))
        })?;
        let mut img = DynamicImage::from_decoder(decoder).map_err(|err| {
            LesewerkError::Preprocessing(format!("failed to decode image: {}", err))
        })?;
        img.apply_orientation(orientation);

        if img.width() == 0 || img.height() == 0 {
            return Err(LesewerkError::Preprocessing(format!(
                "image has zero dimension ({}x{})",
                img.width(),
                img.height()
            )));
        }

        debug!(
            width = img.width(),
            height = img.height(),
            ?orientation,
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Convert the image to 8-bit grayscale (luma).
    #[instrument(skip(self))]
    pub fn grayscale(self) -> Self {
        debug!("Converting to grayscale");
        Self {
            image: DynamicImage::ImageLuma8(self.image.to_luma8()),
        }
    }

    /// Adjust contrast by a factor around mid-grey. Values > 1.0 increase
    /// contrast; values < 1.0 decrease it. A value of 1.0 is a no-op.
    ///
    /// The result is always 8-bit grayscale.
    #[instrument(skip(self), fields(factor))]
    pub fn adjust_contrast(self, factor: f32) -> Self {
        let gray = self.image.to_luma8();
        if (factor - 1.0).abs() < f32::EPSILON {
            return Self {
                image: DynamicImage::ImageLuma8(gray),
            };
        }
        info!(factor, "Adjusting contrast");

        let contrasted = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            let value = gray.get_pixel(x, y).0[0];
            let stretched = factor * (value as f32 - 128.0) + 128.0;
            Luma([stretched.clamp(0.0, 255.0) as u8])
        });

        Self {
            image: DynamicImage::ImageLuma8(contrasted),
        }
    }

    /// Median-filter the grayscale image to remove speckle noise.
    /// A radius of 0 leaves the image untouched.
    #[instrument(skip(self), fields(radius))]
    pub fn denoise(self, radius: u32) -> Self {
        if radius == 0 {
            return self;
        }
        info!(radius, "Applying median denoise");
        let gray = self.image.to_luma8();
        Self {
            image: DynamicImage::ImageLuma8(median_filter(&gray, radius, radius)),
        }
    }
}
