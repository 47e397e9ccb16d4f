// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Binarization — adaptive (local mean over a summed-area table) and global
// Otsu thresholding of 8-bit grayscale images.

use image::{GrayImage, Luma};
use imageproc::contrast::{ThresholdType, threshold};
use imageproc::definitions::Image;
use imageproc::integral_image::{integral_image, sum_image_pixels};

/// Black/white output values.
const INK: u8 = 0;
const PAPER: u8 = 255;

/// Adaptive thresholding: for each pixel, the threshold is the mean intensity
/// within a `block_radius` neighbourhood, minus `offset`. Pixels darker than
/// the local threshold become ink; everything else becomes paper.
///
/// Sums are accumulated in `u64`; a 600 DPI A4 page overflows `u32`.
pub fn binarize_adaptive(gray: &GrayImage, block_radius: u32, offset: i32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let integral = integral_image::<_, u64>(gray);

    GrayImage::from_fn(width, height, |x, y| {
        let local_mean = region_mean(&integral, width, height, x, y, block_radius);
        let cut = (local_mean as i32 - offset).clamp(0, 255) as u8;
        if gray.get_pixel(x, y).0[0] < cut {
            Luma([INK])
        } else {
            Luma([PAPER])
        }
    })
}

/// Global binarization at the level picked by Otsu's method. Pixels at or
/// below the level become ink.
pub fn binarize_otsu(gray: &GrayImage) -> GrayImage {
    threshold(gray, otsu_threshold(gray), ThresholdType::Binary)
}

/// True when every pixel is pure ink or pure paper.
pub fn is_binary(gray: &GrayImage) -> bool {
    gray.pixels().all(|p| p.0[0] == INK || p.0[0] == PAPER)
}

/// Mean pixel value within a square region centred on (cx, cy), clamped to
/// the image bounds.
fn region_mean(
    integral: &Image<Luma<u64>>,
    width: u32,
    height: u32,
    cx: u32,
    cy: u32,
    radius: u32,
) -> f64 {
    let left = cx.saturating_sub(radius);
    let top = cy.saturating_sub(radius);
    let right = cx.saturating_add(radius).min(width - 1);
    let bottom = cy.saturating_add(radius).min(height - 1);

    let area = u64::from(right - left + 1) * u64::from(bottom - top + 1);
    let [sum] = sum_image_pixels(integral, left, top, right, bottom);
    sum as f64 / area as f64
}

/// Otsu level: the last ink intensity of the split maximising between-class
/// variance. Computed here rather than with `imageproc::contrast::otsu_level`,
/// whose `u32` intensity sums overflow on large pages.
pub fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total_pixels = gray.width() as u64 * gray.height() as u64;
    if total_pixels == 0 {
        return 0;
    }

    let sum_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut sum_background: f64 = 0.0;
    let mut weight_background: u64 = 0;
    let mut max_variance: f64 = 0.0;
    let mut best_threshold: u8 = 0;

    for (t, &count) in histogram.iter().enumerate() {
        weight_background += count;
        if weight_background == 0 {
            continue;
        }
        let weight_foreground = total_pixels - weight_background;
        if weight_foreground == 0 {
            break;
        }

        sum_background += t as f64 * count as f64;
        let mean_background = sum_background / weight_background as f64;
        let mean_foreground = (sum_total - sum_background) / weight_foreground as f64;

        let between_variance = weight_background as f64
            * weight_foreground as f64
            * (mean_background - mean_foreground).powi(2);

        if between_variance > max_variance {
            max_variance = between_variance;
            best_threshold = t as u8;
        }
    }

    best_threshold
}
