// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — structural inspection and page rasterization.

pub mod raster;
pub mod reader;

pub use raster::{PageImage, PdfRasterizer, PdftoppmRasterizer, RasterRequest};
pub use reader::PdfReader;
