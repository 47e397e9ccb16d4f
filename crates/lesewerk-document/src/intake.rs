// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File intake — validates an upload's extension and content signature and
// wraps it as an immutable `UploadedDocument`. Nothing downstream runs on
// bytes that have not passed through here.

use std::path::Path;

use chrono::Utc;
use image::ImageFormat;
use lesewerk_core::config::AppConfig;
use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::types::{DocumentId, MediaType, UploadedDocument};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

/// Magic bytes at the start of every PDF file.
const PDF_SIGNATURE: &[u8] = b"%PDF-";
/// PDF readers, Poppler included, find the header anywhere in the first 1 KiB.
const PDF_HEADER_WINDOW: usize = 1024;

/// Gatekeeper for uploaded files.
#[derive(Debug, Clone)]
pub struct FileIntake {
    max_upload_bytes: usize,
}

impl Default for FileIntake {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl FileIntake {
    pub fn new(max_upload_bytes: usize) -> Self {
        Self { max_upload_bytes }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.max_upload_bytes)
    }

    /// Validate an upload and take ownership of its bytes.
    #[instrument(skip(self, bytes), fields(name = %name, size = bytes.len()))]
    pub fn accept(&self, name: &str, bytes: Vec<u8>) -> Result<UploadedDocument> {
        if bytes.is_empty() {
            return Err(LesewerkError::UnsupportedFormat(format!("{name} is empty")));
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(LesewerkError::UnsupportedFormat(format!(
                "{name} is {} bytes, larger than the {} byte limit",
                bytes.len(),
                self.max_upload_bytes
            )));
        }

        let media_type = Self::classify(name, &bytes)?;
        let sha256 = hex::encode(Sha256::digest(&bytes));

        let document = UploadedDocument {
            id: DocumentId::new(),
            name: name.to_owned(),
            media_type,
            bytes,
            sha256,
            received_at: Utc::now(),
        };
        info!(
            id = %document.id,
            media_type = %media_type,
            size = document.size(),
            "Upload accepted"
        );
        Ok(document)
    }

    /// Decide the media type of an upload from its name and leading bytes.
    ///
    /// The extension is checked first and must be on the accepted list. The
    /// content signature then decides; a recognised signature that disagrees
    /// with the extension wins over it.
    pub fn classify(name: &str, bytes: &[u8]) -> Result<MediaType> {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        let declared = MediaType::from_extension(extension).ok_or_else(|| {
            LesewerkError::UnsupportedFormat(format!(
                "{name}: expected one of .{}",
                MediaType::ACCEPTED_EXTENSIONS.join(", .")
            ))
        })?;

        let sniffed = sniff(bytes).ok_or_else(|| {
            LesewerkError::UnsupportedFormat(format!(
                "{name}: content is not a supported image or PDF"
            ))
        })?;

        if sniffed != declared {
            warn!(
                name,
                declared = %declared,
                detected = %sniffed,
                "File extension does not match content; using content type"
            );
        }
        Ok(sniffed)
    }
}

/// Media type from the content signature alone.
///
/// Image magic numbers sit at offset 0 and are checked before the looser
/// PDF header search.
fn sniff(bytes: &[u8]) -> Option<MediaType> {
    if bytes.starts_with(PDF_SIGNATURE) {
        return Some(MediaType::Pdf);
    }
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => return Some(MediaType::Png),
        Ok(ImageFormat::Jpeg) => return Some(MediaType::Jpeg),
        Ok(ImageFormat::Bmp) => return Some(MediaType::Bmp),
        Ok(ImageFormat::Tiff) => return Some(MediaType::Tiff),
        Ok(_) => return None,
        Err(_) => {}
    }
    has_pdf_header(bytes).then_some(MediaType::Pdf)
}

fn has_pdf_header(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(PDF_HEADER_WINDOW)];
    head.windows(PDF_SIGNATURE.len())
        .any(|window| window == PDF_SIGNATURE)
}
