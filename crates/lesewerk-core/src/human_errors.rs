// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the presentation layer.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The taxonomy uses four severity levels that drive UI presentation.

use crate::error::LesewerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Temporary hiccup — trying again may work.
    Transient,
    /// User must do something (pick another file, fix a setting).
    ActionRequired,
    /// Cannot be fixed by retrying — wrong format, damaged file.
    Permanent,
    /// A required program (Tesseract, Poppler) has to be installed first.
    InstallRequired,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether pressing "Process" again could succeed.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `LesewerkError` into a `HumanError`.
pub fn humanize_error(err: &LesewerkError) -> HumanError {
    match err {
        LesewerkError::UnsupportedFormat(detail) => HumanError {
            message: "This type of file isn't supported.".into(),
            suggestion: format!(
                "Upload a PNG, JPG, BMP or TIFF image, or a PDF. ({detail})"
            ),
            retriable: false,
            severity: Severity::Permanent,
        },

        LesewerkError::Preprocessing(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or empty. Try saving it again as PNG or JPEG.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        LesewerkError::Rasterization(detail) => {
            if err.is_missing_tool() {
                HumanError {
                    message: "PDF support isn't installed.".into(),
                    suggestion: "Install Poppler (the `poppler-utils` package on Linux, `brew install poppler` on macOS) and make sure `pdftoppm` is on your PATH, or set its location in Settings.".into(),
                    retriable: false,
                    severity: Severity::InstallRequired,
                }
            } else if detail.contains("page count") {
                HumanError {
                    message: "Some pages of this PDF could not be rendered.".into(),
                    suggestion: "The PDF may be partly damaged. Try re-exporting it, or limit processing to a page range in Settings.".into(),
                    retriable: false,
                    severity: Severity::Permanent,
                }
            } else {
                HumanError {
                    message: "This PDF couldn't be converted to images.".into(),
                    suggestion: "The PDF may be damaged, encrypted, or empty. Try opening it in a PDF viewer first.".into(),
                    retriable: false,
                    severity: Severity::Permanent,
                }
            }
        }

        LesewerkError::OcrEngine(detail) => humanize_ocr_error(err, detail),

        LesewerkError::Config(detail) => HumanError {
            message: "One of the settings isn't valid.".into(),
            suggestion: format!("Open Settings and correct it. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        LesewerkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to read that file.".into(),
                    suggestion: "Check the file permissions, or copy the file somewhere else first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        LesewerkError::Serialization(_) | LesewerkError::Internal(_) => HumanError {
            message: "The app had an internal problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

fn humanize_ocr_error(err: &LesewerkError, detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if err.is_missing_tool() {
        HumanError {
            message: "Tesseract OCR isn't installed.".into(),
            suggestion: "Install Tesseract (the `tesseract-ocr` package on Linux, `brew install tesseract` on macOS) and make sure it's on your PATH, or set its location in Settings.".into(),
            retriable: false,
            severity: Severity::InstallRequired,
        }
    } else if lower.contains("failed loading language") || lower.contains("traineddata") {
        HumanError {
            message: "The selected OCR language isn't installed.".into(),
            suggestion: "Install the Tesseract language pack (e.g. `tesseract-ocr-deu`) or pick another language in Settings.".into(),
            retriable: false,
            severity: Severity::InstallRequired,
        }
    } else if lower.contains("model not found") {
        HumanError {
            message: "The OCR models haven't been downloaded.".into(),
            suggestion: "Download `text-detection.rten` and `text-recognition.rten` into the model folder shown in Settings, or switch the engine to Tesseract.".into(),
            retriable: false,
            severity: Severity::InstallRequired,
        }
    } else {
        HumanError {
            message: "Text recognition didn't work on this file.".into(),
            suggestion: format!(
                "Try again, or try a clearer scan at a higher resolution. (Detail: {detail})"
            ),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_is_permanent() {
        let err = LesewerkError::UnsupportedFormat("extension .exe".into());
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Permanent);
        assert!(!human.retriable);
    }

    #[test]
    fn missing_tesseract_needs_install() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let human = humanize_error(&LesewerkError::missing_tool("tesseract", &io));
        assert_eq!(human.severity, Severity::InstallRequired);
        assert!(human.suggestion.contains("tesseract-ocr"));
    }

    #[test]
    fn missing_pdftoppm_needs_poppler() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let human = humanize_error(&LesewerkError::missing_tool("pdftoppm", &io));
        assert_eq!(human.severity, Severity::InstallRequired);
        assert!(human.suggestion.contains("poppler"));
    }

    #[test]
    fn missing_language_pack_needs_install() {
        let err = LesewerkError::OcrEngine(
            "tesseract exited with 1: Failed loading language 'deu'".into(),
        );
        assert_eq!(humanize_error(&err).severity, Severity::InstallRequired);
    }

    #[test]
    fn generic_engine_failure_is_retriable() {
        let err = LesewerkError::OcrEngine("tesseract exited with signal 9".into());
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.retriable);
    }

    #[test]
    fn bad_setting_is_action_required() {
        let human = humanize_error(&LesewerkError::Config("dpi 5".into()));
        assert_eq!(human.severity, Severity::ActionRequired);
    }
}
