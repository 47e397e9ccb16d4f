// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Running external tools (tesseract, pdftoppm) and turning their failures
// into domain errors.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Output};

use lesewerk_core::error::{LesewerkError, Result};
use tracing::{debug, warn};

/// Longest stderr excerpt carried into an error message.
const STDERR_EXCERPT: usize = 400;

/// Run `binary` with `args` to completion and return its output.
///
/// A binary that cannot be spawned (absent, not executable) becomes a
/// missing-tool error; a non-zero exit becomes `stage_error` carrying the
/// tail of stderr.
pub(crate) fn run_tool<I, S>(
    binary: &Path,
    args: I,
    stage_error: fn(String) -> LesewerkError,
) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let tool = tool_name(binary);
    let mut command = Command::new(binary);
    command.args(args);
    debug!(tool = %tool, command = ?command, "Running external tool");

    let output = command.output().map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
            LesewerkError::missing_tool(&tool, &err)
        }
        _ => stage_error(format!("failed to run {tool}: {err}")),
    })?;

    if !output.status.success() {
        let stderr = stderr_excerpt(&output.stderr);
        warn!(tool = %tool, status = %output.status, stderr = %stderr, "External tool failed");
        return Err(stage_error(format!(
            "{tool} exited with {}: {stderr}",
            output.status
        )));
    }

    Ok(output)
}

/// File name of a binary path, for messages (`/usr/bin/tesseract` → `tesseract`).
pub(crate) fn tool_name(binary: &Path) -> String {
    binary
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| binary.display().to_string())
}

/// Last `STDERR_EXCERPT` characters of stderr, trimmed.
fn stderr_excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    let count = trimmed.chars().count();
    if count <= STDERR_EXCERPT {
        return trimmed.to_owned();
    }
    trimmed.chars().skip(count - STDERR_EXCERPT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn tool_name_strips_directories() {
        assert_eq!(tool_name(Path::new("/usr/local/bin/tesseract")), "tesseract");
        assert_eq!(tool_name(Path::new("pdftoppm")), "pdftoppm");
    }

    #[test]
    fn missing_binary_is_missing_tool() {
        let binary = PathBuf::from("/nonexistent/lesewerk/pdftoppm");
        let err = run_tool(&binary, ["-v"], LesewerkError::Rasterization).unwrap_err();
        assert!(err.is_missing_tool());
        assert!(matches!(err, LesewerkError::Rasterization(_)));
    }

    #[test]
    fn stderr_excerpt_keeps_tail() {
        let long = "x".repeat(1000) + "END";
        let excerpt = stderr_excerpt(long.as_bytes());
        assert_eq!(excerpt.chars().count(), STDERR_EXCERPT);
        assert!(excerpt.ends_with("END"));
    }
}
