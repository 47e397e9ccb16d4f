// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// External tool diagnostics.
//
// Checks that the binaries the pipeline shells out to are installed:
// tesseract → configured language packs → pdftoppm. Each step carries a
// plain-language fix for the user when it fails.

use std::path::Path;
use std::process::{Command, Output};

use lesewerk_core::config::AppConfig;
use tracing::{debug, info};

use crate::command::tool_name;

/// Result of a single diagnostic step.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Step name shown to the user.
    pub name: String,
    pub passed: bool,
    /// What was found.
    pub detail: String,
    /// What to do if the step failed.
    pub fix: Option<String>,
}

impl StepResult {
    fn pass(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            detail: detail.into(),
            fix: None,
        }
    }

    fn fail(name: &str, detail: impl Into<String>, fix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            detail: detail.into(),
            fix: Some(fix.into()),
        }
    }
}

/// Full diagnostic report.
#[derive(Debug, Clone)]
pub struct DiagnosticReport {
    pub steps: Vec<StepResult>,
    /// Index of the first failing step, if any.
    pub failed_step: Option<usize>,
    pub summary: String,
}

impl DiagnosticReport {
    pub fn all_passed(&self) -> bool {
        self.failed_step.is_none()
    }
}

const TESSERACT_STEP: &str = "Tesseract OCR";
const LANGUAGE_STEP: &str = "Language Data";
const POPPLER_STEP: &str = "PDF Renderer (Poppler)";

/// Check the tools the configured pipeline depends on.
///
/// The language check needs a working tesseract and is skipped without one.
/// The Poppler check always runs.
pub fn run_diagnostics(config: &AppConfig) -> DiagnosticReport {
    let mut steps = Vec::new();

    let tesseract = config.tesseract_binary();
    let tesseract_step = check_tesseract(&tesseract);
    let tesseract_ok = tesseract_step.passed;
    steps.push(tesseract_step);
    if tesseract_ok {
        steps.push(check_languages(&tesseract, &config.language));
    }
    steps.push(check_pdftoppm(&config.pdftoppm_binary()));

    let failed_step = steps.iter().position(|step| !step.passed);
    let summary = match failed_step {
        None => "Everything looks good! Lesewerk is ready to read your documents.".into(),
        Some(idx) => match steps[idx].name.as_str() {
            TESSERACT_STEP => "The text recognition program isn't installed.".into(),
            LANGUAGE_STEP => "Text recognition is installed, but not for your language.".into(),
            _ => "PDF support isn't installed. Images will still work.".into(),
        },
    };
    info!(
        passed = failed_step.is_none(),
        steps = steps.len(),
        "Tool diagnostics finished"
    );

    DiagnosticReport {
        steps,
        failed_step,
        summary,
    }
}

/// Shareable plain-text version of a report, for pasting into a help request.
pub fn generate_help_summary(report: &DiagnosticReport) -> String {
    let now = chrono::Utc::now().format("%d %b %Y, %H:%M");
    let mut text = format!("Lesewerk Doctor Report\nDate: {now}\nPlatform: {}\n\n", std::env::consts::OS);
    for (i, step) in report.steps.iter().enumerate() {
        let mark = if step.passed { "ok" } else { "FAILED" };
        text.push_str(&format!("{}. {} [{mark}]: {}\n", i + 1, step.name, step.detail));
        if let Some(ref fix) = step.fix {
            text.push_str(&format!("   What to do: {fix}\n"));
        }
    }
    text.push('\n');
    text.push_str(&report.summary);
    text.push('\n');
    text
}

// -- Step implementations ---------------------------------------------------

/// Spawn a tool and capture its output, whatever the exit status.
fn query_tool(binary: &Path, args: &[&str]) -> std::io::Result<Output> {
    debug!(binary = %binary.display(), ?args, "Probing tool");
    Command::new(binary).args(args).output()
}

/// First non-empty line across stdout then stderr.
fn first_line(output: &Output) -> Option<String> {
    [&output.stdout, &output.stderr]
        .into_iter()
        .flat_map(|bytes| {
            String::from_utf8_lossy(bytes)
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_owned)
                .collect::<Vec<_>>()
        })
        .next()
}

fn check_tesseract(binary: &Path) -> StepResult {
    match query_tool(binary, &["--version"]) {
        Ok(output) => {
            let version = first_line(&output).unwrap_or_else(|| tool_name(binary));
            StepResult::pass(TESSERACT_STEP, format!("Found {version}."))
        }
        Err(err) => StepResult::fail(
            TESSERACT_STEP,
            format!("Could not run {} ({err}).", binary.display()),
            "Install Tesseract OCR: `sudo apt install tesseract-ocr` on Debian/Ubuntu, \
             `brew install tesseract` on macOS. If it is installed somewhere unusual, \
             set its path in Settings.",
        ),
    }
}

fn check_languages(binary: &Path, language: &str) -> StepResult {
    let output = match query_tool(binary, &["--list-langs"]) {
        Ok(output) => output,
        Err(err) => {
            return StepResult::fail(
                LANGUAGE_STEP,
                format!("Could not list installed languages ({err})."),
                "Reinstall Tesseract OCR.",
            );
        }
    };

    let installed = parse_language_list(&String::from_utf8_lossy(&output.stdout));
    let missing: Vec<&str> = language
        .split('+')
        .filter(|lang| !installed.iter().any(|have| have == lang))
        .collect();

    if missing.is_empty() {
        StepResult::pass(
            LANGUAGE_STEP,
            format!("Language data for {language} is installed."),
        )
    } else {
        let packages: Vec<String> = missing
            .iter()
            .map(|lang| format!("tesseract-ocr-{lang}"))
            .collect();
        StepResult::fail(
            LANGUAGE_STEP,
            format!("No language data for {}.", missing.join(", ")),
            format!(
                "Install the language pack: `sudo apt install {}`, or pick an installed \
                 language in Settings.",
                packages.join(" ")
            ),
        )
    }
}

fn check_pdftoppm(binary: &Path) -> StepResult {
    // `pdftoppm -v` exits non-zero on older Poppler releases; spawning at all
    // is what matters.
    match query_tool(binary, &["-v"]) {
        Ok(output) => {
            let version = first_line(&output).unwrap_or_else(|| tool_name(binary));
            StepResult::pass(POPPLER_STEP, format!("Found {version}."))
        }
        Err(err) => StepResult::fail(
            POPPLER_STEP,
            format!("Could not run {} ({err}).", binary.display()),
            "Install Poppler: `sudo apt install poppler-utils` on Debian/Ubuntu, \
             `brew install poppler` on macOS. If it is installed somewhere unusual, \
             set its path in Settings.",
        ),
    }
}

/// Language codes from `tesseract --list-langs` output.
fn parse_language_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("List of available languages"))
        .map(str::to_owned)
        .collect()
}
