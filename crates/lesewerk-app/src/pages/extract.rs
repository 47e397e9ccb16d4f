// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extract page — pick an image or PDF, run OCR, read and export the text.
//
// The pipeline runs on a blocking task; progress snapshots come back over a
// channel so the bar moves page by page while the UI stays responsive.

use dioxus::prelude::*;

use lesewerk_core::error::LesewerkError;
use lesewerk_core::human_errors::{Severity, humanize_error};
use lesewerk_core::types::{ExtractionProgress, ProcessingStage};

use crate::services::app_services::{AppServices, export_file_name, preview_data_url};
use crate::state::{AppState, LoadedFile, SourceKind};

#[component]
pub fn Extract() -> Element {
    let svc = use_context::<AppServices>();
    let state = use_context::<Signal<AppState>>();

    let running = state.read().running;
    let source_kind = state.read().source_kind;
    let has_file = state.read().loaded.is_some();

    rsx! {
        div {
            h1 { "Extract Text" }
            p { style: "color: #666;", "Read the text out of a scanned image or PDF." }

            // Source type selector
            div { style: "display: flex; gap: 24px; margin: 16px 0;",
                SourceOption {
                    label: "Image",
                    selected: source_kind == SourceKind::Image,
                    disabled: running,
                    on_select: move |_| select_kind(state, SourceKind::Image),
                }
                SourceOption {
                    label: "PDF",
                    selected: source_kind == SourceKind::Pdf,
                    disabled: running,
                    on_select: move |_| select_kind(state, SourceKind::Pdf),
                }
            }

            // Pick file button
            button {
                style: "width: 100%; padding: 16px; border-radius: 12px; border: 2px dashed #007aff; color: #007aff; background: white; font-size: 16px; margin-bottom: 16px;",
                disabled: running,
                onclick: move |_| pick_file(state),
                if source_kind == SourceKind::Image { "Choose Image" } else { "Choose PDF" }
            }

            // Loaded file + preview
            if let Some(ref file) = state.read().loaded {
                {
                    let size_kb = file.bytes.len() / 1024;
                    rsx! {
                        p { style: "font-size: 14px; color: #333;",
                            strong { "{file.name}" }
                            span { style: "color: #888;", " ({size_kb} KB)" }
                        }
                        if let Some(ref src) = file.preview {
                            img {
                                src: "{src}",
                                style: "max-width: 100%; max-height: 320px; border: 1px solid #ddd; border-radius: 4px; display: block; margin: 0 auto 16px;",
                            }
                        }
                    }
                }
            }

            // Process button
            button {
                style: "width: 100%; padding: 14px; border-radius: 8px; border: none; background: #007aff; color: white; font-size: 16px;",
                disabled: running || !has_file,
                onclick: {
                    let svc = svc.clone();
                    move |_| start_extraction(svc.clone(), state)
                },
                if running { "Processing..." } else { "Process" }
            }

            // Progress
            if running {
                ProgressBar { progress: state.read().progress }
            }

            // Error
            if let Some(ref err) = state.read().error {
                {
                    let (bg, fg) = match err.severity {
                        Severity::Transient => ("#fff3cd", "#856404"),
                        Severity::InstallRequired => ("#cce5ff", "#004085"),
                        Severity::ActionRequired | Severity::Permanent => ("#f8d7da", "#721c24"),
                    };
                    rsx! {
                        div { style: "margin-top: 16px; padding: 16px; border-radius: 12px; background: {bg}; color: {fg};",
                            p { style: "font-weight: bold; margin: 0 0 8px 0;", "{err.message}" }
                            p { style: "margin: 0; font-size: 14px;", "{err.suggestion}" }
                            if err.severity == Severity::InstallRequired {
                                p { style: "margin: 8px 0 0 0; font-size: 14px;",
                                    "The Doctor tab can check what is missing."
                                }
                            }
                        }
                    }
                }
            }

            // Result
            if let Some(ref result) = state.read().result {
                {
                    let text = result.combined_text();
                    let pages = result.page_count;
                    let seconds = result.elapsed_ms as f64 / 1000.0;
                    let blank = result.is_blank();
                    let warnings = result.warnings.clone();
                    rsx! {
                        div { style: "margin-top: 24px;",
                            h3 { "Extracted Text" }
                            p { style: "color: #888; font-size: 13px;",
                                "{pages} page(s) in {seconds:.1} s"
                            }
                            if blank {
                                p { style: "padding: 12px; border-radius: 8px; background: #fff3cd; color: #856404;",
                                    "No text was detected. Try a sharper scan, a higher DPI in Settings, or a different language."
                                }
                            }
                            for warning in warnings {
                                p { style: "color: #856404; font-size: 13px; margin: 4px 0;", "{warning}" }
                            }
                            textarea {
                                readonly: true,
                                style: "width: 100%; min-height: 320px; font-family: ui-monospace, monospace; font-size: 14px; padding: 8px; border: 1px solid #ccc; border-radius: 8px; box-sizing: border-box;",
                                value: "{text}",
                            }
                            for page in result.pages.iter().filter(|p| p.mean_confidence.is_some()) {
                                {
                                    let n = page.page_number;
                                    let conf = page.mean_confidence.unwrap_or_default();
                                    rsx! {
                                        p { style: "color: #888; font-size: 12px; margin: 2px 0;",
                                            "Page {n}: mean confidence {conf:.0}%"
                                        }
                                    }
                                }
                            }
                            div { style: "display: flex; gap: 8px; margin-top: 12px;",
                                button {
                                    style: "flex: 1; padding: 12px; border-radius: 8px; border: 1px solid #ccc; background: white;",
                                    onclick: {
                                        let svc = svc.clone();
                                        move |_| export(&svc, state, ExportKind::Text)
                                    },
                                    "Save as Text"
                                }
                                button {
                                    style: "flex: 1; padding: 12px; border-radius: 8px; border: 1px solid #ccc; background: white;",
                                    onclick: {
                                        let svc = svc.clone();
                                        move |_| export(&svc, state, ExportKind::Json)
                                    },
                                    "Save as JSON"
                                }
                            }
                        }
                    }
                }
            }

            // Status
            if let Some(ref msg) = state.read().status_message {
                p { style: "margin-top: 12px; color: #666; font-size: 14px; text-align: center;",
                    "{msg}"
                }
            }
        }
    }
}

#[component]
fn SourceOption(
    label: &'static str,
    selected: bool,
    disabled: bool,
    on_select: EventHandler<()>,
) -> Element {
    rsx! {
        label { style: "display: flex; align-items: center; gap: 6px; font-size: 16px;",
            input {
                r#type: "radio",
                name: "source-kind",
                checked: selected,
                disabled: disabled,
                onchange: move |_| on_select.call(()),
            }
            "{label}"
        }
    }
}

#[component]
fn ProgressBar(progress: ExtractionProgress) -> Element {
    let percent = (progress.fraction() * 100.0).round() as u32;
    let label = match progress.stage {
        ProcessingStage::Validating => "Checking file...".to_string(),
        ProcessingStage::Rasterizing => "Rendering PDF pages...".to_string(),
        ProcessingStage::Recognizing => format!(
            "Reading page {} of {}",
            (progress.completed_pages + 1).min(progress.total_pages.max(1)),
            progress.total_pages
        ),
        ProcessingStage::Complete => "Done".to_string(),
        ProcessingStage::Idle | ProcessingStage::Failed => String::new(),
    };
    rsx! {
        div { style: "margin-top: 16px;",
            div { style: "height: 8px; border-radius: 4px; background: #e0e0e0; overflow: hidden;",
                div { style: "height: 100%; width: {percent}%; background: #007aff; transition: width 0.2s;" }
            }
            p { style: "color: #666; font-size: 13px; margin-top: 6px;", "{label}" }
        }
    }
}

fn select_kind(mut state: Signal<AppState>, kind: SourceKind) {
    let mut s = state.write();
    if s.source_kind != kind {
        s.source_kind = kind;
        s.loaded = None;
        s.clear_outcome();
    }
}

fn pick_file(mut state: Signal<AppState>) {
    let kind = state.read().source_kind;
    let (filter_name, extensions) = kind.dialog_filter();
    let Some(path) = rfd::FileDialog::new()
        .add_filter(filter_name, extensions)
        .pick_file()
    else {
        return;
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    match std::fs::read(&path) {
        Ok(bytes) => {
            tracing::info!(path = %path.display(), bytes = bytes.len(), "file loaded");
            let preview = match kind {
                SourceKind::Image => preview_data_url(&bytes),
                SourceKind::Pdf => None,
            };
            let mut s = state.write();
            s.clear_outcome();
            s.loaded = Some(LoadedFile {
                name,
                bytes,
                preview,
            });
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read file");
            let mut s = state.write();
            s.clear_outcome();
            s.error = Some(humanize_error(&LesewerkError::Io(e)));
        }
    }
}

fn start_extraction(svc: AppServices, mut state: Signal<AppState>) {
    let Some(file) = state.read().loaded.clone() else {
        return;
    };
    {
        let mut s = state.write();
        s.clear_outcome();
        s.running = true;
    }

    spawn(async move {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ExtractionProgress>();
        let worker = tokio::task::spawn_blocking(move || {
            let report = move |p: ExtractionProgress| {
                let _ = tx.send(p);
            };
            svc.extract(&file.name, file.bytes, &report)
        });

        while let Some(progress) = rx.recv().await {
            state.write().progress = progress;
        }

        let outcome = match worker.await {
            Ok(outcome) => outcome,
            Err(e) => Err(LesewerkError::Internal(format!("extraction task failed: {e}"))),
        };

        let mut s = state.write();
        s.running = false;
        match outcome {
            Ok(result) => {
                if result.is_blank() {
                    tracing::info!(pages = result.page_count, "no text detected");
                }
                s.result = Some(result);
            }
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind(), "extraction failed");
                s.error = Some(humanize_error(&e));
            }
        }
    });
}

#[derive(Debug, Clone, Copy)]
enum ExportKind {
    Text,
    Json,
}

fn export(svc: &AppServices, mut state: Signal<AppState>, kind: ExportKind) {
    let Some(result) = state.read().result.clone() else {
        return;
    };
    let (filter, ext) = match kind {
        ExportKind::Text => ("Text", "txt"),
        ExportKind::Json => ("JSON", "json"),
    };
    let Some(path) = rfd::FileDialog::new()
        .set_file_name(export_file_name(&result.document_name, ext))
        .add_filter(filter, &[ext])
        .save_file()
    else {
        return;
    };

    let saved = match kind {
        ExportKind::Text => svc.export_text(&result, &path),
        ExportKind::Json => svc.export_json(&result, &path),
    };
    let message = match saved {
        Ok(()) => format!("Saved to {}", path.display()),
        Err(e) => {
            tracing::error!(error = %e, "export failed");
            format!("Save failed: {}", humanize_error(&e).message)
        }
    };
    state.write().status_message = Some(message);
}
