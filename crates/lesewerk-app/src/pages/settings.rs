// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Settings page — persistent OCR configuration.

use std::path::PathBuf;

use dioxus::prelude::*;

use lesewerk_core::config::{MAX_DPI, MIN_DPI};
use lesewerk_core::types::{FailurePolicy, PageRange};
use lesewerk_core::{OcrBackend, ThresholdMethod};

use crate::services::app_services::AppServices;
use crate::state::AppState;

const ROW_STYLE: &str = "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;";
const INPUT_STYLE: &str = "padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px;";

#[component]
pub fn Settings() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let svc = use_context::<AppServices>();
    let mut save_msg = use_signal(|| Option::<Result<String, String>>::None);

    let config = state.read().config.clone();
    let range_start = config.page_range.map(|r| r.start.to_string()).unwrap_or_default();
    let range_end = config
        .page_range
        .filter(|r| r.end != u32::MAX)
        .map(|r| r.end.to_string())
        .unwrap_or_default();
    let version = env!("CARGO_PKG_VERSION");
    let settings_path = svc.data_dir().join("config.json").display().to_string();

    rsx! {
        div {
            h1 { "Settings" }

            section { style: "margin: 16px 0;",
                h3 { "Recognition" }
                div { style: ROW_STYLE,
                    span { "Language (e.g. eng, deu, eng+fra)" }
                    input {
                        r#type: "text",
                        style: "{INPUT_STYLE} width: 120px;",
                        value: "{config.language}",
                        onchange: move |evt| {
                            state.write().config.language = evt.value().trim().to_string();
                        },
                    }
                }
                div { style: ROW_STYLE,
                    span { "Page layout mode (0–13)" }
                    input {
                        r#type: "number",
                        min: "0",
                        max: "13",
                        style: "{INPUT_STYLE} width: 80px; text-align: right;",
                        value: "{config.page_segmentation_mode}",
                        onchange: move |evt| {
                            if let Ok(psm) = evt.value().parse::<u8>()
                                && psm <= 13
                            {
                                state.write().config.page_segmentation_mode = psm;
                            }
                        },
                    }
                }
                div { style: ROW_STYLE,
                    span { "Engine" }
                    select {
                        style: INPUT_STYLE,
                        value: engine_label(config.engine),
                        onchange: move |evt| {
                            if let Some(engine) = engine_from_label(&evt.value()) {
                                state.write().config.engine = engine;
                            }
                        },
                        option { value: "tesseract", "Tesseract" }
                        option { value: "ocrs", "ocrs (built-in)" }
                    }
                }
                SettingRow {
                    label: "Collect word confidence and positions",
                    checked: config.collect_word_data,
                    on_toggle: move |v: bool| { state.write().config.collect_word_data = v; },
                }
            }

            section { style: "margin: 16px 0;",
                h3 { "PDF Pages" }
                div { style: ROW_STYLE,
                    span { "Resolution (DPI, {MIN_DPI}–{MAX_DPI})" }
                    input {
                        r#type: "number",
                        min: "{MIN_DPI}",
                        max: "{MAX_DPI}",
                        style: "{INPUT_STYLE} width: 80px; text-align: right;",
                        value: "{config.dpi}",
                        onchange: move |evt| {
                            if let Ok(dpi) = evt.value().parse::<u32>()
                                && (MIN_DPI..=MAX_DPI).contains(&dpi)
                            {
                                state.write().config.dpi = dpi;
                            }
                        },
                    }
                }
                div { style: ROW_STYLE,
                    span { "Only pages (blank for all)" }
                    div { style: "display: flex; gap: 4px; align-items: center;",
                        input {
                            r#type: "number",
                            min: "1",
                            style: "{INPUT_STYLE} width: 60px; text-align: right;",
                            value: "{range_start}",
                            onchange: move |evt| {
                                let start = evt.value().parse::<u32>().ok();
                                let end = state.read().config.page_range.map(|r| r.end);
                                state.write().config.page_range = page_range(start, end);
                            },
                        }
                        span { "to" }
                        input {
                            r#type: "number",
                            min: "1",
                            style: "{INPUT_STYLE} width: 60px; text-align: right;",
                            value: "{range_end}",
                            onchange: move |evt| {
                                let end = evt.value().parse::<u32>().ok();
                                let start = state.read().config.page_range.map(|r| r.start);
                                state.write().config.page_range = page_range(start, end);
                            },
                        }
                    }
                }
                SettingRow {
                    label: "Keep going when a page fails",
                    checked: config.failure_policy == FailurePolicy::RecordEmpty,
                    on_toggle: move |v: bool| {
                        state.write().config.failure_policy = if v {
                            FailurePolicy::RecordEmpty
                        } else {
                            FailurePolicy::FailFast
                        };
                    },
                }
                SettingRow {
                    label: "Process pages in parallel",
                    checked: config.parallel_pages,
                    on_toggle: move |v: bool| { state.write().config.parallel_pages = v; },
                }
            }

            section { style: "margin: 16px 0;",
                h3 { "Image Cleanup" }
                SettingRow {
                    label: "Clean up images before reading",
                    checked: config.preprocess.enabled,
                    on_toggle: move |v: bool| { state.write().config.preprocess.enabled = v; },
                }
                div { style: ROW_STYLE,
                    span { "Black-and-white conversion" }
                    select {
                        style: INPUT_STYLE,
                        disabled: !config.preprocess.enabled,
                        value: threshold_label(config.preprocess.threshold),
                        onchange: move |evt| {
                            if let Some(method) = threshold_from_label(&evt.value()) {
                                state.write().config.preprocess.threshold = method;
                            }
                        },
                        option { value: "adaptive", "Adaptive (uneven lighting)" }
                        option { value: "otsu", "Global (Otsu)" }
                    }
                }
            }

            section { style: "margin: 16px 0;",
                h3 { "Programs" }
                PathRow {
                    label: "tesseract location",
                    value: path_text(&config.tesseract_path),
                    on_change: move |v: Option<PathBuf>| { state.write().config.tesseract_path = v; },
                }
                PathRow {
                    label: "pdftoppm location",
                    value: path_text(&config.pdftoppm_path),
                    on_change: move |v: Option<PathBuf>| { state.write().config.pdftoppm_path = v; },
                }
                PathRow {
                    label: "ocrs model folder",
                    value: path_text(&config.ocrs_model_dir),
                    on_change: move |v: Option<PathBuf>| { state.write().config.ocrs_model_dir = v; },
                }
            }

            // Save button
            button {
                style: "width: 100%; padding: 12px; border-radius: 8px; border: none; background: #007aff; color: white; font-size: 16px; margin-top: 8px;",
                onclick: {
                    let svc = svc.clone();
                    move |_| {
                        let config = state.read().config.clone();
                        match svc.save_config(&config) {
                            Ok(()) => {
                                tracing::info!("settings saved");
                                save_msg.set(Some(Ok("Settings saved.".into())));
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "failed to save settings");
                                save_msg.set(Some(Err(format!("Save failed: {e}"))));
                            }
                        }
                    }
                },
                "Save Settings"
            }
            match &*save_msg.read() {
                Some(Ok(msg)) => rsx! {
                    p { style: "color: #34c759; font-size: 14px; text-align: center; margin-top: 8px;", "{msg}" }
                },
                Some(Err(msg)) => rsx! {
                    p { style: "color: #ff3b30; font-size: 14px; text-align: center; margin-top: 8px;", "{msg}" }
                },
                None => rsx! {},
            }

            section { style: "margin: 24px 0;",
                h3 { "About" }
                p { style: "color: #666; font-size: 14px;",
                    "Lesewerk v{version}"
                    br {}
                    "Text recognition for scanned images and PDFs"
                    br {}
                    "Settings file: {settings_path}"
                    br {}
                    "PMPL-1.0-or-later"
                }
            }
        }
    }
}

#[component]
fn SettingRow(label: &'static str, checked: bool, on_toggle: EventHandler<bool>) -> Element {
    rsx! {
        div { style: ROW_STYLE,
            span { "{label}" }
            input {
                r#type: "checkbox",
                checked: checked,
                onchange: move |evt| {
                    on_toggle.call(evt.checked());
                },
            }
        }
    }
}

/// Text input for an optional program path; blank means "look it up on PATH".
#[component]
fn PathRow(label: &'static str, value: String, on_change: EventHandler<Option<PathBuf>>) -> Element {
    rsx! {
        div { style: ROW_STYLE,
            span { "{label}" }
            input {
                r#type: "text",
                placeholder: "automatic",
                style: "{INPUT_STYLE} width: 240px;",
                value: "{value}",
                onchange: move |evt| {
                    let text = evt.value().trim().to_string();
                    on_change.call((!text.is_empty()).then(|| PathBuf::from(text)));
                },
            }
        }
    }
}

fn page_range(start: Option<u32>, end: Option<u32>) -> Option<PageRange> {
    match (start, end) {
        (Some(start), Some(end)) => Some(PageRange::new(start, end)),
        (Some(start), None) => Some(PageRange::new(start, u32::MAX)),
        (None, Some(end)) => Some(PageRange::new(1, end)),
        (None, None) => None,
    }
}

fn path_text(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

fn engine_label(engine: OcrBackend) -> &'static str {
    match engine {
        OcrBackend::Tesseract => "tesseract",
        OcrBackend::Ocrs => "ocrs",
    }
}

fn engine_from_label(label: &str) -> Option<OcrBackend> {
    match label {
        "tesseract" => Some(OcrBackend::Tesseract),
        "ocrs" => Some(OcrBackend::Ocrs),
        _ => None,
    }
}

fn threshold_label(method: ThresholdMethod) -> &'static str {
    match method {
        ThresholdMethod::Adaptive => "adaptive",
        ThresholdMethod::Otsu => "otsu",
    }
}

fn threshold_from_label(label: &str) -> Option<ThresholdMethod> {
    match label {
        "adaptive" => Some(ThresholdMethod::Adaptive),
        "otsu" => Some(ThresholdMethod::Otsu),
        _ => None,
    }
}
