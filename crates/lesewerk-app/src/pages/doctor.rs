// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Doctor — checks that the OCR and PDF programs Lesewerk relies on are
// installed, and says how to install whatever is missing.

use dioxus::prelude::*;

use lesewerk_document::tools::{self, DiagnosticReport};

use crate::services::app_services::AppServices;

/// Diagnostic wizard states.
#[derive(Debug, Clone, PartialEq)]
enum WizardState {
    Intro,
    Running,
    Complete,
}

#[component]
pub fn Doctor() -> Element {
    let svc = use_context::<AppServices>();
    let mut wizard = use_signal(|| WizardState::Intro);
    let mut report = use_signal(|| Option::<DiagnosticReport>::None);
    let mut help_text = use_signal(|| Option::<String>::None);

    rsx! {
        div { style: "max-width: 600px; margin: 0 auto;",
            h1 { style: "text-align: center; font-size: 28px;",
                "Doctor"
            }
            p { style: "text-align: center; color: #666; margin-bottom: 24px;",
                "Let's check that everything needed to read your documents is installed."
            }

            match &*wizard.read() {
                WizardState::Intro => rsx! {
                    div { style: "text-align: center; padding: 32px 0;",
                        div { style: "text-align: left; max-width: 300px; margin: 0 auto;",
                            StepPreview { num: 1, label: "Text recognition (Tesseract)" }
                            StepPreview { num: 2, label: "Language data" }
                            StepPreview { num: 3, label: "PDF renderer (Poppler)" }
                        }
                        button {
                            style: "margin-top: 32px; padding: 16px 48px; border-radius: 12px; border: none; background: #007aff; color: white; font-size: 20px; font-weight: bold;",
                            onclick: {
                                let svc = svc.clone();
                                move |_| {
                                    wizard.set(WizardState::Running);
                                    help_text.set(None);
                                    let svc = svc.clone();
                                    spawn(async move {
                                        match tokio::task::spawn_blocking(move || svc.diagnose()).await {
                                            Ok(result) => report.set(Some(result)),
                                            Err(e) => tracing::error!(error = %e, "diagnostics task failed"),
                                        }
                                        wizard.set(WizardState::Complete);
                                    });
                                }
                            },
                            "Start Check"
                        }
                    }
                },

                WizardState::Running => rsx! {
                    div { style: "text-align: center; padding: 48px 0;",
                        p { style: "font-size: 20px; color: #007aff;",
                            "Checking..."
                        }
                    }
                },

                WizardState::Complete => {
                    if let Some(ref rpt) = *report.read() {
                        let summary_bg = if rpt.all_passed() { "#d4edda" } else { "#f8d7da" };
                        let summary_fg = if rpt.all_passed() { "#155724" } else { "#721c24" };
                        rsx! {
                            // Summary card
                            div {
                                style: "padding: 24px; border-radius: 16px; margin-bottom: 24px; background: {summary_bg};",
                                p { style: "font-size: 20px; font-weight: bold; color: {summary_fg}; margin: 0;",
                                    "{rpt.summary}"
                                }
                            }

                            // Step results
                            for (i, step) in rpt.steps.iter().enumerate() {
                                {
                                    let icon = if step.passed { "\u{2705}" } else { "\u{274C}" };
                                    let border = if step.passed { "#d4edda" } else { "#f8d7da" };
                                    rsx! {
                                        div {
                                            style: "padding: 16px; margin: 8px 0; border: 2px solid {border}; border-radius: 12px;",
                                            div { style: "display: flex; align-items: center; gap: 12px;",
                                                span { style: "font-size: 24px;", "{icon}" }
                                                div {
                                                    strong { style: "font-size: 16px;",
                                                        "Step {i + 1}: {step.name}"
                                                    }
                                                    p { style: "color: #666; font-size: 14px; margin: 4px 0 0 0;",
                                                        "{step.detail}"
                                                    }
                                                }
                                            }
                                            if let Some(ref fix) = step.fix {
                                                div { style: "margin-top: 12px; padding: 12px; background: #fff3cd; border-radius: 8px;",
                                                    strong { style: "color: #856404; font-size: 14px;",
                                                        "What to do: "
                                                    }
                                                    span { style: "color: #856404; font-size: 14px;",
                                                        "{fix}"
                                                    }
                                                }
                                            }
                                        }
                                    }
                                }
                            }

                            // Action buttons
                            div { style: "display: flex; gap: 12px; margin-top: 24px;",
                                button {
                                    style: "flex: 1; padding: 14px; border-radius: 12px; border: 1px solid #007aff; color: #007aff; background: white; font-size: 16px; font-weight: bold;",
                                    onclick: move |_| {
                                        wizard.set(WizardState::Intro);
                                        report.set(None);
                                        help_text.set(None);
                                    },
                                    "Run Again"
                                }
                                button {
                                    style: "flex: 1; padding: 14px; border-radius: 12px; border: none; background: #007aff; color: white; font-size: 16px; font-weight: bold;",
                                    onclick: {
                                        let rpt = rpt.clone();
                                        move |_| {
                                            let summary = tools::generate_help_summary(&rpt);
                                            tracing::info!(summary = %summary, "help summary generated");
                                            help_text.set(Some(summary));
                                        }
                                    },
                                    "I Need Help"
                                }
                            }

                            if let Some(ref text) = *help_text.read() {
                                p { style: "color: #666; font-size: 14px; margin-top: 16px;",
                                    "Copy this report and send it to whoever is helping you:"
                                }
                                textarea {
                                    readonly: true,
                                    style: "width: 100%; min-height: 180px; font-family: ui-monospace, monospace; font-size: 13px; padding: 8px; border: 1px solid #ccc; border-radius: 8px; box-sizing: border-box;",
                                    value: "{text}",
                                }
                            }
                        }
                    } else {
                        rsx! {
                            p { "The check could not be run. See the log for details." }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn StepPreview(num: u8, label: &'static str) -> Element {
    rsx! {
        div { style: "display: flex; align-items: center; gap: 12px; padding: 8px 0;",
            span { style: "width: 28px; height: 28px; border-radius: 50%; background: #e0e0e0; display: flex; align-items: center; justify-content: center; font-size: 14px; font-weight: bold; color: #666;",
                "{num}"
            }
            span { style: "font-size: 16px; color: #333;", "{label}" }
        }
    }
}
