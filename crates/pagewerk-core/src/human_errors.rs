// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives presentation: whether the user can fix it, or not.

use crate::error::PagewerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something went wrong that may work on a second attempt.
    Transient,
    /// User must change something (pick pages, enter text, finish a drag).
    ActionRequired,
    /// The input itself cannot be processed.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    pub severity: Severity,
}

impl HumanError {
    fn new(message: impl Into<String>, suggestion: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            severity,
        }
    }
}

/// Convert a `PagewerkError` into a `HumanError` suitable for display.
pub fn humanize_error(err: &PagewerkError) -> HumanError {
    match err {
        PagewerkError::InvalidInput(detail) => HumanError::new(
            "That input can't be used.",
            format!("Check the value and try again. ({detail})"),
            Severity::ActionRequired,
        ),

        PagewerkError::OperationPrecondition(detail) => humanize_precondition(detail),

        PagewerkError::CorruptDocument(_) => HumanError::new(
            "There's a problem with this PDF file.",
            "The file may be damaged or password protected. Try opening it in another viewer first, or choose a different file.",
            Severity::Permanent,
        ),

        PagewerkError::RenderFailure(_) => HumanError::new(
            "We couldn't draw the pages of this document.",
            "Try again. If this keeps happening the document may use features that can't be previewed.",
            Severity::Transient,
        ),

        PagewerkError::PartialItemFailure { index, .. } => HumanError::new(
            format!("Image #{} was skipped.", index + 1),
            "The other images were added. Try saving the skipped image as a JPEG or PNG and add it again.",
            Severity::Permanent,
        ),

        PagewerkError::Codec(_) => HumanError::new(
            "The new document couldn't be created.",
            "Try again with fewer pages, or check the source document opens correctly.",
            Severity::Transient,
        ),

        PagewerkError::Image(_) => HumanError::new(
            "There's a problem with this image.",
            "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.",
            Severity::Permanent,
        ),

        PagewerkError::Archive(_) => HumanError::new(
            "The page images couldn't be packaged.",
            "Try again. If this keeps happening, your device's storage may be full.",
            Severity::Transient,
        ),

        PagewerkError::InvalidTransition { action, state } => HumanError::new(
            format!("You can't {action} right now."),
            format!("The page grid is {state}. Finish or cancel what you're doing first."),
            Severity::ActionRequired,
        ),

        PagewerkError::SessionActive(_) => HumanError::new(
            "This document is already open for editing.",
            "Save or cancel the current page edits before starting new ones.",
            Severity::ActionRequired,
        ),

        PagewerkError::UnknownDocument(_) => HumanError::new(
            "That document is no longer open.",
            "Add the file again, then retry.",
            Severity::ActionRequired,
        ),

        PagewerkError::Config(detail) => HumanError::new(
            "The settings file has a problem.",
            format!("Fix or delete the settings file to restore defaults. ({detail})"),
            Severity::ActionRequired,
        ),

        PagewerkError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError::new(
                "The file couldn't be found.",
                "It may have been moved or deleted. Try choosing the file again.",
                Severity::ActionRequired,
            ),
            std::io::ErrorKind::PermissionDenied => HumanError::new(
                "The app doesn't have permission to use that file.",
                "Check the file permissions, or try copying the file to a different location first.",
                Severity::ActionRequired,
            ),
            _ => HumanError::new(
                "There was a problem reading or writing a file.",
                "Try again. If this keeps happening, your device's storage may be full.",
                Severity::Transient,
            ),
        },

        PagewerkError::Serialization(_) => HumanError::new(
            "The app had an internal data problem.",
            "Try again. If this keeps happening, please report it.",
            Severity::Transient,
        ),
    }
}

/// Preconditions share one variant; pick wording from the detail text.
fn humanize_precondition(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("at least two") {
        HumanError::new(
            "Add another document to merge.",
            "Merging needs two or more documents.",
            Severity::ActionRequired,
        )
    } else if lower.contains("every page") {
        HumanError::new(
            "You can't delete every page.",
            "Leave at least one page unselected.",
            Severity::ActionRequired,
        )
    } else if lower.contains("no pages selected") {
        HumanError::new(
            "No pages are selected.",
            "Tap the pages you want to delete, then try again.",
            Severity::ActionRequired,
        )
    } else {
        HumanError::new(
            "That change isn't possible.",
            detail.to_string(),
            Severity::ActionRequired,
        )
    }
}
