// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagewerk.

use thiserror::Error;

use crate::types::DocumentId;

/// Top-level error type for all Pagewerk operations.
#[derive(Debug, Error)]
pub enum PagewerkError {
    // -- Caller input --
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation not allowed: {0}")]
    OperationPrecondition(String),

    // -- Codec / rendering --
    #[error("document could not be read: {0}")]
    CorruptDocument(String),

    #[error("page rendering failed: {0}")]
    RenderFailure(String),

    #[error("item #{index} failed: {reason}")]
    PartialItemFailure { index: usize, reason: String },

    #[error("document could not be written: {0}")]
    Codec(String),

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("archive could not be written: {0}")]
    Archive(String),

    // -- Interaction sessions --
    #[error("cannot {action} while the session is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("document {0} already has a live session")]
    SessionActive(DocumentId),

    #[error("no document with id {0}")]
    UnknownDocument(DocumentId),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PagewerkError>;
