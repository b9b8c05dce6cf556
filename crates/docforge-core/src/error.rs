// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Docforge.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Docforge operations.
#[derive(Debug, Error)]
pub enum DocforgeError {
    // -- Input errors --
    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid document {id}: {reason}")]
    InvalidDocument { id: String, reason: String },

    // -- Rendering errors --
    #[error("cannot render {id}: {reason}")]
    Render { id: String, reason: String },

    #[error("cannot synthesize scan for {id}: {reason}")]
    Generation { id: String, reason: String },

    #[error("invalid degradation profile: {0}")]
    InvalidDegradation(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("office package error: {0}")]
    Package(String),

    // -- Storage / persistence --
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database export failed: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification used when reporting failures at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Malformed or incomplete input JSON.
    Parse,
    /// A document's fields do not satisfy its renderer's contract.
    Render,
    /// Scan synthesis was given unrenderable content or bad parameters.
    Generation,
    /// Filesystem failure.
    Write,
    /// SQLite export failure.
    Database,
}

impl ErrorClass {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::Render => "render",
            Self::Generation => "generation",
            Self::Write => "write",
            Self::Database => "database",
        }
    }
}

impl DocforgeError {
    /// Map the error onto the four-way reporting taxonomy.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Parse(_) | Self::InvalidDocument { .. } | Self::Serialization(_) => {
                ErrorClass::Parse
            }
            Self::Render { .. } | Self::Package(_) => ErrorClass::Render,
            Self::Generation { .. }
            | Self::InvalidDegradation(_)
            | Self::PdfError(_)
            | Self::ImageError(_) => ErrorClass::Generation,
            Self::Write { .. } | Self::Io(_) => ErrorClass::Write,
            Self::Database(_) => ErrorClass::Database,
        }
    }

    /// Identifier of the document the error is about, when the error knows it.
    pub fn document_id(&self) -> Option<&str> {
        match self {
            Self::InvalidDocument { id, .. }
            | Self::Render { id, .. }
            | Self::Generation { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn render(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Render {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn generation(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Generation {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_document(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDocument {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// A failure bound to the document that caused it.
#[derive(Debug)]
pub struct DocumentFailure {
    pub id: String,
    pub error: DocforgeError,
}

impl DocumentFailure {
    pub fn new(id: impl Into<String>, error: DocforgeError) -> Self {
        Self {
            id: id.into(),
            error,
        }
    }
}

impl std::fmt::Display for DocumentFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} error): {}", self.id, self.error.class().label(), self.error)
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocforgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_follow_taxonomy() {
        assert_eq!(DocforgeError::Parse("x".into()).class(), ErrorClass::Parse);
        assert_eq!(
            DocforgeError::invalid_document("doc_001", "missing subject").class(),
            ErrorClass::Parse
        );
        assert_eq!(DocforgeError::render("doc_002", "no sheets").class(), ErrorClass::Render);
        assert_eq!(
            DocforgeError::InvalidDegradation("noise".into()).class(),
            ErrorClass::Generation
        );
        let write = DocforgeError::Write {
            path: PathBuf::from("/tmp/x"),
            source: std::io::Error::other("disk full"),
        };
        assert_eq!(write.class(), ErrorClass::Write);
    }

    #[test]
    fn failure_display_names_the_document() {
        let failure = DocumentFailure::new(
            "doc_042",
            DocforgeError::render("doc_042", "spreadsheet has no sheets"),
        );
        let text = failure.to_string();
        assert!(text.starts_with("doc_042"));
        assert!(text.contains("render error"));
        assert!(text.contains("spreadsheet has no sheets"));
    }

    #[test]
    fn document_id_is_exposed_for_document_errors() {
        let err = DocforgeError::generation("doc_101", "empty content");
        assert_eq!(err.document_id(), Some("doc_101"));
        assert_eq!(DocforgeError::Database("x".into()).document_id(), None);
    }
}
