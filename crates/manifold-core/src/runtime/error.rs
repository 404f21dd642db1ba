// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Evaluation errors.
//!
//! Every error raised during definition scanning, evaluation, or catalog
//! finalisation is an [`EvaluationError`]. Errors carry the span and source
//! file where evaluation failed whenever one is known, so the compiler can
//! render `path:line:column`, the offending source line, and a caret.

use std::rc::Rc;

use miette::Diagnostic;
use thiserror::Error;

use crate::source_analysis::{SourceFile, Span};

/// The result type of evaluation.
pub type EvalResult<T = crate::values::Value> = Result<T, EvaluationError>;

/// An error raised during evaluation.
///
/// Evaluation errors are fatal for the compilation: they propagate to the
/// top-level compile entry point, which logs them and fails.
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("{message}")]
pub struct EvaluationError {
    message: String,
    span: Option<Span>,
    source_file: Option<Rc<SourceFile>>,
}

impl EvaluationError {
    /// Creates an evaluation error with no source position.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
            source_file: None,
        }
    }

    /// Creates an evaluation error at a position in a source file.
    #[must_use]
    pub fn at(message: impl Into<String>, source_file: Rc<SourceFile>, span: Span) -> Self {
        Self {
            message: message.into(),
            span: Some(span),
            source_file: Some(source_file),
        }
    }

    /// Attaches a position if the error does not already carry one.
    #[must_use]
    pub fn or_at(mut self, source_file: &Rc<SourceFile>, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
            self.source_file = Some(Rc::clone(source_file));
        }
        self
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the span where evaluation failed, if known.
    #[must_use]
    pub fn span(&self) -> Option<Span> {
        self.span
    }

    /// Returns the source file where evaluation failed, if known.
    #[must_use]
    pub fn source_file(&self) -> Option<&Rc<SourceFile>> {
        self.source_file.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_position() {
        let file = Rc::new(SourceFile::new("site.mf", "1/0"));
        let error = EvaluationError::at("cannot divide by zero.", Rc::clone(&file), Span::new(0, 3));
        assert_eq!(error.message(), "cannot divide by zero.");
        assert_eq!(error.span(), Some(Span::new(0, 3)));
        assert!(error.source_file().is_some());
    }

    #[test]
    fn or_at_does_not_overwrite() {
        let file = Rc::new(SourceFile::new("site.mf", "x"));
        let original =
            EvaluationError::at("boom", Rc::clone(&file), Span::new(0, 1)).or_at(&file, Span::new(5, 6));
        assert_eq!(original.span(), Some(Span::new(0, 1)));

        let attached = EvaluationError::new("boom").or_at(&file, Span::new(5, 6));
        assert_eq!(attached.span(), Some(Span::new(5, 6)));
    }
}
