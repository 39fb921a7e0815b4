//! Errors raised while evaluating a template

use thiserror::Error;

use crate::error::{ParseError, Span};

/// Fatal evaluation failures
///
/// Unknown paths, unknown helpers and missing partials are not errors; they
/// render as empty text or an inline notice instead.
#[derive(Error, Debug)]
pub enum EvalError {
    /// `this` or `.` after the first segment
    #[error("'this' can only start a path, found in '{path}'")]
    NestedThis { path: String, span: Span },

    /// `..` after an ordinary segment
    #[error("'..' can only lead a path, found in '{path}'")]
    NestedParent { path: String, span: Span },

    /// `..` with no context left to leave
    #[error("'{path}' has no enclosing context to navigate to")]
    NoParentContext { path: String, span: Span },

    /// Partials nested deeper than the configured limit
    #[error("partial '{name}' exceeds the maximum nesting depth of {limit}")]
    PartialDepth { name: String, limit: usize },

    /// A registered partial whose source does not parse
    #[error("partial '{name}' failed to parse: {}", format_errors(.errors))]
    PartialSyntax { name: String, errors: Vec<ParseError> },

    /// Failure reported by a helper
    #[error("helper '{name}': {message}")]
    Helper { name: String, message: String },
}

impl EvalError {
    pub fn helper(name: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError::Helper {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Source location of scoping errors
    pub fn span(&self) -> Option<&Span> {
        match self {
            EvalError::NestedThis { span, .. }
            | EvalError::NestedParent { span, .. }
            | EvalError::NoParentContext { span, .. } => Some(span),
            _ => None,
        }
    }
}

fn format_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
