//! Match-time error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diagnostic::MalformedPatternError;
use crate::span::Span;

/// Errors that abort a search.
///
/// Failures local to one candidate never surface here; they are collected as
/// [`EvaluationFailure`] records and the candidate simply does not match.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum SearchError {
    /// The caller cancelled the search.
    #[error("search cancelled")]
    Cancelled,
    /// A constraint evaluator cannot run at all.
    #[error("constraint evaluator unavailable: {message}")]
    EvaluatorUnavailable {
        /// Description supplied by the evaluator.
        message: String,
    },
    /// Local evaluation failures exceeded the configured limit.
    #[error("{count} constraint evaluations failed, last: {last}")]
    TooManyFailures {
        /// Number of failures recorded.
        count: usize,
        /// Message of the most recent failure.
        last: String,
    },
    /// A candidate file could not be parsed.
    #[error("failed to parse {uri}: {message}")]
    Parse {
        /// The file that failed.
        uri: String,
        /// Description of the failure.
        message: String,
    },
    /// The pattern was rejected before the search started.
    #[error(transparent)]
    Pattern(#[from] Box<MalformedPatternError>),
}

impl SearchError {
    /// Creates an evaluator-unavailable error.
    #[must_use]
    pub fn evaluator_unavailable(message: impl Into<String>) -> Self {
        Self::EvaluatorUnavailable {
            message: message.into(),
        }
    }

    /// Creates a parse error for a candidate file.
    #[must_use]
    pub fn parse(uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            uri: uri.into(),
            message: message.into(),
        }
    }

    /// Returns whether the error is a cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<MalformedPatternError> for SearchError {
    fn from(error: MalformedPatternError) -> Self {
        Self::Pattern(Box::new(error))
    }
}

/// A constraint that failed to evaluate for one candidate.
///
/// The candidate is treated as not matching and the search continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationFailure {
    /// Location of the candidate node.
    pub span: Span,
    /// Name of the failing predicate, for example `script`.
    pub predicate: String,
    /// Description of the failure.
    pub message: String,
}

impl EvaluationFailure {
    /// Creates a failure record.
    #[must_use]
    pub fn new(span: Span, predicate: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            span,
            predicate: predicate.into(),
            message: message.into(),
        }
    }
}
