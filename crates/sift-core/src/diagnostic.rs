//! Diagnostic types for structured error reporting.
//!
//! Malformed patterns are rejected with a [`MalformedPatternError`] wrapping
//! a single error [`Diagnostic`]. Strict compilation additionally attaches
//! warning diagnostics to the compiled pattern. Each diagnostic carries a
//! stable [`DiagnosticCode`], a message naming the offending construct, an
//! optional location inside the pattern text, and supplementary notes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable codes for Sift diagnostics.
///
/// # Example
///
/// ```
/// use sift_core::DiagnosticCode;
///
/// let code = DiagnosticCode::ESiftUnknownConstraint;
/// assert_eq!(format!("{code}"), "E_SIFT_UNKNOWN_CONSTRAINT");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DiagnosticCode {
    /// The pattern text is empty.
    ESiftEmptyPattern,
    /// A placeholder or quantifier is malformed.
    ESiftPlaceholderSyntax,
    /// An occurrence range is inconsistent or unparsable.
    ESiftRangeInvalid,
    /// A constraint names an unknown predicate.
    ESiftUnknownConstraint,
    /// A constraint expression is malformed.
    ESiftConstraintSyntax,
    /// A regular expression does not compile.
    ESiftRegexInvalid,
    /// A script body is rejected by the evaluator.
    ESiftScriptInvalid,
    /// A nested pattern used by `ref`, `within` or `contains` is malformed.
    ESiftSubPatternInvalid,
    /// A variable carries two incompatible constraints or ranges.
    ESiftConflictingConstraints,
    /// The substituted pattern is not valid in the host language.
    ESiftPatternParse,
    /// An unlimited maximum is used where only one node fits.
    WSiftUnboundedSingleSlot,
    /// A zero minimum is used on a slot the grammar requires.
    WSiftOptionalMandatorySlot,
    /// The whole pattern asserts absence and can never report a match.
    WSiftAbsentPattern,
    /// A target variable only occurs in `{0,0}` slots and never binds.
    WSiftTargetNeverBinds,
}

impl DiagnosticCode {
    /// Returns the severity implied by the code.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::WSiftUnboundedSingleSlot
            | Self::WSiftOptionalMandatorySlot
            | Self::WSiftAbsentPattern
            | Self::WSiftTargetNeverBinds => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ESiftEmptyPattern => "E_SIFT_EMPTY_PATTERN",
            Self::ESiftPlaceholderSyntax => "E_SIFT_PLACEHOLDER_SYNTAX",
            Self::ESiftRangeInvalid => "E_SIFT_RANGE_INVALID",
            Self::ESiftUnknownConstraint => "E_SIFT_UNKNOWN_CONSTRAINT",
            Self::ESiftConstraintSyntax => "E_SIFT_CONSTRAINT_SYNTAX",
            Self::ESiftRegexInvalid => "E_SIFT_REGEX_INVALID",
            Self::ESiftScriptInvalid => "E_SIFT_SCRIPT_INVALID",
            Self::ESiftSubPatternInvalid => "E_SIFT_SUB_PATTERN_INVALID",
            Self::ESiftConflictingConstraints => "E_SIFT_CONFLICTING_CONSTRAINTS",
            Self::ESiftPatternParse => "E_SIFT_PATTERN_PARSE",
            Self::WSiftUnboundedSingleSlot => "W_SIFT_UNBOUNDED_SINGLE_SLOT",
            Self::WSiftOptionalMandatorySlot => "W_SIFT_OPTIONAL_MANDATORY_SLOT",
            Self::WSiftAbsentPattern => "W_SIFT_ABSENT_PATTERN",
            Self::WSiftTargetNeverBinds => "W_SIFT_TARGET_NEVER_BINDS",
        };
        f.write_str(text)
    }
}

/// Whether a diagnostic rejects the pattern or only advises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The pattern is rejected.
    Error,
    /// The pattern compiles but part of it is vacuous.
    Warning,
}

/// A byte range within the pattern text.
///
/// # Example
///
/// ```
/// use sift_core::SourceSpan;
///
/// let span = SourceSpan::new(3, 9);
/// assert_eq!(span.start(), 3);
/// assert_eq!(span.end(), 9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    start: u32,
    end: u32,
}

impl SourceSpan {
    /// Creates a new source span.
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Creates a span from `usize` offsets, saturating on overflow.
    #[must_use]
    pub fn from_offsets(start: usize, end: usize) -> Self {
        Self {
            start: u32::try_from(start).unwrap_or(u32::MAX),
            end: u32::try_from(end).unwrap_or(u32::MAX),
        }
    }

    /// Returns the inclusive start byte offset.
    #[must_use]
    pub const fn start(&self) -> u32 {
        self.start
    }

    /// Returns the exclusive end byte offset.
    #[must_use]
    pub const fn end(&self) -> u32 {
        self.end
    }
}

/// A single diagnostic entry.
///
/// # Example
///
/// ```
/// use sift_core::{Diagnostic, DiagnosticCode, Severity};
///
/// let diag = Diagnostic::new(
///     DiagnosticCode::ESiftRegexInvalid,
///     String::from("regex '(' does not compile"),
///     None,
///     vec![],
/// );
/// assert_eq!(diag.severity(), Severity::Error);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    code: DiagnosticCode,
    message: String,
    span: Option<SourceSpan>,
    notes: Vec<String>,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    #[must_use]
    pub const fn new(
        code: DiagnosticCode,
        message: String,
        span: Option<SourceSpan>,
        notes: Vec<String>,
    ) -> Self {
        Self {
            code,
            message,
            span,
            notes,
        }
    }

    /// Returns the diagnostic code.
    #[must_use]
    pub const fn code(&self) -> DiagnosticCode {
        self.code
    }

    /// Returns the severity implied by the code.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the diagnostic message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the location in the pattern text, if available.
    #[must_use]
    pub const fn span(&self) -> Option<SourceSpan> {
        self.span
    }

    /// Returns the supplementary notes.
    #[must_use]
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Appends a note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(span) = self.span {
            write!(f, " (at {}..{})", span.start, span.end)?;
        }
        Ok(())
    }
}

/// Error returned when a pattern cannot be compiled.
///
/// # Example
///
/// ```
/// use sift_core::{DiagnosticCode, MalformedPatternError, SourceSpan};
///
/// let err = MalformedPatternError::new(
///     DiagnosticCode::ESiftRangeInvalid,
///     "range {3,1} has a minimum above its maximum",
///     Some(SourceSpan::new(4, 9)),
/// );
/// assert_eq!(err.code(), DiagnosticCode::ESiftRangeInvalid);
/// assert!(err.to_string().starts_with("E_SIFT_RANGE_INVALID"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{diagnostic}")]
pub struct MalformedPatternError {
    diagnostic: Diagnostic,
}

impl MalformedPatternError {
    /// Creates an error from a code, message, and optional span.
    #[must_use]
    pub fn new(code: DiagnosticCode, message: impl Into<String>, span: Option<SourceSpan>) -> Self {
        Self {
            diagnostic: Diagnostic::new(code, message.into(), span, Vec::new()),
        }
    }

    /// Appends a note to the underlying diagnostic.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.diagnostic = self.diagnostic.with_note(note);
        self
    }

    /// Shifts the span by `offset` bytes, used when nested pattern text is
    /// reported relative to its enclosing pattern.
    #[must_use]
    pub fn offset_by(mut self, offset: usize) -> Self {
        if let Some(span) = self.diagnostic.span {
            let delta = u32::try_from(offset).unwrap_or(u32::MAX);
            self.diagnostic.span = Some(SourceSpan::new(
                span.start.saturating_add(delta),
                span.end.saturating_add(delta),
            ));
        }
        self
    }

    /// Returns the diagnostic code.
    #[must_use]
    pub const fn code(&self) -> DiagnosticCode {
        self.diagnostic.code
    }

    /// Returns the underlying diagnostic.
    #[must_use]
    pub const fn diagnostic(&self) -> &Diagnostic {
        &self.diagnostic
    }
}
