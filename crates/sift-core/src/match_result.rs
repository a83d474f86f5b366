//! Matches detached from their trees, ready to serialise.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::capture::CaptureValue;
use crate::span::Span;

/// One reported match.
///
/// With target variables in the query there is one `Match` per bound target
/// node, and [`Match::target`] says which.
///
/// ```
/// use std::collections::BTreeMap;
/// use sift_core::{LineCol, Match, Span};
///
/// let span = Span::new(12, 42, LineCol::new(2, 0), LineCol::new(4, 0));
/// let m = Match::new(
///     String::from("file:///app.ts"),
///     span,
///     String::from("a.b(null);"),
///     None,
///     BTreeMap::new(),
/// );
/// assert_eq!(m.uri(), "file:///app.ts");
/// assert!(m.target().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// File the match was found in.
    pub uri: String,
    /// Extent of the matched node or sibling run.
    pub span: Span,
    /// Matched text exactly as written in the file.
    pub image: String,
    /// The target node this result stands for.
    pub target: Option<Span>,
    /// Bindings by placeholder name, without the leading quote.
    pub captures: BTreeMap<String, CaptureValue>,
}

impl Match {
    /// Assembles a match.
    #[must_use]
    pub const fn new(
        uri: String,
        span: Span,
        image: String,
        target: Option<Span>,
        captures: BTreeMap<String, CaptureValue>,
    ) -> Self {
        Self {
            uri,
            span,
            image,
            target,
            captures,
        }
    }

    /// File the match was found in.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Extent of the match.
    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }

    /// Matched source text.
    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    /// The target node, when the query names one.
    #[must_use]
    pub const fn target(&self) -> Option<&Span> {
        self.target.as_ref()
    }

    /// All bindings.
    #[must_use]
    pub const fn captures(&self) -> &BTreeMap<String, CaptureValue> {
        &self.captures
    }

    /// The binding of `name`.
    #[must_use]
    pub fn capture(&self, name: &str) -> Option<&CaptureValue> {
        self.captures.get(name)
    }
}
