//! Captures copied out of a tree so results outlive it.
//!
//! `'x` bound to a single node becomes [`CaptureValue::Node`]. A ranged
//! placeholder such as `'args*` always becomes [`CaptureValue::Nodes`], even
//! when it bound exactly one node or none.

use serde::{Deserialize, Serialize};

use crate::span::Span;

/// One node bound to a placeholder.
///
/// ```
/// use sift_core::{CapturedNode, LineCol, Span};
///
/// let node = CapturedNode::new(
///     Span::new(0, 5, LineCol::new(0, 0), LineCol::new(0, 5)),
///     String::from("identifier"),
///     Some(String::from("hello")),
/// );
/// assert_eq!(node.kind(), "identifier");
/// assert_eq!(node.text(), Some("hello"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedNode {
    /// Where the node sits in its file.
    pub span: Span,
    /// Grammar kind, for example `identifier`.
    pub kind: String,
    /// Node text; `None` when longer than
    /// [`EngineConfig::max_capture_text_bytes`](crate::EngineConfig::max_capture_text_bytes).
    pub text: Option<String>,
}

impl CapturedNode {
    /// Wraps a copied node.
    #[must_use]
    pub const fn new(span: Span, kind: String, text: Option<String>) -> Self {
        Self { span, kind, text }
    }

    /// Where the node sits in its file.
    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }

    /// Grammar kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Node text, unless it was dropped for size.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// What a placeholder bound in one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
#[non_exhaustive]
pub enum CaptureValue {
    /// A single-occurrence placeholder.
    Node(CapturedNode),
    /// A ranged placeholder, in sibling order.
    Nodes(Vec<CapturedNode>),
}

impl CaptureValue {
    /// Views either form as a slice.
    #[must_use]
    pub fn nodes(&self) -> &[CapturedNode] {
        match self {
            Self::Node(node) => std::slice::from_ref(node),
            Self::Nodes(nodes) => nodes,
        }
    }
}
