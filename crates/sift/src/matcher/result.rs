//! Match results borrowed from the searched tree.

use std::collections::BTreeMap;
use std::ops::Range;

use sift_core::{CaptureValue, CapturedNode, Match, Node, Span, Tree};

/// Nodes bound to one variable.
#[derive(Debug, Clone)]
pub struct Capture<'t> {
    nodes: Vec<Node<'t>>,
    repeated: bool,
}

impl<'t> Capture<'t> {
    pub(crate) const fn new(nodes: Vec<Node<'t>>, repeated: bool) -> Self {
        Self { nodes, repeated }
    }

    /// Returns the bound nodes in source order.
    #[must_use]
    pub fn nodes(&self) -> &[Node<'t>] {
        &self.nodes
    }

    /// Returns whether the variable has an occurrence range other than
    /// exactly one.
    #[must_use]
    pub const fn is_repeated(&self) -> bool {
        self.repeated
    }

    /// Returns the source text spanning every bound node.
    #[must_use]
    pub fn text(&self) -> &'t str {
        match (self.nodes.first(), self.nodes.last()) {
            (Some(first), Some(last)) => first
                .tree()
                .slice(first.byte_range().start..last.byte_range().end),
            _ => "",
        }
    }
}

/// A match of a compiled pattern in one tree.
#[derive(Debug, Clone)]
pub struct MatchResult<'t> {
    tree: &'t Tree,
    nodes: Vec<Node<'t>>,
    bytes: Range<usize>,
    target: Option<Node<'t>>,
    captures: BTreeMap<String, Capture<'t>>,
}

impl<'t> MatchResult<'t> {
    pub(crate) fn new(
        tree: &'t Tree,
        nodes: Vec<Node<'t>>,
        captures: BTreeMap<String, Capture<'t>>,
    ) -> Self {
        let start = nodes.first().map_or(0, |node| node.byte_range().start);
        let end = nodes.last().map_or(start, |node| node.byte_range().end);
        Self {
            tree,
            nodes,
            bytes: start..end,
            target: None,
            captures,
        }
    }

    pub(crate) const fn with_target(mut self, target: Node<'t>) -> Self {
        self.target = Some(target);
        self
    }

    /// Returns the matched node, or the sibling run for multi-slot patterns.
    #[must_use]
    pub fn nodes(&self) -> &[Node<'t>] {
        &self.nodes
    }

    /// Returns the first matched node.
    #[must_use]
    pub fn root(&self) -> Option<Node<'t>> {
        self.nodes.first().copied()
    }

    /// Returns the target node this result is reported for.
    #[must_use]
    pub const fn target(&self) -> Option<Node<'t>> {
        self.target
    }

    /// Returns the capture of `name`.
    #[must_use]
    pub fn capture(&self, name: &str) -> Option<&Capture<'t>> {
        self.captures.get(name)
    }

    /// Returns every capture keyed by variable name.
    #[must_use]
    pub const fn captures(&self) -> &BTreeMap<String, Capture<'t>> {
        &self.captures
    }

    /// Returns the byte range covered by the match.
    #[must_use]
    pub fn byte_range(&self) -> Range<usize> {
        self.bytes.clone()
    }

    /// Returns the span covered by the match.
    #[must_use]
    pub fn span(&self) -> Span {
        self.tree.span(self.byte_range())
    }

    /// Returns the matched source text.
    #[must_use]
    pub fn image(&self) -> &'t str {
        self.tree.slice(self.byte_range())
    }

    /// Detaches the result from the tree.
    ///
    /// Capture texts longer than `max_capture_bytes` are omitted.
    #[must_use]
    pub fn to_match(&self, uri: &str, max_capture_bytes: usize) -> Match {
        let captured = |node: &Node<'t>| {
            let text = node.text();
            CapturedNode::new(
                node.span(),
                node.kind().to_owned(),
                (text.len() <= max_capture_bytes).then(|| text.to_owned()),
            )
        };
        let captures = self
            .captures
            .iter()
            .map(|(name, capture)| {
                let value = match capture.nodes() {
                    [only] if !capture.is_repeated() => CaptureValue::Node(captured(only)),
                    nodes => CaptureValue::Nodes(nodes.iter().map(captured).collect()),
                };
                (name.clone(), value)
            })
            .collect();
        Match::new(
            uri.to_owned(),
            self.span(),
            self.image().to_owned(),
            self.target.map(Node::span),
            captures,
        )
    }
}
