//! Read-only syntax tree consumed by the pattern compiler and matcher.
//!
//! Parsers supplied by a language profile convert their native trees into
//! this arena representation. Nodes are addressed by [`NodeId`] and viewed
//! through the borrowed, copyable [`Node`] handle. Traversal helpers use
//! explicit stacks so arbitrarily deep inputs never exhaust the call stack.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::span::{LineCol, Span};

/// Index of a node inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the arena index of this node.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Partition of source tokens used by search planning and comment handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenCategory {
    /// Identifiers, keywords and punctuation of executable code.
    #[default]
    Code,
    /// Text inside comments.
    Comment,
    /// Text inside string, number and other literals.
    Literal,
}

/// Description of a node handed to [`TreeBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    /// Grammar kind of the node.
    pub kind: &'static str,
    /// Byte range of the node within the tree source.
    pub bytes: Range<usize>,
    /// Whether the grammar names this node (as opposed to an anonymous token).
    pub named: bool,
    /// Name of the parent field holding this node, if any.
    pub field: Option<&'static str>,
    /// Token category of the node's text.
    pub category: TokenCategory,
    /// Whether the parser flagged this node as an error or a missing token.
    pub error: bool,
}

impl NodeSpec {
    /// Creates a named code node covering `bytes`.
    #[must_use]
    pub const fn new(kind: &'static str, bytes: Range<usize>) -> Self {
        Self {
            kind,
            bytes,
            named: true,
            field: None,
            category: TokenCategory::Code,
            error: false,
        }
    }

    /// Marks the node as an anonymous token.
    #[must_use]
    pub const fn anonymous(mut self) -> Self {
        self.named = false;
        self
    }

    /// Records the parent field name.
    #[must_use]
    pub const fn with_field(mut self, field: Option<&'static str>) -> Self {
        self.field = field;
        self
    }

    /// Sets the token category.
    #[must_use]
    pub const fn with_category(mut self, category: TokenCategory) -> Self {
        self.category = category;
        self
    }

    /// Marks the node as an error node.
    #[must_use]
    pub const fn with_error(mut self, error: bool) -> Self {
        self.error = error;
        self
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    spec: NodeSpec,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

static MISSING: NodeData = NodeData {
    spec: NodeSpec {
        kind: "",
        bytes: 0..0,
        named: false,
        field: None,
        category: TokenCategory::Code,
        error: true,
    },
    parent: None,
    children: Vec::new(),
};

/// Errors raised while assembling a [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TreeError {
    /// `close` was called with no open node.
    #[error("no open node to close")]
    NothingOpen,
    /// `finish` was called while nodes were still open.
    #[error("{0} node(s) left open")]
    Unclosed(usize),
    /// The builder produced no root node.
    #[error("tree has no root node")]
    Empty,
    /// A second root node was opened.
    #[error("tree already has a root node")]
    SecondRoot,
    /// A node range lies outside the source text.
    #[error("node range {start}..{end} lies outside the {len}-byte source")]
    OutOfBounds {
        /// Start of the offending range.
        start: usize,
        /// End of the offending range.
        end: usize,
        /// Length of the source text.
        len: usize,
    },
    /// More nodes than a [`NodeId`] can address.
    #[error("tree exceeds the maximum node count")]
    TooLarge,
}

/// Incremental builder producing a [`Tree`] in pre-order.
///
/// # Example
///
/// ```
/// use sift_core::{NodeSpec, TreeBuilder};
///
/// let mut builder = TreeBuilder::new("a+b");
/// builder.open(NodeSpec::new("sum", 0..3))?;
/// builder.leaf(NodeSpec::new("identifier", 0..1))?;
/// builder.leaf(NodeSpec::new("+", 1..2).anonymous())?;
/// builder.leaf(NodeSpec::new("identifier", 2..3))?;
/// builder.close()?;
/// let tree = builder.finish()?;
/// assert_eq!(tree.root_node().child_count(), 3);
/// # Ok::<(), sift_core::TreeError>(())
/// ```
#[derive(Debug)]
pub struct TreeBuilder {
    source: String,
    nodes: Vec<NodeData>,
    open: Vec<NodeId>,
}

impl TreeBuilder {
    /// Starts a tree over `source`.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            nodes: Vec::new(),
            open: Vec::new(),
        }
    }

    /// Adds a node as the last child of the innermost open node and opens it.
    ///
    /// # Errors
    ///
    /// Returns an error when the range is outside the source, when a second
    /// root is started, or when the arena is full.
    pub fn open(&mut self, spec: NodeSpec) -> Result<NodeId, TreeError> {
        let id = self.push(spec)?;
        self.open.push(id);
        Ok(id)
    }

    /// Adds a childless node without opening it.
    ///
    /// # Errors
    ///
    /// See [`TreeBuilder::open`].
    pub fn leaf(&mut self, spec: NodeSpec) -> Result<NodeId, TreeError> {
        self.push(spec)
    }

    /// Closes the innermost open node.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NothingOpen`] when every node is already closed.
    pub fn close(&mut self) -> Result<NodeId, TreeError> {
        self.open.pop().ok_or(TreeError::NothingOpen)
    }

    /// Finalises the tree.
    ///
    /// # Errors
    ///
    /// Returns an error when nodes remain open or no root was added.
    pub fn finish(self) -> Result<Tree, TreeError> {
        if !self.open.is_empty() {
            return Err(TreeError::Unclosed(self.open.len()));
        }
        if self.nodes.is_empty() {
            return Err(TreeError::Empty);
        }
        let line_starts = std::iter::once(0)
            .chain(
                self.source
                    .bytes()
                    .enumerate()
                    .filter(|(_, byte)| *byte == b'\n')
                    .map(|(offset, _)| offset.saturating_add(1)),
            )
            .collect();
        Ok(Tree {
            source: self.source,
            nodes: self.nodes,
            line_starts,
        })
    }

    fn push(&mut self, spec: NodeSpec) -> Result<NodeId, TreeError> {
        if spec.bytes.start > spec.bytes.end || spec.bytes.end > self.source.len() {
            return Err(TreeError::OutOfBounds {
                start: spec.bytes.start,
                end: spec.bytes.end,
                len: self.source.len(),
            });
        }
        let parent = self.open.last().copied();
        if parent.is_none() && !self.nodes.is_empty() {
            return Err(TreeError::SecondRoot);
        }
        let id = NodeId(u32::try_from(self.nodes.len()).map_err(|_| TreeError::TooLarge)?);
        self.nodes.push(NodeData {
            spec,
            parent,
            children: Vec::new(),
        });
        if let Some(data) = parent.and_then(|p| self.nodes.get_mut(p.index())) {
            data.children.push(id);
        }
        Ok(id)
    }
}

/// An immutable syntax tree stored as an arena of nodes.
///
/// The first node added to the builder is the root.
#[derive(Debug, Clone)]
pub struct Tree {
    source: String,
    nodes: Vec<NodeData>,
    line_starts: Vec<usize>,
}

impl Tree {
    /// Returns the full source text the tree was built from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the identifier of the root node.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Returns a handle to the root node.
    #[must_use]
    pub const fn root_node(&self) -> Node<'_> {
        Node {
            tree: self,
            id: NodeId(0),
        }
    }

    /// Returns a handle to the node with identifier `id`.
    #[must_use]
    pub const fn node(&self, id: NodeId) -> Node<'_> {
        Node { tree: self, id }
    }

    /// Returns the number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` when the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns whether any node was flagged as an error by the parser.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.nodes.iter().any(|data| data.spec.error)
    }

    /// Converts a byte offset into a zero-based line/column position.
    #[must_use]
    pub fn position(&self, offset: usize) -> LineCol {
        let line = self
            .line_starts
            .partition_point(|start| *start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        LineCol::new(
            u32::try_from(line).unwrap_or(u32::MAX),
            u32::try_from(offset.saturating_sub(line_start)).unwrap_or(u32::MAX),
        )
    }

    /// Builds a [`Span`] for a byte range of this tree's source.
    #[must_use]
    pub fn span(&self, bytes: Range<usize>) -> Span {
        Span::new(
            u32::try_from(bytes.start).unwrap_or(u32::MAX),
            u32::try_from(bytes.end).unwrap_or(u32::MAX),
            self.position(bytes.start),
            self.position(bytes.end),
        )
    }

    /// Returns the source text between two byte offsets, or `""` when the
    /// range is invalid.
    #[must_use]
    pub fn slice(&self, bytes: Range<usize>) -> &str {
        self.source.get(bytes).unwrap_or_default()
    }

    fn data(&self, id: NodeId) -> &NodeData {
        self.nodes.get(id.index()).unwrap_or(&MISSING)
    }
}

/// A borrowed view of one node in a [`Tree`].
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t Tree,
    id: NodeId,
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("bytes", &self.byte_range())
            .finish()
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl<'t> Node<'t> {
    /// Returns the node identifier.
    #[must_use]
    pub const fn id(self) -> NodeId {
        self.id
    }

    /// Returns the tree that owns this node.
    #[must_use]
    pub const fn tree(self) -> &'t Tree {
        self.tree
    }

    fn data(self) -> &'t NodeData {
        self.tree.data(self.id)
    }

    /// Returns the grammar kind.
    #[must_use]
    pub fn kind(self) -> &'static str {
        self.data().spec.kind
    }

    /// Returns the parent field name that holds this node.
    #[must_use]
    pub fn field_name(self) -> Option<&'static str> {
        self.data().spec.field
    }

    /// Returns whether the grammar names this node.
    #[must_use]
    pub fn is_named(self) -> bool {
        self.data().spec.named
    }

    /// Returns whether the parser flagged this node as an error.
    #[must_use]
    pub fn is_error(self) -> bool {
        self.data().spec.error
    }

    /// Returns the token category of the node's text.
    #[must_use]
    pub fn category(self) -> TokenCategory {
        self.data().spec.category
    }

    /// Returns the byte range of the node.
    #[must_use]
    pub fn byte_range(self) -> Range<usize> {
        self.data().spec.bytes.clone()
    }

    /// Returns the node's source text.
    #[must_use]
    pub fn text(self) -> &'t str {
        self.tree.slice(self.byte_range())
    }

    /// Returns the node's span.
    #[must_use]
    pub fn span(self) -> Span {
        self.tree.span(self.byte_range())
    }

    /// Returns the parent node, or `None` for the root.
    #[must_use]
    pub fn parent(self) -> Option<Self> {
        self.data().parent.map(|id| self.tree.node(id))
    }

    /// Returns the number of direct children.
    #[must_use]
    pub fn child_count(self) -> usize {
        self.data().children.len()
    }

    /// Returns `true` when the node has no children.
    #[must_use]
    pub fn is_leaf(self) -> bool {
        self.data().children.is_empty()
    }

    /// Iterates over the direct children in source order.
    pub fn children(self) -> impl DoubleEndedIterator<Item = Node<'t>> + ExactSizeIterator + 't {
        let tree = self.tree;
        self.data().children.iter().map(move |id| tree.node(*id))
    }

    /// Iterates over the named direct children in source order.
    pub fn named_children(self) -> impl DoubleEndedIterator<Item = Node<'t>> + 't {
        self.children().filter(|child| child.is_named())
    }

    /// Returns the first child stored under the given field name.
    #[must_use]
    pub fn child_by_field(self, field: &str) -> Option<Self> {
        self.children().find(|child| child.field_name() == Some(field))
    }

    /// Returns the sibling that follows this node, if any.
    #[must_use]
    pub fn next_sibling(self) -> Option<Self> {
        let parent = self.parent()?;
        let mut siblings = parent.children().skip_while(|child| child.id != self.id);
        siblings.next();
        siblings.next()
    }

    /// Iterates over the strict ancestors, innermost first.
    pub fn ancestors(self) -> impl Iterator<Item = Node<'t>> {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    /// Iterates over this node and its descendants in pre-order.
    #[must_use]
    pub fn descendants(self) -> Descendants<'t> {
        Descendants {
            tree: self.tree,
            stack: vec![self.id],
        }
    }

    /// Returns whether `self` is a strict ancestor of `other`.
    #[must_use]
    pub fn is_ancestor_of(self, other: Self) -> bool {
        other.ancestors().any(|ancestor| ancestor == self)
    }
}

/// Pre-order iterator returned by [`Node::descendants`].
#[derive(Debug)]
pub struct Descendants<'t> {
    tree: &'t Tree,
    stack: Vec<NodeId>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.data(id).children.iter().rev().copied());
        Some(self.tree.node(id))
    }
}
