//! The language profile: every piece of language knowledge the matcher needs.
//!
//! The compiler and matcher are language-agnostic. Grammar-level decisions
//! (which kinds are statements, which child lists ignore order, where a
//! placeholder stands for a whole statement) and semantic queries (static
//! types, modifiers, name resolution, the type hierarchy) are delegated to a
//! [`LanguageProfile`] implementation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hierarchy::TypeHierarchy;
use crate::tree::{Node, NodeId, Tree};

/// How a pattern snippet is parsed.
///
/// The context is always supplied by the caller; it is never inferred from
/// the pattern text beyond the rule documented on [`PatternContext::Default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternContext {
    /// Statements, except that a single expression statement written without
    /// a terminating `;` is treated as a bare expression.
    #[default]
    Default,
    /// Class or impl members.
    Member,
    /// A single expression.
    Expression,
    /// One or more statements, taken as written.
    Statement,
}

impl PatternContext {
    /// Returns the lower-case identifier of the context.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Member => "member",
            Self::Expression => "expression",
            Self::Statement => "statement",
        }
    }
}

impl fmt::Display for PatternContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when parsing a pattern context name fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown pattern context: '{0}'")]
pub struct PatternContextParseError(String);

impl FromStr for PatternContext {
    type Err = PatternContextParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "member" => Ok(Self::Member),
            "expression" | "expr" => Ok(Self::Expression),
            "statement" | "stmt" => Ok(Self::Statement),
            other => Err(PatternContextParseError(other.to_owned())),
        }
    }
}

/// How the children of a structured node are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildMatching {
    /// Children form a strict sequence.
    Ordered,
    /// Children form a sequence, but candidate children of the listed kinds
    /// may be skipped when the pattern does not consume them.
    Lenient(&'static [&'static str]),
    /// Named children are matched in any order and extra ones are allowed.
    Unordered,
}

/// The syntactic position a placeholder stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderRole {
    /// Any named node.
    #[default]
    Any,
    /// A whole statement, written as `'name;`.
    Statement,
    /// A whole class or impl member.
    Member,
}

/// A parsed pattern snippet: the tree plus the nodes that form the pattern.
#[derive(Debug, Clone)]
pub struct Snippet {
    tree: Tree,
    roots: Vec<NodeId>,
}

impl Snippet {
    /// Creates a snippet from a parsed tree and its top-level pattern nodes.
    #[must_use]
    pub const fn new(tree: Tree, roots: Vec<NodeId>) -> Self {
        Self { tree, roots }
    }

    /// Returns the parsed tree.
    #[must_use]
    pub const fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Returns the top-level pattern nodes in source order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Splits the snippet into its tree and roots.
    #[must_use]
    pub fn into_parts(self) -> (Tree, Vec<NodeId>) {
        (self.tree, self.roots)
    }
}

/// Error raised by a profile while parsing sources or snippets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProfileError {
    message: String,
    offset: Option<usize>,
}

impl ProfileError {
    /// Creates an error without a location.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            offset: None,
        }
    }

    /// Attaches the byte offset at which the problem was found.
    #[must_use]
    pub const fn at(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the byte offset of the problem, if known.
    #[must_use]
    pub const fn offset(&self) -> Option<usize> {
        self.offset
    }
}

/// Language knowledge injected into the compiler and the matcher.
///
/// Only [`name`](Self::name), [`parse`](Self::parse),
/// [`parse_snippet`](Self::parse_snippet) and
/// [`is_statement`](Self::is_statement) are required; the remaining hooks
/// default to a purely syntactic profile with no semantic knowledge.
pub trait LanguageProfile: Send + Sync + fmt::Debug {
    /// Returns the profile's language identifier.
    fn name(&self) -> &str;

    /// Parses a complete source file.
    ///
    /// # Errors
    ///
    /// Returns an error when the parser cannot produce a tree.
    fn parse(&self, source: &str) -> Result<Tree, ProfileError>;

    /// Parses a pattern snippet in the given context.
    ///
    /// # Errors
    ///
    /// Returns an error when the snippet is not valid in `context`.
    fn parse_snippet(&self, snippet: &str, context: PatternContext)
    -> Result<Snippet, ProfileError>;

    /// Returns whether nodes of `kind` are statements.
    fn is_statement(&self, kind: &str) -> bool;

    /// Returns whether nodes of `kind` are class or impl members.
    fn is_member(&self, kind: &str) -> bool {
        let _ = kind;
        false
    }

    /// Returns how the children of `kind` are matched.
    fn child_matching(&self, kind: &str) -> ChildMatching {
        let _ = kind;
        ChildMatching::Ordered
    }

    /// Returns the role of a placeholder wrapped in a node of `kind`, if the
    /// kind is a wrapper such as an expression statement.
    fn placeholder_role(&self, kind: &str) -> Option<PlaceholderRole> {
        let _ = kind;
        None
    }

    /// Returns whether `kind` satisfies the placeholder role.
    fn satisfies_role(&self, role: PlaceholderRole, kind: &str) -> bool {
        match role {
            PlaceholderRole::Any => true,
            PlaceholderRole::Statement => self.is_statement(kind),
            PlaceholderRole::Member => self.is_member(kind),
        }
    }

    /// Returns whether an anonymous token of `kind` separates list items.
    fn is_separator(&self, kind: &str) -> bool {
        matches!(kind, "," | ";")
    }

    /// Returns whether a pattern node of `pattern_kind` may match a
    /// candidate of `candidate_kind`.
    fn kinds_compatible(&self, pattern_kind: &str, candidate_kind: &str) -> bool {
        pattern_kind == candidate_kind
    }

    /// Returns whether a quantifier on the `name` child of `kind` applies to
    /// the whole node (for example, "no method named `x`").
    fn is_occurrence_carrier(&self, kind: &str) -> bool {
        let _ = kind;
        false
    }

    /// Returns whether `kind` holds a list of same-role children.
    fn holds_list(&self, kind: &str) -> bool {
        let _ = kind;
        false
    }

    /// Returns the static type of an expression node, if known.
    fn static_type(&self, node: Node<'_>) -> Option<String> {
        let _ = node;
        None
    }

    /// Returns the modifiers carried by a declaration node.
    fn modifiers(&self, node: Node<'_>) -> Vec<String> {
        let _ = node;
        Vec::new()
    }

    /// Resolves a reference to its declaration.
    fn resolve<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        let _ = node;
        None
    }

    /// Collects the type hierarchy declared in `tree`.
    fn type_hierarchy(&self, tree: &Tree) -> TypeHierarchy {
        let _ = tree;
        TypeHierarchy::open()
    }
}
