//! Tree-sitter parsing and conversion into the Sift arena tree.
//!
//! Tree-sitter trees borrow their parser's buffers and cannot be shared
//! between threads, so every parse is converted into an owned
//! [`sift_core::Tree`]. The conversion walks the Tree-sitter cursor
//! iteratively; nesting depth is bounded only by memory.

use std::ops::Range;

use sift_core::{NodeSpec, TokenCategory, Tree, TreeBuilder};

use crate::error::SyntaxError;
use crate::language::SupportedLanguage;
use crate::profile::grammar;

/// Result of parsing source code.
///
/// Tree-sitter is error-tolerant, so a parse result may contain both a
/// usable tree and error nodes.
#[derive(Debug)]
pub struct ParseResult {
    tree: Tree,
    errors: Vec<SyntaxErrorInfo>,
    language: SupportedLanguage,
}

impl ParseResult {
    /// Returns the converted syntax tree.
    #[must_use]
    pub const fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Consumes the result, returning the syntax tree.
    #[must_use]
    pub fn into_tree(self) -> Tree {
        self.tree
    }

    /// Returns the language of the parsed code.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Returns whether the parser reported any error or missing node.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns the syntax errors in source order.
    #[must_use]
    pub fn errors(&self) -> &[SyntaxErrorInfo] {
        &self.errors
    }
}

/// Information about a syntax error found during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxErrorInfo {
    /// Byte range of the error in the source.
    pub byte_range: Range<usize>,
    /// Line number (one-based) where the error starts.
    pub line: u32,
    /// Column number (one-based) where the error starts.
    pub column: u32,
    /// Human-readable description of the error.
    pub message: String,
}

impl SyntaxErrorInfo {
    fn from_node(node: tree_sitter::Node<'_>) -> Self {
        let start = node.start_position();
        let message = if node.is_missing() {
            format!("missing {}", node.kind())
        } else {
            "syntax error".to_owned()
        };
        Self {
            byte_range: node.byte_range(),
            line: u32::try_from(start.row.saturating_add(1)).unwrap_or(u32::MAX),
            column: u32::try_from(start.column.saturating_add(1)).unwrap_or(u32::MAX),
            message,
        }
    }
}

/// Tree-sitter parser wrapper for a specific language.
pub struct Parser {
    inner: tree_sitter::Parser,
    language: SupportedLanguage,
}

impl Parser {
    /// Creates a new parser for the given language.
    ///
    /// # Errors
    ///
    /// Returns an error if the Tree-sitter parser rejects the grammar.
    pub fn new(language: SupportedLanguage) -> Result<Self, SyntaxError> {
        let mut inner = tree_sitter::Parser::new();
        inner
            .set_language(&language.tree_sitter_language())
            .map_err(|e| SyntaxError::parser_init(language, e.to_string()))?;
        Ok(Self { inner, language })
    }

    /// Returns the language this parser is configured for.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Parses source code and converts the result.
    ///
    /// # Errors
    ///
    /// Returns an error if Tree-sitter produces no tree or the tree cannot
    /// be converted.
    pub fn parse(&mut self, source: &str) -> Result<ParseResult, SyntaxError> {
        let ts_tree = self
            .inner
            .parse(source, None)
            .ok_or_else(|| SyntaxError::parse(self.language, "parsing failed"))?;
        let (tree, errors) = convert(&ts_tree, source, self.language)?;
        Ok(ParseResult {
            tree,
            errors,
            language: self.language,
        })
    }
}

/// Copies a Tree-sitter tree into the arena in pre-order.
///
/// Token categories are inherited: every descendant of a comment or literal
/// node shares its category.
fn convert(
    ts_tree: &tree_sitter::Tree,
    source: &str,
    language: SupportedLanguage,
) -> Result<(Tree, Vec<SyntaxErrorInfo>), SyntaxError> {
    let tables = grammar(language);
    let mut builder = TreeBuilder::new(source);
    let mut errors = Vec::new();
    let mut categories: Vec<TokenCategory> = Vec::new();
    let mut cursor = ts_tree.walk();

    loop {
        let node = cursor.node();
        let category = categories
            .last()
            .copied()
            .filter(|inherited| *inherited != TokenCategory::Code)
            .or_else(|| tables.token_category(node.kind()))
            .unwrap_or_default();
        let is_error = node.is_error() || node.is_missing();
        if is_error {
            errors.push(SyntaxErrorInfo::from_node(node));
        }
        let mut spec = NodeSpec::new(node.kind(), node.byte_range())
            .with_field(cursor.field_name())
            .with_category(category)
            .with_error(is_error);
        if !node.is_named() {
            spec = spec.anonymous();
        }
        builder.open(spec)?;
        categories.push(category);

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            builder.close()?;
            categories.pop();
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                let tree = builder.finish()?;
                return Ok((tree, errors));
            }
        }
    }
}
