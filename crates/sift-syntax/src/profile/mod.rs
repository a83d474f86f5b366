//! Tree-sitter backed [`LanguageProfile`] implementations.
//!
//! Each language contributes a static [`Grammar`] table describing its node
//! kinds plus a handful of semantic helpers (static types, modifiers and the
//! type hierarchy). Snippet parsing and name resolution are shared.

mod python;
mod resolve;
mod rust;
mod snippet;
mod typescript;

use sift_core::{
    ChildMatching, LanguageProfile, Node, PatternContext, PlaceholderRole, ProfileError, Snippet,
    TokenCategory, Tree, TypeHierarchy,
};

use crate::language::SupportedLanguage;
use crate::parser::Parser;

/// How a pattern snippet is embedded in valid host source.
#[derive(Debug)]
pub(crate) enum Wrapper {
    /// The snippet is spliced between a prefix and a suffix on one line.
    Braced {
        prefix: &'static str,
        suffix: &'static str,
    },
    /// The snippet is indented under a header line.
    Indented { header: &'static str },
}

/// Static node-kind tables for one grammar.
#[derive(Debug)]
pub(crate) struct Grammar {
    pub(crate) statements: &'static [&'static str],
    pub(crate) members: &'static [&'static str],
    pub(crate) unordered: &'static [&'static str],
    pub(crate) lenient: &'static [(&'static str, &'static [&'static str])],
    pub(crate) wrappers: &'static [(&'static str, PlaceholderRole)],
    pub(crate) identifiers: &'static [&'static str],
    pub(crate) carriers: &'static [&'static str],
    pub(crate) lists: &'static [&'static str],
    pub(crate) comments: &'static [&'static str],
    pub(crate) literals: &'static [&'static str],
    pub(crate) scopes: &'static [&'static str],
    /// `(declaration kind, field holding the declared name)`; `None` accepts
    /// any identifier child.
    pub(crate) declarations: &'static [(&'static str, Option<&'static str>)],
    pub(crate) expression_statement: &'static str,
    pub(crate) member_wrapper: Wrapper,
    pub(crate) function_wrapper: Wrapper,
}

impl Grammar {
    /// Returns the category a node of `kind` starts, if it is not code.
    pub(crate) fn token_category(&self, kind: &str) -> Option<TokenCategory> {
        if self.comments.contains(&kind) {
            Some(TokenCategory::Comment)
        } else if self.literals.contains(&kind) {
            Some(TokenCategory::Literal)
        } else {
            None
        }
    }

    pub(crate) fn is_identifier(&self, kind: &str) -> bool {
        self.identifiers.contains(&kind)
    }
}

/// Returns the grammar tables of `language`.
pub(crate) const fn grammar(language: SupportedLanguage) -> &'static Grammar {
    match language {
        SupportedLanguage::TypeScript => &typescript::GRAMMAR,
        SupportedLanguage::Rust => &rust::GRAMMAR,
        SupportedLanguage::Python => &python::GRAMMAR,
    }
}

/// A [`LanguageProfile`] backed by a bundled Tree-sitter grammar.
///
/// The profile is stateless; a fresh Tree-sitter parser is created for every
/// parse so one profile can serve many threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeSitterProfile {
    language: SupportedLanguage,
}

impl TreeSitterProfile {
    /// Creates the profile for `language`.
    #[must_use]
    pub const fn new(language: SupportedLanguage) -> Self {
        Self { language }
    }

    /// Returns the profile's language.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    const fn grammar(&self) -> &'static Grammar {
        grammar(self.language)
    }
}

impl LanguageProfile for TreeSitterProfile {
    fn name(&self) -> &str {
        self.language.as_str()
    }

    fn parse(&self, source: &str) -> Result<Tree, ProfileError> {
        let mut parser = Parser::new(self.language)?;
        let parsed = parser.parse(source)?;
        if let Some(first) = parsed.errors().first() {
            tracing::debug!(
                language = %self.language,
                line = first.line,
                column = first.column,
                errors = parsed.errors().len(),
                "source parsed with recoverable syntax errors"
            );
        }
        Ok(parsed.into_tree())
    }

    fn parse_snippet(
        &self,
        snippet: &str,
        context: PatternContext,
    ) -> Result<Snippet, ProfileError> {
        snippet::parse(self.language, snippet, context)
    }

    fn is_statement(&self, kind: &str) -> bool {
        self.grammar().statements.contains(&kind)
    }

    fn is_member(&self, kind: &str) -> bool {
        self.grammar().members.contains(&kind)
    }

    fn child_matching(&self, kind: &str) -> ChildMatching {
        let grammar = self.grammar();
        if grammar.unordered.contains(&kind) {
            return ChildMatching::Unordered;
        }
        grammar
            .lenient
            .iter()
            .find(|(lenient_kind, _)| *lenient_kind == kind)
            .map_or(ChildMatching::Ordered, |(_, skippable)| {
                ChildMatching::Lenient(skippable)
            })
    }

    fn placeholder_role(&self, kind: &str) -> Option<PlaceholderRole> {
        self.grammar()
            .wrappers
            .iter()
            .find(|(wrapper, _)| *wrapper == kind)
            .map(|(_, role)| *role)
    }

    fn kinds_compatible(&self, pattern_kind: &str, candidate_kind: &str) -> bool {
        pattern_kind == candidate_kind
            || (self.grammar().is_identifier(pattern_kind)
                && self.grammar().is_identifier(candidate_kind))
    }

    fn is_occurrence_carrier(&self, kind: &str) -> bool {
        self.grammar().carriers.contains(&kind)
    }

    fn holds_list(&self, kind: &str) -> bool {
        self.grammar().lists.contains(&kind)
    }

    fn static_type(&self, node: Node<'_>) -> Option<String> {
        match self.language {
            SupportedLanguage::TypeScript => typescript::static_type(node),
            SupportedLanguage::Rust => rust::static_type(node),
            SupportedLanguage::Python => python::static_type(node),
        }
    }

    fn modifiers(&self, node: Node<'_>) -> Vec<String> {
        match self.language {
            SupportedLanguage::TypeScript => typescript::modifiers(node),
            SupportedLanguage::Rust => rust::modifiers(node),
            SupportedLanguage::Python => python::modifiers(node),
        }
    }

    fn resolve<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        resolve::resolve(self.grammar(), node)
    }

    fn type_hierarchy(&self, tree: &Tree) -> TypeHierarchy {
        match self.language {
            SupportedLanguage::TypeScript => typescript::type_hierarchy(tree),
            SupportedLanguage::Rust => rust::type_hierarchy(tree),
            SupportedLanguage::Python => python::type_hierarchy(tree),
        }
    }
}

/// Strips generic arguments, array suffixes and whitespace from a type name.
pub(crate) fn base_type_name(text: &str) -> String {
    let end = text.find(['<', '[', '(']).unwrap_or(text.len());
    text.get(..end)
        .unwrap_or(text)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Returns the text of the first named child of `node`, if any.
pub(crate) fn first_named_text(node: Node<'_>) -> Option<String> {
    node.named_children().next().map(|child| child.text().to_owned())
}
