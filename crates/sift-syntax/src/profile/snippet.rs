//! Parsing pattern snippets in a caller-supplied context.

use sift_core::{NodeId, PatternContext, ProfileError, Snippet, Tree};

use super::{Grammar, Wrapper, grammar};
use crate::language::SupportedLanguage;
use crate::parser::Parser;

/// Parses `text` as a pattern in `context`.
pub(super) fn parse(
    language: SupportedLanguage,
    text: &str,
    context: PatternContext,
) -> Result<Snippet, ProfileError> {
    let tables = grammar(language);
    match context {
        PatternContext::Member => parse_wrapped(language, text, &tables.member_wrapper),
        PatternContext::Statement => parse_statements(language, text),
        PatternContext::Expression => {
            let snippet = parse_statements(language, text)?;
            unwrap_expression(tables, snippet)
                .map_err(|_| ProfileError::new("pattern is not a single expression"))
        }
        PatternContext::Default => parse_default(language, text),
    }
}

/// Statements, unless the text is one expression statement written without a
/// terminating `;`; member declarations when neither parses.
fn parse_default(language: SupportedLanguage, text: &str) -> Result<Snippet, ProfileError> {
    let tables = grammar(language);
    match parse_statements(language, text) {
        Ok(snippet) if text.trim_end().ends_with(';') => Ok(snippet),
        Ok(snippet) => Ok(unwrap_expression(tables, snippet).unwrap_or_else(|original| original)),
        Err(statement_error) => parse_wrapped(language, text, &tables.member_wrapper)
            .map_err(|_| statement_error),
    }
}

/// Parses top-level statements, retrying inside a function body.
fn parse_statements(language: SupportedLanguage, text: &str) -> Result<Snippet, ProfileError> {
    parse_bare(language, text).or_else(|bare_error| {
        parse_wrapped(language, text, &grammar(language).function_wrapper).map_err(|_| bare_error)
    })
}

fn parse_bare(language: SupportedLanguage, text: &str) -> Result<Snippet, ProfileError> {
    let tree = parse_clean(language, text, 0)?;
    let roots = tree.root_node().named_children().map(|node| node.id()).collect();
    snippet_with_roots(tree, roots)
}

fn parse_wrapped(
    language: SupportedLanguage,
    text: &str,
    wrapper: &Wrapper,
) -> Result<Snippet, ProfileError> {
    let (source, prefix_len) = match wrapper {
        Wrapper::Braced { prefix, suffix } => (format!("{prefix}{text}{suffix}"), prefix.len()),
        Wrapper::Indented { header } => (indent_under(header, text), 0),
    };
    let tree = parse_clean(language, &source, prefix_len)?;
    let body = tree
        .root_node()
        .named_children()
        .next()
        .and_then(|declaration| declaration.child_by_field("body"))
        .ok_or_else(|| ProfileError::new("pattern wrapper has no body"))?;
    let roots = body.named_children().map(|node| node.id()).collect();
    snippet_with_roots(tree, roots)
}

fn indent_under(header: &str, text: &str) -> String {
    let mut out = String::from(header);
    out.push('\n');
    for line in text.lines() {
        out.push_str("    ");
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Parses `source`, rejecting any tree with error nodes. Error offsets are
/// reported relative to the snippet start, `prefix_len` bytes into `source`.
fn parse_clean(
    language: SupportedLanguage,
    source: &str,
    prefix_len: usize,
) -> Result<Tree, ProfileError> {
    let mut parser = Parser::new(language)?;
    let parsed = parser.parse(source)?;
    if let Some(first) = parsed.errors().first() {
        let error = ProfileError::new(format!(
            "{} in pattern at line {}, column {}",
            first.message, first.line, first.column
        ));
        return Err(if prefix_len == 0 || first.byte_range.start >= prefix_len {
            error.at(first.byte_range.start.saturating_sub(prefix_len))
        } else {
            error
        });
    }
    Ok(parsed.into_tree())
}

fn snippet_with_roots(tree: Tree, roots: Vec<NodeId>) -> Result<Snippet, ProfileError> {
    if roots.is_empty() {
        return Err(ProfileError::new("pattern contains no syntax nodes"));
    }
    Ok(Snippet::new(tree, roots))
}

/// Replaces a lone expression statement by the expression it wraps.
///
/// Returns the snippet unchanged in `Err` when it is not a single expression.
fn unwrap_expression(tables: &Grammar, snippet: Snippet) -> Result<Snippet, Snippet> {
    let expression = match snippet.roots() {
        [only] => single_expression(tables, snippet.tree(), *only),
        _ => None,
    };
    match expression {
        Some(id) => {
            let (tree, _) = snippet.into_parts();
            Ok(Snippet::new(tree, vec![id]))
        }
        None => Err(snippet),
    }
}

fn single_expression(tables: &Grammar, tree: &Tree, id: NodeId) -> Option<NodeId> {
    let node = tree.node(id);
    let kind = node.kind();
    if kind == tables.expression_statement {
        let mut named = node.named_children();
        return match (named.next(), named.next()) {
            (Some(inner), None) => Some(inner.id()),
            _ => None,
        };
    }
    let is_statement = tables.statements.contains(&kind) || tables.comments.contains(&kind);
    (!is_statement).then_some(id)
}
