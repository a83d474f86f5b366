//! Snippet parsing in each pattern context.

use rstest::rstest;
use sift_core::{LanguageProfile, PatternContext, Snippet};

use crate::SupportedLanguage;

fn root_kinds(snippet: &Snippet) -> Vec<&'static str> {
    snippet
        .roots()
        .iter()
        .map(|id| snippet.tree().node(*id).kind())
        .collect()
}

fn parse(language: SupportedLanguage, text: &str, context: PatternContext) -> Snippet {
    language
        .profile()
        .parse_snippet(text, context)
        .unwrap_or_else(|err| panic!("snippet {text:?} should parse: {err}"))
}

#[rstest]
#[case("a.b(null);", &["expression_statement"])]
#[case("a.b(null)", &["call_expression"])]
#[case("a = 1; b = 2;", &["expression_statement", "expression_statement"])]
#[case("{ x; }", &["statement_block"])]
#[case("class A {}", &["class_declaration"])]
#[case("foo() {}", &["method_definition"])]
fn default_context_typescript(#[case] text: &str, #[case] expected: &[&str]) {
    let snippet = parse(SupportedLanguage::TypeScript, text, PatternContext::Default);
    assert_eq!(root_kinds(&snippet), expected);
}

#[test]
fn member_context_wraps_in_a_class() {
    let snippet = parse(
        SupportedLanguage::TypeScript,
        "x = 1;\nfoo() {}",
        PatternContext::Member,
    );
    assert_eq!(
        root_kinds(&snippet),
        ["public_field_definition", "method_definition"]
    );
}

#[test]
fn statement_context_keeps_expression_statements() {
    let snippet = parse(SupportedLanguage::TypeScript, "f()", PatternContext::Statement);
    assert_eq!(root_kinds(&snippet), ["expression_statement"]);
}

#[rstest]
#[case(SupportedLanguage::TypeScript, "f(x);", "call_expression")]
#[case(SupportedLanguage::Rust, "foo(x)", "call_expression")]
#[case(SupportedLanguage::Python, "foo(x)", "call")]
fn expression_context_unwraps(
    #[case] language: SupportedLanguage,
    #[case] text: &str,
    #[case] expected: &str,
) {
    let snippet = parse(language, text, PatternContext::Expression);
    assert_eq!(root_kinds(&snippet), [expected]);
}

#[test]
fn expression_context_rejects_declarations() {
    let result = SupportedLanguage::TypeScript
        .profile()
        .parse_snippet("let x = 1;", PatternContext::Expression);
    assert!(result.is_err());
}

#[test]
fn python_member_context_indents_the_snippet() {
    let snippet = parse(
        SupportedLanguage::Python,
        "def run(self):\n    pass",
        PatternContext::Member,
    );
    assert_eq!(root_kinds(&snippet), ["function_definition"]);
}

#[test]
fn invalid_snippets_are_rejected() {
    let result = SupportedLanguage::TypeScript
        .profile()
        .parse_snippet("let = ;", PatternContext::Default);
    let err = result.expect_err("invalid pattern");
    assert!(err.message().contains("line 1"), "{err}");
}
