//! End-to-end tests for the Sift engine using insta for snapshot testing.
//!
//! These tests drive the public API the way an embedder would: compile a
//! query once, then search source files through an [`Engine`].

use std::sync::Arc;

use insta::assert_snapshot;
use rstest::{fixture, rstest};

use sift::{
    CompileOptions, DiagnosticCode, Engine, FileMatches, SearchOptions, SourceFile,
};
use sift_syntax::SupportedLanguage;

fn engine_for(language: SupportedLanguage) -> Engine {
    Engine::new(Arc::new(language.profile()))
}

/// Renders matches as `uri:line:column image`, one per line, using
/// one-based positions.
fn render(results: &[FileMatches]) -> String {
    results
        .iter()
        .flat_map(|file| {
            file.matches.iter().map(|found| {
                format!(
                    "{}:{}:{} {}",
                    file.uri,
                    found.span().start().line() + 1,
                    found.span().start().column() + 1,
                    found.image()
                )
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn search(engine: &Engine, pattern: &str, files: &[SourceFile]) -> String {
    let compiled = engine
        .compile(pattern, &CompileOptions::default())
        .unwrap_or_else(|err| panic!("pattern: {err}"));
    let results = engine
        .search_files(files, &compiled, &SearchOptions::default())
        .unwrap_or_else(|err| panic!("search: {err}"));
    render(&results)
}

#[fixture]
fn typescript() -> Engine {
    engine_for(SupportedLanguage::TypeScript)
}

// =============================================================================
// Happy Path: Matching Across Files
// =============================================================================

#[rstest]
fn finds_calls_across_files(typescript: Engine) {
    let files = [
        SourceFile::new("a.ts", "a.b(null);\na.b(1);\n"),
        SourceFile::new("b.ts", "function f() {\n  a.b(null);\n}\n"),
        SourceFile::new("c.ts", "x.b(null);\n"),
    ];
    assert_snapshot!(search(&typescript, "a.b(null);", &files), @r"
    a.ts:1:1 a.b(null);
    b.ts:2:3 a.b(null);
    ");
}

#[rstest]
fn self_equal_assignments(typescript: Engine) {
    let files = [SourceFile::new("a.ts", "x = x;\nx = y;\ny.z = y.z;\n")];
    assert_snapshot!(search(&typescript, "'_a = '_a;", &files), @r"
    a.ts:1:1 x = x;
    a.ts:3:1 y.z = y.z;
    ");
}

#[rstest]
fn classes_without_constructors(typescript: Engine) {
    let files = [SourceFile::new(
        "a.ts",
        "class A { constructor() { } run() { } }\nclass B { run() { } }\n",
    )];
    let pattern = "class '_C { '_m{0,0}:constructor ('_p*) { '_s*; } }";
    assert_snapshot!(search(&typescript, pattern, &files), @"a.ts:2:1 class B { run() { } }");
}

#[rstest]
#[case(SupportedLanguage::Python, "foo('_x)", "foo(1)\nbar(2)\nfoo(3)\n")]
#[case(SupportedLanguage::Rust, "foo('_x);", "fn main() {\n    foo(1);\n    bar(2);\n    foo(3);\n}\n")]
fn other_languages_share_the_query_syntax(
    #[case] language: SupportedLanguage,
    #[case] pattern: &str,
    #[case] source: &str,
) {
    let engine = engine_for(language);
    let rendered = search(&engine, pattern, &[SourceFile::new("src", source)]);
    let images: Vec<_> = rendered
        .lines()
        .filter_map(|line| line.split_once(' ').map(|(_, image)| image))
        .collect();
    assert_eq!(images.len(), 2);
    assert!(images.iter().all(|image| image.starts_with("foo(")));
}

// =============================================================================
// Unhappy Path: Malformed Queries
// =============================================================================

#[rstest]
fn malformed_queries_render_code_and_message(typescript: Engine) {
    let err = typescript
        .compile("'_x{3,1};", &CompileOptions::default())
        .map(|_| ())
        .expect_err("inverted range");
    assert_eq!(err.code(), DiagnosticCode::ESiftRangeInvalid);
    assert_snapshot!(err.diagnostic().message(), @"range {3,1} has a minimum above its maximum");
}

#[rstest]
fn no_matches_render_nothing(typescript: Engine) {
    let files = [SourceFile::new("a.ts", "foo();\n")];
    assert_snapshot!(search(&typescript, "bar();", &files), @"");
}
