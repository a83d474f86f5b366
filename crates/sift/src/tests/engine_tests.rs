//! The engine facade over source files.

use rstest::{fixture, rstest};
use sift_core::{
    CancellationToken, CaptureValue, CompileOptions, EngineConfig, SearchError, SearchOptions,
    TypeHierarchy,
};

use super::typescript;
use crate::{Engine, SourceFile};

#[fixture]
fn engine() -> Engine {
    Engine::new(typescript())
}

#[rstest]
fn search_source_reports_matches_with_captures(engine: Engine) {
    let pattern = engine
        .compile("'_a = '_a;", &CompileOptions::default())
        .expect("pattern compiles");
    let found = engine
        .search_source("a.ts", "x = x;\nx = y;\n", &pattern, &SearchOptions::default())
        .expect("search succeeds");
    assert_eq!(found.uri, "a.ts");
    let [only] = found.matches.as_slice() else {
        panic!("expected one match, got {}", found.matches.len());
    };
    assert_eq!(only.image(), "x = x;");
    assert_eq!(only.span().start().line(), 0);
    let Some(CaptureValue::Node(captured)) = only.capture("_a") else {
        panic!("expected a single-node capture");
    };
    assert_eq!(captured.text(), Some("x"));
}

#[rstest]
fn files_ruled_out_by_the_plan_are_skipped(engine: Engine) {
    let pattern = engine
        .compile("a.b(null);", &CompileOptions::default())
        .expect("pattern compiles");
    let found = engine
        .search_source("b.ts", "this is not ( valid", &pattern, &SearchOptions::default())
        .expect("unparsed files are not errors");
    assert!(found.matches.is_empty());
}

#[rstest]
fn search_files_keeps_input_order(engine: Engine) {
    let pattern = engine
        .compile("foo('_x);", &CompileOptions::default())
        .expect("pattern compiles");
    let files = [
        SourceFile::new("one.ts", "foo(1);\nfoo(2);\n"),
        SourceFile::new("two.ts", "bar(1);\n"),
        SourceFile::new("three.ts", "foo(3);\n"),
    ];
    let results = engine
        .search_files(&files, &pattern, &SearchOptions::default())
        .expect("search succeeds");
    let summary: Vec<_> = results
        .iter()
        .map(|file| (file.uri.as_str(), file.matches.len()))
        .collect();
    assert_eq!(summary, [("one.ts", 2), ("two.ts", 0), ("three.ts", 1)]);
}

#[rstest]
fn cancelled_searches_stop_before_parsing(engine: Engine) {
    let pattern = engine
        .compile("foo();", &CompileOptions::default())
        .expect("pattern compiles");
    let token = CancellationToken::new();
    token.cancel();
    let options = SearchOptions::default().with_cancellation(token);
    let result = engine.search_source("a.ts", "foo();\n", &pattern, &options);
    assert!(matches!(result, Err(SearchError::Cancelled)));
}

#[rstest]
fn failures_travel_with_file_results(engine: Engine) {
    let pattern = engine
        .compile("'_f:[script( _f.count > \"a\" )]();", &CompileOptions::default())
        .expect("pattern compiles");
    let found = engine
        .search_source("a.ts", "go();\n", &pattern, &SearchOptions::default())
        .expect("search succeeds");
    assert!(found.matches.is_empty());
    assert!(!found.failures.is_empty());
}

#[test]
fn configured_limits_apply_to_every_file() {
    let engine = Engine::new(typescript()).with_config(EngineConfig::new(1, 1024, 10));
    let pattern = engine
        .compile("foo();", &CompileOptions::default())
        .expect("pattern compiles");
    let found = engine
        .search_source("a.ts", "foo();\nfoo();\n", &pattern, &SearchOptions::default())
        .expect("search succeeds");
    assert_eq!(found.matches.len(), 1);
}

#[test]
fn known_hierarchy_resolves_types_declared_elsewhere() {
    let mut hierarchy = TypeHierarchy::closed();
    hierarchy.add_supertype("Derived", "Base");
    let engine = Engine::new(typescript()).with_hierarchy(hierarchy);
    let pattern = engine
        .compile("new '_t:*Base ();", &CompileOptions::default())
        .expect("pattern compiles");
    let found = engine
        .search_source(
            "a.ts",
            "new Derived();\nnew Other();\n",
            &pattern,
            &SearchOptions::default(),
        )
        .expect("search succeeds");
    let images: Vec<_> = found.matches.iter().map(|hit| hit.image()).collect();
    assert_eq!(images, ["new Derived();"]);
}

#[rstest]
fn file_results_serialise_without_empty_failures(engine: Engine) {
    let pattern = engine
        .compile("foo();", &CompileOptions::default())
        .expect("pattern compiles");
    let found = engine
        .search_source("a.ts", "foo();\n", &pattern, &SearchOptions::default())
        .expect("search succeeds");
    let json = serde_json::to_value(&found).expect("serialises");
    assert_eq!(json.get("uri"), Some(&serde_json::json!("a.ts")));
    assert_eq!(
        json.pointer("/matches/0/image"),
        Some(&serde_json::json!("foo();"))
    );
    assert!(json.get("failures").is_none());
}
