//! Matcher behaviour over TypeScript sources.

use rstest::rstest;
use sift_core::{CancellationToken, CompileOptions, SearchError, SearchOptions};

use super::{compile, compile_with, count, images, parse};
use super::typescript;
use crate::{Engine, find_all, find_matches, match_by_down_up};

const THREE_STATEMENTS: &str = "function f() {\n  a();\n  b();\n  c();\n}\n";

#[rstest]
#[case("{ '_T*; '_T2*; }", 1)]
#[case("{ '_T+; '_T2+; '_T3+; '_T4+; }", 0)]
#[case("{ '_T+; '_T2+; '_T3+; }", 1)]
#[case("{ '_T{2,2}; '_T2{2,}; }", 0)]
#[case("{ '_T*?; '_T2{3,3}; }", 1)]
#[case("{ '_T{4,}; }", 0)]
fn quantifiers_split_one_block(#[case] pattern: &str, #[case] expected: usize) {
    assert_eq!(count(pattern, THREE_STATEMENTS), expected);
}

#[rstest]
#[case("{ '_A*; '_B*; }", 3, 0)]
#[case("{ '_A*?; '_B*; }", 0, 3)]
#[case("{ '_A+?; '_B*; }", 1, 2)]
#[case("{ '_A{1,2}; '_B*; }", 2, 1)]
fn greedy_and_lazy_slots_choose_their_share(
    #[case] pattern: &str,
    #[case] first: usize,
    #[case] second: usize,
) {
    let compiled = compile(pattern);
    let tree = parse(THREE_STATEMENTS);
    let results = find_all(&tree, &compiled, &SearchOptions::default()).expect("search");
    let [only] = results.as_slice() else {
        panic!("expected one match, got {}", results.len());
    };
    let share = |name: &str| only.capture(name).map_or(0, |capture| capture.nodes().len());
    assert_eq!((share("_A"), share("_B")), (first, second));
}

#[test]
fn backtracking_gives_back_a_statement_to_a_later_literal() {
    let compiled = compile("{ '_A+; b(); '_C*; }");
    let tree = parse(THREE_STATEMENTS);
    let results = find_all(&tree, &compiled, &SearchOptions::default()).expect("search");
    assert_eq!(results.len(), 1);
    let first = results.first().expect("one match");
    assert_eq!(first.capture("_A").map(|capture| capture.text()), Some("a();"));
    assert_eq!(first.capture("_C").map(|capture| capture.text()), Some("c();"));
}

#[test]
fn later_statement_failure_reopens_an_earlier_argument_split() {
    let source = "foo(1, 2);\nbar(1);\n";
    assert_eq!(count("foo('_x*, '_y*); bar('_x*);", source), 1);
    assert_eq!(count("foo('_x*, '_y*); bar('_x*);", "foo(1, 2);\nbar(1, 2);\n"), 1);

    let compiled = compile("foo('x*, 'y*); bar('x*);");
    let tree = parse(source);
    let results = find_all(&tree, &compiled, &SearchOptions::default()).expect("search");
    let [only] = results.as_slice() else {
        panic!("expected one match, got {}", results.len());
    };
    assert_eq!(only.capture("x").map(|capture| capture.text()), Some("1"));
    assert_eq!(only.capture("y").map(|capture| capture.text()), Some("2"));
}

#[rstest]
#[case("class '_C { '_a() {} foo() {} }", "class X { foo() {} bar() {} }\n")]
#[case("class '_C { foo() {} '_a() {} }", "class X { foo() {} bar() {} }\n")]
#[case("class '_C { '_f:[regex(a.*)] = '_v; '_g = 2; }", "class X { ab = 2; ac = 1; }\n")]
fn unordered_slots_give_up_members_a_later_slot_needs(
    #[case] pattern: &str,
    #[case] source: &str,
) {
    assert_eq!(count(pattern, source), 1);
}

#[test]
fn literal_call_matches_only_identical_calls() {
    let source = "a.b(null);\na.b(1);\nx.b(null);\na.b(null, 2);\n";
    assert_eq!(images(&compile("a.b(null);"), source), ["a.b(null);"]);
}

#[test]
fn repeated_statement_variable_needs_equal_statements() {
    let source = "foo();\nfoo();\nbar();\n";
    assert_eq!(count("'T; 'T;", source), 1);
}

#[test]
fn repeated_variable_enforces_self_equality() {
    let source = "x = x;\nx = y;\ny.z = y.z;\n";
    assert_eq!(
        images(&compile("'_a = '_a;"), source),
        ["x = x;", "y.z = y.z;"]
    );
}

#[test]
fn try_pattern_skips_catch_clauses_but_needs_finally() {
    let source = concat!(
        "try { } finally { }\n",
        "try { } catch (e) { }\n",
        "try { } catch (e) { } finally { }\n",
    );
    assert_eq!(count("try { '_st*; } finally { '_st2*; }", source), 2);
}

#[rstest]
#[case(true, 0)]
#[case(false, 1)]
fn case_sensitivity_toggles_literal_comparison(#[case] case_sensitive: bool, #[case] expected: usize) {
    let options = CompileOptions::default().with_case_sensitive(case_sensitive);
    let pattern = compile_with("Foo();", &options);
    assert_eq!(images(&pattern, "foo();\n").len(), expected);
}

#[test]
fn absent_member_rejects_classes_that_have_it() {
    let source = concat!(
        "class A { constructor() { } run() { } }\n",
        "class B { run() { } }\n",
    );
    let pattern = compile("class '_C { '_m{0,0}:constructor ('_p*) { '_s*; } }");
    let found = images(&pattern, source);
    assert_eq!(found, ["class B { run() { } }"]);
}

#[test]
fn targets_split_results_per_bound_node() {
    let source = concat!(
        "function a() { x(); y(); z(); }\n",
        "function b() { w(); }\n",
        "function c() { }\n",
    );
    let pattern = compile("{ 'T*; }");
    assert_eq!(images(&pattern, source).len(), 5);

    let tree = parse(source);
    let per_match = find_all(
        &tree,
        &pattern,
        &SearchOptions::default().with_context_match(true),
    )
    .expect("search");
    assert_eq!(per_match.len(), 3);
}

#[test]
fn split_results_point_at_their_target() {
    let tree = parse("function a() { x(); y(); }\n");
    let pattern = compile("{ 'T*; }");
    let targets: Vec<_> = find_all(&tree, &pattern, &SearchOptions::default())
        .expect("search")
        .iter()
        .filter_map(|result| result.target().map(|target| target.text()))
        .collect();
    assert_eq!(targets, ["x();", "y();"]);
}

#[test]
fn non_recursive_search_only_tries_top_level_nodes() {
    let source = "foo(1);\nfunction f() { foo(2); }\n";
    let pattern = compile("foo('_x);");
    let tree = parse(source);
    let options = SearchOptions::default().with_recursive_search(false);
    let found = find_all(&tree, &pattern, &options).expect("search");
    assert_eq!(found.len(), 1);
    assert_eq!(count("foo('_x);", source), 2);
}

#[test]
fn search_is_idempotent() {
    let source = "x = x;\ny = y;\n";
    let pattern = compile("'_a = '_a;");
    assert_eq!(images(&pattern, source), images(&pattern, source));
}

#[test]
fn cancelled_search_reports_cancellation() {
    let tree = parse(THREE_STATEMENTS);
    let pattern = compile("a();");
    let token = CancellationToken::new();
    token.cancel();
    let result = find_all(&tree, &pattern, &SearchOptions::default().with_cancellation(token));
    assert!(matches!(result, Err(SearchError::Cancelled)));
}

#[test]
fn matches_iterator_is_lazy_and_stops_early() {
    let tree = parse("a();\na();\na();\n");
    let pattern = compile("a();");
    let mut matches = find_matches(&tree, &pattern, &SearchOptions::default());
    let first = matches.next().expect("first match").expect("no error");
    assert_eq!(first.span().start().line(), 0);
    assert_eq!(matches.count(), 2);
}

#[test]
fn match_limit_truncates_results() {
    let tree = parse("a();\na();\na();\n");
    let pattern = compile("a();");
    let config = sift_core::EngineConfig::new(2, 1024, 10);
    let found: Vec<_> = find_matches(&tree, &pattern, &SearchOptions::default())
        .with_config(&config)
        .collect::<Result<_, _>>()
        .expect("search");
    assert_eq!(found.len(), 2);
}

#[test]
fn down_up_finds_the_enclosing_statement() {
    let tree = parse("class A { run() { foo(1); } }\n");
    let start = tree
        .root_node()
        .descendants()
        .find(|node| node.kind() == "number")
        .expect("number literal");
    let pattern = compile("foo('_a);");
    let found = match_by_down_up(&tree, start, &pattern, &SearchOptions::default()).expect("down-up");
    let images: Vec<_> = found.iter().map(|result| result.image()).collect();
    assert_eq!(images, ["foo(1);"]);
}

#[test]
fn down_up_tries_sibling_windows_for_multi_slot_patterns() {
    let tree = parse("a();\nb();\nc();\n");
    let start = tree
        .root_node()
        .descendants()
        .find(|node| node.kind() == "identifier" && node.text() == "b")
        .expect("identifier b");
    let pattern = compile("a(); b();");
    let found = match_by_down_up(&tree, start, &pattern, &SearchOptions::default()).expect("down-up");
    assert_eq!(found.len(), 1);
    assert_eq!(found.first().map(|result| result.image()), Some("a();\nb();"));
}

#[test]
fn down_up_returns_nothing_without_a_matching_ancestor() {
    let tree = parse("bar(1);\n");
    let start = tree
        .root_node()
        .descendants()
        .find(|node| node.kind() == "number")
        .expect("number literal");
    let pattern = compile("foo('_a);");
    assert!(match_by_down_up(&tree, start, &pattern, &SearchOptions::default()).expect("down-up").is_empty());
}

#[test]
fn engine_down_up_observes_cancellation() {
    let tree = parse("foo(1);\n");
    let start = tree
        .root_node()
        .descendants()
        .find(|node| node.kind() == "number")
        .expect("number literal");
    let pattern = compile("foo('_a);");
    let token = CancellationToken::new();
    token.cancel();
    let options = SearchOptions::default().with_cancellation(token);
    let result = Engine::new(typescript()).match_down_up(&tree, start, &pattern, &options);
    assert!(matches!(result, Err(SearchError::Cancelled)));
}

#[test]
fn engine_down_up_applies_the_match_limit() {
    let tree = parse("function a() { x(); y(); z(); }\n");
    let start = tree
        .root_node()
        .descendants()
        .find(|node| node.kind() == "identifier" && node.text() == "x")
        .expect("identifier x");
    let pattern = compile("{ 'T*; }");
    let options = SearchOptions::default();

    let split = match_by_down_up(&tree, start, &pattern, &options).expect("down-up");
    assert_eq!(split.len(), 3);
    let whole = match_by_down_up(&tree, start, &pattern, &options.clone().with_context_match(true))
        .expect("down-up");
    assert_eq!(whole.len(), 1);

    let engine = Engine::new(typescript()).with_config(sift_core::EngineConfig::new(1, 1024, 10));
    let limited = engine
        .match_down_up(&tree, start, &pattern, &options)
        .expect("down-up");
    assert_eq!(limited.len(), 1);
}
