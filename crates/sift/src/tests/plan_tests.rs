//! Search plans and the token index they filter.

use std::collections::BTreeSet;

use rstest::rstest;
use sift_core::{SearchOptions, TokenCategory, TypeHierarchy};

use super::{compile, parse, typescript};
use crate::{Engine, FileTokens, SearchPlan};

fn required(pattern: &str) -> BTreeSet<(TokenCategory, String)> {
    SearchPlan::build(&compile(pattern), None).required().clone()
}

fn set(entries: &[(TokenCategory, &str)]) -> BTreeSet<(TokenCategory, String)> {
    entries
        .iter()
        .map(|(category, word)| (*category, (*word).to_owned()))
        .collect()
}

#[test]
fn literal_words_are_required() {
    assert_eq!(
        required("a.b(null);"),
        set(&[
            (TokenCategory::Code, "a"),
            (TokenCategory::Code, "b"),
            (TokenCategory::Code, "null"),
        ])
    );
}

#[test]
fn string_literals_contribute_their_words() {
    assert_eq!(
        required("log(\"hello world\");"),
        set(&[
            (TokenCategory::Code, "log"),
            (TokenCategory::Literal, "hello"),
            (TokenCategory::Literal, "world"),
        ])
    );
}

#[test]
fn optional_and_absent_slots_are_not_required() {
    let pattern = "class '_C { '_m{0,0}:constructor ('_p*) { '_s*; } }";
    assert_eq!(required(pattern), set(&[(TokenCategory::Code, "class")]));
}

#[test]
fn placeholders_alone_give_a_trivial_plan() {
    let plan = SearchPlan::build(&compile("'_a = '_b;"), None);
    assert!(plan.is_trivial());
    assert!(plan.admits_source("anything at all"));
}

#[rstest]
#[case(true, vec![BTreeSet::from(["base".to_owned(), "derived".to_owned()])])]
#[case(false, Vec::new())]
fn hierarchy_groups_need_a_closed_hierarchy(
    #[case] closed: bool,
    #[case] expected: Vec<BTreeSet<String>>,
) {
    let mut hierarchy = if closed {
        TypeHierarchy::closed()
    } else {
        TypeHierarchy::open()
    };
    hierarchy.add_supertype("Derived", "Base");
    let plan = SearchPlan::build(&compile("new '_t:*Base ();"), Some(&hierarchy));
    assert_eq!(plan.any_of(), expected.as_slice());
}

#[test]
fn admits_source_checks_required_words() {
    let plan = SearchPlan::build(&compile("a.b(null);"), None);
    assert!(plan.admits_source("a.b(null)"));
    assert!(!plan.admits_source("x.y(null)"));
}

#[test]
fn token_index_keeps_categories_apart() {
    let tokens = FileTokens::from_tree(&parse("log(\"hi\"); // note\n"));
    assert!(tokens.contains(TokenCategory::Literal, "hi"));
    assert!(tokens.contains(TokenCategory::Comment, "note"));
    assert!(!tokens.contains(TokenCategory::Code, "hi"));
}

#[test]
fn plan_admits_indexed_files_with_required_tokens() {
    let plan = SearchPlan::build(&compile("log(\"hi\");"), None);
    assert!(plan.admits(&FileTokens::from_tree(&parse("log(\"hi\");\n"))));
    assert!(!plan.admits(&FileTokens::from_tree(&parse("log(hi);\n"))));
}

fn closed_hierarchy() -> TypeHierarchy {
    let mut hierarchy = TypeHierarchy::closed();
    hierarchy.add_supertype("Derived", "Base");
    hierarchy
}

#[rstest]
#[case("a.b(null);", "a.b(null);\nx.b(null);\n", None)]
#[case("a.b(null);", "A.B(NULL);\n", None)]
#[case("log(\"hello world\");", "log(\"hello world\");\n", None)]
#[case("log(\"hello world\");", "log(\"hello\");\n", None)]
#[case("foo('_x);", "// foo is called below\nfoo(1); /* trailing */\n", None)]
#[case("// note\nfoo();", "// note\nfoo();\n", None)]
#[case("class '_C { '_m{0,0}:constructor ('_p*) { '_s*; } }", "class B { run() { } }\n", None)]
#[case("{ '_a*; done(); '_b*?; }", "function f() { done(); }\n", None)]
#[case("new '_t:*Base ();", "new Derived();\nnew Other();\n", Some(closed_hierarchy()))]
#[case("new '_t:*Base ();", "new Base();\n", Some(closed_hierarchy()))]
#[case("new '_t:+Base ();", "new Derived();\n", Some(closed_hierarchy()))]
fn plans_admit_every_file_that_matches(
    #[case] pattern: &str,
    #[case] source: &str,
    #[case] hierarchy: Option<TypeHierarchy>,
) {
    let compiled = compile(pattern);
    let tree = parse(source);
    let plan = SearchPlan::build(&compiled, hierarchy.as_ref());
    let mut engine = Engine::new(typescript());
    if let Some(known) = hierarchy {
        engine = engine.with_hierarchy(known);
    }
    let found: Vec<_> = engine
        .search_tree(&tree, &compiled, &SearchOptions::default())
        .collect::<Result<_, _>>()
        .expect("search");
    if found.is_empty() {
        return;
    }
    assert!(
        plan.admits(&FileTokens::from_tree(&tree)),
        "{pattern:?} matched {source:?} but the token index was rejected"
    );
    assert!(
        plan.admits_source(source),
        "{pattern:?} matched {source:?} but the source text was rejected"
    );
}
