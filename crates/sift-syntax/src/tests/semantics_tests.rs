//! Static types, modifiers, name resolution and the type hierarchy.

use rstest::{fixture, rstest};
use sift_core::{ChildMatching, LanguageProfile, Node, Tree};

use crate::{SupportedLanguage, TreeSitterProfile};

#[fixture]
fn typescript() -> TreeSitterProfile {
    SupportedLanguage::TypeScript.profile()
}

fn parse(profile: &TreeSitterProfile, source: &str) -> Tree {
    profile.parse(source).expect("source parses")
}

fn find<'t>(tree: &'t Tree, kind: &str, text: &str) -> Node<'t> {
    tree.root_node()
        .descendants()
        .find(|node| node.kind() == kind && node.text() == text)
        .unwrap_or_else(|| panic!("no {kind} node with text {text:?}"))
}

fn first_of_kind<'t>(tree: &'t Tree, kind: &str) -> Node<'t> {
    tree.root_node()
        .descendants()
        .find(|node| node.kind() == kind)
        .unwrap_or_else(|| panic!("no {kind} node"))
}

#[rstest]
fn static_types_follow_declarations(typescript: TreeSitterProfile) {
    let tree = parse(
        &typescript,
        concat!(
            "let x: Foo = make();\n",
            "let y = 1;\n",
            "let z = new Map<string, number>();\n",
            "function mk(): Bar { return null; }\n",
            "let w = mk();\n",
            "call(x, y, z, w);\n",
        ),
    );
    let arguments = find(&tree, "arguments", "(x, y, z, w)");
    let types: Vec<_> = arguments
        .named_children()
        .map(|arg| typescript.static_type(arg))
        .collect();
    assert_eq!(
        types,
        [
            Some(String::from("Foo")),
            Some(String::from("number")),
            Some(String::from("Map<string, number>")),
            Some(String::from("Bar")),
        ]
    );
}

#[rstest]
fn unknown_expressions_have_no_type(typescript: TreeSitterProfile) {
    let tree = parse(&typescript, "call(unknown);");
    let arg = find(&tree, "identifier", "unknown");
    assert_eq!(typescript.static_type(arg), None);
}

#[rstest]
fn modifiers_include_implicit_public_and_export(typescript: TreeSitterProfile) {
    let tree = parse(
        &typescript,
        "export class A { private static x = 1; foo() {} }",
    );
    let field = first_of_kind(&tree, "public_field_definition");
    assert_eq!(typescript.modifiers(field), ["private", "static"]);

    let method = first_of_kind(&tree, "method_definition");
    assert_eq!(typescript.modifiers(method), ["public"]);

    let class = first_of_kind(&tree, "class_declaration");
    assert!(typescript.modifiers(class).contains(&String::from("export")));
}

#[rstest]
fn resolve_prefers_the_innermost_scope(typescript: TreeSitterProfile) {
    let tree = parse(&typescript, "let a = 1;\nfunction f(a) { return a; }");
    let usage = tree
        .root_node()
        .descendants()
        .filter(|node| node.kind() == "identifier" && node.text() == "a")
        .last()
        .expect("usage");
    let declaration = typescript.resolve(usage).expect("resolved");
    assert_eq!(declaration.kind(), "required_parameter");
}

#[rstest]
fn hierarchy_collects_extends_and_implements(typescript: TreeSitterProfile) {
    let tree = parse(
        &typescript,
        concat!(
            "class A {}\n",
            "class B extends A {}\n",
            "class C extends B implements I {}\n",
            "interface J extends I {}\n",
        ),
    );
    let hierarchy = typescript.type_hierarchy(&tree);
    let sups: Vec<_> = hierarchy.supertypes_of("C").into_iter().collect();
    assert_eq!(sups, ["A", "B", "I"]);
    assert!(hierarchy.is_subtype("J", "I", true));
    assert!(!hierarchy.is_subtype("A", "B", false));
}

#[rstest]
#[case("class_body", ChildMatching::Unordered)]
#[case("try_statement", ChildMatching::Lenient(&["catch_clause", "finally_clause"]))]
#[case("arguments", ChildMatching::Ordered)]
fn child_matching_per_kind(
    typescript: TreeSitterProfile,
    #[case] kind: &str,
    #[case] expected: ChildMatching,
) {
    assert_eq!(typescript.child_matching(kind), expected);
}

#[rstest]
fn identifier_kinds_are_compatible(typescript: TreeSitterProfile) {
    assert!(typescript.kinds_compatible("identifier", "property_identifier"));
    assert!(!typescript.kinds_compatible("identifier", "number"));
    assert!(typescript.is_statement("lexical_declaration"));
    assert!(typescript.is_member("method_definition"));
}

#[test]
fn rust_static_types_use_literal_suffixes() {
    let profile = SupportedLanguage::Rust.profile();
    let tree = parse(&profile, "fn main() { let n = 5u8; let s = \"x\"; take(n, s); }");
    let arguments = find(&tree, "arguments", "(n, s)");
    let types: Vec<_> = arguments
        .named_children()
        .filter_map(|arg| profile.static_type(arg))
        .collect();
    assert_eq!(types, ["u8", "&str"]);
}

#[test]
fn python_hierarchy_reads_superclasses() {
    let profile = SupportedLanguage::Python.profile();
    let tree = parse(&profile, "class Base:\n    pass\n\nclass Child(Base):\n    pass\n");
    assert!(profile.type_hierarchy(&tree).is_subtype("Child", "Base", true));
}
