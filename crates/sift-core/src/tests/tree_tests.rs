//! Tests for the arena [`Tree`] and its builder.

use rstest::{fixture, rstest};

use crate::{LineCol, NodeSpec, TokenCategory, Tree, TreeBuilder, TreeError};

/// `f(a, /* b */ c)` as a call with an argument list.
#[fixture]
fn call_tree() -> Tree {
    let source = "f(a, /* b */ c)";
    let mut builder = TreeBuilder::new(source);
    builder.open(NodeSpec::new("call", 0..15)).expect("root");
    builder
        .leaf(NodeSpec::new("identifier", 0..1).with_field(Some("function")))
        .expect("callee");
    builder
        .open(NodeSpec::new("arguments", 1..15).with_field(Some("arguments")))
        .expect("arguments");
    builder.leaf(NodeSpec::new("(", 1..2).anonymous()).expect("(");
    builder.leaf(NodeSpec::new("identifier", 2..3)).expect("a");
    builder.leaf(NodeSpec::new(",", 3..4).anonymous()).expect(",");
    builder
        .leaf(NodeSpec::new("comment", 5..12).with_category(TokenCategory::Comment))
        .expect("comment");
    builder.leaf(NodeSpec::new("identifier", 13..14)).expect("c");
    builder.leaf(NodeSpec::new(")", 14..15).anonymous()).expect(")");
    builder.close().expect("close arguments");
    builder.close().expect("close call");
    builder.finish().expect("finish")
}

#[rstest]
fn descendants_are_pre_order(call_tree: Tree) {
    let kinds: Vec<_> = call_tree
        .root_node()
        .descendants()
        .map(|node| node.kind())
        .collect();
    assert_eq!(
        kinds,
        [
            "call",
            "identifier",
            "arguments",
            "(",
            "identifier",
            ",",
            "comment",
            "identifier",
            ")"
        ]
    );
}

#[rstest]
fn child_by_field_finds_named_slots(call_tree: Tree) {
    let root = call_tree.root_node();
    let callee = root.child_by_field("function").expect("callee");
    assert_eq!(callee.text(), "f");
    assert!(root.child_by_field("body").is_none());
}

#[rstest]
fn ancestors_walk_to_the_root(call_tree: Tree) {
    let c = call_tree
        .root_node()
        .descendants()
        .find(|node| node.text() == "c")
        .expect("c");
    let kinds: Vec<_> = c.ancestors().map(|node| node.kind()).collect();
    assert_eq!(kinds, ["arguments", "call"]);
    assert!(call_tree.root_node().is_ancestor_of(c));
    assert!(!c.is_ancestor_of(call_tree.root_node()));
}

#[rstest]
fn named_children_skip_tokens(call_tree: Tree) {
    let arguments = call_tree
        .root_node()
        .child_by_field("arguments")
        .expect("arguments");
    let texts: Vec<_> = arguments.named_children().map(|node| node.text()).collect();
    assert_eq!(texts, ["a", "/* b */", "c"]);
}

#[test]
fn positions_track_lines() {
    let mut builder = TreeBuilder::new("a\nbc\nd");
    builder.leaf(NodeSpec::new("text", 0..6)).expect("root");
    let tree = builder.finish().expect("finish");
    assert_eq!(tree.position(0), LineCol::new(0, 0));
    assert_eq!(tree.position(3), LineCol::new(1, 1));
    assert_eq!(tree.position(5), LineCol::new(2, 0));
    let span = tree.span(2..4);
    assert_eq!(span.start(), &LineCol::new(1, 0));
    assert_eq!(span.end(), &LineCol::new(1, 2));
}

#[test]
fn builder_rejects_out_of_bounds_ranges() {
    let mut builder = TreeBuilder::new("ab");
    let err = builder.leaf(NodeSpec::new("x", 0..3)).expect_err("out of bounds");
    assert_eq!(
        err,
        TreeError::OutOfBounds {
            start: 0,
            end: 3,
            len: 2
        }
    );
}

#[test]
fn builder_rejects_second_root_and_unclosed_nodes() {
    let mut builder = TreeBuilder::new("ab");
    builder.leaf(NodeSpec::new("x", 0..1)).expect("root");
    assert_eq!(
        builder.leaf(NodeSpec::new("y", 1..2)),
        Err(TreeError::SecondRoot)
    );

    let mut unclosed = TreeBuilder::new("ab");
    unclosed.open(NodeSpec::new("x", 0..2)).expect("open");
    assert_eq!(unclosed.finish().map(|_| ()), Err(TreeError::Unclosed(1)));
    assert_eq!(
        TreeBuilder::new("").finish().map(|_| ()),
        Err(TreeError::Empty)
    );
}

#[test]
fn error_nodes_are_reported() {
    let mut builder = TreeBuilder::new("(");
    builder.open(NodeSpec::new("program", 0..1)).expect("root");
    builder
        .leaf(NodeSpec::new("ERROR", 0..1).with_error(true))
        .expect("error");
    builder.close().expect("close");
    assert!(builder.finish().expect("finish").has_errors());
}
