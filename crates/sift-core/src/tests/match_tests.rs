//! Tests for the owned [`Match`] type.

use std::collections::BTreeMap;

use crate::{CaptureValue, CapturedNode, LineCol, Match, Span};

fn sample_span() -> Span {
    Span::new(12, 42, LineCol::new(2, 0), LineCol::new(4, 0))
}

#[test]
fn match_exposes_captures_by_name() {
    let focus = Span::new(18, 26, LineCol::new(3, 6), LineCol::new(3, 14));
    let mut captures = BTreeMap::new();
    captures.insert(
        String::from("T"),
        CaptureValue::Nodes(vec![CapturedNode::new(
            focus.clone(),
            String::from("expression_statement"),
            Some(String::from("a = 1;")),
        )]),
    );
    let m = Match::new(
        String::from("file:///lib.ts"),
        sample_span(),
        String::from("{ a = 1; }"),
        Some(focus),
        captures,
    );
    let capture = m.capture("T").expect("capture");
    assert_eq!(capture.nodes().len(), 1);
    assert!(m.capture("U").is_none());
    assert_eq!(m.target().map(Span::start_byte), Some(18));
}

#[test]
fn match_serde_round_trip() {
    let m = Match::new(
        String::from("file:///test.ts"),
        sample_span(),
        String::from("x"),
        None,
        BTreeMap::new(),
    );
    let json = serde_json::to_string(&m).expect("serialise");
    let back: Match = serde_json::from_str(&json).expect("deserialise");
    assert_eq!(back, m);
}

#[test]
fn capture_value_is_tagged() {
    let value = CaptureValue::Node(CapturedNode::new(
        Span::new(0, 1, LineCol::new(0, 0), LineCol::new(0, 1)),
        String::from("identifier"),
        None,
    ));
    let json = serde_json::to_string(&value).expect("serialise");
    assert!(json.starts_with(r#"{"kind":"node","value":"#), "{json}");
}
