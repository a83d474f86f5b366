//! Tests for the built-in script evaluator.

use rstest::{fixture, rstest};

use crate::{BuiltinEvaluator, NodeValue, ScriptError, ScriptEvaluator, ScriptScope, ScriptValue};

#[fixture]
fn scope() -> ScriptScope {
    let mut scope = ScriptScope::new();
    scope.insert(
        "name",
        ScriptValue::Node(NodeValue {
            text: "getName".to_owned(),
            kind: "property_identifier".to_owned(),
            count: 1,
        }),
    );
    scope.insert(
        "args",
        ScriptValue::Node(NodeValue {
            text: "a, b".to_owned(),
            kind: "identifier".to_owned(),
            count: 2,
        }),
    );
    scope.insert("missing", ScriptValue::Null);
    scope
}

#[rstest]
#[case("name.text.startsWith(\"get\")", true)]
#[case("name.text.endsWith('Name') && args.count <= 2", true)]
#[case("name.kind == \"identifier\"", false)]
#[case("name == \"getName\"", true)]
#[case("args.count + 1 == 3", true)]
#[case("name.length > 10 || args.text.contains(\",\")", true)]
#[case("!name.text.matches(\"^set\")", true)]
#[case("missing.text == null", true)]
#[case("true || undefinedName", true)]
#[case("-args.count < 0", true)]
fn evaluates_expressions(scope: ScriptScope, #[case] script: &str, #[case] expected: bool) {
    let result = BuiltinEvaluator
        .evaluate(script, &scope)
        .unwrap_or_else(|err| panic!("{script:?} should evaluate: {err}"));
    assert_eq!(result, expected);
}

#[rstest]
#[case("args.count > \"a\"", "cannot order")]
#[case("undefinedName", "unknown identifier")]
#[case("name.text", "instead of a boolean")]
#[case("name.text.shout(\"x\")", "unknown method")]
#[case("args.count.text", "has no property")]
fn reports_local_failures(scope: ScriptScope, #[case] script: &str, #[case] message: &str) {
    let err = BuiltinEvaluator
        .evaluate(script, &scope)
        .expect_err("script should fail");
    let ScriptError::Failed(text) = err else {
        panic!("expected a local failure, got {err:?}");
    };
    assert!(text.contains(message), "{text:?} should mention {message:?}");
}

#[rstest]
#[case("1 +")]
#[case("")]
#[case("(a")]
#[case("\"open")]
#[case("a # b")]
#[case("99999999999999999999 > 1")]
fn rejects_malformed_scripts(#[case] script: &str) {
    assert!(BuiltinEvaluator.validate(script).is_err());
}

#[test]
fn rejects_deep_nesting() {
    let script = format!("{}true{}", "(".repeat(100), ")".repeat(100));
    assert!(BuiltinEvaluator.validate(&script).is_err());
}

#[rstest]
fn scope_iterates_in_name_order(scope: ScriptScope) {
    let names: Vec<_> = scope.iter().map(|(name, _)| name.to_owned()).collect();
    assert_eq!(names, ["args", "missing", "name"]);
}
