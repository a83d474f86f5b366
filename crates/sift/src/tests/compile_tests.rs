//! Pattern compilation: variable tables, diagnostics and strict warnings.

use rstest::rstest;
use sift_core::{CompileOptions, DiagnosticCode, PatternContext, Severity, VariableSpec};

use super::{compile, compile_with, images, typescript};
use crate::{CompiledPattern, Occurs, PatternNode};

fn compile_error(pattern: &str) -> DiagnosticCode {
    CompiledPattern::compile(pattern, typescript(), &CompileOptions::default())
        .map(|_| ())
        .expect_err("pattern should be rejected")
        .code()
}

fn strict_warnings(pattern: &str) -> Vec<DiagnosticCode> {
    compile_with(pattern, &CompileOptions::default().with_strict(true))
        .warnings()
        .iter()
        .map(|warning| warning.code())
        .collect()
}

#[rstest]
#[case("", DiagnosticCode::ESiftEmptyPattern)]
#[case("   \n", DiagnosticCode::ESiftEmptyPattern)]
#[case("'_x{3,1};", DiagnosticCode::ESiftRangeInvalid)]
#[case("'_x:[bogus(1)];", DiagnosticCode::ESiftUnknownConstraint)]
#[case("'_x:[regex(\"(\")];", DiagnosticCode::ESiftRegexInvalid)]
#[case("'_x:a = '_x:b;", DiagnosticCode::ESiftConflictingConstraints)]
#[case("'_x:[script( 1 + )];", DiagnosticCode::ESiftScriptInvalid)]
#[case("'_x:[within(\"class {\")];", DiagnosticCode::ESiftSubPatternInvalid)]
#[case("'_x:[sameas(nope)];", DiagnosticCode::ESiftConstraintSyntax)]
#[case("foo(;", DiagnosticCode::ESiftPatternParse)]
#[case("// '_x\nfoo();", DiagnosticCode::ESiftPlaceholderSyntax)]
fn rejects_malformed_patterns(#[case] pattern: &str, #[case] expected: DiagnosticCode) {
    assert_eq!(compile_error(pattern), expected);
}

#[test]
fn unknown_constraint_names_the_predicate_and_its_location() {
    let err = CompiledPattern::compile("'_x:[bogus(1)];", typescript(), &CompileOptions::default())
        .map(|_| ())
        .expect_err("unknown predicate");
    let diagnostic = err.diagnostic();
    assert_eq!(diagnostic.severity(), Severity::Error);
    assert!(diagnostic.message().contains("bogus"));
    let span = diagnostic.span().expect("located diagnostic");
    assert_eq!((span.start(), span.end()), (5, 10));
}

#[rstest]
#[case("'_x* = 1;", DiagnosticCode::WSiftUnboundedSingleSlot)]
#[case("'_x? = 1;", DiagnosticCode::WSiftOptionalMandatorySlot)]
#[case("'_T{0,0};", DiagnosticCode::WSiftAbsentPattern)]
#[case("{ 'T{0,0}; }", DiagnosticCode::WSiftTargetNeverBinds)]
fn strict_mode_reports_useless_slots(#[case] pattern: &str, #[case] expected: DiagnosticCode) {
    let warnings = strict_warnings(pattern);
    assert!(
        warnings.contains(&expected),
        "{pattern:?} produced {warnings:?}"
    );
}

#[test]
fn lenient_mode_has_no_warnings() {
    assert!(compile("'_x* = 1;").warnings().is_empty());
}

#[test]
fn variable_table_records_kinds_and_ranges() {
    let pattern = compile("'C('_m*?, '_, '_);");
    let target = pattern
        .variable_named("C")
        .and_then(|id| pattern.variable(id))
        .expect("target variable");
    assert!(target.is_target());
    assert!(!target.is_anonymous());

    let member = pattern
        .variable_named("_m")
        .and_then(|id| pattern.variable(id))
        .expect("anonymous variable");
    assert!(member.is_anonymous());
    assert_eq!(
        member.occurs(),
        Occurs {
            min: 0,
            max: None,
            greedy: false,
        }
    );

    let wildcards = pattern
        .variables()
        .iter()
        .filter(|variable| variable.is_wildcard())
        .count();
    assert_eq!(wildcards, 2);
}

#[test]
fn plain_statement_lowers_to_one_structured_slot() {
    let pattern = compile("a.b(null);");
    let [slot] = pattern.slots() else {
        panic!("expected one slot, got {}", pattern.slots().len());
    };
    assert_eq!(slot.occurs, Occurs::ONE);
    assert!(matches!(slot.node, PatternNode::Structured { .. }));
    assert!(!pattern.is_multi_slot());
    assert!(compile("a(); b();").is_multi_slot());
}

#[test]
fn quotes_inside_strings_are_not_placeholders() {
    let pattern = compile("log('it', 's');");
    assert!(pattern.variables().is_empty());
}

#[test]
fn external_variables_take_their_configuration_from_options() {
    let options = CompileOptions::default()
        .with_variable("x", VariableSpec::new(1, Some(1)).with_constraint("foo"));
    let pattern = compile_with("$x$ = 1;", &options);
    assert_eq!(images(&pattern, "foo = 1;\nbar = 1;\n"), ["foo = 1;"]);
}

#[test]
fn inline_quantifier_overrides_external_range() {
    let options = CompileOptions::default().with_variable("x", VariableSpec::new(1, Some(1)));
    let pattern = compile_with("f($x$*);", &options);
    let variable = pattern
        .variable_named("x")
        .and_then(|id| pattern.variable(id))
        .expect("external variable");
    assert_eq!((variable.min(), variable.max()), (0, None));
}

#[test]
fn class_member_context_parses_bare_members() {
    let options = CompileOptions::default().with_context(PatternContext::Member);
    let pattern = compile_with("run() { '_s*; }", &options);
    let source = "class A { run() { go(); } stop() { } }\n";
    assert_eq!(images(&pattern, source), ["run() { go(); }"]);
}
