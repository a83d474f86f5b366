//! Tests for configuration types.

use crate::{CompileOptions, EngineConfig, PatternContext, SearchOptions, VariableSpec};

#[test]
fn engine_config_defaults() {
    let config = EngineConfig::default();
    assert_eq!(config.max_matches_per_file(), 10_000);
    assert_eq!(config.max_capture_text_bytes(), 1_048_576);
    assert_eq!(config.max_evaluation_failures(), 100);
}

#[test]
fn compile_options_deserialise_with_defaults() {
    let options: CompileOptions =
        serde_json::from_str(r#"{"context":"member","strict":true}"#).expect("deserialise");
    assert_eq!(options.context(), PatternContext::Member);
    assert!(options.strict());
    assert!(options.case_sensitive());
    assert!(options.variables().is_empty());
}

#[test]
fn compile_options_carry_variables() {
    let options = CompileOptions::default()
        .with_variable("args", VariableSpec::new(0, None).with_target(true))
        .with_context_constraint("[regex( foo.* )]");
    let spec = options.variables().get("args").expect("spec");
    assert!(spec.target());
    assert_eq!(options.context_constraint(), Some("[regex( foo.* )]"));
}

#[test]
fn search_options_skip_the_token_when_serialised() {
    let options = SearchOptions::default().with_non_overlapping(true);
    let json = serde_json::to_string(&options).expect("serialise");
    assert_eq!(
        json,
        r#"{"recursive_search":true,"context_match":false,"non_overlapping":true}"#
    );
}

#[test]
fn pattern_context_parses_aliases() {
    assert_eq!("stmt".parse::<PatternContext>(), Ok(PatternContext::Statement));
    assert_eq!("Expression".parse::<PatternContext>(), Ok(PatternContext::Expression));
    assert!("module".parse::<PatternContext>().is_err());
}

#[test]
fn search_options_share_cancellation() {
    let options = SearchOptions::default();
    let copy = options.clone();
    options.cancellation().cancel();
    assert!(copy.cancellation().is_cancelled());
}
