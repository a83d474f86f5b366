//! Behaviour-driven tests for structural matching.

use std::str::FromStr;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use sift_core::{CompileOptions, DiagnosticCode, SearchOptions};

use super::{parse, typescript};
use crate::{CompiledPattern, find_all};

// ---------------------------------------------------------------------------
// Typed wrappers for Gherkin step parameters
// ---------------------------------------------------------------------------

/// A quoted value from a feature file, with `\n` read as a newline.
#[derive(Debug, Clone, PartialEq, Eq)]
struct QuotedString(String);

impl FromStr for QuotedString {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim_matches('"').replace("\\n", "\n")))
    }
}

impl QuotedString {
    fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Test world
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TestWorld {
    source: Option<String>,
    pattern: Option<String>,
    options: CompileOptions,
    images: Vec<String>,
    error: Option<DiagnosticCode>,
}

#[fixture]
fn world() -> TestWorld {
    TestWorld::default()
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("the TypeScript source {source}")]
fn given_source(world: &mut TestWorld, source: QuotedString) {
    world.source = Some(source.as_str().to_owned());
}

#[given("the pattern {pattern}")]
fn given_pattern(world: &mut TestWorld, pattern: QuotedString) {
    world.pattern = Some(pattern.as_str().to_owned());
}

#[given("case-insensitive matching")]
fn given_case_insensitive(world: &mut TestWorld) {
    world.options = world.options.clone().with_case_sensitive(false);
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("the pattern is searched for")]
fn when_searched(world: &mut TestWorld) {
    let text = world.pattern.as_deref().expect("pattern should be set");
    let source = world.source.as_deref().expect("source should be set");
    let pattern = CompiledPattern::compile(text, typescript(), &world.options)
        .unwrap_or_else(|err| panic!("pattern should compile: {err}"));
    let tree = parse(source);
    world.images = find_all(&tree, &pattern, &SearchOptions::default())
        .expect("search should succeed")
        .iter()
        .map(|found| found.image().to_owned())
        .collect();
}

#[when("the pattern is compiled")]
fn when_compiled(world: &mut TestWorld) {
    let text = world.pattern.as_deref().expect("pattern should be set");
    world.error = CompiledPattern::compile(text, typescript(), &world.options)
        .err()
        .map(|err| err.code());
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("there are {count} matches")]
fn then_match_count(world: &mut TestWorld, count: usize) {
    assert_eq!(
        world.images.len(),
        count,
        "unexpected matches: {:?}",
        world.images
    );
}

#[then("the first match is {image}")]
fn then_first_match(world: &mut TestWorld, image: QuotedString) {
    assert_eq!(
        world.images.first().map(String::as_str),
        Some(image.as_str())
    );
}

#[then("compilation fails with {code}")]
fn then_compilation_fails(world: &mut TestWorld, code: QuotedString) {
    let actual = world.error.expect("compilation should have failed");
    assert_eq!(actual.to_string(), code.as_str());
}

// ---------------------------------------------------------------------------
// Scenario registration
// ---------------------------------------------------------------------------

#[scenario(path = "tests/features/matching.feature")]
fn matching_behaviour(world: TestWorld) {
    let _ = world;
}
