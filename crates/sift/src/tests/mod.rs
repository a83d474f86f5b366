//! Unit and behaviour tests for the Sift engine, written against the
//! TypeScript profile.

mod behaviour;
mod compile_tests;
mod engine_tests;
mod matcher_tests;
mod plan_tests;
mod script_tests;

use std::sync::Arc;

use sift_core::{CompileOptions, LanguageProfile, SearchOptions, Tree};
use sift_syntax::SupportedLanguage;

use crate::{CompiledPattern, find_all};

/// Returns the TypeScript profile behind an `Arc`.
pub(super) fn typescript() -> Arc<dyn LanguageProfile> {
    Arc::new(SupportedLanguage::TypeScript.profile())
}

pub(super) fn parse(source: &str) -> Tree {
    typescript()
        .parse(source)
        .unwrap_or_else(|err| panic!("source should parse: {err}"))
}

pub(super) fn compile(pattern: &str) -> CompiledPattern {
    compile_with(pattern, &CompileOptions::default())
}

pub(super) fn compile_with(pattern: &str, options: &CompileOptions) -> CompiledPattern {
    CompiledPattern::compile(pattern, typescript(), options)
        .unwrap_or_else(|err| panic!("pattern {pattern:?} should compile: {err}"))
}

/// Returns the images of every match of `pattern` in `source`.
pub(super) fn images(pattern: &CompiledPattern, source: &str) -> Vec<String> {
    let tree = parse(source);
    find_all(&tree, pattern, &SearchOptions::default())
        .unwrap_or_else(|err| panic!("search should succeed: {err}"))
        .iter()
        .map(|found| found.image().to_owned())
        .collect()
}

pub(super) fn count(pattern: &str, source: &str) -> usize {
    images(&compile(pattern), source).len()
}
