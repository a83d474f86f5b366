//! Rendering of front-end errors.

use std::path::{Path, PathBuf};

use insta::assert_snapshot;
use sift_core::ProfileError;

use crate::{SupportedLanguage, SyntaxError};

#[test]
fn detection_errors_name_the_offending_input() {
    let unsupported = SupportedLanguage::detect(Path::new("notes.md")).expect_err("markdown");
    assert_snapshot!(unsupported.to_string(), @"unsupported file extension: md");

    let unknown = SupportedLanguage::detect(Path::new("Makefile")).expect_err("no extension");
    assert_snapshot!(unknown.to_string(), @"could not determine language for path: Makefile");
}

#[test]
fn parser_errors_name_the_language() {
    let init = SyntaxError::parser_init(SupportedLanguage::Python, "version mismatch");
    assert_snapshot!(init.to_string(), @"failed to initialise parser for python: version mismatch");

    let parse = SyntaxError::parse(SupportedLanguage::Rust, "timed out");
    assert_snapshot!(parse.to_string(), @"failed to parse rust: timed out");
}

#[test]
fn profile_errors_keep_the_rendered_message() {
    let error = ProfileError::from(SyntaxError::unknown_language(PathBuf::from("LICENSE")));
    assert_snapshot!(error.to_string(), @"could not determine language for path: LICENSE");
}
