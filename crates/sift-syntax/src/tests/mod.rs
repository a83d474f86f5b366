//! Unit tests for the bundled profiles.

mod error_tests;
mod semantics_tests;
mod snippet_tests;
