//! Unit tests for `sift_core` types.

mod config_tests;
mod match_tests;
mod tree_tests;
