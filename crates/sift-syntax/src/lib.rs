//! Tree-sitter language profiles for the Sift structural search engine.
//!
//! This crate supplies the parsing half of a [`sift_core::LanguageProfile`]:
//!
//! - **Parsing** via [`Parser`], which converts Tree-sitter trees into the
//!   owned, thread-safe [`sift_core::Tree`]
//! - **Pattern snippets** parsed in a caller-chosen
//!   [`sift_core::PatternContext`], wrapped in a class or function body when
//!   they are not valid at the top level
//! - **Language knowledge** via [`TreeSitterProfile`]: statement and member
//!   kinds, order-insensitive child lists, static types, modifiers, name
//!   resolution and the type hierarchy
//!
//! # Supported Languages
//!
//! - TypeScript (`.ts`, `.tsx`, `.mts`, `.cts`)
//! - Rust (`.rs`)
//! - Python (`.py`, `.pyi`)
//!
//! # Example
//!
//! ```
//! use sift_core::LanguageProfile;
//! use sift_syntax::SupportedLanguage;
//!
//! let profile = SupportedLanguage::TypeScript.profile();
//! let tree = profile.parse("let x: number = 1;")?;
//! assert_eq!(tree.root_node().kind(), "program");
//! # Ok::<(), sift_core::ProfileError>(())
//! ```

mod error;
mod language;
mod parser;
mod profile;

pub use error::SyntaxError;
pub use language::{LanguageParseError, SupportedLanguage};
pub use parser::{ParseResult, Parser, SyntaxErrorInfo};
pub use profile::TreeSitterProfile;

#[cfg(test)]
mod tests;
