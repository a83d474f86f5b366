//! Core data model for the Sift structural search engine.
//!
//! This crate holds the types shared by the pattern compiler, the matcher,
//! and language profiles: the read-only syntax [`Tree`], the
//! [`LanguageProfile`] capability trait, the [`TypeHierarchy`], diagnostics,
//! configuration, cancellation, and the owned [`Match`] result. It contains
//! no parser and no matching logic.
//!
//! # Core types
//!
//! - [`Tree`], [`Node`] and [`TreeBuilder`]: the arena syntax tree
//! - [`LanguageProfile`]: language knowledge injected into the engine
//! - [`CompileOptions`], [`SearchOptions`] and [`EngineConfig`]
//! - [`MalformedPatternError`] and [`SearchError`]: failure reporting
//! - [`Match`] and [`CaptureValue`]: owned, serialisable results
//!
//! # Example
//!
//! ```
//! use sift_core::{NodeSpec, TreeBuilder};
//!
//! let mut builder = TreeBuilder::new("x");
//! builder.leaf(NodeSpec::new("identifier", 0..1))?;
//! let tree = builder.finish()?;
//! assert_eq!(tree.root_node().text(), "x");
//! # Ok::<(), sift_core::TreeError>(())
//! ```

mod cancel;
mod capture;
mod config;
mod diagnostic;
mod error;
mod hierarchy;
mod match_result;
mod profile;
mod span;
mod tree;

pub use cancel::CancellationToken;
pub use capture::{CaptureValue, CapturedNode};
pub use config::{CompileOptions, EngineConfig, SearchOptions, VariableSpec};
pub use diagnostic::{Diagnostic, DiagnosticCode, MalformedPatternError, Severity, SourceSpan};
pub use error::{EvaluationFailure, SearchError};
pub use hierarchy::TypeHierarchy;
pub use match_result::Match;
pub use profile::{
    ChildMatching, LanguageProfile, PatternContext, PatternContextParseError, PlaceholderRole,
    ProfileError, Snippet,
};
pub use span::{LineCol, Span};
pub use tree::{Descendants, Node, NodeId, NodeSpec, TokenCategory, Tree, TreeBuilder, TreeError};

#[cfg(test)]
mod tests;
