//! Sift: structural search over syntax trees.
//!
//! A query describes a shape of syntax with named placeholders, occurrence
//! ranges and constraints. Sift compiles it against a [`LanguageProfile`],
//! then finds every subtree of a parsed program with that shape.
//!
//! The pipeline has four stages:
//!
//! - [`CompiledPattern::compile`] turns query text into an immutable pattern
//!   tree with a variable table;
//! - [`SearchPlan::build`] derives the words any matching file must contain;
//! - [`find_matches`] backtracks the pattern over every node of a tree and
//!   yields [`MatchResult`]s lazily;
//! - [`match_by_down_up`] matches from a known node outward instead.
//!
//! [`Engine`] ties these together for callers that hold source text rather
//! than trees, and searches many files in parallel.
//!
//! # Query syntax
//!
//! | Form | Meaning |
//! | --- | --- |
//! | `'name` | target variable, reported per bound node |
//! | `'_name` | anonymous variable |
//! | `'_` | independent wildcard |
//! | `'x*`, `'x+`, `'x?`, `'x{1,3}` | occurrence range, greedy |
//! | `'x*?`, `'x{1,3}?` | non-greedy occurrence range |
//! | `'x:regex`, `'x:*Type`, `'x:+Type` | text and hierarchy shorthands |
//! | `'x:[ exprtype( T ) && !regex( a.* ) ]` | predicate expression |
//! | `$name$` | variable configured through [`CompileOptions`] |

mod down_up;
mod engine;
mod evaluate;
mod matcher;
mod pattern;
mod plan;
mod script;

pub use sift_core::{
    CancellationToken, CaptureValue, CapturedNode, ChildMatching, CompileOptions, Diagnostic,
    DiagnosticCode, EngineConfig, EvaluationFailure, LanguageProfile, LineCol,
    MalformedPatternError, Match, Node, PatternContext, PlaceholderRole, SearchError,
    SearchOptions, Severity, SourceSpan, Span, TokenCategory, Tree, TypeHierarchy, VariableSpec,
};

pub use down_up::match_by_down_up;
pub use engine::{Engine, FileMatches, SourceFile};
pub use matcher::{Capture, MatchResult, Matches, find_all, find_matches};
pub use pattern::{
    CompiledPattern, Constraint, ConstraintExpr, Hierarchy, Occurs, PatternNode, Slot,
    TextPattern, VarId, Variable,
};
pub use plan::{FileTokens, SearchPlan};
pub use script::{
    BuiltinEvaluator, CONTEXT_VARIABLE, NodeValue, ScriptError, ScriptEvaluator, ScriptScope,
    ScriptValue,
};

#[cfg(test)]
mod tests;
