//! Compilation, search, and engine configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cancel::CancellationToken;
use crate::profile::PatternContext;

/// Engine configuration controlling match limits and failure tolerance.
///
/// # Defaults
///
/// - `max_matches_per_file`: 10 000
/// - `max_capture_text_bytes`: 1 048 576 (1 MiB)
/// - `max_evaluation_failures`: 100
///
/// # Example
///
/// ```
/// use sift_core::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.max_matches_per_file(), 10_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of matches reported per file before truncation.
    max_matches_per_file: usize,
    /// Maximum bytes of source text copied into each owned capture.
    max_capture_text_bytes: usize,
    /// Local evaluation failures tolerated before a search is aborted.
    max_evaluation_failures: usize,
}

impl EngineConfig {
    /// Creates a new engine configuration with explicit values.
    #[must_use]
    pub const fn new(
        max_matches_per_file: usize,
        max_capture_text_bytes: usize,
        max_evaluation_failures: usize,
    ) -> Self {
        Self {
            max_matches_per_file,
            max_capture_text_bytes,
            max_evaluation_failures,
        }
    }

    /// Returns the maximum matches per file.
    #[must_use]
    pub const fn max_matches_per_file(&self) -> usize {
        self.max_matches_per_file
    }

    /// Returns the maximum capture text bytes.
    #[must_use]
    pub const fn max_capture_text_bytes(&self) -> usize {
        self.max_capture_text_bytes
    }

    /// Returns the number of local evaluation failures tolerated.
    #[must_use]
    pub const fn max_evaluation_failures(&self) -> usize {
        self.max_evaluation_failures
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_matches_per_file: 10_000,
            max_capture_text_bytes: 1_048_576,
            max_evaluation_failures: 100,
        }
    }
}

/// Range and constraint for a `$name$` variable, supplied outside the
/// pattern text.
///
/// # Example
///
/// ```
/// use sift_core::VariableSpec;
///
/// let spec = VariableSpec::new(0, None).with_constraint("[regex( get.* )]");
/// assert_eq!(spec.min(), 0);
/// assert!(spec.max().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariableSpec {
    min: u32,
    max: Option<u32>,
    greedy: bool,
    target: bool,
    constraint: Option<String>,
}

impl VariableSpec {
    /// Creates a greedy, non-target spec with the given range.
    #[must_use]
    pub const fn new(min: u32, max: Option<u32>) -> Self {
        Self {
            min,
            max,
            greedy: true,
            target: false,
            constraint: None,
        }
    }

    /// Attaches a constraint written in the suffix syntax, for example
    /// `[regex( foo )]` or `*Base`.
    #[must_use]
    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    /// Marks the variable as the search target.
    #[must_use]
    pub const fn with_target(mut self, target: bool) -> Self {
        self.target = target;
        self
    }

    /// Selects greedy or minimal consumption.
    #[must_use]
    pub const fn with_greedy(mut self, greedy: bool) -> Self {
        self.greedy = greedy;
        self
    }

    /// Returns the minimum occurrence count.
    #[must_use]
    pub const fn min(&self) -> u32 {
        self.min
    }

    /// Returns the maximum occurrence count, `None` meaning unbounded.
    #[must_use]
    pub const fn max(&self) -> Option<u32> {
        self.max
    }

    /// Returns whether the variable consumes greedily.
    #[must_use]
    pub const fn greedy(&self) -> bool {
        self.greedy
    }

    /// Returns whether the variable is a search target.
    #[must_use]
    pub const fn target(&self) -> bool {
        self.target
    }

    /// Returns the constraint text, if any.
    #[must_use]
    pub fn constraint(&self) -> Option<&str> {
        self.constraint.as_deref()
    }
}

impl Default for VariableSpec {
    fn default() -> Self {
        Self::new(1, Some(1))
    }
}

/// Options consumed by the pattern compiler.
///
/// # Example
///
/// ```
/// use sift_core::{CompileOptions, PatternContext};
///
/// let options = CompileOptions::default()
///     .with_context(PatternContext::Expression)
///     .with_case_sensitive(false);
/// assert_eq!(options.context(), PatternContext::Expression);
/// assert!(!options.case_sensitive());
/// assert!(!options.strict());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    context: PatternContext,
    case_sensitive: bool,
    strict: bool,
    variables: BTreeMap<String, VariableSpec>,
    context_constraint: Option<String>,
}

impl CompileOptions {
    /// Sets the pattern context.
    #[must_use]
    pub const fn with_context(mut self, context: PatternContext) -> Self {
        self.context = context;
        self
    }

    /// Sets literal and regex case sensitivity.
    #[must_use]
    pub const fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Enables applicability checks.
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Declares the range and constraint of a `$name$` variable.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, spec: VariableSpec) -> Self {
        self.variables.insert(name.into(), spec);
        self
    }

    /// Sets a constraint applied to the root of every complete match.
    #[must_use]
    pub fn with_context_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.context_constraint = Some(constraint.into());
        self
    }

    /// Returns the pattern context.
    #[must_use]
    pub const fn context(&self) -> PatternContext {
        self.context
    }

    /// Returns whether comparisons are case sensitive.
    #[must_use]
    pub const fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Returns whether applicability checks run.
    #[must_use]
    pub const fn strict(&self) -> bool {
        self.strict
    }

    /// Returns the declared `$name$` variables.
    #[must_use]
    pub const fn variables(&self) -> &BTreeMap<String, VariableSpec> {
        &self.variables
    }

    /// Returns the constraint on complete matches, if any.
    #[must_use]
    pub fn context_constraint(&self) -> Option<&str> {
        self.context_constraint.as_deref()
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            context: PatternContext::Default,
            case_sensitive: true,
            strict: false,
            variables: BTreeMap::new(),
            context_constraint: None,
        }
    }
}

/// Options consumed by the matcher.
///
/// # Example
///
/// ```
/// use sift_core::SearchOptions;
///
/// let options = SearchOptions::default().with_recursive_search(false);
/// assert!(!options.recursive_search());
/// assert!(!options.context_match());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    recursive_search: bool,
    context_match: bool,
    non_overlapping: bool,
    #[serde(skip)]
    cancellation: CancellationToken,
}

impl SearchOptions {
    /// Tries every node of the tree (`true`) or only the root's children.
    #[must_use]
    pub const fn with_recursive_search(mut self, recursive_search: bool) -> Self {
        self.recursive_search = recursive_search;
        self
    }

    /// Reports one result per match instead of one per bound target node.
    #[must_use]
    pub const fn with_context_match(mut self, context_match: bool) -> Self {
        self.context_match = context_match;
        self
    }

    /// Skips the subtrees of nodes that already matched.
    #[must_use]
    pub const fn with_non_overlapping(mut self, non_overlapping: bool) -> Self {
        self.non_overlapping = non_overlapping;
        self
    }

    /// Shares a cancellation token with the search.
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Returns whether every node is tried.
    #[must_use]
    pub const fn recursive_search(&self) -> bool {
        self.recursive_search
    }

    /// Returns whether results are reported per match.
    #[must_use]
    pub const fn context_match(&self) -> bool {
        self.context_match
    }

    /// Returns whether matched subtrees are skipped.
    #[must_use]
    pub const fn non_overlapping(&self) -> bool {
        self.non_overlapping
    }

    /// Returns the cancellation token.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            recursive_search: true,
            context_match: false,
            non_overlapping: false,
            cancellation: CancellationToken::new(),
        }
    }
}
