//! The engine facade.
//!
//! An [`Engine`] bundles a language profile, a script evaluator, limits and
//! an optional known type hierarchy. Compilation and execution are separate
//! phases, so one [`CompiledPattern`] can be searched for in many files.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sift_core::{
    CompileOptions, EngineConfig, EvaluationFailure, LanguageProfile, MalformedPatternError,
    Match, Node, SearchError, SearchOptions, Tree, TypeHierarchy,
};
use tracing::debug;

use crate::down_up::climb;
use crate::matcher::{MatchResult, Matches, SearchContext, find_matches};
use crate::pattern::CompiledPattern;
use crate::plan::{FileTokens, SearchPlan};
use crate::script::{BuiltinEvaluator, ScriptEvaluator};

/// A named source text to search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Identifier reported in matches, usually a path.
    pub uri: String,
    /// The file contents.
    pub source: String,
}

impl SourceFile {
    /// Creates a source file.
    #[must_use]
    pub fn new(uri: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            source: source.into(),
        }
    }
}

/// The outcome of searching one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMatches {
    /// The searched file.
    pub uri: String,
    /// Matches in source order.
    pub matches: Vec<Match>,
    /// Constraint evaluations that failed and were treated as no match.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<EvaluationFailure>,
}

impl FileMatches {
    fn empty(uri: &str) -> Self {
        Self {
            uri: uri.to_owned(),
            ..Self::default()
        }
    }
}

/// Compiles patterns and runs them against source files.
///
/// # Example
///
/// ```ignore
/// let engine = Engine::new(SupportedLanguage::TypeScript.profile());
/// let pattern = engine.compile("a.b(null);", &CompileOptions::default())?;
/// let found = engine.search_source("a.ts", "a.b(null);", &pattern, &SearchOptions::default())?;
/// assert_eq!(found.matches.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    profile: Arc<dyn LanguageProfile>,
    evaluator: Arc<dyn ScriptEvaluator>,
    config: EngineConfig,
    hierarchy: Option<Arc<TypeHierarchy>>,
}

impl Engine {
    /// Creates an engine for `profile` with the built-in script evaluator
    /// and default limits.
    #[must_use]
    pub fn new(profile: Arc<dyn LanguageProfile>) -> Self {
        Self {
            profile,
            evaluator: Arc::new(BuiltinEvaluator),
            config: EngineConfig::default(),
            hierarchy: None,
        }
    }

    /// Replaces the script evaluator used by `script(...)` constraints.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Arc<dyn ScriptEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Replaces the limits.
    #[must_use]
    pub const fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses a known type hierarchy instead of collecting one per file.
    ///
    /// A closed hierarchy also lets search plans filter on subtype names.
    #[must_use]
    pub fn with_hierarchy(mut self, hierarchy: TypeHierarchy) -> Self {
        self.hierarchy = Some(Arc::new(hierarchy));
        self
    }

    /// Returns the limits.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the language profile.
    #[must_use]
    pub fn profile(&self) -> &dyn LanguageProfile {
        self.profile.as_ref()
    }

    /// Compiles `text` for this engine's language.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedPatternError`] when the pattern is rejected.
    pub fn compile(
        &self,
        text: &str,
        options: &CompileOptions,
    ) -> Result<CompiledPattern, MalformedPatternError> {
        CompiledPattern::compile_with(
            text,
            Arc::clone(&self.profile),
            Arc::clone(&self.evaluator),
            options,
        )
    }

    /// Builds the search plan of `pattern` against the known hierarchy.
    #[must_use]
    pub fn plan(&self, pattern: &CompiledPattern) -> SearchPlan {
        SearchPlan::build(pattern, self.hierarchy.as_deref())
    }

    /// Lazily searches an already parsed tree.
    #[must_use]
    pub fn search_tree<'t, 'p>(
        &self,
        tree: &'t Tree,
        pattern: &'p CompiledPattern,
        options: &SearchOptions,
    ) -> Matches<'t, 'p> {
        let matches = find_matches(tree, pattern, options).with_config(&self.config);
        match &self.hierarchy {
            Some(hierarchy) => matches.with_hierarchy(Arc::clone(hierarchy)),
            None => matches,
        }
    }

    /// Matches `pattern` at `start` or its nearest matching ancestor, with
    /// this engine's limits and type hierarchy.
    ///
    /// See [`match_by_down_up`](crate::match_by_down_up) for how ancestors
    /// are tried.
    ///
    /// # Errors
    ///
    /// Returns an error when the search is cancelled, a script evaluator is
    /// unavailable or too many evaluations fail.
    pub fn match_down_up<'t>(
        &self,
        tree: &'t Tree,
        start: Node<'t>,
        pattern: &CompiledPattern,
        options: &SearchOptions,
    ) -> Result<Vec<MatchResult<'t>>, SearchError> {
        let mut ctx = SearchContext::new(
            tree,
            options.cancellation().clone(),
            self.config.max_evaluation_failures(),
        );
        if let Some(hierarchy) = &self.hierarchy {
            ctx.preset_hierarchy(Arc::clone(hierarchy));
        }
        let mut results = climb(&mut ctx, start, pattern, !options.context_match())?;
        results.truncate(self.config.max_matches_per_file());
        Ok(results)
    }

    /// Parses and searches one source text.
    ///
    /// Files the search plan rules out are neither parsed nor matched.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Parse`] when the profile cannot parse the
    /// file, and any error that aborted the search.
    pub fn search_source(
        &self,
        uri: &str,
        source: &str,
        pattern: &CompiledPattern,
        options: &SearchOptions,
    ) -> Result<FileMatches, SearchError> {
        if options.cancellation().is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        let plan = self.plan(pattern);
        if !plan.admits_source(source) {
            debug!(uri, "skipped by search plan");
            return Ok(FileMatches::empty(uri));
        }
        let tree = self
            .profile
            .parse(source)
            .map_err(|err| SearchError::parse(uri, err.message()))?;
        if !plan.admits(&FileTokens::from_tree(&tree)) {
            debug!(uri, "skipped by token index");
            return Ok(FileMatches::empty(uri));
        }

        let mut matches = self.search_tree(&tree, pattern, options);
        let found = matches
            .by_ref()
            .map(|result| {
                result.map(|hit| hit.to_match(uri, self.config.max_capture_text_bytes()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let failures = matches.take_failures();
        debug!(
            uri,
            matches = found.len(),
            failures = failures.len(),
            "searched file"
        );
        Ok(FileMatches {
            uri: uri.to_owned(),
            matches: found,
            failures,
        })
    }

    /// Searches many files on the rayon thread pool.
    ///
    /// Results keep the order of `files`. Every task observes the
    /// cancellation token of `options`.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by any file.
    pub fn search_files(
        &self,
        files: &[SourceFile],
        pattern: &CompiledPattern,
        options: &SearchOptions,
    ) -> Result<Vec<FileMatches>, SearchError> {
        debug!(files = files.len(), pattern = pattern.text(), "starting search");
        files
            .par_iter()
            .map(|file| self.search_source(&file.uri, &file.source, pattern, options))
            .collect()
    }
}
