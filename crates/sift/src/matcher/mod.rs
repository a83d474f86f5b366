//! Matching a compiled pattern against a syntax tree.
//!
//! [`find_matches`] walks the tree with an explicit stack and tries the
//! pattern at every node. Single-slot patterns are matched node by node;
//! multi-slot patterns such as `'T; 'T;` are matched against every
//! contiguous window of each node's children.
//!
//! The walk is lazy: results are produced as the iterator is advanced, so
//! callers can stop early or cancel between steps.

mod bindings;
mod equality;
mod result;
mod sequence;
mod session;
mod solver;
mod unordered;

use std::collections::VecDeque;
use std::sync::Arc;

use sift_core::{
    ChildMatching, EngineConfig, EvaluationFailure, LanguageProfile, Node, PlaceholderRole,
    SearchError, SearchOptions, Tree, TypeHierarchy,
};
use tracing::trace;

use crate::pattern::{CompiledPattern, PatternNode, Slot};

use self::sequence::{Anchor, Ordered};
use self::solver::{Goal, Goals};
use self::unordered::Members;

pub use result::{Capture, MatchResult};

pub(crate) use equality::structurally_equal;
pub(crate) use session::{SearchContext, Session};

/// Lazily finds every match of `pattern` in `tree`.
///
/// # Example
///
/// ```ignore
/// let pattern = CompiledPattern::compile("a.b(null);", profile, &CompileOptions::default())?;
/// for result in find_matches(&tree, &pattern, &SearchOptions::default()) {
///     println!("{}", result?.image());
/// }
/// ```
#[must_use]
pub fn find_matches<'t, 'p>(
    tree: &'t Tree,
    pattern: &'p CompiledPattern,
    options: &SearchOptions,
) -> Matches<'t, 'p> {
    Matches::new(tree, pattern, options)
}

/// Collects every match of `pattern` in `tree`.
///
/// # Errors
///
/// Returns the error that stopped the search: cancellation, an unavailable
/// script evaluator, or too many evaluation failures.
pub fn find_all<'t>(
    tree: &'t Tree,
    pattern: &CompiledPattern,
    options: &SearchOptions,
) -> Result<Vec<MatchResult<'t>>, SearchError> {
    find_matches(tree, pattern, options).collect()
}

/// Iterator over the matches in one tree.
///
/// Yields at most one error, after which it is exhausted.
#[derive(Debug)]
pub struct Matches<'t, 'p> {
    ctx: SearchContext<'t>,
    pattern: &'p CompiledPattern,
    options: SearchOptions,
    walk: Vec<Node<'t>>,
    descend: bool,
    pending: VecDeque<MatchResult<'t>>,
    max_matches: usize,
    emitted: usize,
    finished: bool,
}

impl<'t, 'p> Matches<'t, 'p> {
    fn new(tree: &'t Tree, pattern: &'p CompiledPattern, options: &SearchOptions) -> Self {
        let config = EngineConfig::default();
        let root = tree.root_node();
        let (walk, descend) = match (options.recursive_search(), pattern.is_multi_slot()) {
            (true, _) => (vec![root], true),
            (false, true) => (vec![root], false),
            (false, false) => (root.children().rev().collect(), false),
        };
        Self {
            ctx: SearchContext::new(
                tree,
                options.cancellation().clone(),
                config.max_evaluation_failures(),
            ),
            pattern,
            options: options.clone(),
            walk,
            descend,
            pending: VecDeque::new(),
            max_matches: config.max_matches_per_file(),
            emitted: 0,
            finished: false,
        }
    }

    /// Applies the match and failure limits of `config`.
    #[must_use]
    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.max_matches = config.max_matches_per_file();
        self.ctx.set_max_failures(config.max_evaluation_failures());
        self
    }

    /// Uses `hierarchy` for hierarchy wildcards instead of collecting one
    /// from the tree.
    #[must_use]
    pub fn with_hierarchy(mut self, hierarchy: Arc<TypeHierarchy>) -> Self {
        self.ctx.preset_hierarchy(hierarchy);
        self
    }

    /// Returns the evaluation failures recorded so far.
    #[must_use]
    pub fn failures(&self) -> &[EvaluationFailure] {
        self.ctx.failures()
    }

    /// Takes the evaluation failures recorded so far.
    pub fn take_failures(&mut self) -> Vec<EvaluationFailure> {
        self.ctx.take_failures()
    }

    fn step(&mut self, node: Node<'t>) -> Result<Vec<MatchResult<'t>>, SearchError> {
        self.ctx.check_cancelled()?;
        let split_targets = !self.options.context_match();
        let non_overlapping = self.options.non_overlapping();
        let mut session = Session::new(&mut self.ctx, self.pattern);
        let results = if self.pattern.is_multi_slot() {
            session.attempt_windows(node, split_targets, non_overlapping)?
        } else {
            session.attempt_node(node, split_targets)?
        };
        if self.descend && !(non_overlapping && !results.is_empty()) {
            self.walk.extend(node.children().rev());
        }
        Ok(results)
    }
}

impl<'t> Iterator for Matches<'t, '_> {
    type Item = Result<MatchResult<'t>, SearchError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.emitted >= self.max_matches {
                self.finished = true;
                self.pending.clear();
            }
            if let Some(result) = self.pending.pop_front() {
                self.emitted += 1;
                return Some(Ok(result));
            }
            if self.finished {
                return None;
            }
            let Some(node) = self.walk.pop() else {
                self.finished = true;
                return None;
            };
            match self.step(node) {
                Ok(results) => self.pending.extend(results),
                Err(err) => {
                    self.finished = true;
                    self.pending.clear();
                    return Some(Err(err));
                }
            }
        }
    }
}

/// Returns the children of `parent` that take part in matching.
///
/// Separators never do; unordered lists only consider named children;
/// comments only count when the pattern itself contains one.
pub(crate) fn candidate_children<'t>(
    parent: Node<'t>,
    matching: ChildMatching,
    keeps_comments: bool,
    profile: &dyn LanguageProfile,
) -> Vec<Node<'t>> {
    parent
        .children()
        .filter(|child| {
            if !child.is_named() {
                return matching != ChildMatching::Unordered && !profile.is_separator(child.kind());
            }
            keeps_comments || !equality::is_comment(*child)
        })
        .collect()
}

impl<'t, 'p> Session<'_, 't, 'p> {
    /// Tries a single-slot pattern at `node`.
    pub(crate) fn attempt_node(
        &mut self,
        node: Node<'t>,
        split_targets: bool,
    ) -> Result<Vec<MatchResult<'t>>, SearchError> {
        let pattern: &'p CompiledPattern = self.pattern;
        let Some(slot) = pattern.slots().first() else {
            return Ok(Vec::new());
        };
        if slot.occurs.is_absent() || is_duplicate_span(slot, node) {
            return Ok(Vec::new());
        }
        let goals = Goals::new().prepend(vec![
            Goal::Node {
                node: &slot.node,
                candidate: node,
            },
            Goal::Finish(vec![node]),
        ]);
        self.complete(goals, split_targets)
    }

    /// Tries a multi-slot pattern against the children of `parent`.
    pub(crate) fn attempt_windows(
        &mut self,
        parent: Node<'t>,
        split_targets: bool,
        non_overlapping: bool,
    ) -> Result<Vec<MatchResult<'t>>, SearchError> {
        let pattern: &'p CompiledPattern = self.pattern;
        let profile = self.profile();
        let matching = profile.child_matching(parent.kind());
        let candidates =
            candidate_children(parent, matching, pattern.keeps_comments(), profile);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        if matching == ChildMatching::Unordered {
            let members = Members::new(pattern.slots(), candidates, pattern).finishing();
            return self.complete(Goals::new().push(members.goal()), split_targets);
        }

        let mut results = Vec::new();
        let mut start = 0;
        while start < candidates.len() {
            let window = Ordered::new(pattern.slots(), candidates.clone(), &[], start, Anchor::Open)
                .finishing();
            let produced = self.complete(Goals::new().push(window.goal()), split_targets)?;
            let mut advance = start + 1;
            if let Some(first) = produced.first() {
                let end = start + first.nodes().len();
                trace!(start, end, results = produced.len(), "window matched");
                if non_overlapping {
                    advance = end;
                }
            }
            results.extend(produced);
            start = advance;
        }
        Ok(results)
    }

    /// Returns whether `pattern` matches at `node`, ignoring targets.
    ///
    /// Used by the nested patterns of `ref`, `within` and `contains`.
    pub(crate) fn matches_at(&mut self, node: Node<'t>) -> Result<bool, SearchError> {
        let results = if self.pattern.is_multi_slot() {
            self.attempt_windows(node, false, true)?
        } else {
            self.attempt_node(node, false)?
        };
        Ok(!results.is_empty())
    }
}

/// A bare placeholder would report a wrapper node and its only named child
/// for the same text; only the child is kept.
fn is_duplicate_span(slot: &Slot, node: Node<'_>) -> bool {
    if !matches!(
        slot.node,
        PatternNode::Placeholder {
            role: PlaceholderRole::Any,
            ..
        }
    ) {
        return false;
    }
    let mut named = node.named_children();
    match (named.next(), named.next()) {
        (Some(only), None) => only.byte_range() == node.byte_range(),
        _ => false,
    }
}
