//! Per-tree search state and the single-node matching rules.

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use sift_core::{
    CancellationToken, ChildMatching, EvaluationFailure, LanguageProfile, Node, PlaceholderRole,
    SearchError, TokenCategory, Tree, TypeHierarchy,
};
use tracing::warn;

use super::bindings::Bindings;
use super::equality::{is_comment, structurally_equal, texts_equal};
use super::result::{Capture, MatchResult};
use super::candidate_children;
use super::sequence::{Anchor, Ordered};
use super::solver::{Goal, Goals, Step};
use super::unordered::Members;
use crate::pattern::{CompiledPattern, PatternNode, Slot, VarId, Variable};

/// State shared by every match attempt on one tree.
#[derive(Debug)]
pub(crate) struct SearchContext<'t> {
    pub(crate) tree: &'t Tree,
    cancellation: CancellationToken,
    failures: Vec<EvaluationFailure>,
    max_failures: usize,
    hierarchy: OnceCell<Arc<TypeHierarchy>>,
}

impl<'t> SearchContext<'t> {
    pub(crate) const fn new(
        tree: &'t Tree,
        cancellation: CancellationToken,
        max_failures: usize,
    ) -> Self {
        Self {
            tree,
            cancellation,
            failures: Vec::new(),
            max_failures,
            hierarchy: OnceCell::new(),
        }
    }

    /// Uses `hierarchy` instead of collecting one from the tree.
    pub(crate) fn preset_hierarchy(&mut self, hierarchy: Arc<TypeHierarchy>) {
        self.hierarchy = OnceCell::with_value(hierarchy);
    }

    pub(crate) const fn set_max_failures(&mut self, max_failures: usize) {
        self.max_failures = max_failures;
    }

    pub(crate) fn check_cancelled(&self) -> Result<(), SearchError> {
        if self.cancellation.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        Ok(())
    }

    /// Records a local evaluation failure; too many of them abort the
    /// search.
    pub(crate) fn record_failure(&mut self, failure: EvaluationFailure) -> Result<(), SearchError> {
        warn!(
            predicate = %failure.predicate,
            line = failure.span.start.line,
            column = failure.span.start.column,
            message = %failure.message,
            "constraint evaluation failed"
        );
        let last = failure.message.clone();
        self.failures.push(failure);
        if self.failures.len() > self.max_failures {
            return Err(SearchError::TooManyFailures {
                count: self.failures.len(),
                last,
            });
        }
        Ok(())
    }

    pub(crate) fn failures(&self) -> &[EvaluationFailure] {
        &self.failures
    }

    pub(crate) fn take_failures(&mut self) -> Vec<EvaluationFailure> {
        std::mem::take(&mut self.failures)
    }

    /// Returns the type hierarchy, collecting it from the tree on first use.
    pub(crate) fn hierarchy(&self, profile: &dyn LanguageProfile) -> &TypeHierarchy {
        self.hierarchy
            .get_or_init(|| Arc::new(profile.type_hierarchy(self.tree)))
    }
}

/// One match attempt of one pattern.
pub(crate) struct Session<'c, 't, 'p> {
    pub(crate) ctx: &'c mut SearchContext<'t>,
    pub(crate) pattern: &'p CompiledPattern,
    pub(crate) bindings: Bindings<'t>,
    /// Whether `sameas` against an unbound variable fails instead of
    /// passing; set while completion re-checks those constraints.
    pub(crate) strict_same_as: bool,
    /// The run accepted by the last finishing goal.
    pub(crate) matched: Vec<Node<'t>>,
}

impl<'c, 't, 'p> Session<'c, 't, 'p> {
    pub(crate) const fn new(ctx: &'c mut SearchContext<'t>, pattern: &'p CompiledPattern) -> Self {
        Self {
            ctx,
            pattern,
            bindings: Bindings::new(),
            strict_same_as: false,
            matched: Vec::new(),
        }
    }

    pub(crate) fn profile(&self) -> &'p dyn LanguageProfile {
        let pattern: &'p CompiledPattern = self.pattern;
        pattern.profile()
    }

    pub(crate) const fn case_sensitive(&self) -> bool {
        self.pattern.options().case_sensitive()
    }

    /// Expands a node goal. Literals and placeholders succeed or fail
    /// outright; a structured node continues with the goal that places its
    /// children.
    pub(crate) fn expand_node(
        &mut self,
        node: &'p PatternNode,
        candidate: Node<'t>,
        rest: Goals<'t, 'p>,
    ) -> Result<Step<'t, 'p>, SearchError> {
        let matched = match node {
            PatternNode::Literal {
                kind,
                text,
                category,
            } => self.match_literal(kind, text, *category, candidate),
            PatternNode::Placeholder { var, role, site } => {
                self.match_placeholder(*var, *role, *site, candidate)?
            }
            PatternNode::Structured {
                kind,
                matching,
                children,
                keeps_comments,
            } => {
                return Ok(self
                    .structured_goal(kind, *matching, children, *keeps_comments, candidate)
                    .map_or(Step::Fail, |goal| Step::Continue(rest.push(goal))));
            }
        };
        Ok(if matched { Step::Continue(rest) } else { Step::Fail })
    }

    fn match_literal(
        &self,
        kind: &str,
        text: &str,
        category: TokenCategory,
        candidate: Node<'t>,
    ) -> bool {
        candidate.is_leaf()
            && self.profile().kinds_compatible(kind, candidate.kind())
            && texts_equal(text, candidate.text(), category, self.case_sensitive())
    }

    fn match_placeholder(
        &mut self,
        var: VarId,
        role: PlaceholderRole,
        site: usize,
        candidate: Node<'t>,
    ) -> Result<bool, SearchError> {
        let bindable = candidate.is_named()
            && !candidate.is_error()
            && !is_comment(candidate)
            && self.profile().satisfies_role(role, candidate.kind());
        if !bindable {
            return Ok(false);
        }
        let checkpoint = self.bindings.checkpoint();
        if !self.bind(var, site, candidate) {
            return Ok(false);
        }
        let pattern: &'p CompiledPattern = self.pattern;
        let Some(expr) = pattern.variable(var).and_then(Variable::constraint) else {
            return Ok(true);
        };
        if self.satisfies(expr, candidate)? {
            return Ok(true);
        }
        self.bindings.rollback(checkpoint);
        Ok(false)
    }

    /// Records a binding, checking it against the reference site of the
    /// same variable.
    fn bind(&mut self, var: VarId, site: usize, candidate: Node<'t>) -> bool {
        let reference = self
            .bindings
            .reference_site(var)
            .filter(|first| *first != site);
        if let Some(reference_site) = reference {
            let position = self.bindings.at_site(var, site).len();
            let previous = self
                .bindings
                .at_site(var, reference_site)
                .get(position)
                .copied();
            let repeats = previous
                .is_some_and(|node| structurally_equal(node, candidate, self.case_sensitive()));
            if !repeats {
                return false;
            }
        }
        self.bindings.push(var, site, candidate);
        true
    }

    fn structured_goal(
        &self,
        kind: &str,
        matching: ChildMatching,
        children: &'p [Slot],
        keeps_comments: bool,
        candidate: Node<'t>,
    ) -> Option<Goal<'t, 'p>> {
        if candidate.is_leaf() || !self.profile().kinds_compatible(kind, candidate.kind()) {
            return None;
        }
        let candidates = candidate_children(candidate, matching, keeps_comments, self.profile());
        let goal = match matching {
            ChildMatching::Unordered => Members::new(children, candidates, self.pattern).goal(),
            ChildMatching::Ordered => Ordered::new(children, candidates, &[], 0, Anchor::Whole).goal(),
            ChildMatching::Lenient(skippable) => {
                Ordered::new(children, candidates, skippable, 0, Anchor::Whole).goal()
            }
        };
        Some(goal)
    }

    /// Runs the checks that need the whole match: variable groups agree,
    /// `sameas` holds against final bindings, and the context constraint
    /// accepts the first node of `run`.
    pub(crate) fn accepts_run(&mut self, run: &[Node<'t>]) -> Result<bool, SearchError> {
        let Some(first) = run.first().copied() else {
            return Ok(false);
        };
        if !self.bindings.groups_consistent() || !self.same_as_holds()? {
            return Ok(false);
        }
        let pattern: &'p CompiledPattern = self.pattern;
        let Some(expr) = pattern.context_constraint() else {
            return Ok(true);
        };
        self.satisfies(expr, first)
    }

    /// Runs `goals`, which end in a finishing goal, and turns the
    /// accepted run into results: one per bound target node when
    /// `split_targets` is set. The bindings are left as they were.
    pub(crate) fn complete(
        &mut self,
        goals: Goals<'t, 'p>,
        split_targets: bool,
    ) -> Result<Vec<MatchResult<'t>>, SearchError> {
        let checkpoint = self.bindings.checkpoint();
        if !self.solve(goals)? {
            return Ok(Vec::new());
        }
        let run = std::mem::take(&mut self.matched);
        let base = MatchResult::new(self.ctx.tree, run, self.freeze());
        let targets = if split_targets {
            self.target_nodes()
        } else {
            Vec::new()
        };
        self.bindings.rollback(checkpoint);
        if targets.is_empty() {
            return Ok(vec![base]);
        }
        Ok(targets
            .into_iter()
            .map(|target| base.clone().with_target(target))
            .collect())
    }

    /// Re-checks `sameas` constraints now that every variable is bound.
    fn same_as_holds(&mut self) -> Result<bool, SearchError> {
        let pattern: &'p CompiledPattern = self.pattern;
        for (index, variable) in pattern.variables().iter().enumerate() {
            let Some(expr) = variable
                .constraint()
                .filter(|constraint| constraint.mentions_same_as())
            else {
                continue;
            };
            for node in self.bindings.group(VarId::new(index)) {
                self.strict_same_as = true;
                let holds = self.satisfies(expr, node);
                self.strict_same_as = false;
                if !holds? {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    fn freeze(&self) -> BTreeMap<String, Capture<'t>> {
        self.pattern
            .variables()
            .iter()
            .enumerate()
            .filter(|(_, variable)| !variable.is_wildcard())
            .filter_map(|(index, variable)| {
                let nodes = self.bindings.group(VarId::new(index));
                let repeated = !variable.occurs().is_single();
                let keep = !nodes.is_empty() || (repeated && !variable.occurs().is_absent());
                keep.then(|| (variable.name().to_owned(), Capture::new(nodes, repeated)))
            })
            .collect()
    }

    fn target_nodes(&self) -> Vec<Node<'t>> {
        self.pattern
            .variables()
            .iter()
            .enumerate()
            .filter(|(_, variable)| variable.is_target() && !variable.is_wildcard())
            .map(|(index, _)| self.bindings.group(VarId::new(index)))
            .find(|nodes| !nodes.is_empty())
            .unwrap_or_default()
    }
}
