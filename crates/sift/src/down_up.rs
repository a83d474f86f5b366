//! Matching upward from a known node.
//!
//! When a caller already holds a node (an identifier under the cursor, a
//! reference found by an index), it is cheaper to try the pattern at that
//! node and its ancestors than to walk the whole tree.

use sift_core::{EngineConfig, Node, SearchError, SearchOptions, Tree};
use tracing::trace;

use crate::matcher::{MatchResult, SearchContext, Session};
use crate::pattern::{CompiledPattern, PatternNode};

/// Finds matches of `pattern` at `start` or its nearest matching ancestor.
///
/// Single-slot patterns are tried at every node on the way up whose kind
/// can match the pattern root. Multi-slot patterns are tried against the
/// sibling windows that contain the node. The first node with any match
/// wins. Limits come from [`EngineConfig::default`]; use
/// [`Engine::match_down_up`](crate::Engine::match_down_up) to apply an
/// engine's configuration and type hierarchy.
///
/// # Errors
///
/// Returns an error when the search is cancelled, a script evaluator is
/// unavailable or too many evaluations fail.
pub fn match_by_down_up<'t>(
    tree: &'t Tree,
    start: Node<'t>,
    pattern: &CompiledPattern,
    options: &SearchOptions,
) -> Result<Vec<MatchResult<'t>>, SearchError> {
    let mut ctx = SearchContext::new(
        tree,
        options.cancellation().clone(),
        EngineConfig::default().max_evaluation_failures(),
    );
    climb(&mut ctx, start, pattern, !options.context_match())
}

/// Walks up from `start` with a prepared context.
pub(crate) fn climb<'t>(
    ctx: &mut SearchContext<'t>,
    start: Node<'t>,
    pattern: &CompiledPattern,
    split_targets: bool,
) -> Result<Vec<MatchResult<'t>>, SearchError> {
    for node in std::iter::once(start).chain(start.ancestors()) {
        ctx.check_cancelled()?;
        let results = if pattern.is_multi_slot() {
            windows_containing(ctx, pattern, node, split_targets)?
        } else if root_accepts(pattern, node) {
            Session::new(ctx, pattern).attempt_node(node, split_targets)?
        } else {
            Vec::new()
        };
        if !results.is_empty() {
            trace!(kind = node.kind(), results = results.len(), "down-up matched");
            return Ok(results);
        }
    }
    Ok(Vec::new())
}

fn root_accepts(pattern: &CompiledPattern, node: Node<'_>) -> bool {
    match pattern.slots().first().map(|slot| &slot.node) {
        Some(PatternNode::Placeholder { .. }) => node.is_named(),
        Some(other) => other
            .kind()
            .is_some_and(|kind| pattern.profile().kinds_compatible(kind, node.kind())),
        None => false,
    }
}

fn windows_containing<'t>(
    ctx: &mut SearchContext<'t>,
    pattern: &CompiledPattern,
    node: Node<'t>,
    split_targets: bool,
) -> Result<Vec<MatchResult<'t>>, SearchError> {
    let Some(parent) = node.parent() else {
        return Ok(Vec::new());
    };
    let results = Session::new(ctx, pattern).attempt_windows(parent, split_targets, false)?;
    Ok(results
        .into_iter()
        .filter(|result| result.nodes().contains(&node))
        .collect())
}
