//! Backtracking over match goals.
//!
//! A match attempt is a list of goals: match this pattern node against that
//! candidate, place the remaining slots of this sequence from that offset,
//! and so on. Expanding a goal continues with a new list, fails, or branches
//! into alternatives. Branches become choice points on one explicit stack,
//! each holding the binding checkpoint taken before it, so a failure anywhere
//! later in the attempt resumes the most recent untried alternative. That
//! includes choices made inside a nested node when a later sibling of the
//! node fails.
//!
//! Goal lists share their tails, so a choice point stores whole
//! continuations without copying them.

use std::rc::Rc;

use sift_core::{Node, SearchError};
use tracing::trace;

use super::bindings::Checkpoint;
use super::sequence::{Ordered, expand_repeat};
use super::session::Session;
use super::unordered::{Members, expand_pick};
use crate::pattern::PatternNode;

/// One step of a match attempt.
#[derive(Debug, Clone)]
pub(crate) enum Goal<'t, 'p> {
    /// Match one pattern node against one candidate.
    Node {
        node: &'p PatternNode,
        candidate: Node<'t>,
    },
    /// Place the slots of an ordered sequence from `slot` on, starting at
    /// candidate `offset`.
    Ordered {
        seq: Rc<Ordered<'t, 'p>>,
        slot: usize,
        offset: usize,
    },
    /// Give `slot` another candidate or move on. The slot's run started at
    /// `start` and holds `taken` candidates so far.
    Repeat {
        seq: Rc<Ordered<'t, 'p>>,
        slot: usize,
        start: usize,
        taken: usize,
    },
    /// Place the slots of an unordered list from `slot` on.
    Members {
        set: Rc<Members<'t, 'p>>,
        slot: usize,
        used: Vec<bool>,
    },
    /// Give `slot` another unused candidate at or after `from`, or move on.
    Pick {
        set: Rc<Members<'t, 'p>>,
        slot: usize,
        taken: usize,
        from: usize,
        used: Vec<bool>,
    },
    /// Run the whole-match checks over `run` and record it as the match.
    Finish(Vec<Node<'t>>),
}

#[derive(Debug)]
struct Link<'t, 'p> {
    goal: Goal<'t, 'p>,
    rest: Goals<'t, 'p>,
}

/// A persistent list of pending goals.
#[derive(Debug, Clone, Default)]
pub(crate) struct Goals<'t, 'p>(Option<Rc<Link<'t, 'p>>>);

impl<'t, 'p> Goals<'t, 'p> {
    pub(crate) const fn new() -> Self {
        Self(None)
    }

    /// Returns this list with `goal` in front.
    pub(crate) fn push(self, goal: Goal<'t, 'p>) -> Self {
        Self(Some(Rc::new(Link { goal, rest: self })))
    }

    /// Returns this list with `goals` in front, first goal first.
    pub(crate) fn prepend(self, goals: Vec<Goal<'t, 'p>>) -> Self {
        goals
            .into_iter()
            .rev()
            .fold(self, |list, goal| list.push(goal))
    }

    fn pop(&self) -> Option<(Goal<'t, 'p>, Self)> {
        self.0
            .as_ref()
            .map(|link| (link.goal.clone(), link.rest.clone()))
    }
}

/// The outcome of expanding one goal.
#[derive(Debug)]
pub(crate) enum Step<'t, 'p> {
    Continue(Goals<'t, 'p>),
    Fail,
    /// Try each list in turn, first to last.
    Branch(Vec<Goals<'t, 'p>>),
}

impl<'t, 'p> Step<'t, 'p> {
    /// Branches over the given alternatives, collapsing the trivial cases.
    pub(crate) fn branch(mut alternatives: Vec<Goals<'t, 'p>>) -> Self {
        match alternatives.len() {
            0 => Self::Fail,
            1 => alternatives.pop().map_or(Self::Fail, Self::Continue),
            _ => Self::Branch(alternatives),
        }
    }
}

#[derive(Debug)]
struct ChoicePoint<'t, 'p> {
    checkpoint: Checkpoint,
    /// Untried alternatives, last to be tried first.
    alternatives: Vec<Goals<'t, 'p>>,
}

impl<'t, 'p> Session<'_, 't, 'p> {
    /// Runs `goals` until they all succeed or every alternative fails.
    ///
    /// On success the bindings of the successful path are kept; on failure
    /// the bindings are left as they were.
    pub(crate) fn solve(&mut self, goals: Goals<'t, 'p>) -> Result<bool, SearchError> {
        let initial = self.bindings.checkpoint();
        let mut choices: Vec<ChoicePoint<'t, 'p>> = Vec::new();
        let mut current = goals;
        loop {
            self.ctx.check_cancelled()?;
            let Some((goal, rest)) = current.pop() else {
                return Ok(true);
            };
            let next = match self.expand(goal, rest)? {
                Step::Continue(next) => Some(next),
                Step::Fail => None,
                Step::Branch(mut alternatives) => {
                    alternatives.reverse();
                    let first = alternatives.pop();
                    if !alternatives.is_empty() {
                        choices.push(ChoicePoint {
                            checkpoint: self.bindings.checkpoint(),
                            alternatives,
                        });
                    }
                    first
                }
            };
            current = match next {
                Some(list) => list,
                None => {
                    let Some(list) = self.backtrack(&mut choices) else {
                        self.bindings.rollback(initial);
                        return Ok(false);
                    };
                    list
                }
            };
        }
    }

    /// Resumes the most recent choice point that still has alternatives.
    fn backtrack(&mut self, choices: &mut Vec<ChoicePoint<'t, 'p>>) -> Option<Goals<'t, 'p>> {
        loop {
            let depth = choices.len();
            let Some(point) = choices.last_mut() else {
                break;
            };
            let Some(next) = point.alternatives.pop() else {
                choices.pop();
                continue;
            };
            self.bindings.rollback(point.checkpoint);
            trace!(depth, "backtracking");
            if point.alternatives.is_empty() {
                choices.pop();
            }
            return Some(next);
        }
        None
    }

    /// Returns whether `node` matches `candidate` in some way, leaving the
    /// bindings unchanged.
    pub(crate) fn holds(
        &mut self,
        node: &'p PatternNode,
        candidate: Node<'t>,
    ) -> Result<bool, SearchError> {
        let checkpoint = self.bindings.checkpoint();
        let found = self.solve(Goals::new().push(Goal::Node { node, candidate }))?;
        self.bindings.rollback(checkpoint);
        Ok(found)
    }

    fn expand(&mut self, goal: Goal<'t, 'p>, rest: Goals<'t, 'p>) -> Result<Step<'t, 'p>, SearchError> {
        match goal {
            Goal::Node { node, candidate } => self.expand_node(node, candidate, rest),
            Goal::Ordered { seq, slot, offset } => self.expand_ordered(&seq, slot, offset, rest),
            Goal::Repeat {
                seq,
                slot,
                start,
                taken,
            } => Ok(expand_repeat(&seq, slot, start, taken, rest)),
            Goal::Members { set, slot, used } => self.expand_members(&set, slot, used, rest),
            Goal::Pick {
                set,
                slot,
                taken,
                from,
                used,
            } => Ok(expand_pick(&set, slot, taken, from, &used, rest)),
            Goal::Finish(run) => {
                if !self.accepts_run(&run)? {
                    return Ok(Step::Fail);
                }
                self.matched = run;
                Ok(Step::Continue(rest))
            }
        }
    }
}
