//! Order-insensitive matching of member lists.
//!
//! Slots are placed most specific first: structured slots, then
//! constrained placeholders, then free placeholders. A slot picks any
//! combination of the still-unused candidates, in ascending index order so
//! that each combination is tried once. Greedy slots try larger
//! combinations first, lazy slots smaller ones. Candidates no slot takes are
//! allowed.

use std::rc::Rc;

use sift_core::{Node, SearchError};

use super::session::Session;
use super::solver::{Goal, Goals, Step};
use crate::pattern::{CompiledPattern, PatternNode, Slot};

/// The fixed inputs of one unordered match.
#[derive(Debug)]
pub(crate) struct Members<'t, 'p> {
    slots: Vec<&'p Slot>,
    absent: Vec<&'p Slot>,
    candidates: Vec<Node<'t>>,
    finishes: bool,
}

fn priority(slot: &Slot, pattern: &CompiledPattern) -> u8 {
    match &slot.node {
        PatternNode::Structured { .. } | PatternNode::Literal { .. } => 0,
        PatternNode::Placeholder { var, .. } => {
            if pattern
                .variable(*var)
                .is_some_and(|variable| variable.constraint().is_some())
            {
                1
            } else {
                2
            }
        }
    }
}

impl<'t, 'p> Members<'t, 'p> {
    pub(crate) fn new(
        slots: &'p [Slot],
        candidates: Vec<Node<'t>>,
        pattern: &'p CompiledPattern,
    ) -> Self {
        let (absent, mut present): (Vec<&'p Slot>, Vec<&'p Slot>) =
            slots.iter().partition(|slot| slot.occurs.is_absent());
        present.sort_by_key(|slot| priority(slot, pattern));
        Self {
            slots: present,
            absent,
            candidates,
            finishes: false,
        }
    }

    /// Makes the taken candidates the match, checked by a finishing goal.
    pub(crate) const fn finishing(mut self) -> Self {
        self.finishes = true;
        self
    }

    /// The goal that places every slot.
    pub(crate) fn goal(self) -> Goal<'t, 'p> {
        let used = vec![false; self.candidates.len()];
        Goal::Members {
            set: Rc::new(self),
            slot: 0,
            used,
        }
    }
}

impl<'t, 'p> Session<'_, 't, 'p> {
    /// Starts slot `slot` on the unused candidates, or checks the absent
    /// slots once every slot is placed.
    pub(crate) fn expand_members(
        &mut self,
        set: &Rc<Members<'t, 'p>>,
        slot: usize,
        used: Vec<bool>,
        rest: Goals<'t, 'p>,
    ) -> Result<Step<'t, 'p>, SearchError> {
        if slot < set.slots.len() {
            return Ok(Step::Continue(rest.push(Goal::Pick {
                set: Rc::clone(set),
                slot,
                taken: 0,
                from: 0,
                used,
            })));
        }
        if !self.absent_slots_hold(&set.absent, &set.candidates)? {
            return Ok(Step::Fail);
        }
        if !set.finishes {
            return Ok(Step::Continue(rest));
        }
        let run = set
            .candidates
            .iter()
            .zip(&used)
            .filter_map(|(candidate, taken)| taken.then_some(*candidate))
            .collect();
        Ok(Step::Continue(rest.push(Goal::Finish(run))))
    }
}

/// Either gives the slot one more unused candidate at or after `from`, one
/// alternative per candidate, or closes the slot, in the order the slot's
/// greediness prefers.
pub(crate) fn expand_pick<'t, 'p>(
    set: &Rc<Members<'t, 'p>>,
    slot_index: usize,
    taken: usize,
    from: usize,
    used: &[bool],
    rest: Goals<'t, 'p>,
) -> Step<'t, 'p> {
    let Some(slot) = set.slots.get(slot_index).copied() else {
        return Step::Fail;
    };
    let min = usize::try_from(slot.occurs.min).unwrap_or(usize::MAX);
    let max = slot
        .occurs
        .max
        .map_or(usize::MAX, |max| usize::try_from(max).unwrap_or(usize::MAX));

    let mut picks = Vec::new();
    if taken < max {
        for (index, candidate) in set.candidates.iter().enumerate().skip(from) {
            if used.get(index).copied().unwrap_or(true) {
                continue;
            }
            let mut marked = used.to_vec();
            if let Some(flag) = marked.get_mut(index) {
                *flag = true;
            }
            picks.push(rest.clone().prepend(vec![
                Goal::Node {
                    node: &slot.node,
                    candidate: *candidate,
                },
                Goal::Pick {
                    set: Rc::clone(set),
                    slot: slot_index,
                    taken: taken + 1,
                    from: index + 1,
                    used: marked,
                },
            ]));
        }
    }
    let stop = (taken >= min).then(|| {
        rest.push(Goal::Members {
            set: Rc::clone(set),
            slot: slot_index + 1,
            used: used.to_vec(),
        })
    });

    let alternatives = if slot.occurs.greedy {
        picks.into_iter().chain(stop).collect()
    } else {
        stop.into_iter().chain(picks).collect()
    };
    Step::branch(alternatives)
}
