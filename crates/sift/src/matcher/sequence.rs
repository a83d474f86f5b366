//! Goals for an ordered list of slots.
//!
//! A sequence places its slots left to right. Each slot grows its run one
//! candidate at a time, greedy slots preferring one more and lazy slots
//! preferring to stop, and every such preference is a choice point the
//! solver can come back to.

use std::rc::Rc;

use sift_core::{Node, SearchError};
use tracing::trace;

use super::session::Session;
use super::solver::{Goal, Goals, Step};
use crate::pattern::Slot;

/// How the end of a sequence is constrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Anchor {
    /// Every candidate must be consumed, apart from skippable trailing ones.
    Whole,
    /// Any non-empty run starting at the start offset is accepted.
    Open,
}

/// The fixed inputs of one sequence match.
#[derive(Debug)]
pub(crate) struct Ordered<'t, 'p> {
    slots: Vec<&'p Slot>,
    absent: Vec<&'p Slot>,
    candidates: Vec<Node<'t>>,
    skippable: &'static [&'static str],
    /// `min_after[i]` is the number of candidates slots `i..` need at least.
    min_after: Vec<usize>,
    start: usize,
    anchor: Anchor,
    /// Whether the consumed run is the whole match.
    finishes: bool,
}

impl<'t, 'p> Ordered<'t, 'p> {
    pub(crate) fn new(
        slots: &'p [Slot],
        candidates: Vec<Node<'t>>,
        skippable: &'static [&'static str],
        start: usize,
        anchor: Anchor,
    ) -> Self {
        let (absent, present): (Vec<&'p Slot>, Vec<&'p Slot>) =
            slots.iter().partition(|slot| slot.occurs.is_absent());
        let mut min_after = vec![0_usize; present.len() + 1];
        for index in (0..present.len()).rev() {
            let own = present
                .get(index)
                .map_or(0, |slot| usize::try_from(slot.occurs.min).unwrap_or(usize::MAX));
            let rest = min_after.get(index + 1).copied().unwrap_or(0);
            if let Some(total) = min_after.get_mut(index) {
                *total = own.saturating_add(rest);
            }
        }
        Self {
            slots: present,
            absent,
            candidates,
            skippable,
            min_after,
            start,
            anchor,
            finishes: false,
        }
    }

    /// Makes the consumed run the match, checked by a finishing goal.
    pub(crate) const fn finishing(mut self) -> Self {
        self.finishes = true;
        self
    }

    /// The goal that places every slot.
    pub(crate) fn goal(self) -> Goal<'t, 'p> {
        let offset = self.start;
        Goal::Ordered {
            seq: Rc::new(self),
            slot: 0,
            offset,
        }
    }

    fn is_skippable(&self, offset: usize) -> bool {
        self.candidates
            .get(offset)
            .is_some_and(|candidate| self.skippable.contains(&candidate.kind()))
    }

    fn accepts_end(&self, end: usize) -> bool {
        match self.anchor {
            Anchor::Open => end > self.start,
            Anchor::Whole => (end..self.candidates.len()).all(|offset| self.is_skippable(offset)),
        }
    }

    /// How many candidates `slot` may take from a run starting at `start`.
    fn limit(&self, slot_index: usize, slot: &Slot, start: usize) -> usize {
        let remaining = self.candidates.len().saturating_sub(start);
        let needed_after = self.min_after.get(slot_index + 1).copied().unwrap_or(0);
        let max = slot
            .occurs
            .max
            .map_or(usize::MAX, |max| usize::try_from(max).unwrap_or(usize::MAX));
        remaining.saturating_sub(needed_after).min(max)
    }
}

impl<'t, 'p> Session<'_, 't, 'p> {
    /// Places slot `slot` at `offset`, or checks the end of the sequence
    /// once every slot is placed.
    pub(crate) fn expand_ordered(
        &mut self,
        seq: &Rc<Ordered<'t, 'p>>,
        slot: usize,
        offset: usize,
        rest: Goals<'t, 'p>,
    ) -> Result<Step<'t, 'p>, SearchError> {
        if slot == seq.slots.len() {
            if !seq.accepts_end(offset) || !self.absent_slots_hold(&seq.absent, &seq.candidates)? {
                return Ok(Step::Fail);
            }
            if !seq.finishes {
                return Ok(Step::Continue(rest));
            }
            let run = seq.candidates.get(seq.start..offset).unwrap_or_default();
            return Ok(Step::Continue(rest.push(Goal::Finish(run.to_vec()))));
        }
        let mut alternatives = vec![rest.clone().push(Goal::Repeat {
            seq: Rc::clone(seq),
            slot,
            start: offset,
            taken: 0,
        })];
        if seq.is_skippable(offset) {
            alternatives.push(rest.push(Goal::Ordered {
                seq: Rc::clone(seq),
                slot,
                offset: offset + 1,
            }));
        }
        Ok(Step::branch(alternatives))
    }

    /// Checks that no `{0,0}` slot matches any candidate in scope.
    pub(crate) fn absent_slots_hold(
        &mut self,
        absent: &[&'p Slot],
        candidates: &[Node<'t>],
    ) -> Result<bool, SearchError> {
        for slot in absent {
            for candidate in candidates {
                if self.holds(&slot.node, *candidate)? {
                    trace!(kind = candidate.kind(), "absent slot found a candidate");
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

/// Either gives the slot the next candidate or closes its run, in the order
/// the slot's greediness prefers.
pub(crate) fn expand_repeat<'t, 'p>(
    seq: &Rc<Ordered<'t, 'p>>,
    slot_index: usize,
    start: usize,
    taken: usize,
    rest: Goals<'t, 'p>,
) -> Step<'t, 'p> {
    let Some(slot) = seq.slots.get(slot_index).copied() else {
        return Step::Fail;
    };
    let min = usize::try_from(slot.occurs.min).unwrap_or(usize::MAX);
    let more = seq
        .candidates
        .get(start + taken)
        .copied()
        .filter(|_| taken < seq.limit(slot_index, slot, start))
        .map(|candidate| {
            rest.clone().prepend(vec![
                Goal::Node {
                    node: &slot.node,
                    candidate,
                },
                Goal::Repeat {
                    seq: Rc::clone(seq),
                    slot: slot_index,
                    start,
                    taken: taken + 1,
                },
            ])
        });
    let stop = (taken >= min).then(|| {
        rest.push(Goal::Ordered {
            seq: Rc::clone(seq),
            slot: slot_index + 1,
            offset: start + taken,
        })
    });
    let alternatives = if slot.occurs.greedy {
        [more, stop]
    } else {
        [stop, more]
    };
    Step::branch(alternatives.into_iter().flatten().collect())
}
