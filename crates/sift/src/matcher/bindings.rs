//! Variable bindings for one match attempt.
//!
//! Bindings are an append-only log so that backtracking is a truncation.
//! Each entry remembers the placeholder occurrence (`site`) that produced
//! it: entries from the same site accumulate, while a later site of the
//! same variable must reproduce the first site's nodes one by one.

use sift_core::Node;

use crate::pattern::VarId;

/// One bound node.
#[derive(Debug, Clone, Copy)]
struct Entry<'t> {
    var: VarId,
    site: usize,
    node: Node<'t>,
}

/// A position in the binding log to roll back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Checkpoint(usize);

/// The binding log of a match attempt.
#[derive(Debug, Default)]
pub(crate) struct Bindings<'t> {
    entries: Vec<Entry<'t>>,
}

impl<'t> Bindings<'t> {
    pub(crate) const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.entries.len())
    }

    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        self.entries.truncate(checkpoint.0);
    }

    pub(crate) fn push(&mut self, var: VarId, site: usize, node: Node<'t>) {
        self.entries.push(Entry { var, site, node });
    }

    /// Returns the site whose nodes every other site of `var` must repeat.
    pub(crate) fn reference_site(&self, var: VarId) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| entry.var == var)
            .map(|entry| entry.site)
    }

    /// Returns the nodes bound to `var` at `site`, in binding order.
    pub(crate) fn at_site(&self, var: VarId, site: usize) -> Vec<Node<'t>> {
        self.entries
            .iter()
            .filter(|entry| entry.var == var && entry.site == site)
            .map(|entry| entry.node)
            .collect()
    }

    /// Returns the nodes of the reference site of `var`.
    pub(crate) fn group(&self, var: VarId) -> Vec<Node<'t>> {
        self.reference_site(var)
            .map(|site| self.at_site(var, site))
            .unwrap_or_default()
    }

    /// Returns whether every site of every variable bound the same number of
    /// nodes as its reference site.
    pub(crate) fn groups_consistent(&self) -> bool {
        self.entries.iter().all(|entry| {
            self.reference_site(entry.var).is_none_or(|reference| {
                reference == entry.site
                    || self.at_site(entry.var, entry.site).len()
                        == self.at_site(entry.var, reference).len()
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use sift_core::{NodeSpec, Tree, TreeBuilder};

    use super::*;

    /// `x y x` as three identifiers under one root.
    #[fixture]
    fn words() -> Tree {
        let mut builder = TreeBuilder::new("x y x");
        builder.open(NodeSpec::new("root", 0..5)).expect("root");
        for range in [0..1, 2..3, 4..5] {
            builder
                .leaf(NodeSpec::new("identifier", range))
                .expect("word");
        }
        builder.close().expect("close root");
        builder.finish().expect("finish")
    }

    fn leaves(tree: &Tree) -> [Node<'_>; 3] {
        let nodes: Vec<_> = tree.root_node().children().collect();
        let [first, second, third] = nodes.as_slice() else {
            panic!("expected three leaves, got {}", nodes.len());
        };
        [*first, *second, *third]
    }

    #[rstest]
    fn rollback_restores_the_checkpointed_state(words: Tree) {
        let [x, y, _] = leaves(&words);
        let var = VarId::new(0);
        let mut bindings = Bindings::new();
        bindings.push(var, 0, x);
        let checkpoint = bindings.checkpoint();
        bindings.push(var, 0, y);
        assert_eq!(bindings.group(var).len(), 2);

        bindings.rollback(checkpoint);
        let texts: Vec<_> = bindings.group(var).iter().map(|node| node.text()).collect();
        assert_eq!(texts, ["x"]);
        assert_eq!(bindings.checkpoint(), checkpoint);
    }

    #[rstest]
    fn the_first_site_is_the_reference(words: Tree) {
        let [first, _, last] = leaves(&words);
        let var = VarId::new(3);
        let mut bindings = Bindings::new();
        assert_eq!(bindings.reference_site(var), None);

        bindings.push(var, 2, first);
        bindings.push(var, 5, last);
        assert_eq!(bindings.reference_site(var), Some(2));
        assert_eq!(bindings.at_site(var, 5).len(), 1);
        assert!(bindings.groups_consistent());
    }

    #[rstest]
    fn sites_of_different_sizes_are_inconsistent(words: Tree) {
        let [x, y, again] = leaves(&words);
        let var = VarId::new(1);
        let mut bindings = Bindings::new();
        bindings.push(var, 0, x);
        bindings.push(var, 0, y);
        bindings.push(var, 1, again);
        assert!(!bindings.groups_consistent());
    }
}
