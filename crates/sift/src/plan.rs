//! Search planning: cheap necessary conditions for a file to match.
//!
//! A [`SearchPlan`] lists the words that every match must contain. Files
//! whose token index lacks any of them are skipped before matching. The
//! plan is sound, never complete: admitting a file only means the matcher
//! has to look.

use std::collections::BTreeSet;

use sift_core::{Tree, TokenCategory, TypeHierarchy};

use crate::pattern::{CompiledPattern, Constraint, Hierarchy, PatternNode, Slot};

/// Tokens that must appear in any file containing a match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPlan {
    required: BTreeSet<(TokenCategory, String)>,
    any_of: Vec<BTreeSet<String>>,
}

impl SearchPlan {
    /// Derives the plan of `pattern`.
    ///
    /// Hierarchy wildcards contribute a group of alternative type names
    /// only when `hierarchy` is closed; with an open or missing hierarchy a
    /// subtype might be declared in a file the plan never saw.
    #[must_use]
    pub fn build(pattern: &CompiledPattern, hierarchy: Option<&TypeHierarchy>) -> Self {
        let mut plan = Self::default();
        let closed = hierarchy.filter(|known| known.is_closed());
        let mut pending: Vec<&Slot> = pattern
            .slots()
            .iter()
            .filter(|slot| is_mandatory(slot))
            .collect();

        while let Some(slot) = pending.pop() {
            match &slot.node {
                PatternNode::Literal { text, category, .. } => {
                    plan.required
                        .extend(words(text).map(|word| (*category, word)));
                }
                PatternNode::Placeholder { var, .. } => {
                    let constraint = pattern.variable(*var).and_then(|variable| variable.constraint());
                    if let (Some(expr), Some(known)) = (constraint, closed) {
                        plan.any_of
                            .extend(expr.conjuncts().into_iter().filter_map(|c| type_group(c, known)));
                    }
                }
                PatternNode::Structured { children, .. } => {
                    pending.extend(children.iter().filter(|child| is_mandatory(child)));
                }
            }
        }
        plan
    }

    /// Returns the required `(category, word)` pairs.
    #[must_use]
    pub const fn required(&self) -> &BTreeSet<(TokenCategory, String)> {
        &self.required
    }

    /// Returns the groups of which at least one word must appear.
    #[must_use]
    pub fn any_of(&self) -> &[BTreeSet<String>] {
        &self.any_of
    }

    /// Returns `true` when the plan admits every file.
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.required.is_empty() && self.any_of.is_empty()
    }

    /// Tests an indexed file.
    #[must_use]
    pub fn admits(&self, tokens: &FileTokens) -> bool {
        self.required.iter().all(|key| tokens.by_category.contains(key))
            && self
                .any_of
                .iter()
                .all(|group| group.iter().any(|word| tokens.all.contains(word)))
    }

    /// Tests raw source text without categorising its tokens.
    #[must_use]
    pub fn admits_source(&self, source: &str) -> bool {
        if self.is_trivial() {
            return true;
        }
        let present: BTreeSet<String> = words(source).collect();
        self.required.iter().all(|(_, word)| present.contains(word))
            && self
                .any_of
                .iter()
                .all(|group| group.iter().any(|word| present.contains(word)))
    }
}

/// The words of a parsed file, with and without their token category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTokens {
    by_category: BTreeSet<(TokenCategory, String)>,
    all: BTreeSet<String>,
}

impl FileTokens {
    /// Indexes the leaves of `tree`.
    #[must_use]
    pub fn from_tree(tree: &Tree) -> Self {
        let mut tokens = Self::default();
        for leaf in tree.root_node().descendants().filter(|node| node.is_leaf()) {
            for word in words(leaf.text()) {
                tokens.by_category.insert((leaf.category(), word.clone()));
                tokens.all.insert(word);
            }
        }
        tokens
    }

    /// Returns whether `word` occurs in `category`.
    #[must_use]
    pub fn contains(&self, category: TokenCategory, word: &str) -> bool {
        self.by_category.contains(&(category, word.to_lowercase()))
    }
}

fn is_mandatory(slot: &Slot) -> bool {
    slot.occurs.min >= 1 && !slot.occurs.is_absent()
}

/// Splits text into lower-cased identifier-like words.
fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|ch: char| !(ch.is_alphanumeric() || ch == '_' || ch == '$'))
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}

/// `*Name` and `+Name` over a closed hierarchy: the candidate text is
/// `Name` (unless strict) or one of its subtypes.
fn type_group(constraint: &Constraint, hierarchy: &TypeHierarchy) -> Option<BTreeSet<String>> {
    let Constraint::Regex { pattern, .. } = constraint else {
        return None;
    };
    if pattern.negate() || pattern.hierarchy() == Hierarchy::Exact {
        return None;
    }
    let name = pattern.plain_name()?;
    let mut group: BTreeSet<String> = hierarchy
        .subtypes_of(name)
        .iter()
        .map(|sub| sub.to_lowercase())
        .collect();
    if pattern.hierarchy() == Hierarchy::Inclusive {
        group.insert(name.to_lowercase());
    }
    Some(group)
}
