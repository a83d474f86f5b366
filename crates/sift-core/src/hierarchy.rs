//! Type hierarchy used by hierarchy wildcards and search planning.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Direct supertype edges between simple type names.
///
/// A hierarchy is *closed* when it is known to contain every subtype edge of
/// the searched code base. Search planning only enumerates subtypes of a
/// closed hierarchy; an open hierarchy is still used for matching.
///
/// # Example
///
/// ```
/// use sift_core::TypeHierarchy;
///
/// let mut hierarchy = TypeHierarchy::closed();
/// hierarchy.add_supertype("B", "A");
/// hierarchy.add_supertype("C", "B");
/// assert!(hierarchy.is_subtype("C", "A", true));
/// assert!(!hierarchy.is_subtype("A", "A", true));
/// assert!(hierarchy.is_subtype("A", "A", false));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeHierarchy {
    supertypes: BTreeMap<String, BTreeSet<String>>,
    closed: bool,
}

impl TypeHierarchy {
    /// Creates an empty hierarchy whose subtype closure is not known.
    #[must_use]
    pub fn open() -> Self {
        Self::default()
    }

    /// Creates an empty hierarchy that will be treated as complete.
    #[must_use]
    pub fn closed() -> Self {
        Self {
            supertypes: BTreeMap::new(),
            closed: true,
        }
    }

    /// Returns whether the hierarchy is known to be complete.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Marks the hierarchy as complete or incomplete.
    pub const fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
    }

    /// Records that `sub` directly extends or implements `sup`.
    pub fn add_supertype(&mut self, sub: impl Into<String>, sup: impl Into<String>) {
        self.supertypes
            .entry(sub.into())
            .or_default()
            .insert(sup.into());
    }

    /// Adds every edge of `other`; the result is closed only when both are.
    pub fn merge(&mut self, other: &Self) {
        for (sub, sups) in &other.supertypes {
            self.supertypes
                .entry(sub.clone())
                .or_default()
                .extend(sups.iter().cloned());
        }
        self.closed = self.closed && other.closed;
    }

    /// Returns `true` when no edges are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.supertypes.is_empty()
    }

    /// Returns the transitive supertypes of `name`, excluding `name`.
    #[must_use]
    pub fn supertypes_of(&self, name: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut pending: Vec<&str> = vec![name];
        while let Some(current) = pending.pop() {
            for sup in self.supertypes.get(current).into_iter().flatten() {
                if sup != name && seen.insert(sup.clone()) {
                    pending.push(sup.as_str());
                }
            }
        }
        seen
    }

    /// Returns the transitive subtypes of `name`, excluding `name`.
    #[must_use]
    pub fn subtypes_of(&self, name: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut pending = vec![name.to_owned()];
        while let Some(current) = pending.pop() {
            for (sub, sups) in &self.supertypes {
                if sups.contains(&current) && sub != name && seen.insert(sub.clone()) {
                    pending.push(sub.clone());
                }
            }
        }
        seen
    }

    /// Returns whether `sub` is `sup` or one of its subtypes.
    ///
    /// With `strict` set, the type itself does not count.
    #[must_use]
    pub fn is_subtype(&self, sub: &str, sup: &str, strict: bool) -> bool {
        if sub == sup {
            return !strict;
        }
        self.supertypes_of(sub).contains(sup)
    }
}
