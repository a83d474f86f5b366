//! Lowering of the parsed host tree into pattern nodes.

use sift_core::{
    ChildMatching, DiagnosticCode, LanguageProfile, MalformedPatternError, Node, PlaceholderRole,
    Snippet, TokenCategory,
};

use super::lexer::{Scanned, placeholder_index};
use super::variables::VariableTable;
use super::{Occurs, PatternNode, Slot};

struct Lowering<'a> {
    profile: &'a dyn LanguageProfile,
    table: &'a VariableTable,
    seen: Vec<bool>,
}

/// Lowers the snippet roots into top-level slots.
///
/// Every placeholder occurrence must end up as exactly one
/// [`PatternNode::Placeholder`]; one swallowed by a comment or a string
/// token is reported.
pub(super) fn lower(
    snippet: &Snippet,
    profile: &dyn LanguageProfile,
    table: &VariableTable,
    scanned: &Scanned,
) -> Result<Vec<Slot>, MalformedPatternError> {
    let mut lowering = Lowering {
        profile,
        table,
        seen: vec![false; table.by_occurrence.len()],
    };
    let tree = snippet.tree();
    let slots = snippet
        .roots()
        .iter()
        .map(|id| lowering.slot(tree.node(*id)))
        .collect::<Vec<_>>();

    let missing = lowering
        .seen
        .iter()
        .zip(&scanned.occurrences)
        .find(|(seen, _)| !**seen);
    if let Some((_, occurrence)) = missing {
        return Err(MalformedPatternError::new(
            DiagnosticCode::ESiftPlaceholderSyntax,
            format!(
                "placeholder '{}' does not stand for a syntax node",
                occurrence.name
            ),
            Some(occurrence.source_span()),
        )
        .with_note("placeholders inside comments or string fragments are not supported"));
    }
    Ok(slots)
}

/// Returns whether a slot list contains a comment literal.
pub(super) fn keeps_comments(slots: &[Slot]) -> bool {
    slots.iter().any(|slot| {
        matches!(
            slot.node,
            PatternNode::Literal {
                category: TokenCategory::Comment,
                ..
            }
        )
    })
}

impl Lowering<'_> {
    fn slot(&mut self, node: Node<'_>) -> Slot {
        if let Some(slot) = self.wrapped_placeholder(node) {
            return slot;
        }
        if let Some(site) = placeholder_index(node.text()) {
            return self.placeholder(site, PlaceholderRole::Any);
        }
        if node.is_leaf() {
            return Slot {
                node: PatternNode::Literal {
                    kind: node.kind(),
                    text: node.text().to_owned(),
                    category: node.category(),
                },
                occurs: Occurs::ONE,
            };
        }
        self.structured(node)
    }

    /// A wrapper such as an expression statement around a lone placeholder
    /// becomes that placeholder, with the wrapper's role.
    fn wrapped_placeholder(&mut self, node: Node<'_>) -> Option<Slot> {
        let role = self.profile.placeholder_role(node.kind())?;
        let mut named = node.named_children();
        let (Some(inner), None) = (named.next(), named.next()) else {
            return None;
        };
        let site = placeholder_index(inner.text())?;
        let bare = node.text().trim_end_matches(';').trim_end();
        (bare == inner.text()).then(|| self.placeholder(site, role))
    }

    fn placeholder(&mut self, site: usize, role: PlaceholderRole) -> Slot {
        if let Some(seen) = self.seen.get_mut(site) {
            *seen = true;
        }
        let var = self
            .table
            .by_occurrence
            .get(site)
            .copied()
            .unwrap_or_default();
        let occurs = self
            .table
            .variables
            .get(var.index())
            .map_or(Occurs::ONE, |variable| variable.occurs);
        Slot {
            node: PatternNode::Placeholder { var, role, site },
            occurs,
        }
    }

    fn structured(&mut self, node: Node<'_>) -> Slot {
        let kind = node.kind();
        let matching = self.profile.child_matching(kind);
        let carrier = self.profile.is_occurrence_carrier(kind);
        let mut lifted = None;
        let mut children = Vec::new();

        for child in node.children() {
            let anonymous = !child.is_named();
            if anonymous
                && (matching == ChildMatching::Unordered || self.profile.is_separator(child.kind()))
            {
                continue;
            }
            let mut slot = self.slot(child);
            let quantified_name = carrier
                && child.field_name() == Some("name")
                && matches!(slot.node, PatternNode::Placeholder { .. })
                && !slot.occurs.is_single();
            if quantified_name {
                lifted = Some(slot.occurs);
                slot.occurs = Occurs::ONE;
            }
            children.push(slot);
        }

        let keeps_comments = keeps_comments(&children);
        Slot {
            node: PatternNode::Structured {
                kind,
                matching,
                children,
                keeps_comments,
            },
            occurs: lifted.unwrap_or(Occurs::ONE),
        }
    }
}
