//! Scope-based name resolution shared by the bundled grammars.

use sift_core::Node;

use super::Grammar;

/// Resolves an identifier to the node that declares it.
///
/// Among the declarations with a matching name whose scope encloses the
/// reference, the one in the innermost scope wins. A declared name resolves
/// to its own declaration.
pub(crate) fn resolve<'t>(grammar: &Grammar, node: Node<'t>) -> Option<Node<'t>> {
    if !grammar.is_identifier(node.kind()) {
        return None;
    }
    if let Some(declaration) = declaration_of(grammar, node) {
        return Some(declaration);
    }

    let name = node.text();
    let mut best: Option<(usize, Node<'t>)> = None;
    for candidate in node.tree().root_node().descendants() {
        if !grammar.is_identifier(candidate.kind()) || candidate.text() != name {
            continue;
        }
        let Some(declaration) = declaration_of(grammar, candidate) else {
            continue;
        };
        let scope = declaring_scope(grammar, declaration);
        if !scope.is_ancestor_of(node) {
            continue;
        }
        let depth = scope.ancestors().count();
        if best.is_none_or(|(best_depth, _)| depth > best_depth) {
            best = Some((depth, declaration));
        }
    }
    best.map(|(_, declaration)| declaration)
}

/// Returns the declaration introduced by `name`, if `name` is a declared
/// name rather than a reference.
pub(crate) fn declaration_of<'t>(grammar: &Grammar, name: Node<'t>) -> Option<Node<'t>> {
    let parent = name.parent()?;
    grammar
        .declarations
        .iter()
        .any(|(kind, field)| {
            *kind == parent.kind() && field.is_none_or(|wanted| name.field_name() == Some(wanted))
        })
        .then_some(parent)
}

fn declaring_scope<'t>(grammar: &Grammar, declaration: Node<'t>) -> Node<'t> {
    declaration
        .ancestors()
        .find(|ancestor| grammar.scopes.contains(&ancestor.kind()))
        .unwrap_or_else(|| declaration.tree().root_node())
}
