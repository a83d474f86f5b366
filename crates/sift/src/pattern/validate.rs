//! Cross-checks run after lowering, and the strict-mode applicability
//! warnings.

use sift_core::{
    Diagnostic, DiagnosticCode, LanguageProfile, MalformedPatternError, PlaceholderRole,
};

use super::constraint::{Constraint, ConstraintExpr};
use super::{PatternNode, Slot, Variable};

/// Rejects `sameas(v)` naming a variable the pattern does not declare.
pub(super) fn same_as_targets(
    variables: &[Variable],
    context: Option<&ConstraintExpr>,
) -> Result<(), MalformedPatternError> {
    let declared = |name: &str| {
        variables
            .iter()
            .any(|variable| !variable.wildcard && variable.name == name)
    };
    let owners = variables
        .iter()
        .filter_map(|variable| {
            variable
                .constraint
                .as_ref()
                .map(|expr| (expr, Some(variable.span)))
        })
        .chain(context.map(|expr| (expr, None)));

    for (expr, span) in owners {
        let unknown = expr.predicates().into_iter().find_map(|constraint| match constraint {
            Constraint::SameAs(name) if !declared(name) => Some(name),
            _ => None,
        });
        if let Some(name) = unknown {
            return Err(MalformedPatternError::new(
                DiagnosticCode::ESiftConstraintSyntax,
                format!("'sameas' refers to unknown variable '{name}'"),
                span,
            ));
        }
    }
    Ok(())
}

/// Collects applicability warnings for strict compilation.
pub(super) fn applicability(
    slots: &[Slot],
    variables: &[Variable],
    profile: &dyn LanguageProfile,
) -> Vec<Diagnostic> {
    let mut warnings = Vec::new();
    let mut binds = vec![false; variables.len()];
    let mut pending: Vec<(&Slot, Option<&'static str>, bool)> =
        slots.iter().map(|slot| (slot, None, false)).collect();

    while let Some((slot, parent, inside_absent)) = pending.pop() {
        let absent = inside_absent || slot.occurs.is_absent();
        match &slot.node {
            PatternNode::Placeholder { var, role, .. } => {
                if let Some(flag) = binds.get_mut(var.index()).filter(|_| !absent) {
                    *flag = true;
                }
                if let (Some(parent_kind), Some(variable)) = (parent, variables.get(var.index())) {
                    single_slot_checks(slot, *role, parent_kind, variable, profile, &mut warnings);
                }
            }
            PatternNode::Structured { kind, children, .. } => {
                pending.extend(children.iter().map(|child| (child, Some(*kind), absent)));
            }
            PatternNode::Literal { .. } => {}
        }
    }

    if !slots.is_empty() && slots.iter().all(|slot| slot.occurs.is_absent()) {
        warnings.push(Diagnostic::new(
            DiagnosticCode::WSiftAbsentPattern,
            String::from("the whole pattern is {0,0} and can never report a match"),
            None,
            Vec::new(),
        ));
    }

    for (variable, bound) in variables.iter().zip(binds) {
        if variable.target && !bound {
            warnings.push(Diagnostic::new(
                DiagnosticCode::WSiftTargetNeverBinds,
                format!(
                    "target '{}' only occurs in {{0,0}} slots and never binds",
                    variable.name
                ),
                Some(variable.span),
                vec![String::from("prefix the name with '_' to make it anonymous")],
            ));
        }
    }
    warnings
}

fn single_slot_checks(
    slot: &Slot,
    role: PlaceholderRole,
    parent_kind: &str,
    variable: &Variable,
    profile: &dyn LanguageProfile,
    warnings: &mut Vec<Diagnostic>,
) {
    if profile.holds_list(parent_kind) || role != PlaceholderRole::Any {
        return;
    }
    if slot.occurs.max.is_none() {
        warnings.push(Diagnostic::new(
            DiagnosticCode::WSiftUnboundedSingleSlot,
            format!(
                "'{}' allows unlimited occurrences but '{parent_kind}' holds a single node there",
                variable.name
            ),
            Some(variable.span),
            Vec::new(),
        ));
    } else if slot.occurs.min == 0 && !slot.occurs.is_absent() {
        warnings.push(Diagnostic::new(
            DiagnosticCode::WSiftOptionalMandatorySlot,
            format!(
                "'{}' may be absent but '{parent_kind}' always has a node there",
                variable.name
            ),
            Some(variable.span),
            vec![String::from("drop the '?' quantifier")],
        ));
    }
}
