//! The variable table built from scanned placeholders.

use sift_core::{
    CompileOptions, DiagnosticCode, MalformedPatternError, SourceSpan, VariableSpec,
};

use super::constraint::{self, ConstraintExpr};
use super::lexer::{Occurrence, Quantifier, Scanned, Sigil};
use super::{CompileEnv, Occurs, VarId, Variable};

/// Variables plus the variable each placeholder occurrence refers to.
#[derive(Debug)]
pub(super) struct VariableTable {
    pub(super) variables: Vec<Variable>,
    pub(super) by_occurrence: Vec<VarId>,
}

/// What the query spelled out for a variable, used to reject conflicts.
#[derive(Debug, Default)]
struct Written {
    range: Option<Quantifier>,
    constraint: Option<String>,
}

pub(super) fn build(
    scanned: &Scanned,
    options: &CompileOptions,
    env: &CompileEnv<'_>,
) -> Result<VariableTable, MalformedPatternError> {
    let mut variables: Vec<Variable> = Vec::new();
    let mut written: Vec<Written> = Vec::new();
    let mut by_occurrence = Vec::with_capacity(scanned.occurrences.len());

    for occurrence in &scanned.occurrences {
        let existing = (occurrence.sigil != Sigil::Wildcard)
            .then(|| {
                variables
                    .iter()
                    .position(|variable| !variable.wildcard && variable.name == occurrence.name)
            })
            .flatten();
        let index = match existing {
            Some(index) => {
                if let (Some(variable), Some(record)) =
                    (variables.get_mut(index), written.get_mut(index))
                {
                    merge(variable, record, occurrence, env)?;
                }
                index
            }
            None => {
                let (variable, record) = declare(occurrence, options, env)?;
                variables.push(variable);
                written.push(record);
                variables.len() - 1
            }
        };
        by_occurrence.push(VarId(index));
    }

    Ok(VariableTable {
        variables,
        by_occurrence,
    })
}

fn declare(
    occurrence: &Occurrence,
    options: &CompileOptions,
    env: &CompileEnv<'_>,
) -> Result<(Variable, Written), MalformedPatternError> {
    let span = occurrence.source_span();
    let external = (occurrence.sigil == Sigil::External).then(|| {
        options
            .variables()
            .get(&occurrence.name)
            .cloned()
            .unwrap_or_default()
    });

    let occurs = match (occurrence.quantifier, &external) {
        (Some(quantifier), _) => occurs_of(quantifier),
        (None, Some(spec)) => spec_occurs(&occurrence.name, spec, span)?,
        (None, None) => Occurs::ONE,
    };
    let constraint = match (&occurrence.constraint, &external) {
        (Some(raw), _) => Some(constraint::parse(&raw.text, raw.offset, env)?),
        (None, Some(spec)) => spec
            .constraint()
            .map(|source| {
                detached_constraint(
                    source,
                    &format!("constraint of variable '{}'", occurrence.name),
                    Some(span),
                    env,
                )
            })
            .transpose()?,
        (None, None) => None,
    };
    let target = match &external {
        Some(spec) => spec.target(),
        None => occurrence.sigil == Sigil::Target,
    };

    let variable = Variable {
        name: occurrence.name.clone(),
        anonymous: !target,
        wildcard: occurrence.sigil == Sigil::Wildcard,
        occurs,
        constraint,
        target,
        span,
    };
    let record = Written {
        range: occurrence.quantifier,
        constraint: occurrence
            .constraint
            .as_ref()
            .map(|raw| raw.text.trim().to_owned()),
    };
    Ok((variable, record))
}

fn merge(
    variable: &mut Variable,
    record: &mut Written,
    occurrence: &Occurrence,
    env: &CompileEnv<'_>,
) -> Result<(), MalformedPatternError> {
    let span = Some(occurrence.source_span());
    if let Some(quantifier) = occurrence.quantifier {
        match record.range {
            Some(previous) if previous != quantifier => {
                return Err(MalformedPatternError::new(
                    DiagnosticCode::ESiftConflictingConstraints,
                    format!(
                        "variable '{}' is given two different ranges",
                        occurrence.name
                    ),
                    span,
                )
                .with_note(format!(
                    "first range is {}, this one is {}",
                    occurs_of(previous),
                    occurs_of(quantifier)
                )));
            }
            Some(_) => {}
            None => {
                record.range = Some(quantifier);
                variable.occurs = occurs_of(quantifier);
            }
        }
    }
    if let Some(raw) = &occurrence.constraint {
        let text = raw.text.trim();
        match &record.constraint {
            Some(previous) if previous != text => {
                return Err(MalformedPatternError::new(
                    DiagnosticCode::ESiftConflictingConstraints,
                    format!(
                        "variable '{}' is given two different constraints",
                        occurrence.name
                    ),
                    span,
                )
                .with_note(format!("first constraint is '{previous}'")));
            }
            Some(_) => {}
            None => {
                variable.constraint = Some(constraint::parse(&raw.text, raw.offset, env)?);
                record.constraint = Some(text.to_owned());
            }
        }
    }
    Ok(())
}

const fn occurs_of(quantifier: Quantifier) -> Occurs {
    Occurs {
        min: quantifier.min,
        max: quantifier.max,
        greedy: quantifier.greedy,
    }
}

fn spec_occurs(
    name: &str,
    spec: &VariableSpec,
    span: SourceSpan,
) -> Result<Occurs, MalformedPatternError> {
    if spec.max().is_some_and(|max| max < spec.min()) {
        return Err(MalformedPatternError::new(
            DiagnosticCode::ESiftRangeInvalid,
            format!(
                "variable '{name}' declares a minimum of {} above its maximum",
                spec.min()
            ),
            Some(span),
        ));
    }
    Ok(Occurs {
        min: spec.min(),
        max: spec.max(),
        greedy: spec.greedy(),
    })
}

/// Parses constraint text supplied outside the query, reporting errors
/// against `span` instead of offsets into that text.
pub(super) fn detached_constraint(
    source: &str,
    label: &str,
    span: Option<SourceSpan>,
    env: &CompileEnv<'_>,
) -> Result<ConstraintExpr, MalformedPatternError> {
    constraint::parse(source.trim(), 0, env).map_err(|err| {
        let diagnostic = err.diagnostic();
        diagnostic.notes().iter().fold(
            MalformedPatternError::new(
                err.code(),
                format!("{label}: {}", diagnostic.message()),
                span,
            ),
            |error, note| error.with_note(note.clone()),
        )
    })
}
