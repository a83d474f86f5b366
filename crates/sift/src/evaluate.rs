//! Constraint evaluation against candidate nodes.
//!
//! Every predicate answers for one candidate. A predicate that fails to run
//! (a script error, say) is recorded as an [`EvaluationFailure`] and treated
//! as `false`; only an evaluator that cannot run at all aborts the search.

use sift_core::{EvaluationFailure, Node, SearchError, TypeHierarchy};

use crate::matcher::{Session, structurally_equal};
use crate::pattern::{CompiledPattern, Constraint, ConstraintExpr, Hierarchy, TextPattern, VarId};
use crate::script::{CONTEXT_VARIABLE, NodeValue, ScriptError, ScriptScope, ScriptValue};

impl<'t, 'p> Session<'_, 't, 'p> {
    /// Evaluates a constraint expression for `candidate`.
    pub(crate) fn satisfies(
        &mut self,
        expr: &'p ConstraintExpr,
        candidate: Node<'t>,
    ) -> Result<bool, SearchError> {
        match expr {
            ConstraintExpr::Predicate(constraint) => self.predicate(constraint, candidate),
            ConstraintExpr::Not(inner) => Ok(!self.satisfies(inner, candidate)?),
            ConstraintExpr::All(items) => {
                for item in items {
                    if !self.satisfies(item, candidate)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            ConstraintExpr::Any(items) => {
                for item in items {
                    if self.satisfies(item, candidate)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    fn predicate(
        &mut self,
        constraint: &'p Constraint,
        candidate: Node<'t>,
    ) -> Result<bool, SearchError> {
        match constraint {
            Constraint::Regex { pattern, .. } => Ok(self.text_matches(pattern, candidate.text())),
            Constraint::ExprType(pattern) => Ok(self.type_matches(pattern, candidate)),
            Constraint::Ref(sub) => self.refers_to(sub, candidate),
            Constraint::Within { pattern, negate } => {
                let mut found = false;
                for ancestor in candidate.ancestors() {
                    if self.nested_match(pattern, ancestor)? {
                        found = true;
                        break;
                    }
                }
                Ok(found != *negate)
            }
            Constraint::Contains { pattern, negate } => {
                let mut found = false;
                for descendant in candidate.descendants().skip(1) {
                    if self.nested_match(pattern, descendant)? {
                        found = true;
                        break;
                    }
                }
                Ok(found != *negate)
            }
            Constraint::Script(source) => self.script(source, candidate),
            Constraint::Modifier { set, negate } => {
                let holder = match candidate.field_name() {
                    Some("name") => candidate.parent().unwrap_or(candidate),
                    _ => candidate,
                };
                let present = self.profile().modifiers(holder);
                let found = set.iter().any(|modifier| present.contains(modifier));
                Ok(found != *negate)
            }
            Constraint::SameAs(name) => Ok(self.same_as(name, candidate)),
        }
    }

    fn hierarchy(&self) -> &TypeHierarchy {
        self.ctx.hierarchy(self.profile())
    }

    /// Tests a regex against `text` and, for hierarchy wildcards, against
    /// the supertypes of `text`.
    fn text_matches(&self, pattern: &TextPattern, text: &str) -> bool {
        let direct = pattern.regex().is_match(text);
        let found = match pattern.hierarchy() {
            Hierarchy::Exact => direct,
            Hierarchy::Inclusive => direct || self.supertype_matches(pattern, text),
            Hierarchy::Strict => self.supertype_matches(pattern, text),
        };
        found != pattern.negate()
    }

    fn supertype_matches(&self, pattern: &TextPattern, text: &str) -> bool {
        self.hierarchy()
            .supertypes_of(&base_name(text))
            .iter()
            .any(|sup| pattern.regex().is_match(sup))
    }

    /// An unknown static type never matches, negated or not.
    fn type_matches(&self, pattern: &TextPattern, candidate: Node<'t>) -> bool {
        let Some(raw) = self.profile().static_type(candidate) else {
            return false;
        };
        let raw_type = raw.trim();
        let normalised = normalise_type(raw_type);
        let direct =
            pattern.regex().is_match(raw_type) || pattern.regex().is_match(&normalised);
        let found = match pattern.hierarchy() {
            Hierarchy::Exact => direct,
            Hierarchy::Inclusive => direct || self.supertype_matches(pattern, &normalised),
            Hierarchy::Strict => self.supertype_matches(pattern, &normalised),
        };
        found != pattern.negate()
    }

    /// Resolves `candidate` and tries `sub` at the declaration and its
    /// enclosing nodes up to the nearest statement.
    fn refers_to(
        &mut self,
        sub: &'p CompiledPattern,
        candidate: Node<'t>,
    ) -> Result<bool, SearchError> {
        let Some(declaration) = self.profile().resolve(candidate) else {
            return Ok(false);
        };
        for node in std::iter::once(declaration).chain(declaration.ancestors()) {
            if self.nested_match(sub, node)? {
                return Ok(true);
            }
            if self.profile().is_statement(node.kind()) {
                break;
            }
        }
        Ok(false)
    }

    fn nested_match(&mut self, sub: &'p CompiledPattern, node: Node<'t>) -> Result<bool, SearchError> {
        Session::new(&mut *self.ctx, sub).matches_at(node)
    }

    /// Compares against the binding of another variable; an unbound
    /// variable passes until completion re-checks it strictly.
    fn same_as(&self, name: &str, candidate: Node<'t>) -> bool {
        let bound = self
            .pattern
            .variable_named(name)
            .map(|var| self.bindings.group(var))
            .unwrap_or_default();
        match bound.first() {
            Some(first) => structurally_equal(*first, candidate, self.case_sensitive()),
            None => !self.strict_same_as,
        }
    }

    fn script(&mut self, source: &str, candidate: Node<'t>) -> Result<bool, SearchError> {
        self.ctx.check_cancelled()?;
        let scope = self.script_scope(candidate);
        match self.pattern.evaluator().evaluate(source, &scope) {
            Ok(result) => Ok(result),
            Err(ScriptError::Failed(message)) => {
                self.ctx.record_failure(EvaluationFailure::new(
                    candidate.span(),
                    "script",
                    message,
                ))?;
                Ok(false)
            }
            Err(ScriptError::Unavailable(message)) => Err(SearchError::evaluator_unavailable(message)),
        }
    }

    fn script_scope(&self, candidate: Node<'t>) -> ScriptScope {
        let mut scope = ScriptScope::new();
        for (index, variable) in self.pattern.variables().iter().enumerate() {
            if variable.is_wildcard() {
                continue;
            }
            let nodes = self.bindings.group(VarId::new(index));
            scope.insert(variable.name(), node_value(&nodes));
        }
        scope.insert(CONTEXT_VARIABLE, node_value(&[candidate]));
        scope
    }
}

fn node_value(nodes: &[Node<'_>]) -> ScriptValue {
    let (Some(first), Some(last)) = (nodes.first(), nodes.last()) else {
        return ScriptValue::Null;
    };
    let text = first
        .tree()
        .slice(first.byte_range().start..last.byte_range().end);
    ScriptValue::Node(NodeValue {
        text: text.to_owned(),
        kind: first.kind().to_owned(),
        count: nodes.len(),
    })
}

/// Strips package qualifiers from every path segment and removes
/// whitespace: `java.util.Map<java.lang.String, Foo>` becomes
/// `Map<String,Foo>`.
pub(crate) fn normalise_type(text: &str) -> String {
    let mut normalised = String::with_capacity(text.len());
    let mut segment = String::new();
    for ch in text.chars().filter(|ch| !ch.is_whitespace()) {
        if ch.is_alphanumeric() || ch == '_' || ch == '$' {
            segment.push(ch);
        } else if ch == '.' || ch == ':' {
            segment.clear();
        } else {
            normalised.push_str(&segment);
            segment.clear();
            normalised.push(ch);
        }
    }
    normalised.push_str(&segment);
    normalised
}

/// Returns the simple type name without generic arguments or array
/// suffixes.
fn base_name(text: &str) -> String {
    let normalised = normalise_type(text);
    let end = normalised.find(['<', '[', '(']).unwrap_or(normalised.len());
    normalised.get(..end).unwrap_or_default().to_owned()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{base_name, normalise_type};

    #[rstest]
    #[case("List<String>", "List<String>")]
    #[case("java.util.List<java.lang.String>", "List<String>")]
    #[case("java.util.Map< java.lang.String , Foo >", "Map<String,Foo>")]
    #[case("std::collections::HashMap<K, V>", "HashMap<K,V>")]
    #[case("int[]", "int[]")]
    #[case("java.lang.String[][]", "String[][]")]
    #[case("$Proxy_1", "$Proxy_1")]
    #[case("", "")]
    fn qualifiers_and_whitespace_are_dropped(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalise_type(raw), expected);
    }

    #[test]
    fn qualified_and_simple_generics_agree() {
        assert_eq!(
            normalise_type("java.util.List<java.lang.String>"),
            normalise_type("List<String>")
        );
    }

    #[rstest]
    #[case("java.util.List<java.lang.String>", "List")]
    #[case("Foo[]", "Foo")]
    #[case(" Bar ", "Bar")]
    #[case("Callback(number)", "Callback")]
    fn base_names_drop_arguments_and_suffixes(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(base_name(raw), expected);
    }
}
