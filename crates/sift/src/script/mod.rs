//! Script constraints.
//!
//! `script(e)` hands a boolean expression to a [`ScriptEvaluator`] together
//! with a [`ScriptScope`] describing every bound variable. The engine ships
//! with [`BuiltinEvaluator`], a small side-effect-free expression language;
//! embedders may plug in their own evaluator.

mod builtin;

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

pub use builtin::BuiltinEvaluator;

/// Name under which the candidate node is exposed to scripts.
pub const CONTEXT_VARIABLE: &str = "__context__";

/// Errors raised while running a script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// The script failed for this candidate only; the candidate does not
    /// match and the search continues.
    #[error("{0}")]
    Failed(String),
    /// The evaluator cannot run scripts at all; the search is aborted.
    #[error("{0}")]
    Unavailable(String),
}

/// A bound variable as seen by a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeValue {
    /// Source text spanning every bound node.
    pub text: String,
    /// Grammar kind of the first bound node.
    pub kind: String,
    /// Number of bound nodes.
    pub count: usize,
}

/// A value produced or consumed by a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptValue {
    /// An unbound variable or the `null` literal.
    Null,
    /// A boolean.
    Bool(bool),
    /// A 64-bit integer.
    Int(i64),
    /// A string.
    Str(String),
    /// A bound variable.
    Node(NodeValue),
}

impl ScriptValue {
    /// Returns the type name used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Str(_) => "string",
            Self::Node(_) => "node",
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(value) => f.write_str(value),
            Self::Node(node) => f.write_str(&node.text),
        }
    }
}

/// The variables visible to a script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptScope {
    values: BTreeMap<String, ScriptValue>,
}

impl ScriptScope {
    /// Creates an empty scope.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Binds `name` to `value`, replacing any earlier binding.
    pub fn insert(&mut self, name: impl Into<String>, value: ScriptValue) {
        self.values.insert(name.into(), value);
    }

    /// Looks a variable up.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ScriptValue> {
        self.values.get(name)
    }

    /// Iterates over the bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScriptValue)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }
}

/// Runs `script(...)` constraints.
///
/// Implementations must be pure: the matcher may call `evaluate` any number
/// of times for one candidate while it backtracks.
pub trait ScriptEvaluator: Send + Sync + fmt::Debug {
    /// Checks a script when the pattern is compiled.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the script cannot run.
    fn validate(&self, source: &str) -> Result<(), String>;

    /// Evaluates a script against one candidate.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Failed`] when the script fails for this
    /// candidate and [`ScriptError::Unavailable`] when no script can run.
    fn evaluate(&self, source: &str, scope: &ScriptScope) -> Result<bool, ScriptError>;
}
