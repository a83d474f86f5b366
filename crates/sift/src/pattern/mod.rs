//! Pattern compilation.
//!
//! A query such as `class 'C { '_m{0,0}:constructor ('_p*) { '_s*; } }` is
//! compiled in four steps:
//!
//! 1. placeholders are scanned and replaced by host identifiers;
//! 2. the language profile parses the rewritten text in the requested
//!    [`PatternContext`];
//! 3. the host tree is lowered into [`PatternNode`]s, attaching each
//!    placeholder to its [`Variable`];
//! 4. the result is validated, and in strict mode checked for slots that
//!    can never do anything useful.
//!
//! The [`CompiledPattern`] is immutable and can be shared between threads.

mod constraint;
mod lexer;
mod lower;
mod validate;
mod variables;

use std::fmt;
use std::sync::Arc;

use sift_core::{
    ChildMatching, CompileOptions, Diagnostic, DiagnosticCode, LanguageProfile,
    MalformedPatternError, PatternContext, PlaceholderRole, SourceSpan, TokenCategory,
};
use tracing::debug;

use crate::script::{BuiltinEvaluator, ScriptEvaluator};

pub use constraint::{Constraint, ConstraintExpr, Hierarchy, TextPattern};

/// Index of a variable in a pattern's variable table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VarId(usize);

impl VarId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the table index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// An occurrence range with its consumption order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum number of candidates consumed.
    pub min: u32,
    /// Maximum number of candidates consumed, `None` meaning unbounded.
    pub max: Option<u32>,
    /// Whether larger counts are tried first.
    pub greedy: bool,
}

impl Occurs {
    /// Exactly one, the range of an unquantified slot.
    pub const ONE: Self = Self {
        min: 1,
        max: Some(1),
        greedy: true,
    };

    /// Returns whether the slot asserts absence (`{0,0}`).
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self.max, Some(0))
    }

    /// Returns whether the slot is a plain single slot.
    #[must_use]
    pub const fn is_single(&self) -> bool {
        self.min == 1 && matches!(self.max, Some(1))
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Occurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{{{},{max}}}", self.min)?,
            None => write!(f, "{{{},}}", self.min)?,
        }
        if !self.greedy {
            f.write_str("?")?;
        }
        Ok(())
    }
}

/// A placeholder variable.
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    anonymous: bool,
    wildcard: bool,
    occurs: Occurs,
    constraint: Option<ConstraintExpr>,
    target: bool,
    span: SourceSpan,
}

impl Variable {
    /// Returns the name as written, without the leading quote.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the variable is never a search target.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// Returns whether this is a bare `'_`, never captured nor compared.
    #[must_use]
    pub const fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Returns the minimum occurrence count.
    #[must_use]
    pub const fn min(&self) -> u32 {
        self.occurs.min
    }

    /// Returns the maximum occurrence count.
    #[must_use]
    pub const fn max(&self) -> Option<u32> {
        self.occurs.max
    }

    /// Returns whether the variable consumes greedily.
    #[must_use]
    pub const fn greedy(&self) -> bool {
        self.occurs.greedy
    }

    /// Returns the occurrence range.
    #[must_use]
    pub const fn occurs(&self) -> Occurs {
        self.occurs
    }

    /// Returns the constraint, if any.
    #[must_use]
    pub const fn constraint(&self) -> Option<&ConstraintExpr> {
        self.constraint.as_ref()
    }

    /// Returns whether results are reported per node bound to it.
    #[must_use]
    pub const fn is_target(&self) -> bool {
        self.target
    }

    /// Returns the location of its first occurrence in the query.
    #[must_use]
    pub const fn span(&self) -> SourceSpan {
        self.span
    }
}

/// A node of the lowered pattern tree.
#[derive(Debug, Clone)]
pub enum PatternNode {
    /// A leaf that must appear verbatim.
    Literal {
        /// Grammar kind of the leaf.
        kind: &'static str,
        /// Source text of the leaf.
        text: String,
        /// Token category of the leaf.
        category: TokenCategory,
    },
    /// A placeholder binding candidate nodes to a variable.
    Placeholder {
        /// The bound variable.
        var: VarId,
        /// The syntactic position it stands for.
        role: PlaceholderRole,
        /// The occurrence index in the query, distinguishing repeated uses
        /// of one name.
        site: usize,
    },
    /// An inner node whose children are matched slot by slot.
    Structured {
        /// Grammar kind of the node.
        kind: &'static str,
        /// How the child slots are matched.
        matching: ChildMatching,
        /// Child slots in source order.
        children: Vec<Slot>,
        /// Whether candidate comments take part in matching.
        keeps_comments: bool,
    },
}

impl PatternNode {
    /// Returns the grammar kind for literal and structured nodes.
    #[must_use]
    pub const fn kind(&self) -> Option<&'static str> {
        match self {
            Self::Literal { kind, .. } | Self::Structured { kind, .. } => Some(kind),
            Self::Placeholder { .. } => None,
        }
    }
}

/// A pattern node together with how many candidates it consumes.
#[derive(Debug, Clone)]
pub struct Slot {
    /// The node matched against each consumed candidate.
    pub node: PatternNode,
    /// The occurrence range.
    pub occurs: Occurs,
}

/// Shared state threaded through compilation, including nested patterns.
pub(crate) struct CompileEnv<'a> {
    pub(crate) profile: &'a Arc<dyn LanguageProfile>,
    pub(crate) evaluator: &'a Arc<dyn ScriptEvaluator>,
    pub(crate) case_sensitive: bool,
}

impl CompileEnv<'_> {
    /// Compiles a pattern nested in a `ref`, `within` or `contains`
    /// constraint.
    pub(crate) fn nested(
        &self,
        text: &str,
        context: PatternContext,
    ) -> Result<CompiledPattern, MalformedPatternError> {
        let options = CompileOptions::default()
            .with_context(context)
            .with_case_sensitive(self.case_sensitive);
        CompiledPattern::compile_with(
            text,
            Arc::clone(self.profile),
            Arc::clone(self.evaluator),
            &options,
        )
    }
}

/// A compiled, immutable pattern.
///
/// # Example
///
/// ```ignore
/// let pattern = CompiledPattern::compile("a.b(null);", profile, &CompileOptions::default())?;
/// assert_eq!(pattern.slots().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    text: String,
    slots: Vec<Slot>,
    variables: Vec<Variable>,
    options: CompileOptions,
    context_constraint: Option<ConstraintExpr>,
    keeps_comments: bool,
    warnings: Vec<Diagnostic>,
    profile: Arc<dyn LanguageProfile>,
    evaluator: Arc<dyn ScriptEvaluator>,
}

impl CompiledPattern {
    /// Compiles `text` using the built-in script evaluator.
    ///
    /// # Errors
    ///
    /// Returns a [`MalformedPatternError`] describing the first problem
    /// found in the query.
    pub fn compile(
        text: &str,
        profile: Arc<dyn LanguageProfile>,
        options: &CompileOptions,
    ) -> Result<Self, MalformedPatternError> {
        Self::compile_with(text, profile, Arc::new(BuiltinEvaluator), options)
    }

    /// Compiles `text` with an explicit script evaluator.
    ///
    /// # Errors
    ///
    /// Returns a [`MalformedPatternError`] describing the first problem
    /// found in the query.
    pub fn compile_with(
        text: &str,
        profile: Arc<dyn LanguageProfile>,
        evaluator: Arc<dyn ScriptEvaluator>,
        options: &CompileOptions,
    ) -> Result<Self, MalformedPatternError> {
        if text.trim().is_empty() {
            return Err(MalformedPatternError::new(
                DiagnosticCode::ESiftEmptyPattern,
                "pattern is empty",
                None,
            ));
        }
        let env = CompileEnv {
            profile: &profile,
            evaluator: &evaluator,
            case_sensitive: options.case_sensitive(),
        };

        let scanned = lexer::scan(text)?;
        let table = variables::build(&scanned, options, &env)?;
        let snippet = profile
            .parse_snippet(&scanned.text, options.context())
            .map_err(|err| {
                let span = err.offset().map(|offset| {
                    let start = scanned.original_offset(offset);
                    SourceSpan::from_offsets(start, start.saturating_add(1))
                });
                MalformedPatternError::new(
                    DiagnosticCode::ESiftPatternParse,
                    format!(
                        "pattern is not valid {} in {} context: {}",
                        profile.name(),
                        options.context(),
                        err.message()
                    ),
                    span,
                )
            })?;
        let slots = lower::lower(&snippet, profile.as_ref(), &table, &scanned)?;
        let context_constraint = options
            .context_constraint()
            .map(|source| variables::detached_constraint(source, "context constraint", None, &env))
            .transpose()?;
        validate::same_as_targets(&table.variables, context_constraint.as_ref())?;

        let warnings = if options.strict() {
            validate::applicability(&slots, &table.variables, profile.as_ref())
        } else {
            Vec::new()
        };
        let keeps_comments = lower::keeps_comments(&slots);
        debug!(
            pattern = text,
            context = %options.context(),
            slots = slots.len(),
            variables = table.variables.len(),
            warnings = warnings.len(),
            "compiled pattern"
        );

        Ok(Self {
            text: text.to_owned(),
            slots,
            variables: table.variables,
            options: options.clone(),
            context_constraint,
            keeps_comments,
            warnings,
            profile,
            evaluator,
        })
    }

    /// Returns the query text as written.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the top-level slots.
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Returns the variable table.
    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Returns a variable by id.
    #[must_use]
    pub fn variable(&self, id: VarId) -> Option<&Variable> {
        self.variables.get(id.index())
    }

    /// Looks a variable up by name.
    #[must_use]
    pub fn variable_named(&self, name: &str) -> Option<VarId> {
        self.variables
            .iter()
            .position(|variable| !variable.wildcard && variable.name == name)
            .map(VarId)
    }

    /// Returns the options the pattern was compiled with.
    #[must_use]
    pub const fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Returns the constraint applied to every complete match.
    #[must_use]
    pub const fn context_constraint(&self) -> Option<&ConstraintExpr> {
        self.context_constraint.as_ref()
    }

    /// Returns whether top-level candidate comments take part in matching.
    #[must_use]
    pub const fn keeps_comments(&self) -> bool {
        self.keeps_comments
    }

    /// Returns the applicability warnings found in strict mode.
    #[must_use]
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Returns the language profile.
    #[must_use]
    pub fn profile(&self) -> &dyn LanguageProfile {
        self.profile.as_ref()
    }

    /// Returns the script evaluator.
    #[must_use]
    pub fn evaluator(&self) -> &dyn ScriptEvaluator {
        self.evaluator.as_ref()
    }

    /// Returns whether the pattern is matched over sibling windows rather
    /// than single nodes.
    #[must_use]
    pub const fn is_multi_slot(&self) -> bool {
        match self.slots.as_slice() {
            [only] => !only.occurs.is_single(),
            _ => true,
        }
    }
}
