//! Constraint predicates and their parser.
//!
//! A constraint is written after a placeholder as either a shorthand regex
//! (`'x:get.*`, `'x:!*Base`) or a bracketed predicate expression
//! (`'x:[regex( get.* ) && !within( class 'C {} )]`). `&&` binds tighter
//! than `||`; `!` and parentheses work as usual.

use regex::{Regex, RegexBuilder};
use sift_core::{DiagnosticCode, MalformedPatternError, PatternContext, SourceSpan};

use super::lexer::{Cursor, is_ident_char};
use super::{CompileEnv, CompiledPattern};

/// How a text or type constraint treats the type hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Hierarchy {
    /// Only the text itself is tested.
    #[default]
    Exact,
    /// `*Name`: the text or any of its supertypes.
    Inclusive,
    /// `+Name`: supertypes only.
    Strict,
}

/// A compiled regex together with its hierarchy mode and negation.
#[derive(Debug, Clone)]
pub struct TextPattern {
    source: String,
    regex: Regex,
    hierarchy: Hierarchy,
    negate: bool,
}

impl TextPattern {
    /// Returns the regex body as written.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the compiled regex.
    #[must_use]
    pub const fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Returns the hierarchy mode.
    #[must_use]
    pub const fn hierarchy(&self) -> Hierarchy {
        self.hierarchy
    }

    /// Returns whether the result is inverted.
    #[must_use]
    pub const fn negate(&self) -> bool {
        self.negate
    }

    /// Returns the body when it is a plain identifier such as `Base`.
    #[must_use]
    pub fn plain_name(&self) -> Option<&str> {
        let mut chars = self.source.chars();
        let first = chars.next()?;
        (!first.is_ascii_digit() && is_ident_char(first) && chars.all(is_ident_char))
            .then_some(self.source.as_str())
    }
}

/// A single constraint predicate.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Constraint {
    /// `regex(p)` anchored to the whole text, or `regexw(p)` on word
    /// boundaries.
    Regex {
        /// The compiled text pattern.
        pattern: TextPattern,
        /// Whether the regex only needs to match a whole word.
        whole_word: bool,
    },
    /// `exprtype(t)`: the static type of the candidate.
    ExprType(TextPattern),
    /// `ref(p)`: the declaration the candidate resolves to.
    Ref(Box<CompiledPattern>),
    /// `within(p)`: some strict ancestor.
    Within {
        /// The nested pattern.
        pattern: Box<CompiledPattern>,
        /// Whether the result is inverted.
        negate: bool,
    },
    /// `contains(p)`: some strict descendant.
    Contains {
        /// The nested pattern.
        pattern: Box<CompiledPattern>,
        /// Whether the result is inverted.
        negate: bool,
    },
    /// `script(e)`: a boolean expression run by the script evaluator.
    Script(String),
    /// `modifier(m, ...)`: at least one of the modifiers is present.
    Modifier {
        /// Accepted modifiers.
        set: Vec<String>,
        /// Whether the result is inverted.
        negate: bool,
    },
    /// `sameas(v)`: structurally equal to the binding of `v`.
    SameAs(String),
}

impl Constraint {
    /// Returns the predicate name used in diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Regex {
                whole_word: true, ..
            } => "regexw",
            Self::Regex { .. } => "regex",
            Self::ExprType(_) => "exprtype",
            Self::Ref(_) => "ref",
            Self::Within { .. } => "within",
            Self::Contains { .. } => "contains",
            Self::Script(_) => "script",
            Self::Modifier { .. } => "modifier",
            Self::SameAs(_) => "sameas",
        }
    }
}

/// A boolean combination of predicates.
#[derive(Debug, Clone)]
pub enum ConstraintExpr {
    /// A single predicate.
    Predicate(Constraint),
    /// Logical negation.
    Not(Box<ConstraintExpr>),
    /// Every operand holds, checked left to right.
    All(Vec<ConstraintExpr>),
    /// Some operand holds, checked left to right.
    Any(Vec<ConstraintExpr>),
}

impl ConstraintExpr {
    /// Negates the expression, folding into the predicate's own flag where
    /// it has one.
    fn negated(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            Self::Predicate(Constraint::Regex {
                mut pattern,
                whole_word,
            }) => {
                pattern.negate = !pattern.negate;
                Self::Predicate(Constraint::Regex {
                    pattern,
                    whole_word,
                })
            }
            Self::Predicate(Constraint::ExprType(mut pattern)) => {
                pattern.negate = !pattern.negate;
                Self::Predicate(Constraint::ExprType(pattern))
            }
            Self::Predicate(Constraint::Within { pattern, negate }) => {
                Self::Predicate(Constraint::Within {
                    pattern,
                    negate: !negate,
                })
            }
            Self::Predicate(Constraint::Contains { pattern, negate }) => {
                Self::Predicate(Constraint::Contains {
                    pattern,
                    negate: !negate,
                })
            }
            Self::Predicate(Constraint::Modifier { set, negate }) => {
                Self::Predicate(Constraint::Modifier {
                    set,
                    negate: !negate,
                })
            }
            other => Self::Not(Box::new(other)),
        }
    }

    /// Returns every predicate in evaluation order.
    #[must_use]
    pub fn predicates(&self) -> Vec<&Constraint> {
        let mut found = Vec::new();
        let mut pending = vec![self];
        while let Some(expr) = pending.pop() {
            match expr {
                Self::Predicate(constraint) => found.push(constraint),
                Self::Not(inner) => pending.push(inner),
                Self::All(items) | Self::Any(items) => pending.extend(items.iter().rev()),
            }
        }
        found
    }

    /// Returns the predicates that must all hold, skipping any under `||`
    /// or `!`.
    pub(crate) fn conjuncts(&self) -> Vec<&Constraint> {
        let mut found = Vec::new();
        let mut pending = vec![self];
        while let Some(expr) = pending.pop() {
            match expr {
                Self::Predicate(constraint) => found.push(constraint),
                Self::All(items) => pending.extend(items.iter().rev()),
                Self::Not(_) | Self::Any(_) => {}
            }
        }
        found
    }

    /// Returns whether any predicate compares against another variable.
    pub(crate) fn mentions_same_as(&self) -> bool {
        self.predicates()
            .iter()
            .any(|constraint| matches!(constraint, Constraint::SameAs(_)))
    }
}

/// Parses constraint text found after a placeholder.
///
/// `offset` is the position of the text in the query and anchors every
/// reported span.
pub(crate) fn parse(
    text: &str,
    offset: usize,
    env: &CompileEnv<'_>,
) -> Result<ConstraintExpr, MalformedPatternError> {
    let Some(inner) = text.strip_prefix('[') else {
        let pattern = text_pattern(text, offset, false, env)?;
        return Ok(ConstraintExpr::Predicate(Constraint::Regex {
            pattern,
            whole_word: false,
        }));
    };
    let body = inner.strip_suffix(']').ok_or_else(|| {
        syntax_error(
            "constraint '[' is never closed",
            offset,
            offset + text.len(),
        )
    })?;
    let mut parser = Parser {
        cursor: Cursor::new(body),
        base: offset + 1,
        env,
    };
    let expr = parser.disjunction()?;
    parser.cursor.skip_whitespace();
    if !parser.cursor.is_done() {
        let at = parser.absolute(parser.cursor.pos());
        return Err(syntax_error(
            "unexpected text after constraint expression",
            at,
            offset + text.len(),
        ));
    }
    Ok(expr)
}

fn syntax_error(message: &str, start: usize, end: usize) -> MalformedPatternError {
    MalformedPatternError::new(
        DiagnosticCode::ESiftConstraintSyntax,
        message,
        Some(SourceSpan::from_offsets(start, end)),
    )
}

/// An argument as written, before unquoting.
#[derive(Debug, Clone, Copy)]
struct Arg<'a> {
    raw: &'a str,
    offset: usize,
}

impl Arg<'_> {
    fn end(&self) -> usize {
        self.offset + self.raw.len()
    }

    fn error(&self, code: DiagnosticCode, message: impl Into<String>) -> MalformedPatternError {
        MalformedPatternError::new(
            code,
            message,
            Some(SourceSpan::from_offsets(self.offset, self.end())),
        )
    }

    /// Returns the argument value, processing `\"` and `\\` escapes in a
    /// quoted argument. Other escapes are kept verbatim.
    fn value(&self) -> Result<String, MalformedPatternError> {
        let Some(quoted) = self.raw.strip_prefix('"') else {
            if self.raw.ends_with('\\') && !self.raw.ends_with("\\\\") {
                return Err(self.error(
                    DiagnosticCode::ESiftConstraintSyntax,
                    "invalid escape: '\\' at end of argument",
                ));
            }
            return Ok(self.raw.to_owned());
        };
        let mut value = String::with_capacity(quoted.len());
        let mut chars = quoted.chars();
        while let Some(ch) = chars.next() {
            match ch {
                '\\' => match chars.next() {
                    Some(escaped @ ('"' | '\\')) => value.push(escaped),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => {
                        return Err(self.error(
                            DiagnosticCode::ESiftConstraintSyntax,
                            "invalid escape: '\\' at end of argument",
                        ));
                    }
                },
                '"' => {
                    if chars.as_str().trim().is_empty() {
                        return Ok(value);
                    }
                    return Err(self.error(
                        DiagnosticCode::ESiftConstraintSyntax,
                        "unexpected text after quoted argument",
                    ));
                }
                _ => value.push(ch),
            }
        }
        Err(self.error(
            DiagnosticCode::ESiftConstraintSyntax,
            "quoted argument is never closed",
        ))
    }

    /// Offset of the first value byte, past an opening quote.
    fn value_offset(&self) -> usize {
        if self.raw.starts_with('"') {
            self.offset + 1
        } else {
            self.offset
        }
    }
}

struct Parser<'a, 'e> {
    cursor: Cursor<'a>,
    base: usize,
    env: &'e CompileEnv<'e>,
}

impl<'a> Parser<'a, '_> {
    const fn absolute(&self, local: usize) -> usize {
        self.base + local
    }

    fn disjunction(&mut self) -> Result<ConstraintExpr, MalformedPatternError> {
        let mut items = vec![self.conjunction()?];
        loop {
            self.cursor.skip_whitespace();
            if !self.cursor.eat_str("||") {
                break;
            }
            items.push(self.conjunction()?);
        }
        Ok(collapse(items, ConstraintExpr::Any))
    }

    fn conjunction(&mut self) -> Result<ConstraintExpr, MalformedPatternError> {
        let mut items = vec![self.unary()?];
        loop {
            self.cursor.skip_whitespace();
            if !self.cursor.eat_str("&&") {
                break;
            }
            items.push(self.unary()?);
        }
        Ok(collapse(items, ConstraintExpr::All))
    }

    fn unary(&mut self) -> Result<ConstraintExpr, MalformedPatternError> {
        self.cursor.skip_whitespace();
        if self.cursor.eat('!') {
            return Ok(self.unary()?.negated());
        }
        if self.cursor.eat('(') {
            let open = self.cursor.pos();
            let inner = self.disjunction()?;
            self.cursor.skip_whitespace();
            if !self.cursor.eat(')') {
                return Err(syntax_error(
                    "'(' is never closed",
                    self.absolute(open.saturating_sub(1)),
                    self.absolute(self.cursor.pos()),
                ));
            }
            return Ok(inner);
        }
        self.predicate()
    }

    fn predicate(&mut self) -> Result<ConstraintExpr, MalformedPatternError> {
        let start = self.cursor.pos();
        let name = self.cursor.take_while(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        let name_span = (self.absolute(start), self.absolute(self.cursor.pos()));
        if name.is_empty() {
            return Err(syntax_error(
                "expected a predicate name",
                name_span.0,
                name_span.0,
            ));
        }
        self.cursor.skip_whitespace();
        if !self.cursor.eat('(') {
            return Err(syntax_error(
                &format!("predicate '{name}' needs an argument list"),
                name_span.0,
                name_span.1,
            ));
        }
        let args = self.arguments()?;
        let lowered = name.to_ascii_lowercase();
        let constraint = match lowered.as_str() {
            "regex" | "regexw" => {
                let arg = single(name, &args, name_span)?;
                let whole_word = lowered == "regexw";
                Constraint::Regex {
                    pattern: text_pattern(&arg.value()?, arg.value_offset(), whole_word, self.env)?,
                    whole_word,
                }
            }
            "exprtype" => {
                let arg = single(name, &args, name_span)?;
                let pattern = text_pattern(&arg.value()?, arg.value_offset(), false, self.env)?;
                Constraint::ExprType(pattern)
            }
            "ref" => Constraint::Ref(sub_pattern(single(name, &args, name_span)?, self.env)?),
            "within" | "contains" => {
                let (pattern, negate) = scoped(name, &args, name_span, self.env)?;
                if lowered == "within" {
                    Constraint::Within { pattern, negate }
                } else {
                    Constraint::Contains { pattern, negate }
                }
            }
            "script" => {
                let arg = single(name, &args, name_span)?;
                let source = arg.value()?;
                self.env.evaluator.validate(&source).map_err(|reason| {
                    arg.error(
                        DiagnosticCode::ESiftScriptInvalid,
                        format!("script '{source}' is invalid: {reason}"),
                    )
                })?;
                Constraint::Script(source)
            }
            "modifier" => {
                let set: Vec<String> = args
                    .iter()
                    .map(Arg::value)
                    .collect::<Result<Vec<_>, _>>()?
                    .into_iter()
                    .filter(|modifier| !modifier.is_empty())
                    .collect();
                if set.is_empty() {
                    return Err(syntax_error(
                        "'modifier' needs at least one modifier",
                        name_span.0,
                        name_span.1,
                    ));
                }
                Constraint::Modifier { set, negate: false }
            }
            "sameas" => {
                let arg = single(name, &args, name_span)?;
                let value = arg.value()?;
                let variable = value.trim_start_matches('\'');
                let valid = !variable.is_empty()
                    && variable.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
                if !valid {
                    return Err(arg.error(
                        DiagnosticCode::ESiftConstraintSyntax,
                        format!("'sameas' expects a variable name, found '{value}'"),
                    ));
                }
                Constraint::SameAs(variable.to_owned())
            }
            _ => {
                return Err(MalformedPatternError::new(
                    DiagnosticCode::ESiftUnknownConstraint,
                    format!("unknown constraint '{name}'"),
                    Some(SourceSpan::from_offsets(name_span.0, name_span.1)),
                ));
            }
        };
        Ok(ConstraintExpr::Predicate(constraint))
    }

    /// Reads comma-separated arguments up to the closing `)`.
    fn arguments(&mut self) -> Result<Vec<Arg<'a>>, MalformedPatternError> {
        let open = self.cursor.pos();
        let mut args = Vec::new();
        loop {
            let (raw, start) = self.raw_argument()?;
            let trimmed_start = raw.len() - raw.trim_start().len();
            let trimmed = raw.trim();
            if !trimmed.is_empty() || !args.is_empty() || self.cursor.peek() == Some(',') {
                args.push(Arg {
                    raw: trimmed,
                    offset: self.absolute(start + trimmed_start),
                });
            }
            match self.cursor.bump() {
                Some(',') => {}
                Some(')') => return Ok(args),
                _ => {
                    return Err(syntax_error(
                        "argument list is never closed",
                        self.absolute(open.saturating_sub(1)),
                        self.absolute(self.cursor.pos()),
                    ));
                }
            }
        }
    }

    /// Scans one argument, honouring nesting, quoted strings and `\`
    /// escapes. Stops before the terminating `,` or `)`.
    fn raw_argument(&mut self) -> Result<(&'a str, usize), MalformedPatternError> {
        let start = self.cursor.pos();
        let mut depth = 0_usize;
        let mut in_string = false;
        while let Some(ch) = self.cursor.peek() {
            match ch {
                '\\' => {
                    self.cursor.bump();
                }
                '"' => in_string = !in_string,
                _ if in_string => {}
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' | ',' if depth == 0 => break,
                ')' | ']' | '}' => depth -= 1,
                _ => {}
            }
            self.cursor.bump();
        }
        if self.cursor.is_done() {
            return Err(syntax_error(
                "argument list is never closed",
                self.absolute(start),
                self.absolute(self.cursor.pos()),
            ));
        }
        Ok((self.cursor.slice(start..self.cursor.pos()), start))
    }
}

fn collapse(
    items: Vec<ConstraintExpr>,
    combine: fn(Vec<ConstraintExpr>) -> ConstraintExpr,
) -> ConstraintExpr {
    match <[ConstraintExpr; 1]>::try_from(items) {
        Ok([only]) => only,
        Err(many) => combine(many),
    }
}

fn single<'a>(
    name: &str,
    args: &[Arg<'a>],
    name_span: (usize, usize),
) -> Result<Arg<'a>, MalformedPatternError> {
    match args {
        [only] if !only.raw.is_empty() => Ok(*only),
        _ => Err(syntax_error(
            &format!("'{name}' expects exactly one argument"),
            name_span.0,
            name_span.1,
        )),
    }
}

fn scoped(
    name: &str,
    args: &[Arg<'_>],
    name_span: (usize, usize),
    env: &CompileEnv<'_>,
) -> Result<(Box<CompiledPattern>, bool), MalformedPatternError> {
    let (pattern_arg, flag) = match args {
        [pattern] => (pattern, None),
        [pattern, flag] => (pattern, Some(flag)),
        _ => {
            return Err(syntax_error(
                &format!("'{name}' expects a pattern and an optional negation flag"),
                name_span.0,
                name_span.1,
            ));
        }
    };
    let negate = match flag {
        None => false,
        Some(flag) => match flag.value()?.as_str() {
            "true" | "negate" => true,
            "false" => false,
            other => {
                return Err(flag.error(
                    DiagnosticCode::ESiftConstraintSyntax,
                    format!("'{name}' flag must be true, false or negate, found '{other}'"),
                ));
            }
        },
    };
    Ok((sub_pattern(*pattern_arg, env)?, negate))
}

fn sub_pattern(arg: Arg<'_>, env: &CompileEnv<'_>) -> Result<Box<CompiledPattern>, MalformedPatternError> {
    let text = arg.value()?;
    env.nested(&text, PatternContext::Default)
        .map(Box::new)
        .map_err(|inner| {
            let shifted = inner.clone().offset_by(arg.value_offset());
            let span = shifted
                .diagnostic()
                .span()
                .or_else(|| Some(SourceSpan::from_offsets(arg.offset, arg.end())));
            MalformedPatternError::new(
                DiagnosticCode::ESiftSubPatternInvalid,
                format!("nested pattern '{text}' is invalid"),
                span,
            )
            .with_note(inner.to_string())
        })
}

/// Parses optional `!`/`~` negation and `*`/`+` hierarchy sigils, then
/// compiles the regex with the configured case sensitivity.
fn text_pattern(
    text: &str,
    offset: usize,
    whole_word: bool,
    env: &CompileEnv<'_>,
) -> Result<TextPattern, MalformedPatternError> {
    let trimmed = text.trim();
    let (negate, unsigned) = match trimmed.strip_prefix(['!', '~']) {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let (hierarchy, body) = if let Some(rest) = unsigned.strip_prefix('*') {
        (Hierarchy::Inclusive, rest)
    } else if let Some(rest) = unsigned.strip_prefix('+') {
        (Hierarchy::Strict, rest)
    } else {
        (Hierarchy::Exact, unsigned)
    };
    let span = Some(SourceSpan::from_offsets(offset, offset + text.len()));
    if body.is_empty() {
        return Err(MalformedPatternError::new(
            DiagnosticCode::ESiftRegexInvalid,
            "regex is empty",
            span,
        ));
    }
    let wrapped = if whole_word {
        format!(r"\b(?:{body})\b")
    } else {
        format!("^(?:{body})$")
    };
    let regex = RegexBuilder::new(&wrapped)
        .case_insensitive(!env.case_sensitive)
        .build()
        .map_err(|err| {
            MalformedPatternError::new(
                DiagnosticCode::ESiftRegexInvalid,
                format!("regex '{body}' does not compile"),
                span,
            )
            .with_note(err.to_string())
        })?;
    Ok(TextPattern {
        source: body.to_owned(),
        regex,
        hierarchy,
        negate,
    })
}
