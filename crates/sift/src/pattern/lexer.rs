//! Placeholder scanning.
//!
//! The scanner walks the query text once, replaces every placeholder (with
//! its quantifier and constraint suffix) by a host-language identifier and
//! records what it removed. Everything else is copied through unchanged so
//! the host parser sees ordinary code.

use std::ops::Range;

use sift_core::{DiagnosticCode, MalformedPatternError, SourceSpan};

const IDENT_PREFIX: &str = "__SIFT_VAR_";
const IDENT_SUFFIX: &str = "__";

/// Returns the identifier substituted for the placeholder at `index`.
pub(crate) fn placeholder_ident(index: usize) -> String {
    format!("{IDENT_PREFIX}{index}{IDENT_SUFFIX}")
}

/// Returns the occurrence index encoded in a substituted identifier.
pub(crate) fn placeholder_index(text: &str) -> Option<usize> {
    text.strip_prefix(IDENT_PREFIX)?
        .strip_suffix(IDENT_SUFFIX)?
        .parse()
        .ok()
}

/// How a placeholder was spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Sigil {
    /// `'name`: captured and reported as a search target.
    Target,
    /// `'_name`: captured but never a target.
    Anonymous,
    /// `'_`: an independent wildcard per occurrence.
    Wildcard,
    /// `$name$`: range and constraint come from the compile options.
    External,
}

/// An occurrence range written after a placeholder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Quantifier {
    pub(crate) min: u32,
    pub(crate) max: Option<u32>,
    pub(crate) greedy: bool,
}

/// Constraint text written after `:`, with its offset in the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawConstraint {
    pub(crate) text: String,
    pub(crate) offset: usize,
}

/// One placeholder found in the query.
#[derive(Debug, Clone)]
pub(crate) struct Occurrence {
    pub(crate) name: String,
    pub(crate) sigil: Sigil,
    /// Bytes of the whole placeholder in the original query.
    pub(crate) span: Range<usize>,
    /// Bytes of the substituted identifier in the rewritten text.
    pub(crate) replaced: Range<usize>,
    pub(crate) quantifier: Option<Quantifier>,
    pub(crate) constraint: Option<RawConstraint>,
}

impl Occurrence {
    pub(crate) fn source_span(&self) -> SourceSpan {
        SourceSpan::from_offsets(self.span.start, self.span.end)
    }
}

/// The rewritten query and the placeholders removed from it.
#[derive(Debug, Clone)]
pub(crate) struct Scanned {
    pub(crate) text: String,
    pub(crate) occurrences: Vec<Occurrence>,
}

impl Scanned {
    /// Maps an offset in the rewritten text back to the original query.
    pub(crate) fn original_offset(&self, offset: usize) -> usize {
        let preceding = self
            .occurrences
            .iter()
            .take_while(|occurrence| occurrence.replaced.start <= offset)
            .last();
        match preceding {
            None => offset,
            Some(occurrence) if offset < occurrence.replaced.end => occurrence.span.start,
            Some(occurrence) => offset - occurrence.replaced.end + occurrence.span.end,
        }
    }
}

/// A byte cursor over the query text.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) const fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    pub(crate) const fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.text.get(self.pos..)?.chars().next()
    }

    pub(crate) fn peek_second(&self) -> Option<char> {
        let mut chars = self.text.get(self.pos..)?.chars();
        chars.next();
        chars.next()
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    pub(crate) fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_str(&mut self, expected: &str) -> bool {
        let found = self
            .text
            .get(self.pos..)
            .is_some_and(|rest| rest.starts_with(expected));
        if found {
            self.pos += expected.len();
        }
        found
    }

    pub(crate) fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    pub(crate) fn take_while(&mut self, mut keep: impl FnMut(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&mut keep) {
            self.bump();
        }
        self.slice(start..self.pos)
    }

    pub(crate) fn slice(&self, range: Range<usize>) -> &'a str {
        self.text.get(range).unwrap_or_default()
    }

    pub(crate) fn is_done(&self) -> bool {
        self.pos >= self.text.len()
    }
}

pub(crate) const fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}

const fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Replaces every placeholder of `query` by a substituted identifier.
///
/// # Errors
///
/// Returns an error for malformed quantifiers and unterminated constraint
/// brackets.
pub(crate) fn scan(query: &str) -> Result<Scanned, MalformedPatternError> {
    let mut text = String::with_capacity(query.len());
    let mut occurrences = Vec::new();
    let mut cursor = Cursor::new(query);
    let mut previous: Option<char> = None;

    while let Some(ch) = cursor.peek() {
        let start = cursor.pos();
        let after_ident = previous.is_some_and(is_ident_char);
        let name = match ch {
            '\'' if !after_ident => quoted_name(&mut cursor),
            '$' if !after_ident => external_name(&mut cursor),
            _ => None,
        };
        let Some((name, sigil)) = name else {
            cursor.bump();
            text.push(ch);
            previous = Some(ch);
            continue;
        };

        let quantifier = quantifier(&mut cursor)?;
        let constraint = constraint(&mut cursor)?;
        let ident = placeholder_ident(occurrences.len());
        let replaced = text.len()..text.len() + ident.len();
        text.push_str(&ident);
        occurrences.push(Occurrence {
            name,
            sigil,
            span: start..cursor.pos(),
            replaced,
            quantifier,
            constraint,
        });
        previous = Some('_');
    }

    Ok(Scanned { text, occurrences })
}

/// Reads `'name`, leaving the cursor untouched when the quote does not start
/// a placeholder.
fn quoted_name(cursor: &mut Cursor<'_>) -> Option<(String, Sigil)> {
    let mut probe = *cursor;
    probe.bump();
    if !probe
        .peek()
        .is_some_and(|first| first == '_' || first.is_ascii_alphabetic())
    {
        return None;
    }
    let name = probe.take_while(is_name_char);
    if probe.peek() == Some('\'') {
        return None;
    }
    let sigil = match name {
        "_" => Sigil::Wildcard,
        _ if name.starts_with('_') => Sigil::Anonymous,
        _ => Sigil::Target,
    };
    *cursor = probe;
    Some((name.to_owned(), sigil))
}

/// Reads `$name$`, leaving the cursor untouched otherwise.
fn external_name(cursor: &mut Cursor<'_>) -> Option<(String, Sigil)> {
    let mut probe = *cursor;
    probe.bump();
    if !probe
        .peek()
        .is_some_and(|first| first == '_' || first.is_ascii_alphabetic())
    {
        return None;
    }
    let name = probe.take_while(is_name_char);
    if !probe.eat('$') {
        return None;
    }
    *cursor = probe;
    Some((name.to_owned(), Sigil::External))
}

fn quantifier(cursor: &mut Cursor<'_>) -> Result<Option<Quantifier>, MalformedPatternError> {
    let range = match cursor.peek() {
        Some('?') => {
            cursor.bump();
            (0, Some(1))
        }
        Some('*') => {
            cursor.bump();
            (0, None)
        }
        Some('+') => {
            cursor.bump();
            (1, None)
        }
        Some('{')
            if cursor
                .peek_second()
                .is_some_and(|next| next.is_ascii_digit() || next == ',') =>
        {
            braced_range(cursor)?
        }
        _ => return Ok(None),
    };
    let greedy = !cursor.eat('?');
    Ok(Some(Quantifier {
        min: range.0,
        max: range.1,
        greedy,
    }))
}

fn braced_range(cursor: &mut Cursor<'_>) -> Result<(u32, Option<u32>), MalformedPatternError> {
    let start = cursor.pos();
    cursor.bump();
    let body = cursor.take_while(|ch| ch != '}');
    if !cursor.eat('}') {
        return Err(MalformedPatternError::new(
            DiagnosticCode::ESiftRangeInvalid,
            "occurrence range is missing its closing '}'",
            Some(SourceSpan::from_offsets(start, cursor.pos())),
        ));
    }
    let span = Some(SourceSpan::from_offsets(start, cursor.pos()));
    let invalid = |reason: &str| {
        MalformedPatternError::new(
            DiagnosticCode::ESiftRangeInvalid,
            format!("range {{{body}}} {reason}"),
            span,
        )
    };
    let bound = |text: &str| -> Result<Option<u32>, MalformedPatternError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed
            .parse()
            .map(Some)
            .map_err(|_| invalid("is not a number"))
    };

    let (min, max) = match body.split_once(',') {
        None => {
            let exact = bound(body)?.ok_or_else(|| invalid("is empty"))?;
            (exact, Some(exact))
        }
        Some((_, upper)) if upper.contains(',') => return Err(invalid("has too many bounds")),
        Some((lower, upper)) => (bound(lower)?.unwrap_or(0), bound(upper)?),
    };
    if max.is_some_and(|upper| upper < min) {
        return Err(invalid("has a minimum above its maximum"));
    }
    Ok((min, max))
}

fn constraint(cursor: &mut Cursor<'_>) -> Result<Option<RawConstraint>, MalformedPatternError> {
    if cursor.peek() != Some(':')
        || cursor
            .peek_second()
            .is_none_or(|next| next.is_whitespace() || next == ':')
    {
        return Ok(None);
    }
    let before = *cursor;
    cursor.bump();
    let offset = cursor.pos();
    let text = if cursor.peek() == Some('[') {
        bracketed(cursor)?
    } else {
        shorthand(cursor)
    };
    if text.is_empty() {
        *cursor = before;
        return Ok(None);
    }
    Ok(Some(RawConstraint {
        text: text.to_owned(),
        offset,
    }))
}

/// Reads a `[ ... ]` predicate list, including the brackets.
fn bracketed<'a>(cursor: &mut Cursor<'a>) -> Result<&'a str, MalformedPatternError> {
    let start = cursor.pos();
    let mut depth = 0_usize;
    let mut in_string = false;
    while let Some(ch) = cursor.bump() {
        match ch {
            '\\' => {
                cursor.bump();
            }
            '"' => in_string = !in_string,
            '[' if !in_string => depth += 1,
            ']' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(cursor.slice(start..cursor.pos()));
                }
            }
            _ => {}
        }
    }
    Err(MalformedPatternError::new(
        DiagnosticCode::ESiftConstraintSyntax,
        "constraint '[' is never closed",
        Some(SourceSpan::from_offsets(start, cursor.pos())),
    ))
}

/// Reads a shorthand regex up to whitespace, a list separator or an
/// unbalanced closing bracket.
fn shorthand<'a>(cursor: &mut Cursor<'a>) -> &'a str {
    let start = cursor.pos();
    let mut depth = 0_usize;
    while let Some(ch) = cursor.peek() {
        match ch {
            _ if ch.is_whitespace() => break,
            ';' | ',' if depth == 0 => break,
            ')' | ']' | '}' => {
                let Some(inner) = depth.checked_sub(1) else {
                    break;
                };
                depth = inner;
            }
            '(' | '[' | '{' => depth += 1,
            '\\' => {
                cursor.bump();
            }
            _ => {}
        }
        cursor.bump();
    }
    cursor.slice(start..cursor.pos())
}
