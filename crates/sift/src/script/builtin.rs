//! The built-in script language.
//!
//! Expressions combine variables, string and integer literals, comparisons,
//! `+`/`-`, boolean `!`/`&&`/`||`, the accessors `.text`, `.kind`, `.count`
//! and `.length`, and the string methods `contains`, `startsWith`,
//! `endsWith` and `matches`. For example:
//!
//! ```text
//! name.text.startsWith("get") && args.count <= 2
//! ```

use regex::Regex;

use super::{ScriptError, ScriptEvaluator, ScriptScope, ScriptValue};

/// Nesting limit for parsed expressions.
const MAX_DEPTH: usize = 64;

const TWO_CHAR_PUNCT: &[&str] = &["||", "&&", "==", "!=", "<=", ">="];
const ONE_CHAR_PUNCT: &[&str] = &["!", "<", ">", "+", "-", "(", ")", ".", ","];

/// Evaluator for the built-in expression language.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinEvaluator;

impl ScriptEvaluator for BuiltinEvaluator {
    fn validate(&self, source: &str) -> Result<(), String> {
        parse(source).map(|_| ())
    }

    fn evaluate(&self, source: &str, scope: &ScriptScope) -> Result<bool, ScriptError> {
        let expr = parse(source).map_err(ScriptError::Failed)?;
        match eval(&expr, scope).map_err(ScriptError::Failed)? {
            ScriptValue::Bool(result) => Ok(result),
            other => Err(ScriptError::Failed(format!(
                "script produced a {} instead of a boolean",
                other.type_name()
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Int(i64),
    Str(String),
    Ident(String),
    Punct(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
}

#[derive(Debug, Clone)]
enum Expr {
    Literal(ScriptValue),
    Var(String),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Field(Box<Expr>, String),
    Call(Box<Expr>, String, Vec<Expr>),
}

impl Expr {
    fn operands(&self) -> Vec<&Self> {
        match self {
            Self::Literal(_) | Self::Var(_) => Vec::new(),
            Self::Not(inner) | Self::Neg(inner) | Self::Field(inner, _) => vec![&**inner],
            Self::Binary(_, left, right) => vec![&**left, &**right],
            Self::Call(receiver, _, args) => std::iter::once(&**receiver).chain(args).collect(),
        }
    }

    fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 1_usize)];
        while let Some((expr, level)) = pending.pop() {
            deepest = deepest.max(level);
            pending.extend(expr.operands().into_iter().map(|child| (child, level + 1)));
        }
        deepest
    }
}

fn parse(source: &str) -> Result<Expr, String> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(String::from("script is empty"));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.or()?;
    if let Some(token) = parser.peek() {
        return Err(format!("unexpected {} after expression", describe(token)));
    }
    if expr.depth() > MAX_DEPTH {
        return Err(format!("expression nests deeper than {MAX_DEPTH} levels"));
    }
    Ok(expr)
}

fn describe(token: &Token) -> String {
    match token {
        Token::Int(value) => format!("number {value}"),
        Token::Str(value) => format!("string \"{value}\""),
        Token::Ident(name) => format!("identifier '{name}'"),
        Token::Punct(punct) => format!("'{punct}'"),
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut rest = source.trim_start();
    while let Some(first) = rest.chars().next() {
        let (token, len) = if first.is_ascii_digit() {
            number(rest)?
        } else if first == '"' || first == '\'' {
            string(rest, first)?
        } else if first.is_alphabetic() || first == '_' || first == '$' {
            identifier(rest)
        } else {
            punct(rest)?
        };
        tokens.push(token);
        rest = rest.get(len..).unwrap_or_default().trim_start();
    }
    Ok(tokens)
}

fn number(text: &str) -> Result<(Token, usize), String> {
    let len = text
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(text.len());
    let digits = text.get(..len).unwrap_or_default();
    digits
        .parse::<i64>()
        .map(|value| (Token::Int(value), len))
        .map_err(|_| format!("integer literal {digits} is out of range"))
}

fn string(text: &str, quote: char) -> Result<(Token, usize), String> {
    let mut value = String::new();
    let mut chars = text.char_indices().skip(1);
    while let Some((offset, ch)) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, escaped @ ('\\' | '"' | '\''))) => value.push(escaped),
                Some((_, other)) => {
                    value.push('\\');
                    value.push(other);
                }
                None => break,
            },
            _ if ch == quote => return Ok((Token::Str(value), offset + ch.len_utf8())),
            _ => value.push(ch),
        }
    }
    Err(String::from("string literal is never closed"))
}

fn identifier(text: &str) -> (Token, usize) {
    let len = text
        .find(|ch: char| !(ch.is_alphanumeric() || ch == '_' || ch == '$'))
        .unwrap_or(text.len());
    let name = text.get(..len).unwrap_or_default();
    (Token::Ident(name.to_owned()), len)
}

fn punct(text: &str) -> Result<(Token, usize), String> {
    TWO_CHAR_PUNCT
        .iter()
        .chain(ONE_CHAR_PUNCT)
        .find(|candidate| text.starts_with(**candidate))
        .map(|found| (Token::Punct(*found), found.len()))
        .ok_or_else(|| {
            let ch = text.chars().next().unwrap_or_default();
            format!("unexpected character '{ch}'")
        })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, punct: &str) -> bool {
        let found = matches!(self.peek(), Some(Token::Punct(p)) if *p == punct);
        if found {
            self.pos += 1;
        }
        found
    }

    fn expect(&mut self, punct: &str) -> Result<(), String> {
        if self.eat(punct) {
            return Ok(());
        }
        Err(self.peek().map_or_else(
            || format!("expected '{punct}' but the script ended"),
            |token| format!("expected '{punct}', found {}", describe(token)),
        ))
    }

    fn enter(&mut self) -> Result<(), String> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(format!("expression nests deeper than {MAX_DEPTH} levels"));
        }
        Ok(())
    }

    const fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn or(&mut self) -> Result<Expr, String> {
        let mut left = self.and()?;
        while self.eat("||") {
            let right = self.and()?;
            left = Expr::Binary(BinaryOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, String> {
        let mut left = self.comparison()?;
        while self.eat("&&") {
            let right = self.comparison()?;
            left = Expr::Binary(BinaryOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn comparison(&mut self) -> Result<Expr, String> {
        let left = self.additive()?;
        let op = match self.peek() {
            Some(Token::Punct("==")) => BinaryOp::Eq,
            Some(Token::Punct("!=")) => BinaryOp::Ne,
            Some(Token::Punct("<")) => BinaryOp::Lt,
            Some(Token::Punct("<=")) => BinaryOp::Le,
            Some(Token::Punct(">")) => BinaryOp::Gt,
            Some(Token::Punct(">=")) => BinaryOp::Ge,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.additive()?;
        Ok(Expr::Binary(op, Box::new(left), Box::new(right)))
    }

    fn additive(&mut self) -> Result<Expr, String> {
        let mut left = self.unary()?;
        loop {
            let op = if self.eat("+") {
                BinaryOp::Add
            } else if self.eat("-") {
                BinaryOp::Sub
            } else {
                return Ok(left);
            };
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn unary(&mut self) -> Result<Expr, String> {
        self.enter()?;
        let result = if self.eat("!") {
            self.unary().map(|inner| Expr::Not(Box::new(inner)))
        } else if self.eat("-") {
            self.unary().map(|inner| Expr::Neg(Box::new(inner)))
        } else {
            self.postfix()
        };
        self.leave();
        result
    }

    fn postfix(&mut self) -> Result<Expr, String> {
        let mut expr = self.primary()?;
        while self.eat(".") {
            let Some(Token::Ident(name)) = self.next_token() else {
                return Err(String::from("expected a property or method name after '.'"));
            };
            if self.eat("(") {
                let args = self.arguments()?;
                expr = Expr::Call(Box::new(expr), name, args);
            } else {
                expr = Expr::Field(Box::new(expr), name);
            }
        }
        Ok(expr)
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, String> {
        let mut args = Vec::new();
        if self.eat(")") {
            return Ok(args);
        }
        loop {
            args.push(self.or()?);
            if self.eat(")") {
                return Ok(args);
            }
            self.expect(",")?;
        }
    }

    fn primary(&mut self) -> Result<Expr, String> {
        match self.next_token() {
            Some(Token::Int(value)) => Ok(Expr::Literal(ScriptValue::Int(value))),
            Some(Token::Str(value)) => Ok(Expr::Literal(ScriptValue::Str(value))),
            Some(Token::Ident(name)) => Ok(match name.as_str() {
                "true" => Expr::Literal(ScriptValue::Bool(true)),
                "false" => Expr::Literal(ScriptValue::Bool(false)),
                "null" => Expr::Literal(ScriptValue::Null),
                _ => Expr::Var(name),
            }),
            Some(Token::Punct("(")) => {
                self.enter()?;
                let inner = self.or()?;
                self.expect(")")?;
                self.leave();
                Ok(inner)
            }
            Some(token) => Err(format!("unexpected {}", describe(&token))),
            None => Err(String::from("expression ended unexpectedly")),
        }
    }
}

fn eval(expr: &Expr, scope: &ScriptScope) -> Result<ScriptValue, String> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Var(name) => scope
            .get(name)
            .cloned()
            .ok_or_else(|| format!("unknown identifier '{name}'")),
        Expr::Not(inner) => Ok(ScriptValue::Bool(!boolean(&eval(inner, scope)?, "!")?)),
        Expr::Neg(inner) => match eval(inner, scope)? {
            ScriptValue::Int(value) => value
                .checked_neg()
                .map(ScriptValue::Int)
                .ok_or_else(|| String::from("integer overflow")),
            other => Err(format!("cannot negate a {}", other.type_name())),
        },
        Expr::Binary(op, left, right) => binary(*op, left, right, scope),
        Expr::Field(receiver, name) => field(&eval(receiver, scope)?, name),
        Expr::Call(receiver, name, args) => {
            let values = args
                .iter()
                .map(|arg| eval(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            call(&eval(receiver, scope)?, name, &values)
        }
    }
}

fn boolean(value: &ScriptValue, op: &str) -> Result<bool, String> {
    match value {
        ScriptValue::Bool(flag) => Ok(*flag),
        other => Err(format!("'{op}' expects booleans, found a {}", other.type_name())),
    }
}

fn binary(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    scope: &ScriptScope,
) -> Result<ScriptValue, String> {
    match op {
        BinaryOp::Or => {
            let result = boolean(&eval(left, scope)?, "||")? || boolean(&eval(right, scope)?, "||")?;
            Ok(ScriptValue::Bool(result))
        }
        BinaryOp::And => {
            let result = boolean(&eval(left, scope)?, "&&")? && boolean(&eval(right, scope)?, "&&")?;
            Ok(ScriptValue::Bool(result))
        }
        _ => {
            let lhs = eval(left, scope)?;
            let rhs = eval(right, scope)?;
            arithmetic(op, &lhs, &rhs)
        }
    }
}

fn arithmetic(op: BinaryOp, lhs: &ScriptValue, rhs: &ScriptValue) -> Result<ScriptValue, String> {
    let overflow = || String::from("integer overflow");
    match (op, comparable(lhs), comparable(rhs)) {
        (BinaryOp::Eq, left, right) => Ok(ScriptValue::Bool(left == right)),
        (BinaryOp::Ne, left, right) => Ok(ScriptValue::Bool(left != right)),
        (BinaryOp::Add, ScriptValue::Int(a), ScriptValue::Int(b)) => {
            a.checked_add(b).map(ScriptValue::Int).ok_or_else(overflow)
        }
        (BinaryOp::Add, ScriptValue::Str(_), _) | (BinaryOp::Add, _, ScriptValue::Str(_)) => {
            Ok(ScriptValue::Str(format!("{lhs}{rhs}")))
        }
        (BinaryOp::Sub, ScriptValue::Int(a), ScriptValue::Int(b)) => {
            a.checked_sub(b).map(ScriptValue::Int).ok_or_else(overflow)
        }
        (BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge, left, right) => {
            ordering(op, &left, &right)
        }
        (_, left, right) => Err(format!(
            "operator cannot combine a {} and a {}",
            left.type_name(),
            right.type_name()
        )),
    }
}

/// Nodes compare and concatenate as their text.
fn comparable(value: &ScriptValue) -> ScriptValue {
    match value {
        ScriptValue::Node(node) => ScriptValue::Str(node.text.clone()),
        other => other.clone(),
    }
}

fn ordering(op: BinaryOp, left: &ScriptValue, right: &ScriptValue) -> Result<ScriptValue, String> {
    let order = match (left, right) {
        (ScriptValue::Int(a), ScriptValue::Int(b)) => a.cmp(b),
        (ScriptValue::Str(a), ScriptValue::Str(b)) => a.cmp(b),
        _ => {
            return Err(format!(
                "cannot order a {} and a {}",
                left.type_name(),
                right.type_name()
            ));
        }
    };
    let result = match op {
        BinaryOp::Lt => order.is_lt(),
        BinaryOp::Le => order.is_le(),
        BinaryOp::Gt => order.is_gt(),
        _ => order.is_ge(),
    };
    Ok(ScriptValue::Bool(result))
}

fn field(receiver: &ScriptValue, name: &str) -> Result<ScriptValue, String> {
    match (receiver, name) {
        (ScriptValue::Null, _) => Ok(ScriptValue::Null),
        (ScriptValue::Node(node), "text") => Ok(ScriptValue::Str(node.text.clone())),
        (ScriptValue::Node(node), "kind") => Ok(ScriptValue::Str(node.kind.clone())),
        (ScriptValue::Node(node), "count") => Ok(ScriptValue::Int(
            i64::try_from(node.count).unwrap_or(i64::MAX),
        )),
        (ScriptValue::Node(node), "length") => Ok(length(&node.text)),
        (ScriptValue::Str(text), "length") => Ok(length(text)),
        (other, _) => Err(format!("a {} has no property '{name}'", other.type_name())),
    }
}

fn length(text: &str) -> ScriptValue {
    ScriptValue::Int(i64::try_from(text.chars().count()).unwrap_or(i64::MAX))
}

fn call(receiver: &ScriptValue, name: &str, args: &[ScriptValue]) -> Result<ScriptValue, String> {
    let text = match comparable(receiver) {
        ScriptValue::Str(text) => text,
        other => {
            return Err(format!("a {} has no method '{name}'", other.type_name()));
        }
    };
    let [ScriptValue::Str(argument)] = args else {
        return Err(format!("'{name}' expects a single string argument"));
    };
    let result = match name {
        "contains" => text.contains(argument.as_str()),
        "startsWith" => text.starts_with(argument.as_str()),
        "endsWith" => text.ends_with(argument.as_str()),
        "matches" => Regex::new(argument)
            .map_err(|err| format!("regex '{argument}' does not compile: {err}"))?
            .is_match(&text),
        _ => return Err(format!("unknown method '{name}'")),
    };
    Ok(ScriptValue::Bool(result))
}
