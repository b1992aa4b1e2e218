//! Predicate language for `custom` trigger conditions.
//!
//! Expressions use a small JavaScript-flavoured grammar (comparisons, boolean
//! connectives, field lookups, a few helper functions) that is parsed into a
//! typed tree and evaluated against a JSON scope. Nothing in an expression can
//! reach host code: the only names in scope are the ones the caller puts in
//! the scope object, and the only callable functions are the built-ins below.
//!
//! ```text
//! data.tool === 'git_commit' && includes(projectPath, 'frontend')
//! matches(data.filePath, '\\.(ts|tsx)$') || data.files.length > 10
//! ```

use regex::Regex;
use serde_json::{Number, Value};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors raised while parsing or evaluating a predicate.
#[derive(Debug, thiserror::Error)]
pub enum ExpressionError {
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("'{0}' is not defined")]
    UnknownIdentifier(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("invalid regular expression: {0}")]
    Regex(String),
}

fn syntax(offset: usize, message: impl Into<String>) -> ExpressionError {
    ExpressionError::Syntax {
        offset,
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Str(String),
    Num(f64),
    Ident(String),
    Op(&'static str),
}

/// Operators, longest first so that `===` wins over `==`.
const OPERATORS: [&str; 21] = [
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "<", ">", "!", "(", ")", "[", "]", ".",
    ",", "+", "?", ":", "-",
];

fn tokenize(src: &str) -> Result<Vec<(Token, usize)>, ExpressionError> {
    let mut tokens = Vec::new();
    let bytes = src.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if c == '\'' || c == '"' {
            let (s, next) = lex_string(src, i)?;
            tokens.push((Token::Str(s), i));
            i = next;
            continue;
        }

        if c.is_ascii_digit() {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
            let text = &src[start..i];
            let n: f64 = text
                .parse()
                .map_err(|_| syntax(start, format!("invalid number '{text}'")))?;
            tokens.push((Token::Num(n), start));
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' || c == '$' {
            let start = i;
            while i < bytes.len()
                && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'$')
            {
                i += 1;
            }
            tokens.push((Token::Ident(src[start..i].to_string()), start));
            continue;
        }

        match OPERATORS.iter().find(|op| src[i..].starts_with(**op)) {
            Some(op) => {
                tokens.push((Token::Op(*op), i));
                i += op.len();
            }
            None => return Err(syntax(i, format!("unexpected character '{c}'"))),
        }
    }

    Ok(tokens)
}

/// Lex a quoted string starting at `start`. Returns the unescaped text and
/// the offset just past the closing quote.
fn lex_string(src: &str, start: usize) -> Result<(String, usize), ExpressionError> {
    let mut chars = src[start..].char_indices();
    let (_, quote) = chars.next().ok_or_else(|| syntax(start, "expected string"))?;
    let mut out = String::new();

    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, other)) => out.push(other),
                None => break,
            },
            c if c == quote => return Ok((out, start + idx + c.len_utf8())),
            c => out.push(c),
        }
    }

    Err(syntax(start, "unterminated string literal"))
}

// ---------------------------------------------------------------------------
// AST
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Var(String),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
    Method(Box<Expr>, String, Vec<Expr>),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Deepest tree the parser will build. Evaluation recurses once per level.
const MAX_DEPTH: usize = 64;

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    len: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.len, |(_, o)| *o)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        self.pos += 1;
        token
    }

    fn eat(&mut self, op: &str) -> bool {
        if matches!(self.peek(), Some(Token::Op(o)) if *o == op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, op: &str) -> Result<(), ExpressionError> {
        if self.eat(op) {
            Ok(())
        } else {
            Err(syntax(self.offset(), format!("expected '{op}'")))
        }
    }

    /// Enter one more level of nesting.
    fn descend(&mut self) -> Result<(), ExpressionError> {
        if self.depth >= MAX_DEPTH {
            return Err(syntax(
                self.offset(),
                format!("expression nested deeper than {MAX_DEPTH} levels"),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn expression(&mut self) -> Result<Expr, ExpressionError> {
        let base = self.depth;
        let cond = self.or()?;
        if self.eat("?") {
            self.descend()?;
            let then = self.expression()?;
            self.expect(":")?;
            let otherwise = self.expression()?;
            self.depth = base;
            return Ok(Expr::Conditional(
                Box::new(cond),
                Box::new(then),
                Box::new(otherwise),
            ));
        }
        Ok(cond)
    }

    fn or(&mut self) -> Result<Expr, ExpressionError> {
        let base = self.depth;
        let mut lhs = self.and()?;
        while self.eat("||") {
            self.descend()?;
            let rhs = self.and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        self.depth = base;
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, ExpressionError> {
        let base = self.depth;
        let mut lhs = self.comparison()?;
        while self.eat("&&") {
            self.descend()?;
            let rhs = self.comparison()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        self.depth = base;
        Ok(lhs)
    }

    fn comparison(&mut self) -> Result<Expr, ExpressionError> {
        let lhs = self.additive()?;
        let op = match self.peek() {
            Some(Token::Op("==" | "===")) => BinaryOp::Eq,
            Some(Token::Op("!=" | "!==")) => BinaryOp::Ne,
            Some(Token::Op("<")) => BinaryOp::Lt,
            Some(Token::Op("<=")) => BinaryOp::Le,
            Some(Token::Op(">")) => BinaryOp::Gt,
            Some(Token::Op(">=")) => BinaryOp::Ge,
            _ => return Ok(lhs),
        };
        self.pos += 1;
        self.descend()?;
        let rhs = self.additive()?;
        self.depth -= 1;
        Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)))
    }

    fn additive(&mut self) -> Result<Expr, ExpressionError> {
        let base = self.depth;
        let mut lhs = self.prefix()?;
        loop {
            let op = if self.eat("+") {
                BinaryOp::Add
            } else if self.eat("-") {
                BinaryOp::Sub
            } else {
                self.depth = base;
                return Ok(lhs);
            };
            self.descend()?;
            let rhs = self.prefix()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    /// `!` and unary `-` bind tighter than every binary operator.
    fn prefix(&mut self) -> Result<Expr, ExpressionError> {
        let negate = if self.eat("-") {
            true
        } else if self.eat("!") {
            false
        } else {
            return self.postfix();
        };
        self.descend()?;
        let operand = Box::new(self.prefix()?);
        self.depth -= 1;
        Ok(if negate {
            Expr::Neg(operand)
        } else {
            Expr::Not(operand)
        })
    }

    fn postfix(&mut self) -> Result<Expr, ExpressionError> {
        let base = self.depth;
        let mut expr = self.primary()?;
        loop {
            if matches!(self.peek(), Some(Token::Op("." | "["))) {
                self.descend()?;
            }
            if self.eat(".") {
                let offset = self.offset();
                let name = match self.next() {
                    Some(Token::Ident(name)) => name,
                    _ => return Err(syntax(offset, "expected property name after '.'")),
                };
                if self.eat("(") {
                    let args = self.arguments()?;
                    expr = Expr::Method(Box::new(expr), name, args);
                } else {
                    expr = Expr::Member(Box::new(expr), name);
                }
            } else if self.eat("[") {
                let index = self.expression()?;
                self.expect("]")?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else {
                self.depth = base;
                return Ok(expr);
            }
        }
    }

    /// Parse call arguments after the opening parenthesis.
    fn arguments(&mut self) -> Result<Vec<Expr>, ExpressionError> {
        let mut args = Vec::new();
        if self.eat(")") {
            return Ok(args);
        }
        self.descend()?;
        loop {
            args.push(self.expression()?);
            if self.eat(")") {
                self.depth -= 1;
                return Ok(args);
            }
            self.expect(",")?;
        }
    }

    fn primary(&mut self) -> Result<Expr, ExpressionError> {
        let offset = self.offset();
        match self.next() {
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Token::Num(n)) => Ok(Expr::Literal(number(n))),
            Some(Token::Ident(name)) => match name.as_str() {
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                "null" | "undefined" => Ok(Expr::Literal(Value::Null)),
                _ if self.eat("(") => {
                    let args = self.arguments()?;
                    Ok(Expr::Call(name, args))
                }
                _ => Ok(Expr::Var(name)),
            },
            Some(Token::Op("(")) => {
                self.descend()?;
                let inner = self.expression()?;
                self.expect(")")?;
                self.depth -= 1;
                Ok(inner)
            }
            Some(Token::Op(op)) => Err(syntax(offset, format!("unexpected '{op}'"))),
            None => Err(syntax(offset, "unexpected end of expression")),
        }
    }
}

// ---------------------------------------------------------------------------
// Predicate
// ---------------------------------------------------------------------------

/// A parsed predicate, ready to be evaluated against any number of scopes.
#[derive(Debug, Clone)]
pub struct Predicate {
    root: Expr,
}

impl Predicate {
    /// Parse an expression source string.
    pub fn parse(src: &str) -> Result<Self, ExpressionError> {
        let tokens = tokenize(src)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            len: src.len(),
            depth: 0,
        };
        let root = parser.expression()?;
        if parser.pos < parser.tokens.len() {
            return Err(syntax(parser.offset(), "unexpected trailing input"));
        }
        Ok(Self { root })
    }

    /// Evaluate against `scope` and coerce the result with JavaScript truthiness.
    ///
    /// `scope` must be a JSON object; its keys are the only variables visible
    /// to the expression.
    pub fn evaluate(&self, scope: &Value) -> Result<bool, ExpressionError> {
        Ok(truthy(&self.evaluate_value(scope)?))
    }

    /// Evaluate against `scope` and return the raw JSON value.
    pub fn evaluate_value(&self, scope: &Value) -> Result<Value, ExpressionError> {
        if !scope.is_object() {
            return Err(ExpressionError::Type("scope must be a JSON object".to_string()));
        }
        eval(&self.root, scope)
    }
}

/// Parse and evaluate in one call.
pub fn evaluate_predicate(src: &str, scope: &Value) -> Result<bool, ExpressionError> {
    Predicate::parse(src)?.evaluate(scope)
}

/// Coerce a JSON value to boolean using JavaScript-like truthiness.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn eval(expr: &Expr, scope: &Value) -> Result<Value, ExpressionError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Var(name) => scope
            .get(name)
            .cloned()
            .ok_or_else(|| ExpressionError::UnknownIdentifier(name.clone())),
        Expr::Member(target, name) => {
            let target = eval(target, scope)?;
            member(&target, name)
        }
        Expr::Index(target, index) => {
            let target = eval(target, scope)?;
            let index = eval(index, scope)?;
            match (&target, &index) {
                (Value::Array(items), Value::Number(n)) => Ok(n
                    .as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                    .and_then(|f| items.get(f as usize))
                    .cloned()
                    .unwrap_or(Value::Null)),
                (_, Value::String(key)) => member(&target, key),
                _ => member(&target, &display(&index)),
            }
        }
        Expr::Call(name, args) => {
            let args = args
                .iter()
                .map(|a| eval(a, scope))
                .collect::<Result<Vec<_>, _>>()?;
            call(name, &args)
        }
        Expr::Method(target, name, args) => {
            let target = eval(target, scope)?;
            let args = args
                .iter()
                .map(|a| eval(a, scope))
                .collect::<Result<Vec<_>, _>>()?;
            method(&target, name, &args)
        }
        Expr::Not(inner) => Ok(Value::Bool(!truthy(&eval(inner, scope)?))),
        Expr::Neg(inner) => match eval(inner, scope)? {
            Value::Number(n) => Ok(number(-n.as_f64().unwrap_or(0.0))),
            other => Err(ExpressionError::Type(format!("cannot negate {}", type_name(&other)))),
        },
        Expr::And(lhs, rhs) => {
            let l = eval(lhs, scope)?;
            if truthy(&l) { eval(rhs, scope) } else { Ok(l) }
        }
        Expr::Or(lhs, rhs) => {
            let l = eval(lhs, scope)?;
            if truthy(&l) { Ok(l) } else { eval(rhs, scope) }
        }
        Expr::Binary(op, lhs, rhs) => {
            let l = eval(lhs, scope)?;
            let r = eval(rhs, scope)?;
            binary(*op, &l, &r)
        }
        Expr::Conditional(cond, then, otherwise) => {
            if truthy(&eval(cond, scope)?) {
                eval(then, scope)
            } else {
                eval(otherwise, scope)
            }
        }
    }
}

fn member(target: &Value, name: &str) -> Result<Value, ExpressionError> {
    match target {
        Value::Null => Err(ExpressionError::Type(format!(
            "cannot read property '{name}' of null"
        ))),
        Value::Object(map) => Ok(map.get(name).cloned().unwrap_or(Value::Null)),
        Value::String(s) if name == "length" => Ok(number(s.chars().count() as f64)),
        Value::Array(items) if name == "length" => Ok(number(items.len() as f64)),
        _ => Ok(Value::Null),
    }
}

static NULL: Value = Value::Null;

fn call(name: &str, args: &[Value]) -> Result<Value, ExpressionError> {
    let arg = |i: usize| args.get(i).unwrap_or(&NULL);
    match name {
        "includes" => Ok(Value::Bool(includes(arg(0), arg(1)))),
        "matches" => {
            let subject = match arg(0) {
                Value::Null => return Ok(Value::Bool(false)),
                v => display(v),
            };
            let pattern = display(arg(1));
            let re = Regex::new(&pattern).map_err(|e| ExpressionError::Regex(e.to_string()))?;
            Ok(Value::Bool(re.is_match(&subject)))
        }
        "length" => Ok(number(length(arg(0)) as f64)),
        other => Err(ExpressionError::UnknownFunction(other.to_string())),
    }
}

fn method(target: &Value, name: &str, args: &[Value]) -> Result<Value, ExpressionError> {
    let arg = args.first().unwrap_or(&NULL);
    match (target, name) {
        (Value::Null, _) => Err(ExpressionError::Type(format!(
            "cannot call '{name}' on null"
        ))),
        (_, "includes") => Ok(Value::Bool(includes(target, arg))),
        (Value::String(s), "startsWith") => Ok(Value::Bool(s.starts_with(&display(arg)))),
        (Value::String(s), "endsWith") => Ok(Value::Bool(s.ends_with(&display(arg)))),
        (Value::String(s), "toLowerCase") => Ok(Value::String(s.to_lowercase())),
        (Value::String(s), "toUpperCase") => Ok(Value::String(s.to_uppercase())),
        (Value::String(s), "trim") => Ok(Value::String(s.trim().to_string())),
        _ => Err(ExpressionError::Type(format!(
            "{} has no method '{name}'",
            type_name(target)
        ))),
    }
}

fn includes(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::String(s) => s.contains(&display(needle)),
        Value::Array(items) => items.iter().any(|item| json_eq(item, needle)),
        Value::Object(map) => needle.as_str().is_some_and(|k| map.contains_key(k)),
        _ => false,
    }
}

fn length(value: &Value) -> usize {
    match value {
        Value::String(s) => s.chars().count(),
        Value::Array(a) => a.len(),
        Value::Object(o) => o.len(),
        _ => 0,
    }
}

fn binary(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, ExpressionError> {
    let result = match op {
        BinaryOp::Eq => Value::Bool(json_eq(l, r)),
        BinaryOp::Ne => Value::Bool(!json_eq(l, r)),
        BinaryOp::Add => match (l, r) {
            (Value::Number(a), Value::Number(b)) => {
                number(a.as_f64().unwrap_or(0.0) + b.as_f64().unwrap_or(0.0))
            }
            (Value::String(_), _) | (_, Value::String(_)) => {
                Value::String(format!("{}{}", display(l), display(r)))
            }
            _ => {
                return Err(ExpressionError::Type(format!(
                    "cannot add {} and {}",
                    type_name(l),
                    type_name(r)
                )));
            }
        },
        BinaryOp::Sub => match (l, r) {
            (Value::Number(a), Value::Number(b)) => {
                number(a.as_f64().unwrap_or(0.0) - b.as_f64().unwrap_or(0.0))
            }
            _ => {
                return Err(ExpressionError::Type(format!(
                    "cannot subtract {} from {}",
                    type_name(r),
                    type_name(l)
                )));
            }
        },
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (l, r) {
                (Value::Number(a), Value::Number(b)) => a
                    .as_f64()
                    .unwrap_or(f64::NAN)
                    .partial_cmp(&b.as_f64().unwrap_or(f64::NAN)),
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => {
                    return Err(ExpressionError::Type(format!(
                        "cannot compare {} with {}",
                        type_name(l),
                        type_name(r)
                    )));
                }
            };
            let Some(ordering) = ordering else {
                return Ok(Value::Bool(false));
            };
            Value::Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            })
        }
    };
    Ok(result)
}

/// Strict equality, except that numbers compare by value (`1 == 1.0`).
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn number(n: f64) -> Value {
    Number::from_f64(n).map_or(Value::Null, Value::Number)
}

/// String form used for concatenation and string helpers.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope() -> Value {
        json!({
            "event": "PostToolUse",
            "data": {
                "tool": "git_commit",
                "filePath": "src/app/main.ts",
                "files": ["a.rs", "b.rs", "c.rs"],
                "count": 3,
                "meta": { "branch": "main", "dirty": false }
            },
            "projectPath": "/home/dev/frontend",
            "timestamp": "2024-05-01T10:00:00.000Z"
        })
    }

    fn check(src: &str) -> bool {
        evaluate_predicate(src, &scope()).unwrap()
    }

    #[test]
    fn test_strict_equality_on_data_field() {
        assert!(check("data.tool === 'git_commit'"));
        assert!(!check("data.tool === 'edit'"));
        assert!(check("data.tool !== 'edit'"));
        assert!(check("data.tool == \"git_commit\""));
    }

    #[test]
    fn test_missing_key_is_false_not_error() {
        let scope = json!({ "event": "GitCommit", "data": {}, "projectPath": null, "timestamp": "" });
        assert!(!evaluate_predicate("data.tool === 'git_commit'", &scope).unwrap());
    }

    #[test]
    fn test_nested_lookup_on_missing_parent_is_error() {
        let result = evaluate_predicate("data.nothing.deeper == 1", &scope());
        assert!(matches!(result, Err(ExpressionError::Type(_))));
    }

    #[test]
    fn test_boolean_connectives_and_grouping() {
        assert!(check("data.count > 2 && data.meta.branch == 'main'"));
        assert!(check("data.count > 5 || data.meta.branch == 'main'"));
        assert!(!check("!(data.count >= 3)"));
        assert!(check("!data.meta.dirty"));
        assert!(check("(data.count < 1 || data.count <= 3) && event == 'PostToolUse'"));
    }

    #[test]
    fn test_helper_functions() {
        assert!(check("includes(projectPath, 'frontend')"));
        assert!(!check("includes(projectPath, 'backend')"));
        assert!(check("includes(data.files, 'b.rs')"));
        assert!(check("matches(data.filePath, '\\\\.(ts|tsx)$')"));
        assert!(!check("matches(data.filePath, '^lib/')"));
        assert!(check("length(data.files) == 3"));
        assert!(check("length(data.tool) == 10"));
        assert!(check("length(data.missing) == 0"));
    }

    #[test]
    fn test_methods_and_length_property() {
        assert!(check("data.filePath.endsWith('.ts')"));
        assert!(check("data.filePath.startsWith('src/')"));
        assert!(check("data.tool.toUpperCase() == 'GIT_COMMIT'"));
        assert!(check("data.files.includes('a.rs')"));
        assert!(check("data.files.length > 2"));
        assert!(check("data.files[0] == 'a.rs'"));
        assert!(check("data['meta']['branch'] == 'main'"));
    }

    #[test]
    fn test_ternary_and_concat() {
        assert!(check("(data.count > 1 ? 'many' : 'one') == 'many'"));
        assert!(check("event + ':' + data.tool == 'PostToolUse:git_commit'"));
        assert!(check("data.count + 1 == 4"));
        assert!(check("data.count - 1 == 2"));
    }

    #[test]
    fn test_truthiness_of_non_boolean_results() {
        assert!(check("data.tool"));
        assert!(!check("data.missing"));
        assert!(!check("0"));
        assert!(check("data.files"));
        assert!(!check("''"));
    }

    #[test]
    fn test_unknown_identifier_is_error() {
        let result = evaluate_predicate("process.exit(1)", &scope());
        assert!(matches!(result, Err(ExpressionError::UnknownIdentifier(name)) if name == "process"));
    }

    #[test]
    fn test_unknown_function_is_error() {
        let result = evaluate_predicate("require('fs')", &scope());
        assert!(matches!(result, Err(ExpressionError::UnknownFunction(_))));
    }

    #[test]
    fn test_invalid_regex_is_error() {
        let result = evaluate_predicate("matches(data.tool, '(')", &scope());
        assert!(matches!(result, Err(ExpressionError::Regex(_))));
    }

    #[test]
    fn test_syntax_errors() {
        for src in ["data.tool ===", "(data.tool", "data.", "'open", "a # b", "data.tool 'x'"] {
            assert!(
                matches!(Predicate::parse(src), Err(ExpressionError::Syntax { .. })),
                "expected syntax error for {src:?}"
            );
        }
    }

    #[test]
    fn test_not_binds_tighter_than_comparison() {
        // (!"git_commit") == false
        assert!(check("!data.tool == false"));
        assert!(!check("!data.tool == true"));
        assert!(check("!data.meta.dirty && data.count == 3"));
        assert!(check("!(data.tool == 'edit')"));
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |n: usize| format!("{}data.count{} == 3", "(".repeat(n), ")".repeat(n));
        assert!(check(&nested(MAX_DEPTH / 2)));

        for src in [
            nested(10_000),
            format!("{}true", "!".repeat(10_000)),
            vec!["data.count > 1"; 5_000].join(" || "),
            vec!["1"; 5_000].join(" + "),
            format!("data{}", ".meta".repeat(5_000)),
            format!("{}1{}", "length(".repeat(5_000), ")".repeat(5_000)),
        ] {
            assert!(
                matches!(Predicate::parse(&src), Err(ExpressionError::Syntax { .. })),
                "expected depth error for input of {} bytes",
                src.len()
            );
        }
    }

    #[test]
    fn test_type_errors_on_mismatched_comparison() {
        let result = evaluate_predicate("data.files > 1", &scope());
        assert!(matches!(result, Err(ExpressionError::Type(_))));
    }

    #[test]
    fn test_parsed_predicate_is_reusable() {
        let predicate = Predicate::parse("data.count == 3").unwrap();
        assert!(predicate.evaluate(&scope()).unwrap());
        let other = json!({ "data": { "count": 4 } });
        assert!(!predicate.evaluate(&other).unwrap());
    }

    #[test]
    fn test_scope_must_be_object() {
        let predicate = Predicate::parse("true").unwrap();
        assert!(predicate.evaluate(&json!([1, 2])).is_err());
    }
}
