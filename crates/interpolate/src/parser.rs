//! Template parser
//!
//! Grammar:
//!
//! ```text
//! template := (literal | "$${" | "${" expr "}")*
//! expr     := string | number | "true" | "false" | ident | ident "(" args ")"
//! args     := (expr ("," expr)*)?
//! ident    := [A-Za-z_][A-Za-z0-9_.-]*
//! ```

use crate::error::{InterpolationError, Result};

/// Location of a character in the source, both 1-indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Variable(String),
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Call { name: String, args: Vec<Expr> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Literal(String),
    Interpolation { expr: Expr, at: Position },
}

/// A parsed template
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    pub parts: Vec<Part>,
}

impl Template {
    /// The single expression and its position when the template is exactly
    /// one `${...}`
    pub fn sole_expression(&self) -> Option<(&Expr, Position)> {
        match self.parts.as_slice() {
            [Part::Interpolation { expr, at }] => Some((expr, *at)),
            _ => None,
        }
    }
}

pub fn parse(source: &str) -> Result<Template> {
    Parser::new(source).template()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    fn error(&self, message: impl Into<String>) -> InterpolationError {
        InterpolationError::Parse {
            line: self.line,
            column: self.column,
            message: message.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn template(mut self) -> Result<Template> {
        let mut parts = Vec::new();
        let mut literal = String::new();

        while let Some(c) = self.peek() {
            match (c, self.peek_at(1), self.peek_at(2)) {
                ('$', Some('$'), Some('{')) => {
                    self.bump();
                    self.bump();
                    self.bump();
                    literal.push_str("${");
                }
                ('$', Some('{'), _) => {
                    if !literal.is_empty() {
                        parts.push(Part::Literal(std::mem::take(&mut literal)));
                    }
                    let at = self.position();
                    self.bump();
                    self.bump();
                    let expr = self.expr()?;
                    self.skip_whitespace();
                    match self.peek() {
                        Some('}') => {
                            self.bump();
                        }
                        Some(other) => {
                            return Err(self.error(format!("expected '}}', found '{other}'")));
                        }
                        None => return Err(self.error("unterminated interpolation")),
                    }
                    parts.push(Part::Interpolation { expr, at });
                }
                _ => {
                    literal.push(c);
                    self.bump();
                }
            }
        }

        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }

        Ok(Template { parts })
    }

    fn expr(&mut self) -> Result<Expr> {
        self.skip_whitespace();

        match self.peek() {
            None => Err(self.error("unterminated interpolation")),
            Some('}') => Err(self.error("empty interpolation")),
            Some('"') => self.string(),
            Some(c) if c.is_ascii_digit() => self.number(),
            Some('-') if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.number(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.ident_or_call(),
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
        }
    }

    fn string(&mut self) -> Result<Expr> {
        self.bump(); // opening quote
        let mut value = String::new();

        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string literal")),
                Some('"') => return Ok(Expr::Str(value)),
                Some('\\') => match self.bump() {
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(other) => {
                        return Err(self.error(format!("unknown escape sequence '\\{other}'")));
                    }
                    None => return Err(self.error("unterminated string literal")),
                },
                Some(c) => value.push(c),
            }
        }
    }

    fn number(&mut self) -> Result<Expr> {
        let mut text = String::new();
        if self.peek() == Some('-') {
            text.push('-');
            self.bump();
        }

        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c == '.' && !is_float && self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) {
                is_float = true;
                text.push(c);
            } else {
                break;
            }
            self.bump();
        }

        if is_float {
            text.parse()
                .map(Expr::Float)
                .map_err(|_| self.error(format!("invalid number '{text}'")))
        } else {
            text.parse()
                .map(Expr::Int)
                .map_err(|_| self.error(format!("invalid number '{text}'")))
        }
    }

    fn ident_or_call(&mut self) -> Result<Expr> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }

        self.skip_whitespace();
        if self.peek() == Some('(') {
            self.bump();
            let args = self.args()?;
            return Ok(Expr::Call { name, args });
        }

        Ok(match name.as_str() {
            "true" => Expr::Bool(true),
            "false" => Expr::Bool(false),
            _ => Expr::Variable(name),
        })
    }

    fn args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(')') {
            self.bump();
            return Ok(args);
        }

        loop {
            args.push(self.expr()?);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some(')') => return Ok(args),
                Some(other) => return Err(self.error(format!("expected ',' or ')', found '{other}'"))),
                None => return Err(self.error("unterminated function call")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpolation(expr: Expr, line: usize, column: usize) -> Part {
        Part::Interpolation {
            expr,
            at: Position { line, column },
        }
    }

    #[test]
    fn test_literal_only() {
        let template = parse("listen 80;\n").unwrap();
        assert_eq!(template.parts, vec![Part::Literal("listen 80;\n".into())]);
        assert!(template.sole_expression().is_none());
    }

    #[test]
    fn test_variables_and_literals() {
        let template = parse("host-${var.class}-${ var.sequence }").unwrap();
        assert_eq!(
            template.parts,
            vec![
                Part::Literal("host-".into()),
                interpolation(Expr::Variable("var.class".into()), 1, 6),
                Part::Literal("-".into()),
                interpolation(Expr::Variable("var.sequence".into()), 1, 19),
            ]
        );
    }

    #[test]
    fn test_escape_sequence() {
        let template = parse("echo $${HOME} $x").unwrap();
        assert_eq!(template.parts, vec![Part::Literal("echo ${HOME} $x".into())]);
    }

    #[test]
    fn test_literals_of_every_kind() {
        let exprs: Vec<Expr> = ["${\"a\\\"b\"}", "${42}", "${-7}", "${1.5}", "${true}"]
            .iter()
            .map(|src| parse(src).unwrap().sole_expression().unwrap().0.clone())
            .collect();

        assert_eq!(
            exprs,
            vec![
                Expr::Str("a\"b".into()),
                Expr::Int(42),
                Expr::Int(-7),
                Expr::Float(1.5),
                Expr::Bool(true),
            ]
        );
    }

    #[test]
    fn test_function_call() {
        let template = parse("${upper(var.locale, \"x\")}").unwrap();
        assert_eq!(
            template.sole_expression().map(|(expr, _)| expr),
            Some(&Expr::Call {
                name: "upper".into(),
                args: vec![Expr::Variable("var.locale".into()), Expr::Str("x".into())],
            })
        );
    }

    #[test]
    fn test_parse_errors_carry_position() {
        let err = parse("line one\nvalue = ${var.class").unwrap_err();
        assert_eq!(
            err,
            InterpolationError::Parse {
                line: 2,
                column: 20,
                message: "unterminated interpolation".into(),
            }
        );

        assert!(parse("${}").unwrap_err().is_parse());
        assert!(parse("${\"open}").unwrap_err().is_parse());
        assert!(parse("${var.a var.b}").unwrap_err().is_parse());
        assert!(parse("${#}").unwrap_err().is_parse());
        assert!(parse("${f(1,}").unwrap_err().is_parse());
    }
}
