//! Template evaluation against a fixed variable namespace

use crate::error::{InterpolationError, Result};
use crate::parser::{Expr, Part, Position, Template};
use std::fmt;

/// Variables available to templates as `var.class`, `var.sequence`,
/// `var.locale` and `var.specname`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    pub class: String,
    pub sequence: String,
    pub locale: String,
    pub specname: String,
}

impl Variables {
    /// Every name `lookup` resolves
    pub const NAMES: [&'static str; 4] = ["var.class", "var.sequence", "var.locale", "var.specname"];

    pub fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "var.class" => Some(&self.class),
            "var.sequence" => Some(&self.sequence),
            "var.locale" => Some(&self.locale),
            "var.specname" => Some(&self.specname),
            _ => None,
        }
    }
}

/// Result of evaluating an expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Evaluate a whole template.
///
/// A template made of exactly one interpolation yields that expression's
/// value unchanged; anything else is concatenated into a string.
pub fn eval_template(template: &Template, vars: &Variables) -> Result<Value> {
    if let Some((expr, at)) = template.sole_expression() {
        return eval_expr(expr, at, vars);
    }

    let mut output = String::new();
    for part in &template.parts {
        match part {
            Part::Literal(text) => output.push_str(text),
            Part::Interpolation { expr, at } => {
                output.push_str(&eval_expr(expr, *at, vars)?.to_string());
            }
        }
    }

    Ok(Value::String(output))
}

/// Evaluate one expression; `at` locates it in the template for errors
pub fn eval_expr(expr: &Expr, at: Position, vars: &Variables) -> Result<Value> {
    match expr {
        Expr::Variable(name) => vars
            .lookup(name)
            .map(|value| Value::String(value.to_string()))
            .ok_or_else(|| InterpolationError::UnknownVariable {
                name: name.clone(),
                line: at.line,
                column: at.column,
            }),
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Int(i) => Ok(Value::Int(*i)),
        Expr::Float(x) => Ok(Value::Float(*x)),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Call { name, .. } => Err(InterpolationError::UnknownFunction {
            name: name.clone(),
            line: at.line,
            column: at.column,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn vars() -> Variables {
        Variables {
            class: "web".into(),
            sequence: "03".into(),
            locale: "en_US".into(),
            specname: "nginx".into(),
        }
    }

    #[test]
    fn test_lookup_covers_namespace() {
        let vars = vars();
        for name in Variables::NAMES {
            assert!(vars.lookup(name).is_some(), "{name}");
        }
        assert!(vars.lookup("var.hostname").is_none());
        assert!(vars.lookup("class").is_none());
    }

    #[test]
    fn test_sole_expression_keeps_type() {
        let template = parse("${7}").unwrap();
        assert_eq!(eval_template(&template, &vars()).unwrap(), Value::Int(7));
    }

    #[test]
    fn test_mixed_template_is_string() {
        let template = parse("workers ${4}; # ${var.specname} ${false}").unwrap();
        assert_eq!(
            eval_template(&template, &vars()).unwrap(),
            Value::String("workers 4; # nginx false".into())
        );
    }

    #[test]
    fn test_unknown_function() {
        let template = parse("${lower(var.class)}").unwrap();
        let err = eval_template(&template, &vars()).unwrap_err();
        assert_eq!(
            err,
            InterpolationError::UnknownFunction {
                name: "lower".into(),
                line: 1,
                column: 1,
            }
        );
        assert!(err.is_evaluation());
    }

    #[test]
    fn test_unknown_variable_is_located() {
        let template = parse("user www;\nworker_processes ${var.cores};\n").unwrap();
        let err = eval_template(&template, &vars()).unwrap_err();
        assert_eq!(
            err,
            InterpolationError::UnknownVariable {
                name: "var.cores".into(),
                line: 2,
                column: 18,
            }
        );

        let message = err.to_string();
        assert!(message.contains("line 2, column 18"), "{message}");
        for name in Variables::NAMES {
            assert!(message.contains(name), "{message}");
        }
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Bool(true).type_name(), "bool");
    }
}
