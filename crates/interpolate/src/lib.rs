//! # interpolate
//!
//! Variable substitution for configuration files.
//!
//! Templates are literal text with `${ expr }` interpolations. An expression
//! is a variable reference (`var.class`), a string/number/bool literal, or a
//! function call. `$${` writes a literal `${`.
//!
//! ```
//! use interpolate::{evaluate_str, Variables};
//!
//! let vars = Variables {
//!     class: "web".into(),
//!     sequence: "01".into(),
//!     locale: "en_US".into(),
//!     specname: "nginx".into(),
//! };
//!
//! let out = evaluate_str("server_name ${var.class}${var.sequence};", &vars)?;
//! assert_eq!(out, "server_name web01;");
//! # Ok::<(), interpolate::InterpolationError>(())
//! ```

mod error;
mod eval;
mod parser;

pub use error::{InterpolationError, Result};
pub use eval::{eval_expr, eval_template, Value, Variables};
pub use parser::{parse, Expr, Part, Position, Template};

/// Interpolate a template held as raw bytes.
///
/// Non-UTF-8 input is a parse error located at the first invalid byte.
pub fn evaluate(template: &[u8], vars: &Variables) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(template).map_err(|err| {
        let valid = &template[..err.valid_up_to()];
        let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = valid
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        // valid prefix is UTF-8, so counting chars gives the column
        let column = String::from_utf8_lossy(&valid[line_start..]).chars().count() + 1;
        InterpolationError::Parse {
            line,
            column,
            message: "template is not valid UTF-8".to_string(),
        }
    })?;

    evaluate_str(text, vars).map(String::into_bytes)
}

/// Interpolate a template, requiring a string result
pub fn evaluate_str(template: &str, vars: &Variables) -> Result<String> {
    let parsed = parse(template)?;
    log::trace!("Template parsed into {} parts", parsed.parts.len());
    match eval_template(&parsed, vars)? {
        Value::String(output) => Ok(output),
        other => Err(InterpolationError::NotAString {
            found: other.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> Variables {
        Variables {
            class: "db".into(),
            sequence: "2".into(),
            locale: "de_DE".into(),
            specname: "postgres".into(),
        }
    }

    #[test]
    fn test_evaluate_bytes() {
        let out = evaluate(b"# ${var.specname}\nlc_messages = '${var.locale}'\n", &vars()).unwrap();
        assert_eq!(out, b"# postgres\nlc_messages = 'de_DE'\n");
    }

    #[test]
    fn test_plain_text_passes_through() {
        let text = "no templates here, just $HOME and {braces}";
        assert_eq!(evaluate_str(text, &vars()).unwrap(), text);
        assert_eq!(evaluate_str("", &vars()).unwrap(), "");
    }

    #[test]
    fn test_three_failure_classes_are_distinct() {
        let parse_err = evaluate_str("${var.class", &vars()).unwrap_err();
        let eval_err = evaluate_str("${var.hostname}", &vars()).unwrap_err();
        let type_err = evaluate_str("${8080}", &vars()).unwrap_err();

        assert!(parse_err.is_parse() && !parse_err.is_evaluation() && !parse_err.is_type());
        assert!(eval_err.is_evaluation() && !eval_err.is_parse() && !eval_err.is_type());
        assert!(type_err.is_type() && !type_err.is_parse() && !type_err.is_evaluation());

        assert_eq!(
            eval_err,
            InterpolationError::UnknownVariable {
                name: "var.hostname".into(),
                line: 1,
                column: 1,
            }
        );
        assert_eq!(type_err, InterpolationError::NotAString { found: "int" });
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let err = evaluate(b"ok\nab\xffcd", &vars()).unwrap_err();
        assert_eq!(
            err,
            InterpolationError::Parse {
                line: 2,
                column: 3,
                message: "template is not valid UTF-8".into(),
            }
        );
    }
}
