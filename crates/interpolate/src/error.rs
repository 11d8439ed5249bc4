//! Interpolation error taxonomy
//!
//! Parse, evaluation and type failures are separate variants so callers can
//! tell a malformed template from one that merely references something
//! unknown.

use thiserror::Error;

/// Errors produced while interpolating a template
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InterpolationError {
    /// The template or an embedded expression is malformed
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        /// 1-indexed line of the offending character
        line: usize,
        /// 1-indexed column of the offending character
        column: usize,
        message: String,
    },

    /// Reference to a variable outside the namespace
    #[error(
        "unknown variable accessed at line {line}, column {column}: {name} (expected one of {})",
        crate::eval::Variables::NAMES.join(", ")
    )]
    UnknownVariable {
        name: String,
        /// Position of the `${` holding the reference
        line: usize,
        column: usize,
    },

    /// Call to a function that does not exist
    #[error("unknown function called at line {line}, column {column}: {name}")]
    UnknownFunction { name: String, line: usize, column: usize },

    /// The template evaluated to something other than a string
    #[error("template must evaluate to a string, found {found}")]
    NotAString { found: &'static str },
}

impl InterpolationError {
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Whether the template parsed but referenced something undefined
    pub fn is_evaluation(&self) -> bool {
        matches!(
            self,
            Self::UnknownVariable { .. } | Self::UnknownFunction { .. }
        )
    }

    pub fn is_type(&self) -> bool {
        matches!(self, Self::NotAString { .. })
    }
}

pub type Result<T> = std::result::Result<T, InterpolationError>;
