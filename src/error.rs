//! Error types.
//!
//! Only two situations are hard failures for a caller: input that is not text
//! at all, and input whose structure is ambiguous (a section opened twice).
//! Everything else (malformed section bodies, expressions that cannot be
//! evaluated) degrades to a default value and is reported through `tracing`.
//! `EvalError` still exists as a proper type because the evaluator propagates
//! it internally with `?` before the boundary turns it into absence.

use thiserror::Error;

/// Structural failure of a whole parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("problem source is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("section <<{name}>> opened a second time on line {line}")]
    DuplicateSection { name: String, line: usize },
}

/// Why an expression could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("undefined name '{0}'")]
    Undefined(String),

    #[error("'{0}' is not a function")]
    NotCallable(String),

    #[error("{function}() takes {expected} argument(s), got {got}")]
    Arity { function: &'static str, expected: &'static str, got: usize },

    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: &'static str, got: &'static str },

    #[error("division by zero")]
    DivisionByZero,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("{function}(): {reason}")]
    InvalidArgument { function: &'static str, reason: String },

    #[error("{function}(): no admissible value after {draws} draws")]
    ExhaustedSampling { function: &'static str, draws: usize },

    #[error("'{name}' refers to parameter '{referenced}', which is not declared before it")]
    ForwardReference { name: String, referenced: String },

    #[error("{0}")]
    Other(String),
}

impl EvalError {
    pub fn type_mismatch(expected: &'static str, got: &'static str) -> Self {
        EvalError::TypeMismatch { expected, got }
    }
}

/// Failure reported by a [`crate::ScriptSandbox`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SandboxError {
    #[error("line {line}: {message}")]
    Statement { line: usize, message: String },

    #[error("line {line}: {source}")]
    Eval {
        line: usize,
        #[source]
        source: EvalError,
    },

    #[error("script sandbox failed: {0}")]
    Other(String),
}
