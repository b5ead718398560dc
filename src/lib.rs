//! Randomized quiz problems from plain-text templates.
//!
//! A problem file declares parameters (`a: randnum(1, 9)`) and text with
//! `@{expr}` placeholders. [`parse`] turns the file into a
//! [`ProblemDefinition`]; [`generate`] renders as many variants as requested,
//! no two with the same statement.
//!
//! ```
//! use quizgen::{Context, generate, parse};
//!
//! let source = "\
//! <<parameters>>
//! a: randnum(2, 9)
//! b: randnum(2, 9)
//! <<statement>>
//! Compute @{a} \\times @{b}.
//! <<answer>>
//! @{a * b}
//! ";
//! let def = parse(source).unwrap();
//! let batch = generate(&def, 3, &Context::default());
//! assert_eq!(batch.instances.len(), 3);
//! ```

#[macro_use]
mod macros;
mod algebra;
mod api;
mod engine;
mod error;
mod grammar;
mod problem;
mod registry;
mod sandbox;
mod value;

pub use algebra::{Algebra, ExactAlgebra};
pub use api::{Context, DEFAULT_MAX_ATTEMPTS, Dialect, Function, Options, generate, generate_with, parse, parse_bytes, parse_with};
pub use engine::{
    Batch, BatchStatus, BinaryOp, Expr, GenerationMetrics, Instantiation, InstantiationReport, UnaryOp, evaluate,
    instantiate, parse_expression, substitute, try_evaluate,
};
pub use error::{EvalError, ParseError, SandboxError};
pub use grammar::{RawValue, SectionMap, SectionValue, parse_legacy, parse_sections};
pub use problem::{HasChoices, HasParameters, ProblemDefinition, ProblemInstance, ProblemKind, SCRIPT_KEY};
pub use registry::ProblemRegistry;
pub use sandbox::{AssignmentSandbox, ScriptSandbox};
pub use value::{Precedence, Rational, Symbolic, Value, ValueEnvironment};
