//! Evaluation and generation engine.
//!
//! The engine turns a parsed [`crate::ProblemDefinition`] into rendered
//! [`crate::ProblemInstance`]s. It never sees problem source text; the section
//! grammar (`src/grammar/**`) has already produced the definition.
//!
//! ## How the parts work together
//!
//! ```text
//! ProblemDefinition ──┐
//!                     │  CompiledProblem::new          (compiled.rs)
//!                     │    - parse each parameter      (expr.rs)
//!                     │    - reject forward references
//!                     │    - split templates into slots (substitute.rs)
//!                     └──────────────┬─────────────────
//!                                    │
//!            generate ── loop ───────┼─ CompiledProblem::instantiate (instantiate.rs)
//!         (generator.rs)             │    - evaluate parameters in order   (eval.rs)
//!                                    │        - arithmetic                  (ops.rs)
//!                                    │        - randnum, pick, dfraction..  (library.rs)
//!                                    │    - render every template
//!                                    v
//!                     SeenStatements::insert (dedup.rs)
//!                       - keep the instance if its statement is new
//!                                    │
//!                                    v
//!                       Batch { instances, values, status, metrics }
//! ```
//!
//! Compilation happens once per generation call; only evaluation and
//! rendering repeat per attempt.
//!
//! ## Responsibilities by module
//!
//! - `expr.rs`: expression grammar (nom) and the `Expr` tree.
//! - `ops.rs`: arithmetic and comparison on `Value`s; symbolic operands are
//!   passed to the `Algebra` capability.
//! - `library.rs`: the built-in function table.
//! - `eval.rs`: namespace lookup and tree evaluation; `evaluate` turns errors
//!   into logged absence.
//! - `substitute.rs`: `@{expr}` templates.
//! - `compiled.rs`: per-definition parameter and template plans.
//! - `instantiate.rs`: one instantiation, with a report of what went missing.
//! - `generator.rs` + `dedup.rs`: bounded duplicate-free batches.
//! - `metrics.rs`: counters and timings for a batch.
//!
//! ## Failure model
//!
//! Evaluation failures are values, not panics: an `EvalError` is logged at
//! `warn` with the offending source and the parameter or placeholder becomes
//! absent. Absence propagates (a later parameter that reads an absent one is
//! itself absent) and is counted in the instantiation report.

#[path = "engine/compiled.rs"]
mod compiled;
#[path = "engine/dedup.rs"]
mod dedup;
#[path = "engine/eval.rs"]
mod eval;
#[path = "engine/expr.rs"]
mod expr;
#[path = "engine/generator.rs"]
mod generator;
#[path = "engine/instantiate.rs"]
mod instantiate;
#[path = "engine/library.rs"]
mod library;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/ops.rs"]
mod ops;
#[path = "engine/substitute.rs"]
mod substitute;

#[cfg(test)]
#[path = "engine/tests.rs"]
mod tests;

pub use eval::{evaluate, try_evaluate};
pub use expr::{BinaryOp, Expr, UnaryOp, parse_expression};
pub use generator::{Batch, BatchStatus};
pub use instantiate::{Instantiation, InstantiationReport, instantiate};
pub use metrics::GenerationMetrics;
pub use substitute::substitute;

pub(crate) use generator::generate;
