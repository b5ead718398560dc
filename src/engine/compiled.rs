//! Compiled problem plans.
//!
//! Generation instantiates the same definition many times, so everything that
//! does not depend on random draws is done once up front:
//!
//! 1. **Parameters**: each expression is parsed, and its free names are
//!    checked against the declaration order. A name that refers to the
//!    parameter itself or to one declared later is a compile-time
//!    `ForwardReference`, reported every time the plan runs.
//! 2. **Templates**: statement, answer, solution and every choice are split
//!    into literal pieces and slots (`substitute.rs`).
//!
//! ## Invariants
//!
//! - `ParameterPlan::Ordered` keeps declaration order.
//! - A script-mode plan never evaluates per-key expressions.

use super::expr::{Expr, parse_expression};
use super::substitute::Template;
use crate::grammar::RawValue;
use crate::problem::{ProblemDefinition, SCRIPT_KEY};
use crate::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CompiledParameter {
    pub name: String,
    pub source: String,
    pub expr: Result<Expr, EvalError>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ParameterPlan {
    /// Opaque body handed to the script sandbox.
    Script(String),
    Ordered(Vec<CompiledParameter>),
}

/// A definition with every expression and template pre-parsed.
#[derive(Debug, Clone)]
pub(crate) struct CompiledProblem<'d> {
    pub definition: &'d ProblemDefinition,
    pub parameters: ParameterPlan,
    pub statement: Template,
    pub answer: Template,
    pub solution: Template,
    pub choices: Vec<Template>,
}

impl<'d> CompiledProblem<'d> {
    pub(crate) fn new(definition: &'d ProblemDefinition) -> Self {
        let parameters = match definition.parameters.get(SCRIPT_KEY) {
            Some(body) => ParameterPlan::Script(body.expression_source()),
            None => ParameterPlan::Ordered(compile_parameters(definition.parameters.iter())),
        };

        CompiledProblem {
            definition,
            parameters,
            statement: Template::compile(&definition.statement),
            answer: Template::compile(&definition.answer),
            solution: Template::compile(&definition.solution),
            choices: definition.choices.iter().map(|c| Template::compile(c)).collect(),
        }
    }

    /// Number of placeholders across every template.
    pub(crate) fn slot_count(&self) -> usize {
        [&self.statement, &self.answer, &self.solution].into_iter().chain(&self.choices).map(Template::slot_count).sum()
    }
}

fn compile_parameters<'a, I>(declared: I) -> Vec<CompiledParameter>
where
    I: Iterator<Item = (&'a String, &'a RawValue)>,
{
    let declared: Vec<(&String, &RawValue)> = declared.collect();
    declared
        .iter()
        .enumerate()
        .map(|(position, (name, raw))| {
            let source = raw.expression_source();
            let expr = parse_expression(&source).and_then(|expr| {
                let not_yet_declared = |n: &str| declared[position..].iter().any(|(later, _)| later.as_str() == n);
                let forward = expr.free_names().into_iter().find(|n| not_yet_declared(n)).map(str::to_string);
                match forward {
                    Some(referenced) => {
                        Err(EvalError::ForwardReference { name: name.to_string(), referenced })
                    }
                    None => Ok(expr),
                }
            });
            CompiledParameter { name: name.to_string(), source, expr }
        })
        .collect()
}
