//! Parameter instantiation and rendering.

use super::compiled::{CompiledProblem, ParameterPlan};
use super::eval::Namespace;
use crate::api::Context;
use crate::problem::{ProblemDefinition, ProblemInstance, SCRIPT_KEY};
use crate::value::ValueEnvironment;
use serde::Serialize;

/// What went missing during one instantiation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstantiationReport {
    /// Parameters that could not be evaluated, in declaration order.
    pub absent_parameters: Vec<String>,
    /// Placeholders emitted as their literal `@{..}` text.
    pub unresolved_placeholders: usize,
}

impl InstantiationReport {
    pub fn is_clean(&self) -> bool {
        self.absent_parameters.is_empty() && self.unresolved_placeholders == 0
    }
}

/// One rendered instance together with the values that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instantiation {
    pub instance: ProblemInstance,
    pub values: ValueEnvironment,
    pub report: InstantiationReport,
}

/// Instantiate a definition once.
pub fn instantiate(definition: &ProblemDefinition, context: &Context) -> Instantiation {
    CompiledProblem::new(definition).instantiate(context)
}

impl CompiledProblem<'_> {
    pub(crate) fn instantiate(&self, context: &Context) -> Instantiation {
        let mut report = InstantiationReport::default();
        let values = self.resolve_parameters(context, &mut report);

        let ns = Namespace::new(&values, context);
        let mut render = |template: &super::substitute::Template| {
            let rendered = template.render(ns);
            report.unresolved_placeholders += rendered.unresolved;
            rendered.text
        };

        let statement = render(&self.statement);
        let solution = render(&self.solution);
        let choices: Vec<String> = self.choices.iter().map(&mut render).collect();
        let answer = match choices.first() {
            Some(first) => first.clone(),
            None => render(&self.answer),
        };

        let definition = self.definition;
        let instance = ProblemInstance {
            id: definition.problem_id.clone(),
            title: definition.title.clone(),
            tags: definition.tags.clone(),
            statement,
            answer,
            solution,
            solution_title: definition.solution_title.clone(),
            choices,
        };

        if !report.is_clean() {
            tracing::debug!(
                problem = %definition.problem_id,
                absent = report.absent_parameters.len(),
                unresolved = report.unresolved_placeholders,
                "instance rendered with missing pieces"
            );
        }
        Instantiation { instance, values, report }
    }

    fn resolve_parameters(&self, context: &Context, report: &mut InstantiationReport) -> ValueEnvironment {
        match &self.parameters {
            ParameterPlan::Script(body) => {
                let Some(sandbox) = context.sandbox() else {
                    tracing::warn!(problem = %self.definition.problem_id, "script parameters need a sandbox; none configured");
                    return ValueEnvironment::new();
                };
                match sandbox.execute(body, context) {
                    Ok(mut values) => {
                        values.remove(SCRIPT_KEY);
                        values
                    }
                    Err(err) => {
                        tracing::warn!(problem = %self.definition.problem_id, error = %err, "script sandbox failed");
                        ValueEnvironment::new()
                    }
                }
            }
            ParameterPlan::Ordered(params) => {
                let mut values = ValueEnvironment::new();
                for param in params {
                    let result = param.expr.clone().and_then(|expr| Namespace::new(&values, context).eval(&expr));
                    match result {
                        Ok(value) => values.define(param.name.clone(), value),
                        Err(err) => {
                            tracing::warn!(
                                parameter = %param.name,
                                expression = %param.source,
                                error = %err,
                                "parameter is absent"
                            );
                            report.absent_parameters.push(param.name.clone());
                        }
                    }
                }
                values
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::RawValue;
    use crate::value::Value;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn definition(params: &[(&str, &str)]) -> ProblemDefinition {
        let parameters: IndexMap<String, RawValue> =
            params.iter().map(|(k, v)| (k.to_string(), RawValue::decode(v))).collect();
        ProblemDefinition { problem_id: "p".to_string(), parameters, ..ProblemDefinition::default() }
    }

    #[test]
    fn renders_every_field() {
        let def = ProblemDefinition {
            statement: "Add @{a} and @{b}.".to_string(),
            answer: "@{a + b}".to_string(),
            solution: "It is @{a + b}.".to_string(),
            ..definition(&[("a", "2"), ("b", "a * 3")])
        };
        let out = instantiate(&def, &Context::default());
        assert_eq!(out.instance.statement, "Add 2 and 6.");
        assert_eq!(out.instance.answer, "8");
        assert_eq!(out.instance.solution, "It is 8.");
        assert_eq!(out.values.get("b"), Some(&Value::int(6)));
        assert!(out.report.is_clean());
    }

    #[test]
    fn first_choice_is_the_answer() {
        let def = ProblemDefinition {
            answer: "ignored".to_string(),
            choices: vec!["@{a}".to_string(), "@{a + 1}".to_string()],
            ..definition(&[("a", "4")])
        };
        let out = instantiate(&def, &Context::default());
        assert_eq!(out.instance.choices, vec!["4", "5"]);
        assert_eq!(out.instance.answer, "4");
    }

    #[test]
    fn absence_propagates_without_crashing() {
        let def = ProblemDefinition {
            statement: "@{a} @{b} @{c}".to_string(),
            ..definition(&[("a", "1/0"), ("b", "a + 1"), ("c", "5")])
        };
        let out = instantiate(&def, &Context::default());
        assert_eq!(out.report.absent_parameters, vec!["a", "b"]);
        assert_eq!(out.report.unresolved_placeholders, 2);
        assert_eq!(out.instance.statement, "@{a} @{b} 5");
    }

    #[test]
    fn forward_reference_wins_over_same_named_external() {
        let def = ProblemDefinition { statement: "@{a}".to_string(), ..definition(&[("a", "b"), ("b", "1")]) };
        let ctx = Context::default().with_external("b", Value::int(99));
        let out = instantiate(&def, &ctx);
        assert_eq!(out.report.absent_parameters, vec!["a"]);
        assert_eq!(out.instance.statement, "@{a}");
    }

    #[test]
    fn externals_are_visible_to_templates() {
        let def = ProblemDefinition { statement: "@{k * a}".to_string(), ..definition(&[("a", "2")]) };
        let ctx = Context::default().with_external("k", Value::int(10));
        assert_eq!(instantiate(&def, &ctx).instance.statement, "20");
    }

    #[test]
    fn script_mode_without_sandbox_is_empty() {
        let def = ProblemDefinition { statement: "@{a}".to_string(), ..definition(&[("code", "'a = 1'")]) };
        let out = instantiate(&def, &Context::default());
        assert!(out.values.is_empty());
        assert_eq!(out.instance.statement, "@{a}");
    }
}
