//! End-to-end behavior: parse, instantiate, generate.

use crate::api::{Context, Options};
use crate::value::{Value, ValueEnvironment};
use crate::{
    AssignmentSandbox, BatchStatus, Dialect, ProblemDefinition, RawValue, evaluate, generate, generate_with,
    instantiate, parse, parse_with, substitute,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

const ADDITION: &str = "<<statement>>\nWhat is @{a}+@{b}?\n<<parameters>>\na: randnum(1,5)\nb: randnum(1,5)\n<<answer>>\n@{a+b}";

#[test]
fn addition_problem_parses_and_renders() {
    let def = parse(ADDITION).unwrap();
    assert_eq!(def.statement, "What is @{a}+@{b}?");
    assert_eq!(def.answer, "@{a+b}");
    assert_eq!(def.parameters.keys().collect::<Vec<_>>(), vec!["a", "b"]);

    let out = instantiate(&def, &Context::default());
    let a = out.values.get("a").and_then(|v| v.as_integer().ok()).unwrap();
    let b = out.values.get("b").and_then(|v| v.as_integer().ok()).unwrap();
    assert!((1..=5).contains(&a) && (1..=5).contains(&b));
    assert_eq!(out.instance.statement, format!("What is {}+{}?", a, b));
    assert_eq!(out.instance.answer, (a + b).to_string());
}

#[test]
fn first_choice_is_the_canonical_answer() {
    let def = parse("<<statement>>\nPick four.\n<<choices>>\n- 4\n- 5\n- 6\n").unwrap();
    assert_eq!(def.choices, vec!["4", "5", "6"]);
    let out = instantiate(&def, &Context::default());
    assert_eq!(out.instance.answer, "4");
    assert!(out.instance.check_answer(" 4 "));
}

#[test]
fn dfraction_reduces_before_rendering() {
    let ctx = Context::default();
    let env = ValueEnvironment::new();
    assert_eq!(evaluate("dfraction(3,6)", &env, &ctx), Some(Value::str("\\dfrac{1}{2}")));
    assert_eq!(substitute("@{dfraction(3,6)}", &env, &ctx), "\\dfrac{1}{2}");
}

#[test]
fn info_keys_are_lifted() {
    let def = parse("<<info>>\ndifficulty: 3\nauthor: \"jane\"\nid: \"p1\"\n").unwrap();
    assert_eq!(def.problem_id, "p1");
    assert_eq!(def.metadata.get("difficulty"), Some(&RawValue::Int(3)));
    assert_eq!(def.metadata.get("author"), Some(&RawValue::Str("jane".to_string())));
    assert!(!def.metadata.contains_key("id"));
    assert!(!def.metadata.contains_key("info"));
}

#[test]
fn constant_problem_exhausts_the_budget() {
    let def = parse("<<parameters>>\ncoin: pickone(0,0)\n<<statement>>\nThe coin shows @{coin}.\n").unwrap();
    let batch = generate(&def, 5, &Context::default());
    assert_eq!(batch.status, BatchStatus::Exhausted);
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.instances[0].statement, "The coin shows 0.");
    assert_eq!(batch.metrics.attempts, crate::DEFAULT_MAX_ATTEMPTS);
    assert_eq!(batch.metrics.duplicates_rejected, crate::DEFAULT_MAX_ATTEMPTS - 1);
}

#[test]
fn small_budget_is_respected() {
    let def = parse("<<parameters>>\nx: randnum(1, 2)\n<<statement>>\n@{x}\n").unwrap();
    let batch = generate_with(&def, 3, &Context::default(), &Options::new().max_attempts(50));
    assert_eq!(batch.status, BatchStatus::Exhausted);
    assert_eq!(batch.len(), 2);
    assert_eq!(batch.metrics.attempts, 50);
    let seen: HashSet<_> = batch.instances.iter().map(|i| i.statement.as_str()).collect();
    assert_eq!(seen, HashSet::from(["1", "2"]));
}

#[test]
fn batch_values_line_up_with_instances() {
    let def = parse("<<parameters>>\nn: randnum(10, 99)\n<<statement>>\nn = @{n}\n").unwrap();
    let batch = generate(&def, 6, &Context::default());
    assert!(batch.is_complete());
    for (instance, values) in batch.instances.iter().zip(&batch.values) {
        let n = values.get("n").map(ToString::to_string).unwrap();
        assert_eq!(instance.statement, format!("n = {}", n));
    }
}

#[test]
fn legacy_script_runs_in_the_assignment_sandbox() {
    let source = "\
Question
<eqn> $a = randnum(2, 9);
$b = $a * $a; ''</eqn>
<watex>What is $a squared?</watex>
<_>
Answer
<watex>$b</watex>
<watex><eqn $b + 1></watex>
";
    let def = parse_with(source, Dialect::Legacy).unwrap();
    let ctx = Context::default().with_sandbox(Arc::new(AssignmentSandbox));
    let out = instantiate(&def, &ctx);
    let a = out.values.get("a").and_then(|v| v.as_integer().ok()).unwrap();
    assert_eq!(out.values.names().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(out.instance.statement, format!("What is {} squared?", a));
    assert_eq!(out.instance.choices, vec![(a * a).to_string(), (a * a + 1).to_string()]);
    assert_eq!(out.instance.answer, (a * a).to_string());
}

#[test]
fn symbols_render_through_the_algebra() {
    let algebra = crate::ExactAlgebra::new().with_symbols(["x"]);
    let ctx = Context::default().with_algebra(Arc::new(algebra));
    let def = parse("<<parameters>>\nk: 3\n<<statement>>\nExpand @{k*x + 1}.\n").unwrap();
    assert_eq!(instantiate(&def, &ctx).instance.statement, "Expand 3 x + 1.");
}

fn chain(names: &[String]) -> ProblemDefinition {
    let mut def = ProblemDefinition { statement: "@{".to_string() + &names[names.len() - 1] + "}", ..Default::default() };
    for (idx, name) in names.iter().enumerate() {
        let expr = match idx {
            0 => "randnum(1, 9)".to_string(),
            _ => format!("{} + 1", names[idx - 1]),
        };
        def.parameters.insert(name.clone(), RawValue::decode(&expr));
    }
    def
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn resolved_keys_match_declared_keys(raw in prop::collection::vec("[a-z]{1,6}", 1..8)) {
        let mut names: Vec<String> = Vec::new();
        for name in raw.into_iter().map(|n| format!("p_{}", n)) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        let def = chain(&names);
        let out = instantiate(&def, &Context::default());
        prop_assert!(out.report.is_clean());
        prop_assert_eq!(out.values.names().map(String::from).collect::<Vec<_>>(), names);
    }

    #[test]
    fn accepted_statements_are_pairwise_distinct(count in 1usize..40) {
        let def = parse("<<parameters>>\na: randnum(1, 100)\n<<statement>>\nTake @{a}.\n").unwrap();
        let batch = generate(&def, count, &Context::default());
        prop_assert!(batch.is_complete());
        let distinct: HashSet<&str> = batch.instances.iter().map(|i| i.statement.as_str()).collect();
        prop_assert_eq!(distinct.len(), count);
    }

    #[test]
    fn substitution_leaves_plain_text_alone(text in "[^@]{0,40}") {
        prop_assert_eq!(substitute(&text, &ValueEnvironment::new(), &Context::default()), text);
    }
}
