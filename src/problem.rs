//! Problem records: the parsed definition and its rendered instances.

use crate::grammar::{RawValue, SectionMap, SectionValue};
use indexmap::IndexMap;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::fmt::Write as _;

/// Parameter key whose value is an opaque script body rather than an
/// expression.
pub const SCRIPT_KEY: &str = "code";

bitflags::bitflags! {
    /// What a definition carries, for callers that branch on problem shape.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ProblemKind: u8 {
        const PARAMETERIZED   = 1 << 0;
        const SCRIPTED        = 1 << 1;
        const MULTIPLE_CHOICE = 1 << 2;
        const WITH_SOLUTION   = 1 << 3;
    }
}

/// Records that offer a list of choices, the first one correct.
pub trait HasChoices {
    fn choices(&self) -> &[String];

    fn is_multiple_choice(&self) -> bool {
        !self.choices().is_empty()
    }
}

/// Records that declare parameters.
pub trait HasParameters {
    fn parameters(&self) -> &IndexMap<String, RawValue>;

    /// Script-mode definitions hand their `code` body to a sandbox instead of
    /// evaluating parameters one by one.
    fn is_scripted(&self) -> bool {
        self.parameters().contains_key(SCRIPT_KEY)
    }
}

/// An authored, unresolved problem.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProblemDefinition {
    pub problem_id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub statement: String,
    pub answer: String,
    pub solution: String,
    pub solution_title: String,
    pub choices: Vec<String>,
    /// Parameter name → expression, in declaration order.
    pub parameters: IndexMap<String, RawValue>,
    /// Info keys with no dedicated field.
    pub metadata: IndexMap<String, RawValue>,
}

impl ProblemDefinition {
    /// Build a definition from a decoded section map.
    ///
    /// Only recognized keys become fields; other plain values are kept in
    /// `metadata` and anything else is dropped with a `debug!`.
    pub fn from_sections(sections: SectionMap) -> Self {
        let mut def = ProblemDefinition::default();
        for (key, value) in sections {
            match (key.as_str(), value) {
                ("problem_id", SectionValue::Value(v)) => def.problem_id = v.to_string(),
                ("title", SectionValue::Value(v)) => def.title = v.to_string(),
                ("solution_title", SectionValue::Value(v)) => def.solution_title = v.to_string(),
                ("tags", SectionValue::Value(v)) => def.tags = tags(v),
                ("statement", SectionValue::Text(t)) => def.statement = t,
                ("answer", SectionValue::Text(t)) => def.answer = t,
                ("solution", SectionValue::Text(t)) => def.solution = t,
                ("choices", SectionValue::Items(items)) => def.choices = items,
                // `info` keys land here as values and still name the field
                ("statement", SectionValue::Value(v)) => def.statement = v.to_string(),
                ("answer", SectionValue::Value(v)) => def.answer = v.to_string(),
                ("solution", SectionValue::Value(v)) => def.solution = v.to_string(),
                ("choices", SectionValue::Value(RawValue::List(items))) => {
                    def.choices = items.iter().map(RawValue::to_string).collect();
                }
                ("choices", SectionValue::Value(v)) => def.choices = vec![v.to_string()],
                ("parameters", SectionValue::Mapping(entries)) => def.parameters = entries,
                (_, SectionValue::Value(v)) => {
                    def.metadata.insert(key, v);
                }
                (_, other) => tracing::debug!(section = %key, ?other, "section not used by the definition"),
            }
        }
        def
    }

    pub fn kind(&self) -> ProblemKind {
        let mut kind = ProblemKind::empty();
        kind.set(ProblemKind::SCRIPTED, self.is_scripted());
        kind.set(ProblemKind::PARAMETERIZED, !self.parameters.is_empty());
        kind.set(ProblemKind::MULTIPLE_CHOICE, self.is_multiple_choice());
        kind.set(ProblemKind::WITH_SOLUTION, !self.solution.is_empty());
        kind
    }

    /// Serialize back to the `<<section>>` dialect.
    ///
    /// ```
    /// let def = quizgen::parse("<<parameters>>\na: randnum(1, 9)\n<<statement>>\nDouble @{a}.\n").unwrap();
    /// let again = quizgen::parse(&def.to_source()).unwrap();
    /// assert_eq!(def, again);
    /// ```
    pub fn to_source(&self) -> String {
        let mut out = String::new();

        let mut info: Vec<(String, String)> = Vec::new();
        for (key, value) in [("id", &self.problem_id), ("title", &self.title), ("solution_title", &self.solution_title)] {
            if !value.is_empty() {
                info.push((key.to_string(), RawValue::Str(value.clone()).to_literal()));
            }
        }
        if !self.tags.is_empty() {
            let tags = RawValue::List(self.tags.iter().cloned().map(RawValue::Str).collect());
            info.push(("tags".to_string(), tags.to_literal()));
        }
        info.extend(self.metadata.iter().map(|(k, v)| (k.clone(), v.to_literal())));
        write_mapping(&mut out, "info", info);

        let parameters = self.parameters.iter().map(|(k, v)| (k.clone(), v.to_literal())).collect();
        write_mapping(&mut out, "parameters", parameters);

        for (name, text) in [("statement", &self.statement), ("answer", &self.answer), ("solution", &self.solution)] {
            if !text.is_empty() {
                let _ = writeln!(out, "<<{}>>\n{}", name, text);
            }
        }

        if !self.choices.is_empty() {
            out.push_str("<<choices>>\n");
            for choice in &self.choices {
                let _ = writeln!(out, "- {}", choice);
            }
        }
        out
    }
}

fn write_mapping(out: &mut String, section: &str, entries: Vec<(String, String)>) {
    if entries.is_empty() {
        return;
    }
    let _ = writeln!(out, "<<{}>>", section);
    for (key, literal) in entries {
        let key = if regex!(r"^[A-Za-z_][A-Za-z0-9_]*$").is_match(&key) { key } else { RawValue::Str(key).to_literal() };
        let _ = writeln!(out, "{}: {}", key, literal);
    }
}

/// Tags come as a list or as one comma-separated string.
fn tags(value: RawValue) -> Vec<String> {
    match value {
        RawValue::List(items) => items.iter().map(RawValue::to_string).collect(),
        other => other.to_string().split(',').map(str::trim).filter(|t| !t.is_empty()).map(String::from).collect(),
    }
}

impl HasChoices for ProblemDefinition {
    fn choices(&self) -> &[String] {
        &self.choices
    }
}

impl HasParameters for ProblemDefinition {
    fn parameters(&self) -> &IndexMap<String, RawValue> {
        &self.parameters
    }
}

/// A fully rendered problem. Never mutated after generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProblemInstance {
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub statement: String,
    pub answer: String,
    pub solution: String,
    pub solution_title: String,
    /// Rendered choices; the first one is the correct answer.
    pub choices: Vec<String>,
}

impl ProblemInstance {
    /// Choices in a random display order, with the position of the correct
    /// one. `None` when there are no choices.
    pub fn shuffled_choices<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(Vec<String>, usize)> {
        if self.choices.is_empty() {
            return None;
        }
        let mut order: Vec<usize> = (0..self.choices.len()).collect();
        order.shuffle(rng);
        let correct = order.iter().position(|&i| i == 0)?;
        Some((order.into_iter().map(|i| self.choices[i].clone()).collect(), correct))
    }

    pub fn check_answer(&self, response: &str) -> bool {
        response.trim() == self.answer.trim()
    }
}

impl HasChoices for ProblemInstance {
    fn choices(&self) -> &[String] {
        &self.choices
    }
}
