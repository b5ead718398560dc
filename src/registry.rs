//! Caller-owned lookup of parsed problems by name.

use crate::problem::ProblemDefinition;
use indexmap::IndexMap;

#[derive(Debug, Clone, Default)]
pub struct ProblemRegistry {
    problems: IndexMap<String, ProblemDefinition>,
}

impl ProblemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `problem` under `name`, or under its `problem_id` when `name`
    /// is empty. Returns the definition previously registered under that name.
    pub fn add(&mut self, problem: ProblemDefinition, name: &str) -> Option<ProblemDefinition> {
        let key = if name.is_empty() { problem.problem_id.clone() } else { name.to_string() };
        let previous = self.problems.insert(key.clone(), problem);
        if previous.is_some() {
            tracing::debug!(name = %key, "replaced registered problem");
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<&ProblemDefinition> {
        self.problems.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.problems.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}
