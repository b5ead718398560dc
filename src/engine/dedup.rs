//! Deduplication keys for generated batches.
//!
//! Two instances count as the same variant when their rendered statements are
//! byte-for-byte equal. Answers, solutions and choices play no part.

use crate::problem::ProblemInstance;
use std::collections::HashSet;

/// Statements accepted so far in one batch.
#[derive(Debug, Default, Clone)]
pub(crate) struct SeenStatements {
    seen: HashSet<String>,
}

impl SeenStatements {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record the instance; `false` if its statement was already present.
    pub(crate) fn insert(&mut self, instance: &ProblemInstance) -> bool {
        if self.seen.contains(&instance.statement) {
            return false;
        }
        self.seen.insert(instance.statement.clone())
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(statement: &str, answer: &str) -> ProblemInstance {
        ProblemInstance { statement: statement.to_string(), answer: answer.to_string(), ..ProblemInstance::default() }
    }

    #[test]
    fn only_the_statement_matters() {
        let mut seen = SeenStatements::new();
        assert!(seen.insert(&instance("What is 2+2?", "4")));
        assert!(!seen.insert(&instance("What is 2+2?", "5")));
        assert!(seen.insert(&instance("What is 2+3?", "5")));
        assert_eq!(seen.len(), 2);
    }
}
