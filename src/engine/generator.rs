//! Batch generation with duplicate avoidance.

use super::compiled::CompiledProblem;
use super::dedup::SeenStatements;
use super::metrics::GenerationMetrics;
use crate::api::{Context, Options};
use crate::problem::{ProblemDefinition, ProblemInstance};
use crate::value::ValueEnvironment;
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// The requested number of instances was produced.
    Complete,
    /// The attempt budget ran out first; the batch holds what was accepted.
    Exhausted,
}

/// Result of [`crate::generate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Batch {
    pub instances: Vec<ProblemInstance>,
    /// The environment behind each instance, index-aligned with `instances`.
    pub values: Vec<ValueEnvironment>,
    pub status: BatchStatus,
    pub metrics: GenerationMetrics,
}

impl Batch {
    pub fn is_complete(&self) -> bool {
        self.status == BatchStatus::Complete
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

pub(crate) fn generate(definition: &ProblemDefinition, count: usize, context: &Context, options: &Options) -> Batch {
    let start = Instant::now();
    let mut metrics = GenerationMetrics::default();

    let compiled = CompiledProblem::new(definition);
    metrics.compile = start.elapsed();
    tracing::debug!(problem = %definition.problem_id, slots = compiled.slot_count(), requested = count, "compiled problem");

    let mut seen = SeenStatements::new();
    let mut instances = Vec::with_capacity(count);
    let mut values = Vec::with_capacity(count);

    let status = loop {
        if instances.len() >= count {
            break BatchStatus::Complete;
        }
        if options.max_attempts.is_some_and(|max| metrics.attempts >= max) {
            break BatchStatus::Exhausted;
        }

        let out = compiled.instantiate(context);
        metrics.attempts += 1;
        metrics.absent_parameters += out.report.absent_parameters.len();
        metrics.unresolved_placeholders += out.report.unresolved_placeholders;

        if seen.insert(&out.instance) || options.duplicates_allowed {
            instances.push(out.instance);
            values.push(out.values);
        } else {
            metrics.duplicates_rejected += 1;
        }
    };

    metrics.accepted = instances.len();
    metrics.total = start.elapsed();

    match status {
        BatchStatus::Complete => tracing::debug!(
            problem = %definition.problem_id,
            accepted = metrics.accepted,
            attempts = metrics.attempts,
            "batch complete"
        ),
        BatchStatus::Exhausted => tracing::warn!(
            problem = %definition.problem_id,
            requested = count,
            accepted = metrics.accepted,
            attempts = metrics.attempts,
            duplicates = metrics.duplicates_rejected,
            "attempt budget exhausted before the batch was filled"
        ),
    }

    Batch { instances, values, status, metrics }
}
