//! Generation run metrics.
//!
//! Every [`crate::Batch`] carries a [`GenerationMetrics`] so callers can see
//! how hard the generator had to work for its result:
//!
//! - a high `duplicates_rejected` count means the parameter space is small
//!   relative to the requested batch size;
//! - non-zero `absent_parameters` / `unresolved_placeholders` point at
//!   expressions that failed (the `tracing` output names them).

use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationMetrics {
    /// Total elapsed time for the generation call.
    pub total: Duration,
    /// Time spent compiling parameters and templates.
    pub compile: Duration,
    /// Instantiations performed.
    pub attempts: usize,
    /// Instances accepted into the batch.
    pub accepted: usize,
    /// Instances dropped because their statement was already in the batch.
    pub duplicates_rejected: usize,
    /// Parameters that evaluated to absence, summed over all attempts.
    pub absent_parameters: usize,
    /// Placeholders left unresolved, summed over all attempts.
    pub unresolved_placeholders: usize,
}

impl GenerationMetrics {
    /// Fraction of attempts that were accepted.
    pub fn acceptance_rate(&self) -> f64 {
        if self.attempts == 0 { 0.0 } else { self.accepted as f64 / self.attempts as f64 }
    }
}
