//! Iterative deepening over the number of happenings.
//!
//! Each round encodes the problem for one bound, hands the persisted
//! encoding to the solver and either stops on a satisfying assignment or
//! moves on to `bound + step`. A bound is never attempted twice and never
//! exceeds the configured upper bound.

use std::io::Write;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use smtplan_solver::{Model, PlanSummary, SolveOutcome, SolverInvoker};

use crate::config::Configuration;
use crate::ports::PortError;
use crate::sink::{EncodingSink, SinkError};
use crate::timer::Timer;

/// Produces the encoding for a single bound.
pub trait BoundEncoder {
    fn encode(&mut self, bound: u64, out: &mut dyn Write) -> Result<(), PortError>;
}

impl<T: BoundEncoder + ?Sized> BoundEncoder for &mut T {
    fn encode(&mut self, bound: u64, out: &mut dyn Write) -> Result<(), PortError> {
        (**self).encode(bound, out)
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum SearchError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Sink(#[from] SinkError),
    #[error("Encoding is written to standard output; the solver needs a file (use -o or -n)")]
    #[diagnostic(code(smtplan::search::unlocated))]
    Unlocated,
}

/// The sequence of bounds a run may attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchBounds {
    pub start: u64,
    pub upper: Option<u64>,
    pub step: u64,
}

impl SearchBounds {
    /// `suggested` is the pruner's goal layer; it replaces the configured
    /// lower bound only when the run asked for it.
    pub fn from_config(config: &Configuration, suggested: Option<u64>) -> Self {
        let start = match (config.rpg_lower_bound, suggested) {
            (true, Some(layer)) => layer,
            (true, None) => {
                warn!(
                    lower_bound = config.lower_bound,
                    "reachability analysis suggested no bound, using configured lower bound"
                );
                config.lower_bound
            }
            (false, _) => config.lower_bound,
        };
        Self {
            start,
            upper: config.upper_bound,
            step: config.step_size.max(1),
        }
    }

    pub fn admits(&self, bound: u64) -> bool {
        self.upper.map_or(true, |upper| bound <= upper)
    }

    /// Bounds in attempt order. Unbounded when there is no upper bound.
    pub fn schedule(&self) -> impl Iterator<Item = u64> {
        let bounds = *self;
        std::iter::successors(Some(bounds.start).filter(|b| bounds.admits(*b)), move |b| {
            b.checked_add(bounds.step).filter(|next| bounds.admits(*next))
        })
    }
}

/// Per-bound diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundAttempt {
    pub bound: u64,
    pub encode_secs: f64,
    pub solve_secs: Option<f64>,
    pub verdict: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    PlanFound {
        bound: u64,
        plan: PlanSummary,
        #[serde(skip)]
        model: Model,
    },
    /// Encode-only run: the first encoding was produced and solving skipped.
    EncodedOnly { bound: u64 },
    /// Every admissible bound was unsatisfiable or failed.
    Exhausted { upper_bound: Option<u64> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    pub attempts: Vec<BoundAttempt>,
    pub total_secs: f64,
}

impl SearchReport {
    pub fn attempted_bounds(&self) -> Vec<u64> {
        self.attempts.iter().map(|a| a.bound).collect()
    }

    pub fn plan_found(&self) -> bool {
        matches!(self.outcome, SearchOutcome::PlanFound { .. })
    }
}

pub struct SearchLoop<E, S> {
    bounds: SearchBounds,
    solve: bool,
    encoder: E,
    solver: S,
}

impl<E: BoundEncoder, S: SolverInvoker> SearchLoop<E, S> {
    pub fn new(bounds: SearchBounds, solve: bool, encoder: E, solver: S) -> Self {
        Self {
            bounds,
            solve,
            encoder,
            solver,
        }
    }

    pub fn run(
        &mut self,
        sink: &EncodingSink,
        timer: &mut Timer,
    ) -> Result<SearchReport, SearchError> {
        if self.solve && sink.location().is_none() {
            return Err(SearchError::Unlocated);
        }
        let mut attempts = Vec::new();

        for bound in self.bounds.schedule() {
            info!(bound, "encoding");
            let encoder = &mut self.encoder;
            sink.write_with(bound, |out| encoder.encode(bound, out))?;
            let encode_secs = timer.elapsed_since_last();
            info!(bound, elapsed_secs = encode_secs, "encoded");

            let mut attempt = BoundAttempt {
                bound,
                encode_secs,
                solve_secs: None,
                verdict: None,
                error: None,
            };

            if !self.solve {
                attempts.push(attempt);
                return Ok(SearchReport {
                    outcome: SearchOutcome::EncodedOnly { bound },
                    attempts,
                    total_secs: timer.total_elapsed(),
                });
            }

            let location = sink.location().ok_or(SearchError::Unlocated)?;
            let outcome = self.solver.solve(location);
            let solve_secs = timer.elapsed_since_last();
            attempt.solve_secs = Some(solve_secs);
            attempt.verdict = Some(outcome.label().to_string());
            info!(bound, verdict = outcome.label(), elapsed_secs = solve_secs, "solved");

            match outcome {
                SolveOutcome::Found { model } => {
                    attempts.push(attempt);
                    info!(bound, "plan found");
                    return Ok(SearchReport {
                        outcome: SearchOutcome::PlanFound {
                            bound,
                            plan: PlanSummary::from_model(&model),
                            model,
                        },
                        attempts,
                        total_secs: timer.total_elapsed(),
                    });
                }
                SolveOutcome::NotFound { .. } => {}
                SolveOutcome::Error(message) => {
                    warn!(bound, %message, "solver failed, advancing");
                    attempt.error = Some(message);
                }
            }
            attempts.push(attempt);
        }

        info!(upper_bound = ?self.bounds.upper, "no plan found within the configured upper bound");
        Ok(SearchReport {
            outcome: SearchOutcome::Exhausted {
                upper_bound: self.bounds.upper,
            },
            attempts,
            total_secs: timer.total_elapsed(),
        })
    }

    pub fn into_parts(self) -> (E, S) {
        (self.encoder, self.solver)
    }
}
