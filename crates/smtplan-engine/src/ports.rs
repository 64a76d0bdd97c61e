//! Interfaces to the planning front end.
//!
//! Parsing, grounding, reachability analysis and SMT encoding live outside
//! this crate. The driver only needs the four narrow capabilities below; the
//! model types they exchange stay opaque to it.

use std::io::{self, Write};
use std::path::Path;

use thiserror::Error;

use crate::config::Configuration;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Rejected(String),
}

pub trait Parser {
    type Domain;
    type Problem;

    fn parse_domain(&mut self, path: &Path) -> Result<Self::Domain, PortError>;

    fn parse_problem(&mut self, path: &Path) -> Result<Self::Problem, PortError>;
}

pub trait Grounder<D, P> {
    type Grounded;

    fn ground(
        &mut self,
        domain: &D,
        problem: &P,
        config: &Configuration,
    ) -> Result<Self::Grounded, PortError>;
}

/// Output of reachability analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pruned<G> {
    pub model: G,
    /// First bound at which the goal can be reachable, if the analysis knows.
    pub suggested_lower_bound: Option<u64>,
}

pub trait ReachabilityPruner<G> {
    fn build(&mut self, grounded: G, config: &Configuration) -> Result<Pruned<G>, PortError>;
}

pub trait Encoder<D, P, G> {
    /// Write the encoding of "a plan with exactly `bound` happenings exists".
    fn encode(
        &mut self,
        domain: &D,
        problem: &P,
        grounded: &G,
        bound: u64,
        out: &mut dyn Write,
    ) -> Result<(), PortError>;
}

/// The front-end collaborators for one run.
#[derive(Debug, Clone)]
pub struct Ports<P, G, R, E> {
    pub parser: P,
    pub grounder: G,
    pub pruner: R,
    pub encoder: E,
}

/// Pruner that keeps the grounded model and suggests nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPruning;

impl<G> ReachabilityPruner<G> for NoPruning {
    fn build(&mut self, grounded: G, _config: &Configuration) -> Result<Pruned<G>, PortError> {
        Ok(Pruned {
            model: grounded,
            suggested_lower_bound: None,
        })
    }
}
