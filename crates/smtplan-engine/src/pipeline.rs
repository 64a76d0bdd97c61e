//! End-to-end driver: parse, ground, prune once, then search.

use std::io::Write;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;
use tracing::info;

use smtplan_solver::SolverInvoker;

use crate::config::{ConfigError, Configuration};
use crate::ports::{Encoder, Grounder, Parser, PortError, Ports, ReachabilityPruner};
use crate::search::{BoundEncoder, SearchBounds, SearchError, SearchLoop, SearchReport};
use crate::sink::{EncodingSink, SinkError};
use crate::timer::Timer;

#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(smtplan::config))]
    Config(#[from] ConfigError),
    #[error("Domain and problem parsing failed: {path}: {source}")]
    #[diagnostic(code(smtplan::parse))]
    Parse {
        path: PathBuf,
        #[source]
        source: PortError,
    },
    #[error("Grounding failed: {0}")]
    #[diagnostic(code(smtplan::ground))]
    Ground(#[source] PortError),
    #[error("Reachability analysis failed: {0}")]
    #[diagnostic(code(smtplan::prune))]
    Prune(#[source] PortError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Sink(#[from] SinkError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Search(#[from] SearchError),
}

/// Binds the parsed and grounded models to an encoder so the search loop
/// only has to supply a bound.
pub struct PreparedEncoder<'a, D, P, G, E> {
    pub domain: &'a D,
    pub problem: &'a P,
    pub grounded: &'a G,
    pub encoder: E,
}

impl<D, P, G, E: Encoder<D, P, G>> BoundEncoder for PreparedEncoder<'_, D, P, G, E> {
    fn encode(&mut self, bound: u64, out: &mut dyn Write) -> Result<(), PortError> {
        self.encoder
            .encode(self.domain, self.problem, self.grounded, bound, out)
    }
}

/// Run the whole planning pipeline for `config`.
///
/// The timer is sampled after each stage; the returned report carries the
/// per-bound timings and the total.
pub fn run_pipeline<Pa, Gr, Pr, En, S>(
    config: &Configuration,
    ports: Ports<Pa, Gr, Pr, En>,
    solver: S,
    timer: &mut Timer,
) -> Result<SearchReport, PipelineError>
where
    Pa: Parser,
    Gr: Grounder<Pa::Domain, Pa::Problem>,
    Pr: ReachabilityPruner<Gr::Grounded>,
    En: Encoder<Pa::Domain, Pa::Problem, Gr::Grounded>,
    S: SolverInvoker,
{
    config.validate()?;
    let Ports {
        mut parser,
        mut grounder,
        mut pruner,
        encoder,
    } = ports;

    let domain = parser
        .parse_domain(&config.domain_path)
        .map_err(|source| PipelineError::Parse {
            path: config.domain_path.clone(),
            source,
        })?;
    let problem = parser
        .parse_problem(&config.problem_path)
        .map_err(|source| PipelineError::Parse {
            path: config.problem_path.clone(),
            source,
        })?;
    info!(elapsed_secs = timer.elapsed_since_last(), "parsed");

    let grounded = grounder
        .ground(&domain, &problem, config)
        .map_err(PipelineError::Ground)?;
    info!(elapsed_secs = timer.elapsed_since_last(), "grounded");

    let pruned = pruner
        .build(grounded, config)
        .map_err(PipelineError::Prune)?;
    info!(
        elapsed_secs = timer.elapsed_since_last(),
        suggested_lower_bound = ?pruned.suggested_lower_bound,
        "reachability analysis built"
    );

    let bounds = SearchBounds::from_config(config, pruned.suggested_lower_bound);
    let sink = EncodingSink::for_config(config)?;
    let prepared = PreparedEncoder {
        domain: &domain,
        problem: &problem,
        grounded: &pruned.model,
        encoder,
    };
    let report = SearchLoop::new(bounds, config.solve, prepared, solver).run(&sink, timer)?;
    info!(total_secs = report.total_secs, "finished");
    Ok(report)
}
