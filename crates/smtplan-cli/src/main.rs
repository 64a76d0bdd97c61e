#![doc = include_str!("../README.md")]

mod cli;
mod report;

use std::io::Write;

use tracing::info;
use tracing_subscriber::EnvFilter;

use smtplan_engine::frontend::{CommandFrontend, DeferredGrounder, SourceParser};
use smtplan_engine::ports::Ports;
use smtplan_engine::{run_pipeline, Configuration, Timer};
use smtplan_solver::{ExternalSolver, SolverCommand};

use crate::cli::UsageError;
use crate::report::{RunStatus, EXIT_USAGE};

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match cli::parse_arguments(std::env::args_os().skip(1)) {
        Ok(config) => config,
        Err(UsageError::HelpRequested) => {
            print!("{}", cli::usage());
            return Ok(());
        }
        Err(err) => {
            eprintln!("{err}\n");
            eprint!("{}", cli::usage());
            std::process::exit(i32::from(EXIT_USAGE));
        }
    };

    let status = run(&config)?;
    match status.exit_code() {
        0 => Ok(()),
        code => std::process::exit(i32::from(code)),
    }
}

fn run(config: &Configuration) -> miette::Result<RunStatus> {
    let mut timer = Timer::start();
    let frontend = CommandFrontend::from_env();
    let solver = ExternalSolver::new(SolverCommand::from_env())
        .with_timeout_secs(config.solver_timeout_secs);
    info!(
        frontend = frontend.program(),
        solver = %solver.command().program,
        lower_bound = config.lower_bound,
        upper_bound = %config.upper_bound_display(),
        step_size = config.step_size,
        "starting search"
    );

    let ports = Ports {
        parser: SourceParser::default(),
        grounder: DeferredGrounder,
        pruner: frontend.clone(),
        encoder: frontend,
    };
    let search = run_pipeline(config, ports, solver, &mut timer)?;

    let text = report::render_text(&search);
    // Keep stdout clean when the encoding itself went there.
    if config.encoding_path.is_none() && !config.solve {
        eprint!("{text}");
    } else {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    if let Some(path) = &config.report_path {
        report::write_json(path, config, &search)?;
        info!(path = %path.display(), "report written");
    }
    Ok(RunStatus::from_outcome(&search.outcome))
}
