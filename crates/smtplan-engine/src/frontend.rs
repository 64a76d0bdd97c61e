//! Port adapters backed by an external front-end program.
//!
//! The front end owns PDDL semantics. It is invoked as
//!
//! ```text
//! <frontend> goal-layer --domain D --problem P
//! <frontend> encode --domain D --problem P --bound N [--prune] [--readable-names]
//! ```
//!
//! `goal-layer` prints the first reachable goal layer (or nothing), `encode`
//! prints the SMT-LIB encoding for bound `N` on stdout.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::config::Configuration;
use crate::ports::{Encoder, Grounder, Parser, PortError, Pruned, ReachabilityPruner};

/// Environment variable naming the front-end program.
pub const FRONTEND_ENV: &str = "SMTPLAN_FRONTEND";
pub const DEFAULT_FRONTEND: &str = "smtplan-encode";

/// Inputs above this size are refused before any processing.
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 16 * 1024 * 1024;

/// A domain or problem file that was read and accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanningSource {
    pub path: PathBuf,
    pub text: String,
}

/// Reads domain and problem files, rejecting unreadable, empty or
/// oversized inputs.
#[derive(Debug, Clone)]
pub struct SourceParser {
    max_input_bytes: u64,
}

impl SourceParser {
    pub fn new(max_input_bytes: u64) -> Self {
        Self { max_input_bytes }
    }

    fn read(&self, path: &Path) -> Result<PlanningSource, PortError> {
        let size = fs::metadata(path)?.len();
        if size > self.max_input_bytes {
            return Err(PortError::Rejected(format!(
                "input file too large: {size} bytes exceeds limit of {} bytes",
                self.max_input_bytes
            )));
        }
        let text = fs::read_to_string(path)?;
        if text.trim().is_empty() {
            return Err(PortError::Rejected("input file is empty".into()));
        }
        Ok(PlanningSource {
            path: path.to_path_buf(),
            text,
        })
    }
}

impl Default for SourceParser {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_INPUT_BYTES)
    }
}

impl Parser for SourceParser {
    type Domain = PlanningSource;
    type Problem = PlanningSource;

    fn parse_domain(&mut self, path: &Path) -> Result<PlanningSource, PortError> {
        self.read(path)
    }

    fn parse_problem(&mut self, path: &Path) -> Result<PlanningSource, PortError> {
        self.read(path)
    }
}

/// What the front end needs to produce encodings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundedSources {
    pub domain_path: PathBuf,
    pub problem_path: PathBuf,
    pub readable_names: bool,
    pub prune: bool,
}

/// Grounding is performed by the front end during encoding; this records
/// the inputs and naming options it will use.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeferredGrounder;

impl Grounder<PlanningSource, PlanningSource> for DeferredGrounder {
    type Grounded = GroundedSources;

    fn ground(
        &mut self,
        domain: &PlanningSource,
        problem: &PlanningSource,
        config: &Configuration,
    ) -> Result<GroundedSources, PortError> {
        Ok(GroundedSources {
            domain_path: domain.path.clone(),
            problem_path: problem.path.clone(),
            readable_names: config.readable_names,
            prune: false,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrontend {
    program: String,
}

impl CommandFrontend {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_env() -> Self {
        match std::env::var(FRONTEND_ENV) {
            Ok(program) if !program.trim().is_empty() => Self::new(program.trim()),
            _ => Self::new(DEFAULT_FRONTEND),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, subcommand: &str, grounded: &GroundedSources) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(subcommand)
            .arg("--domain")
            .arg(&grounded.domain_path)
            .arg("--problem")
            .arg(&grounded.problem_path);
        cmd
    }

    fn spawn_error(&self, source: io::Error) -> PortError {
        PortError::Rejected(format!(
            "failed to start front end `{}`: {source}",
            self.program
        ))
    }
}

impl ReachabilityPruner<GroundedSources> for CommandFrontend {
    fn build(
        &mut self,
        mut grounded: GroundedSources,
        config: &Configuration,
    ) -> Result<Pruned<GroundedSources>, PortError> {
        // Pruning itself happens inside `encode`; only the goal layer is
        // computed up front.
        grounded.prune = config.prune;
        if !config.rpg_lower_bound {
            return Ok(Pruned {
                model: grounded,
                suggested_lower_bound: None,
            });
        }

        let output = self
            .command("goal-layer", &grounded)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;
        if !output.status.success() {
            return Err(PortError::Rejected(format!(
                "reachability analysis failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let suggested_lower_bound = match stdout.trim() {
            "" => None,
            raw => Some(raw.parse::<u64>().map_err(|_| {
                PortError::Rejected(format!("reachability analysis printed `{raw}`, expected a bound"))
            })?),
        };
        debug!(?suggested_lower_bound, "reachability analysis finished");
        Ok(Pruned {
            model: grounded,
            suggested_lower_bound,
        })
    }
}

impl Encoder<PlanningSource, PlanningSource, GroundedSources> for CommandFrontend {
    fn encode(
        &mut self,
        _domain: &PlanningSource,
        _problem: &PlanningSource,
        grounded: &GroundedSources,
        bound: u64,
        out: &mut dyn Write,
    ) -> Result<(), PortError> {
        let mut cmd = self.command("encode", grounded);
        cmd.arg("--bound").arg(bound.to_string());
        if grounded.prune {
            cmd.arg("--prune");
        }
        if grounded.readable_names {
            cmd.arg("--readable-names");
        }

        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;
        let copied = match child.stdout.take() {
            Some(mut stdout) => io::copy(&mut stdout, out),
            None => Ok(0),
        };
        let status = child.wait()?;
        let bytes = copied?;
        if !status.success() {
            return Err(PortError::Rejected(format!(
                "front end `{}` exited with {status} while encoding bound {bound}",
                self.program
            )));
        }
        info!(bound, bytes, "encoding streamed from front end");
        Ok(())
    }
}
