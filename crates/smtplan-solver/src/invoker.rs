use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{parse_model, Model};

/// Environment variable naming the solver program.
pub const SOLVER_ENV: &str = "SMTPLAN_SOLVER";
pub const DEFAULT_SOLVER: &str = "z3";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Classification of one solve attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    /// The encoding is satisfiable; `model` is empty when the solver printed none.
    Found { model: Model },
    /// The solver answered without a satisfying assignment (`unsat`, `unknown`, ...).
    NotFound { verdict: String },
    /// The solver could not be run or produced no usable answer.
    Error(String),
}

impl SolveOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, SolveOutcome::Found { .. })
    }

    /// Short label used in reports and logs.
    pub fn label(&self) -> &str {
        match self {
            SolveOutcome::Found { .. } => "sat",
            SolveOutcome::NotFound { verdict } => verdict,
            SolveOutcome::Error(_) => "error",
        }
    }
}

/// Capability to decide a persisted encoding.
pub trait SolverInvoker {
    fn solve(&mut self, encoding: &Path) -> SolveOutcome;
}

impl<T: SolverInvoker + ?Sized> SolverInvoker for &mut T {
    fn solve(&mut self, encoding: &Path) -> SolveOutcome {
        (**self).solve(encoding)
    }
}

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("failed to start solver `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("solver I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("solver timed out after {secs}s")]
    Timeout { secs: u64 },
    #[error("solver output reader panicked")]
    ReaderPanicked,
}

/// Program plus fixed arguments; the encoding path is appended last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolverCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl SolverCommand {
    /// Default arguments are chosen from the program's file name, so
    /// `/opt/z3/bin/z3` is treated like `z3`.
    pub fn for_program(program: &str) -> Self {
        let stem = Path::new(program)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(program);
        let args: &[&str] = match stem {
            "z3" => &["-smt2"],
            "cvc5" => &["--lang", "smt2", "--produce-models"],
            _ => &[],
        };
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn from_env() -> Self {
        match std::env::var(SOLVER_ENV) {
            Ok(program) if !program.trim().is_empty() => Self::for_program(program.trim()),
            _ => Self::for_program(DEFAULT_SOLVER),
        }
    }
}

/// Captured result of one solver process.
#[derive(Debug, Clone)]
pub struct SolverRun {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Runs an external solver as a blocking subprocess on the encoding file.
#[derive(Debug, Clone)]
pub struct ExternalSolver {
    command: SolverCommand,
    timeout: Option<Duration>,
}

impl ExternalSolver {
    pub fn new(command: SolverCommand) -> Self {
        Self {
            command,
            timeout: None,
        }
    }

    /// A timeout of zero seconds disables the limit.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout = if timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(timeout_secs))
        };
        self
    }

    pub fn command(&self) -> &SolverCommand {
        &self.command
    }

    pub fn run(&self, encoding: &Path) -> Result<SolverRun, SolverError> {
        let mut cmd = Command::new(&self.command.program);
        cmd.args(&self.command.args)
            .arg(encoding)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // A timed solver gets its own process group so wrapper scripts and
        // their children are killed together.
        #[cfg(unix)]
        if self.timeout.is_some() {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        let mut child = cmd
            .spawn()
            .map_err(|source| SolverError::Spawn {
                program: self.command.program.clone(),
                source,
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let status = self.wait(&mut child)?;

        Ok(SolverRun {
            status,
            stdout: join_drain(stdout)?,
            stderr: join_drain(stderr)?,
        })
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, SolverError> {
        let Some(timeout) = self.timeout else {
            return Ok(child.wait()?);
        };
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                warn!(program = %self.command.program, "solver exceeded timeout, killing");
                kill_process_group(child);
                return Err(SolverError::Timeout {
                    secs: timeout.as_secs(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl SolverInvoker for ExternalSolver {
    fn solve(&mut self, encoding: &Path) -> SolveOutcome {
        match self.run(encoding) {
            Ok(run) => classify_run(&run),
            Err(e) => SolveOutcome::Error(e.to_string()),
        }
    }
}

fn kill_process_group(child: &mut Child) {
    #[cfg(unix)]
    if let Ok(pid) = libc::pid_t::try_from(child.id()) {
        // SAFETY: kill(2) only sends a signal; the group id is the child's
        // pid, set by `process_group(0)` at spawn.
        unsafe {
            libc::kill(-pid, libc::SIGKILL);
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<std::io::Result<String>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf)?;
            Ok(String::from_utf8_lossy(&buf).into_owned())
        })
    })
}

fn join_drain(handle: Option<JoinHandle<std::io::Result<String>>>) -> Result<String, SolverError> {
    match handle {
        Some(handle) => Ok(handle.join().map_err(|_| SolverError::ReaderPanicked)??),
        None => Ok(String::new()),
    }
}

/// Classify a finished solver process by its first output token.
///
/// A verdict is trusted even if the exit status is nonzero, since some
/// solvers report errors for trailing commands such as `(get-model)` after
/// `unsat`.
pub fn classify_run(run: &SolverRun) -> SolveOutcome {
    let verdict = run
        .stdout
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_string();
    match verdict.as_str() {
        "sat" => {
            let model = parse_model(&run.stdout).unwrap_or_else(|e| {
                warn!(error = %e, "could not parse solver model");
                Model::default()
            });
            debug!(assignments = model.values.len(), "solver reported sat");
            SolveOutcome::Found { model }
        }
        "unsat" | "unknown" | "timeout" => SolveOutcome::NotFound { verdict },
        _ if !run.status.success() => SolveOutcome::Error(format!(
            "solver exited with {}: {}",
            run.status,
            run.stderr.trim()
        )),
        "" => SolveOutcome::Error("solver produced no output".into()),
        other => SolveOutcome::Error(format!("unrecognised solver verdict `{other}`")),
    }
}
