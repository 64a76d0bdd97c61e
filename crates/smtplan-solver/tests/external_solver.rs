//! Subprocess tests: run shell-script stand-ins for a real solver.
//!
//! These only need `/bin/sh`, so they run without z3 or cvc5 installed.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use smtplan_solver::{ExternalSolver, SolveOutcome, SolverCommand, SolverInvoker};

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("{body}\n")).unwrap();
    path
}

// Run scripts through `sh` rather than executing them directly, which can
// fail with ETXTBSY while other test threads are forking.
fn solver_for(script: &Path) -> ExternalSolver {
    ExternalSolver::new(SolverCommand {
        program: "sh".into(),
        args: vec![script.to_str().unwrap().to_string()],
    })
}

#[test]
fn script_receives_encoding_path_and_reports_model() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "solver.sh",
        "if grep -q 'bound 3' \"$1\"; then\n\
         echo sat\n\
         echo '((define-fun sta_go_0 () Bool true) (define-fun duration_go_0 () Real 1.0))'\n\
         else echo unsat; fi",
    );
    let encoding = dir.path().join("enc.smt2");

    fs::write(&encoding, "; bound 2\n").unwrap();
    let mut solver = solver_for(&script);
    assert_eq!(
        solver.solve(&encoding),
        SolveOutcome::NotFound {
            verdict: "unsat".into()
        }
    );

    fs::write(&encoding, "; bound 3\n").unwrap();
    match solver.solve(&encoding) {
        SolveOutcome::Found { model } => {
            assert_eq!(model.get_bool("sta_go_0"), Some(true));
            assert_eq!(model.get_real("duration_go_0"), Some(1.0));
        }
        other => panic!("expected a model, got {other:?}"),
    }
}

#[test]
fn nonzero_exit_without_verdict_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "broken.sh", "echo 'boom' >&2\nexit 3");
    let outcome = solver_for(&script).solve(&dir.path().join("enc.smt2"));
    match outcome {
        SolveOutcome::Error(msg) => assert!(msg.contains("boom"), "{msg}"),
        other => panic!("expected error, got {other:?}"),
    }
}

#[test]
fn hung_solver_is_killed_after_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "hang.sh", "exec sleep 30");
    let mut solver = solver_for(&script).with_timeout_secs(1);

    let started = Instant::now();
    let outcome = solver.solve(&dir.path().join("enc.smt2"));
    assert!(started.elapsed().as_secs() < 20, "timeout was not enforced");
    match outcome {
        SolveOutcome::Error(msg) => assert!(msg.contains("timed out"), "{msg}"),
        other => panic!("expected timeout error, got {other:?}"),
    }
}

#[test]
fn timeout_also_kills_processes_started_by_the_solver() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("survived");
    let script = write_script(
        dir.path(),
        "wrapper.sh",
        &format!(
            "(sleep 3; echo late > '{}') &\nwait",
            marker.display()
        ),
    );
    let mut solver = solver_for(&script).with_timeout_secs(1);

    let started = Instant::now();
    let outcome = solver.solve(&dir.path().join("enc.smt2"));
    assert!(
        started.elapsed().as_secs() < 3,
        "solver output readers waited for the background process"
    );
    assert!(matches!(outcome, SolveOutcome::Error(msg) if msg.contains("timed out")));

    std::thread::sleep(std::time::Duration::from_secs(4));
    assert!(!marker.exists(), "background process outlived the timeout");
}
