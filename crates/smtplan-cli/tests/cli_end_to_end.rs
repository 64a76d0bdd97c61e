//! Full runs against shell-script stand-ins for the front end and solver.
//!
//! Everything runs inside a single test: the scripts are written and then
//! executed, and a concurrent fork from another test thread could still hold
//! them open for writing (ETXTBSY).
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const FRONTEND: &str = r#"#!/bin/sh
cmd=$1
shift
bound=0
while [ $# -gt 0 ]; do
  case $1 in
    --bound) bound=$2; shift 2 ;;
    *) shift ;;
  esac
done
case $cmd in
  goal-layer) echo 2 ;;
  encode) echo "; bound $bound"; echo "(check-sat)" ;;
  *) exit 9 ;;
esac
"#;

const SOLVER: &str = r#"#!/bin/sh
if grep -q "; bound 3" "$1"; then
  echo sat
  echo "((define-fun sta_go_3 () Bool true)"
  echo " (define-fun duration_3 () Real 2.5))"
else
  echo unsat
fi
"#;

struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
    frontend: PathBuf,
    solver: PathBuf,
    domain: PathBuf,
    problem: PathBuf,
}

fn script(path: &Path, body: &str) {
    fs::write(path, body).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();
    let frontend = root.join("frontend.sh");
    let solver = root.join("solver.sh");
    script(&frontend, FRONTEND);
    script(&solver, SOLVER);
    let domain = root.join("domain.pddl");
    let problem = root.join("problem.pddl");
    fs::write(&domain, "(define (domain move))").unwrap();
    fs::write(&problem, "(define (problem one) (:domain move))").unwrap();
    Fixture {
        _dir: dir,
        root,
        frontend,
        solver,
        domain,
        problem,
    }
}

impl Fixture {
    fn run(&self, extra: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_smtplan"))
            .arg(&self.domain)
            .arg(&self.problem)
            .args(extra)
            .env("SMTPLAN_FRONTEND", &self.frontend)
            .env("SMTPLAN_SOLVER", &self.solver)
            .env("RUST_LOG", "warn")
            .output()
            .expect("failed to execute smtplan")
    }

    fn path(&self, name: &str) -> String {
        self.root.join(name).to_string_lossy().into_owned()
    }

    fn report(&self, name: &str) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(self.root.join(name)).unwrap()).unwrap()
    }
}

fn bounds(report: &serde_json::Value) -> Vec<u64> {
    report["attempts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["bound"].as_u64().unwrap())
        .collect()
}

#[test]
fn planning_runs_through_external_programs() {
    let fx = fixture();

    // Deepening finds the plan at bound 3 and keeps the last encoding.
    let out = fx.path("plan.smt2");
    let output = fx.run(&["-u", "5", "-o", &out]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(0), "{stdout}");
    assert!(stdout.contains("Plan found in 3 happenings"), "{stdout}");
    assert!(stdout.contains("sta_go_3"), "{stdout}");
    assert!(stdout.contains("duration_3 = 2.5"), "{stdout}");
    assert!(fs::read_to_string(&out).unwrap().contains("; bound 3"));

    // Exhaustion below the solvable bound.
    let output = fx.run(&["-u", "2"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stdout).contains("No plan found in 2 happenings"));

    // Step size is honoured and recorded in the JSON report.
    let report = fx.path("stepped.json");
    let output = fx.run(&["-l", "2", "-s", "2", "-u", "6", "-j", &report]);
    assert_eq!(output.status.code(), Some(3));
    let json = fx.report("stepped.json");
    assert_eq!(bounds(&json), vec![2, 4, 6]);
    assert_eq!(json["outcome"]["status"], "exhausted");

    // The reachability analysis moves the starting bound.
    let report = fx.path("rpg.json");
    let output = fx.run(&["-r", "-u", "5", "-j", &report]);
    assert_eq!(output.status.code(), Some(0));
    let json = fx.report("rpg.json");
    assert_eq!(bounds(&json), vec![2, 3]);
    assert_eq!(json["outcome"]["status"], "plan_found");
    assert_eq!(json["outcome"]["bound"], 3);

    // Encode-only without an output path leaves only the encoding on stdout.
    let output = fx.run(&["-n", "-l", "4"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "; bound 4\n(check-sat)\n"
    );
    assert!(String::from_utf8_lossy(&output.stderr).contains("solving skipped"));
}
