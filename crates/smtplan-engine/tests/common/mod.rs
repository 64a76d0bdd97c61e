#![allow(dead_code)]

use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use smtplan_engine::config::Configuration;
use smtplan_engine::ports::{Encoder, Grounder, Parser, PortError, Ports, Pruned, ReachabilityPruner};
use smtplan_solver::{SolveOutcome, SolverInvoker};

/// Shared record of which pipeline stages ran, in order.
pub type Journal = Rc<RefCell<Vec<String>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

pub struct FakeParser {
    pub journal: Journal,
    pub fail_on: Option<PathBuf>,
}

impl Parser for FakeParser {
    type Domain = String;
    type Problem = String;

    fn parse_domain(&mut self, path: &Path) -> Result<String, PortError> {
        self.parse("domain", path)
    }

    fn parse_problem(&mut self, path: &Path) -> Result<String, PortError> {
        self.parse("problem", path)
    }
}

impl FakeParser {
    fn parse(&mut self, what: &str, path: &Path) -> Result<String, PortError> {
        self.journal.borrow_mut().push(format!("parse {what}"));
        if self.fail_on.as_deref() == Some(path) {
            return Err(PortError::Rejected(format!("syntax error in {what}")));
        }
        Ok(path.display().to_string())
    }
}

pub struct FakeGrounder {
    pub journal: Journal,
}

impl Grounder<String, String> for FakeGrounder {
    type Grounded = Vec<String>;

    fn ground(
        &mut self,
        domain: &String,
        problem: &String,
        _config: &Configuration,
    ) -> Result<Vec<String>, PortError> {
        self.journal.borrow_mut().push("ground".into());
        Ok(vec![domain.clone(), problem.clone()])
    }
}

pub struct FakePruner {
    pub journal: Journal,
    pub goal_layer: Option<u64>,
}

impl ReachabilityPruner<Vec<String>> for FakePruner {
    fn build(
        &mut self,
        grounded: Vec<String>,
        _config: &Configuration,
    ) -> Result<Pruned<Vec<String>>, PortError> {
        self.journal.borrow_mut().push("prune".into());
        Ok(Pruned {
            model: grounded,
            suggested_lower_bound: self.goal_layer,
        })
    }
}

/// Writes `; bound N` so the fake solver can read the bound back.
pub struct FakeEncoder {
    pub journal: Journal,
}

impl Encoder<String, String, Vec<String>> for FakeEncoder {
    fn encode(
        &mut self,
        _domain: &String,
        _problem: &String,
        grounded: &Vec<String>,
        bound: u64,
        out: &mut dyn Write,
    ) -> Result<(), PortError> {
        self.journal.borrow_mut().push(format!("encode {bound}"));
        writeln!(out, "; bound {bound}")?;
        writeln!(out, "; inputs {}", grounded.join(" "))?;
        Ok(())
    }
}

/// Satisfiable from `solvable_at` on.
pub struct FakeSolver {
    pub journal: Journal,
    pub solvable_at: Option<u64>,
}

impl SolverInvoker for FakeSolver {
    fn solve(&mut self, encoding: &Path) -> SolveOutcome {
        let text = std::fs::read_to_string(encoding).expect("encoding should be persisted");
        let bound: u64 = text
            .lines()
            .next()
            .and_then(|l| l.strip_prefix("; bound "))
            .and_then(|b| b.parse().ok())
            .expect("encoding should start with its bound");
        self.journal.borrow_mut().push(format!("solve {bound}"));
        match self.solvable_at {
            Some(at) if bound >= at => {
                let out = format!("sat\n((define-fun sta_act_{bound} () Bool true))");
                SolveOutcome::Found {
                    model: smtplan_solver::model::parse_model(&out).unwrap_or_default(),
                }
            }
            _ => SolveOutcome::NotFound {
                verdict: "unsat".into(),
            },
        }
    }
}

pub fn fake_ports(
    journal: &Journal,
    goal_layer: Option<u64>,
) -> Ports<FakeParser, FakeGrounder, FakePruner, FakeEncoder> {
    Ports {
        parser: FakeParser {
            journal: journal.clone(),
            fail_on: None,
        },
        grounder: FakeGrounder {
            journal: journal.clone(),
        },
        pruner: FakePruner {
            journal: journal.clone(),
            goal_layer,
        },
        encoder: FakeEncoder {
            journal: journal.clone(),
        },
    }
}

pub fn fake_solver(journal: &Journal, solvable_at: Option<u64>) -> FakeSolver {
    FakeSolver {
        journal: journal.clone(),
        solvable_at,
    }
}

/// Stages recorded with the given prefix, e.g. every `solve N` entry.
pub fn stages(journal: &Journal, prefix: &str) -> Vec<u64> {
    journal
        .borrow()
        .iter()
        .filter_map(|entry| entry.strip_prefix(prefix))
        .filter_map(|rest| rest.trim().parse().ok())
        .collect()
}

pub fn config_in(dir: &Path) -> Configuration {
    Configuration {
        encoding_path: Some(dir.join("encoding.smt2")),
        ..Configuration::new("domain.pddl", "problem.pddl")
    }
}
