use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use miette::{IntoDiagnostic, WrapErr};
use serde::Serialize;

use smtplan_engine::{Configuration, SearchOutcome, SearchReport};

pub(crate) const EXIT_USAGE: u8 = 2;
pub(crate) const EXIT_NO_PLAN: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunStatus {
    PlanFound,
    EncodedOnly,
    NoPlan,
}

impl RunStatus {
    pub(crate) fn from_outcome(outcome: &SearchOutcome) -> Self {
        match outcome {
            SearchOutcome::PlanFound { .. } => RunStatus::PlanFound,
            SearchOutcome::EncodedOnly { .. } => RunStatus::EncodedOnly,
            SearchOutcome::Exhausted { .. } => RunStatus::NoPlan,
        }
    }

    pub(crate) fn exit_code(self) -> u8 {
        match self {
            RunStatus::PlanFound | RunStatus::EncodedOnly => 0,
            RunStatus::NoPlan => EXIT_NO_PLAN,
        }
    }
}

/// Human-readable summary in the order the stages ran.
pub(crate) fn render_text(report: &SearchReport) -> String {
    let mut out = String::new();
    for attempt in &report.attempts {
        let _ = writeln!(
            out,
            "Encoded {}:\t{:.6} seconds",
            attempt.bound, attempt.encode_secs
        );
        if let Some(solve_secs) = attempt.solve_secs {
            let verdict = attempt.verdict.as_deref().unwrap_or("?");
            let _ = writeln!(
                out,
                "Solved {}:\t{:.6} seconds ({verdict})",
                attempt.bound, solve_secs
            );
        }
        if let Some(error) = &attempt.error {
            let _ = writeln!(out, "  solver error: {error}");
        }
    }

    match &report.outcome {
        SearchOutcome::PlanFound { bound, plan, .. } => {
            let _ = writeln!(out, "Plan found in {bound} happenings");
            for happening in &plan.happenings {
                let _ = writeln!(out, "  {happening}");
            }
            for (name, value) in &plan.durations {
                let _ = writeln!(out, "  {name} = {value}");
            }
        }
        SearchOutcome::EncodedOnly { bound } => {
            let _ = writeln!(out, "Encoding for {bound} happenings written; solving skipped");
        }
        SearchOutcome::Exhausted {
            upper_bound: Some(upper),
        } => {
            let _ = writeln!(out, "No plan found in {upper} happenings");
        }
        SearchOutcome::Exhausted { upper_bound: None } => {
            let _ = writeln!(out, "No plan found before the bound overflowed");
        }
    }
    let _ = writeln!(out, "Total time:\t{:.6} seconds", report.total_secs);
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    configuration: &'a Configuration,
    #[serde(flatten)]
    report: &'a SearchReport,
}

pub(crate) fn render_json(config: &Configuration, report: &SearchReport) -> miette::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        configuration: config,
        report,
    })
    .into_diagnostic()
    .wrap_err("failed to serialize search report")
}

pub(crate) fn write_json(
    path: &Path,
    config: &Configuration,
    report: &SearchReport,
) -> miette::Result<()> {
    let json = render_json(config, report)?;
    fs::write(path, json)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to write report to {}", path.display()))
}
