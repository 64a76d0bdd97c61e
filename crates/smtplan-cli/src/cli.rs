//! Flag registry and argument parsing.
//!
//! Every recognised option is one entry in [`ARGUMENTS`]. The clap command
//! that renders the usage text and the token walk in [`parse_arguments`]
//! both read that slice, so a declared flag is always reachable.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, Command};
use miette::Diagnostic;
use thiserror::Error;

use smtplan_engine::config::{ConfigError, Configuration};

const ABOUT: &str = "Temporal planning as SMT: iterative deepening over the number of happenings";
const EXAMPLE: &str = "Example: smtplan domain.pddl problem.pddl -l 4 -u 10 -s 2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArgKind {
    Help,
    Switch,
    /// Consumes the next token; the payload names it in the usage text.
    Value(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ArgumentSpec {
    pub(crate) flag: char,
    pub(crate) id: &'static str,
    pub(crate) kind: ArgKind,
    pub(crate) help: &'static str,
}

impl ArgumentSpec {
    pub(crate) fn name(&self) -> String {
        format!("-{}", self.flag)
    }

    fn to_arg(self) -> Arg {
        let arg = Arg::new(self.id).short(self.flag).help(self.help);
        match self.kind {
            ArgKind::Help => arg.action(ArgAction::Help),
            ArgKind::Switch => arg.action(ArgAction::SetTrue),
            ArgKind::Value(value_name) => arg
                .action(ArgAction::Set)
                .value_name(value_name)
                .num_args(1)
                .allow_negative_numbers(true),
        }
    }
}

pub(crate) const ARGUMENTS: &[ArgumentSpec] = &[
    ArgumentSpec {
        flag: 'h',
        id: "help",
        kind: ArgKind::Help,
        help: "Print this and exit.",
    },
    ArgumentSpec {
        flag: 'p',
        id: "prune",
        kind: ArgKind::Switch,
        help: "Use the RPG reachability analysis to prune variables.",
    },
    ArgumentSpec {
        flag: 'l',
        id: "lower-bound",
        kind: ArgKind::Value("number"),
        help: "Begin iterative deepening at an encoding with l happenings (default 1).",
    },
    ArgumentSpec {
        flag: 'r',
        id: "rpg-lower-bound",
        kind: ArgKind::Switch,
        help: "Use the RPG reachability analysis to determine the starting bound on happenings.",
    },
    ArgumentSpec {
        flag: 'u',
        id: "upper-bound",
        kind: ArgKind::Value("number"),
        help: "Run iterative deepening until u is reached. Set -1 for unlimited (default -1).",
    },
    ArgumentSpec {
        flag: 's',
        id: "step-size",
        kind: ArgKind::Value("number"),
        help: "Iteratively deepen with a step size of s (default 1).",
    },
    ArgumentSpec {
        flag: 'o',
        id: "output",
        kind: ArgKind::Value("path"),
        help: "Save encodings to file in smt2 format (default: standard output).",
    },
    ArgumentSpec {
        flag: 'n',
        id: "no-solve",
        kind: ArgKind::Switch,
        help: "Do not solve. Generate encoding and exit.",
    },
    ArgumentSpec {
        flag: 'e',
        id: "readable-names",
        kind: ArgKind::Switch,
        help: "Use human readable variable names in the SMT encoding.",
    },
    ArgumentSpec {
        flag: 't',
        id: "solver-timeout",
        kind: ArgKind::Value("seconds"),
        help: "Kill the solver after t seconds per bound; 0 disables (default 0).",
    },
    ArgumentSpec {
        flag: 'j',
        id: "report",
        kind: ArgKind::Value("path"),
        help: "Write a JSON search report to path.",
    },
];

pub(crate) fn command() -> Command {
    let cmd = Command::new("smtplan")
        .about(ABOUT)
        .override_usage("smtplan <domain> <problem> [options]")
        .after_help(EXAMPLE)
        .disable_help_flag(true)
        .arg(
            Arg::new("domain")
                .value_name("domain")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("PDDL domain file"),
        )
        .arg(
            Arg::new("problem")
                .value_name("problem")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("PDDL problem file"),
        );
    ARGUMENTS
        .iter()
        .fold(cmd, |cmd, spec| cmd.arg(spec.to_arg()))
}

pub(crate) fn usage() -> String {
    command().render_help().to_string()
}

#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub(crate) enum UsageError {
    #[error("help requested")]
    #[diagnostic(code(smtplan::usage::help))]
    HelpRequested,
    #[error("Unrecognised argument: {0}")]
    #[diagnostic(code(smtplan::usage::unrecognized))]
    Unrecognized(String),
    #[error("Expected value for option {0}")]
    #[diagnostic(code(smtplan::usage::missing_value))]
    MissingValue(String),
    #[error("Expected a domain file and a problem file")]
    #[diagnostic(code(smtplan::usage::missing_positional))]
    MissingPositional,
    #[error("Invalid value `{value}` for option {flag}: {reason}")]
    #[diagnostic(code(smtplan::usage::invalid_value))]
    InvalidValue {
        flag: String,
        value: String,
        reason: String,
    },
    #[error(transparent)]
    #[diagnostic(code(smtplan::usage::config))]
    Config(#[from] ConfigError),
}

/// Parse the tokens following the program name into a [`Configuration`].
///
/// The first two tokens are the domain and problem paths. Every later token
/// must be exactly one registered flag, optionally followed by its value;
/// grouped (`-np`) or attached (`-l4`) forms are not flags.
pub(crate) fn parse_arguments<I, T>(tokens: I) -> Result<Configuration, UsageError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut tokens = tokens.into_iter().map(Into::into);
    let domain = positional(tokens.next())?;
    let problem = positional(tokens.next())?;
    let mut config = Configuration::new(domain, problem);

    while let Some(token) = tokens.next() {
        let spec = lookup(&token)
            .ok_or_else(|| UsageError::Unrecognized(token.to_string_lossy().into_owned()))?;
        match spec.kind {
            ArgKind::Help => return Err(UsageError::HelpRequested),
            ArgKind::Switch => apply_switch(&mut config, spec),
            ArgKind::Value(_) => {
                let value = tokens
                    .next()
                    .ok_or_else(|| UsageError::MissingValue(spec.name()))?;
                apply_value(&mut config, spec, &value)?;
            }
        }
    }

    config.validate()?;
    Ok(config)
}

fn lookup(token: &OsStr) -> Option<&'static ArgumentSpec> {
    let token = token.to_str()?;
    ARGUMENTS.iter().find(|spec| spec.name() == token)
}

/// A registered flag in a path slot means a path is missing, except `-h`.
fn positional(token: Option<OsString>) -> Result<PathBuf, UsageError> {
    let token = token.ok_or(UsageError::MissingPositional)?;
    match lookup(&token) {
        Some(spec) if spec.kind == ArgKind::Help => Err(UsageError::HelpRequested),
        Some(_) => Err(UsageError::MissingPositional),
        None => Ok(PathBuf::from(token)),
    }
}

fn apply_switch(config: &mut Configuration, spec: &ArgumentSpec) {
    match spec.flag {
        'p' => config.prune = true,
        'r' => config.rpg_lower_bound = true,
        'n' => config.solve = false,
        'e' => config.readable_names = true,
        _ => {}
    }
}

fn apply_value(
    config: &mut Configuration,
    spec: &ArgumentSpec,
    value: &OsStr,
) -> Result<(), UsageError> {
    match spec.flag {
        'l' => config.lower_bound = number(spec, value)?,
        'u' => {
            let upper: i64 = number(spec, value)?;
            config.upper_bound = u64::try_from(upper).ok();
        }
        's' => config.step_size = number(spec, value)?,
        't' => config.solver_timeout_secs = number(spec, value)?,
        'o' => config.encoding_path = optional_path(value),
        'j' => config.report_path = optional_path(value),
        _ => {}
    }
    Ok(())
}

fn optional_path(value: &OsStr) -> Option<PathBuf> {
    (!value.is_empty()).then(|| PathBuf::from(value))
}

fn number<T>(spec: &ArgumentSpec, raw: &OsStr) -> Result<T, UsageError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let invalid = |reason: String| UsageError::InvalidValue {
        flag: spec.name(),
        value: raw.to_string_lossy().into_owned(),
        reason,
    };
    let text = raw.to_str().ok_or_else(|| invalid("not valid UTF-8".into()))?;
    text.trim()
        .parse::<T>()
        .map_err(|e| invalid(e.to_string()))
}
