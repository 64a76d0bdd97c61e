//! SMTPlan planning driver.
//!
//! This crate runs planning as satisfiability: the problem is parsed,
//! grounded and optionally pruned once through the [`ports`] interfaces,
//! then the [`search`] loop encodes it for increasing numbers of happenings
//! until the solver finds a satisfying assignment or the upper bound is
//! reached.

pub mod config;
pub mod frontend;
pub mod pipeline;
pub mod ports;
pub mod search;
pub mod sink;
pub mod timer;

pub use config::Configuration;
pub use pipeline::{run_pipeline, PipelineError};
pub use search::{SearchOutcome, SearchReport};
pub use timer::Timer;
