//! External SMT solver integration for SMTPlan.
//!
//! The search loop only sees the [`invoker::SolverInvoker`] capability:
//! hand it the location of a persisted encoding, get back a
//! [`invoker::SolveOutcome`]. [`invoker::ExternalSolver`] is the concrete
//! subprocess-backed implementation; [`model`] and [`plan`] turn a
//! satisfying assignment into a readable plan.

pub mod invoker;
pub mod model;
pub mod plan;

pub use invoker::{ExternalSolver, SolveOutcome, SolverCommand, SolverInvoker};
pub use model::{Model, ModelValue};
pub use plan::PlanSummary;
