//! Plan extraction from a satisfying model.
//!
//! Encoders name the variable that marks an action starting at a happening
//! with a `sta` fragment, and the variable holding its duration with a
//! `duration` fragment. A plan is the set of start markers assigned `true`
//! together with every duration value.

use serde::Serialize;

use crate::model::{Model, ModelValue};

pub const START_MARKER: &str = "sta";
pub const DURATION_MARKER: &str = "duration";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanSummary {
    /// Start-of-happening variables assigned `true`, in name order.
    pub happenings: Vec<String>,
    pub durations: Vec<(String, f64)>,
}

impl PlanSummary {
    pub fn from_model(model: &Model) -> Self {
        let mut plan = PlanSummary::default();
        for (name, value) in &model.values {
            if name.contains(DURATION_MARKER) {
                if let Some(d) = model.get_real(name) {
                    plan.durations.push((name.clone(), d));
                }
            } else if name.contains(START_MARKER) && *value == ModelValue::Bool(true) {
                plan.happenings.push(name.clone());
            }
        }
        plan
    }

    pub fn is_empty(&self) -> bool {
        self.happenings.is_empty() && self.durations.is_empty()
    }
}
