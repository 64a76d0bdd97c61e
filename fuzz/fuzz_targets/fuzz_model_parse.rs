#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Solver output is untrusted; the model reader must never panic.
        if let Ok(model) = smtplan_solver::model::parse_model(s) {
            let _ = smtplan_solver::PlanSummary::from_model(&model);
        }
    }
});
