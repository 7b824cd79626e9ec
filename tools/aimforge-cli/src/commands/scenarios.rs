//! List the available scenarios.

use aimforge_session_engine::{RunBound, ScenarioKind};

pub fn run() -> anyhow::Result<()> {
    for kind in ScenarioKind::ALL {
        let descriptor = kind.descriptor();
        let bound = match descriptor.bound {
            RunBound::Duration(ms) => format!("{:.0}s", ms / 1000.0),
            RunBound::Attempts(n) => {
                format!("{n} attempts (max {:.0}s)", descriptor.max_duration_ms / 1000.0)
            }
        };
        println!("{:<20} {:<24} {:?}", kind.test_type(), bound, descriptor.mode);

        let weights: Vec<String> = descriptor
            .weights
            .terms
            .iter()
            .map(|(factor, weight)| format!("{factor} {weight:.2}"))
            .collect();
        println!("{:<20} {}", "", weights.join(", "));
    }
    Ok(())
}
