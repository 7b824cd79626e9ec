//! Per-run results and the submission payload.

use serde::{Deserialize, Serialize};

use crate::setup::SetupRecord;

/// Terminal aggregate for one parameter configuration.
///
/// Created once when a run ends and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Position of the run within its battery.
    pub run_index: usize,

    /// Scenario test type (e.g., "flick").
    pub test_type: String,

    /// Effective DPI and sensitivity for this configuration.
    pub dpi: f64,
    pub sensitivity: f64,

    /// Distance per full turn at this configuration.
    pub inches_per_360: f64,
    pub cm_per_360: f64,

    /// Accuracy/precision percentage.
    pub accuracy: f64,

    /// Timing consistency score.
    pub consistency_score: f64,

    /// Movement smoothness score.
    pub movement_smoothness: f64,

    /// Correction, overshoot and undershoot events per 100 moving samples.
    pub correction_rate: f64,
    pub overshoot_rate: f64,
    pub undershoot_rate: f64,

    /// Mean spawn-to-hit time for discrete targets.
    pub avg_reaction_ms: Option<f64>,

    /// Weighted composite used to rank configurations.
    pub composite_score: f64,

    pub hits: u32,
    pub misses: u32,
    pub time_on_target_ms: f64,
    pub duration_ms: f64,
    pub sample_count: usize,

    /// Wall-clock completion time (ISO 8601).
    pub completed_at: String,

    /// Scenario-specific figures.
    pub detail: ScenarioDetail,
}

/// Figures only meaningful for one scenario family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "scenario",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ScenarioDetail {
    GridShot {
        targets_spawned: u32,
        stray_clicks: u32,
    },
    Flick {
        attempts: u32,
        stray_clicks: u32,
    },
    Tracking {
        target_switches: u32,
        adaptability: f64,
        velocity_matching: f64,
    },
    Consistency {
        attempts: u32,
        stray_clicks: u32,
    },
    CrosshairPlacement {
        reacquisitions: u32,
        avg_reacquisition_ms: f64,
    },
}

/// JSON body for `POST /api/test-result`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSubmission {
    pub user_id: String,
    pub test_type: String,
    pub dpi: f64,
    pub in_game_sensitivity: f64,
    pub inches_per_360: f64,
    pub accuracy_percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reaction_time_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistency_score: Option<f64>,
    pub movement_smoothness: f64,
    pub correction_rate: f64,
    pub overshoot_rate: f64,
    pub undershoot_rate: f64,
    pub optimization_score: f64,
    pub game: String,
    #[serde(flatten)]
    pub detail: ScenarioDetail,
}

impl RunResult {
    /// Build the submission body for this result.
    pub fn to_submission(&self, setup: &SetupRecord) -> TestSubmission {
        TestSubmission {
            user_id: setup.user.clone(),
            test_type: self.test_type.clone(),
            dpi: self.dpi,
            in_game_sensitivity: self.sensitivity,
            inches_per_360: round_to(self.inches_per_360, 2),
            accuracy_percentage: round_to(self.accuracy, 2),
            reaction_time_ms: self.avg_reaction_ms.map(|ms| round_to(ms, 1)),
            consistency_score: Some(round_to(self.consistency_score, 2)),
            movement_smoothness: round_to(self.movement_smoothness, 2),
            correction_rate: round_to(self.correction_rate, 2),
            overshoot_rate: round_to(self.overshoot_rate, 2),
            undershoot_rate: round_to(self.undershoot_rate, 2),
            optimization_score: round_to(self.composite_score, 2),
            game: setup.game.to_string(),
            detail: self.detail.clone(),
        }
    }
}

/// Index of the result with the highest composite score; the first one
/// wins ties. `None` for an empty slice.
pub fn select_best(results: &[RunResult]) -> Option<usize> {
    results
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, r)| match best {
            Some((_, score)) if r.composite_score <= score => best,
            _ => Some((i, r.composite_score)),
        })
        .map(|(i, _)| i)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
