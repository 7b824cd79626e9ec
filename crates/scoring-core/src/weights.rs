//! Named composite-score weight tables.
//!
//! Each scenario ranks its configurations by a fixed weighted sum of
//! [`MetricSummary`] factors. The tables are static configuration rather than
//! inline constants so they can be listed and tested.

use std::fmt;

use crate::metrics::{clamp_score, MetricSummary};

/// A metric that can contribute to a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreFactor {
    Accuracy,
    Consistency,
    Smoothness,
    Adaptability,
    VelocityMatching,
    ReactionSpeed,
    /// `100 - overshoot_rate * penalty`
    OvershootControl,
    /// `100 - correction_rate * penalty`
    CorrectionControl,
}

impl fmt::Display for ScoreFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScoreFactor::Accuracy => "accuracy",
            ScoreFactor::Consistency => "consistency",
            ScoreFactor::Smoothness => "smoothness",
            ScoreFactor::Adaptability => "adaptability",
            ScoreFactor::VelocityMatching => "velocity matching",
            ScoreFactor::ReactionSpeed => "reaction speed",
            ScoreFactor::OvershootControl => "overshoot control",
            ScoreFactor::CorrectionControl => "correction control",
        };
        f.write_str(name)
    }
}

/// A named set of `(factor, weight)` terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightTable {
    pub name: &'static str,
    pub terms: &'static [(ScoreFactor, f64)],
}

impl WeightTable {
    pub const TRACKING: WeightTable = WeightTable {
        name: "tracking",
        terms: &[
            (ScoreFactor::Accuracy, 0.35),
            (ScoreFactor::Smoothness, 0.25),
            (ScoreFactor::Adaptability, 0.25),
            (ScoreFactor::VelocityMatching, 0.15),
        ],
    };

    pub const CROSSHAIR_PLACEMENT: WeightTable = WeightTable {
        name: "crosshair-placement",
        terms: &[
            (ScoreFactor::Accuracy, 0.40),
            (ScoreFactor::Smoothness, 0.30),
            (ScoreFactor::Consistency, 0.20),
            (ScoreFactor::CorrectionControl, 0.10),
        ],
    };

    pub const FLICK: WeightTable = WeightTable {
        name: "flick",
        terms: &[
            (ScoreFactor::Accuracy, 0.35),
            (ScoreFactor::ReactionSpeed, 0.25),
            (ScoreFactor::Consistency, 0.20),
            (ScoreFactor::OvershootControl, 0.20),
        ],
    };

    pub const GRID_SHOT: WeightTable = WeightTable {
        name: "grid-shot",
        terms: &[
            (ScoreFactor::Accuracy, 0.50),
            (ScoreFactor::ReactionSpeed, 0.30),
            (ScoreFactor::Consistency, 0.20),
        ],
    };

    pub const CONSISTENCY: WeightTable = WeightTable {
        name: "consistency",
        terms: &[
            (ScoreFactor::Consistency, 0.40),
            (ScoreFactor::Accuracy, 0.30),
            (ScoreFactor::Smoothness, 0.20),
            (ScoreFactor::CorrectionControl, 0.10),
        ],
    };

    pub const ALL: [WeightTable; 5] = [
        Self::GRID_SHOT,
        Self::FLICK,
        Self::TRACKING,
        Self::CONSISTENCY,
        Self::CROSSHAIR_PLACEMENT,
    ];

    /// Weighted sum of the summary's factors, clamped to `[0, 100]`.
    pub fn composite(&self, summary: &MetricSummary) -> f64 {
        let total = self
            .terms
            .iter()
            .map(|(factor, weight)| summary.factor(*factor) * weight)
            .sum::<f64>();
        clamp_score(total)
    }

    pub fn total_weight(&self) -> f64 {
        self.terms.iter().map(|(_, w)| w).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_sum_to_one() {
        for table in WeightTable::ALL {
            assert!(
                (table.total_weight() - 1.0).abs() < 1e-9,
                "{} sums to {}",
                table.name,
                table.total_weight()
            );
        }
    }

    #[test]
    fn test_tracking_composite() {
        let summary = MetricSummary {
            accuracy: 80.0,
            movement_smoothness: 60.0,
            adaptability: 40.0,
            velocity_matching: 100.0,
            // Not part of the tracking table.
            reaction_speed: 100.0,
            ..MetricSummary::default()
        };
        let expected = 80.0 * 0.35 + 60.0 * 0.25 + 40.0 * 0.25 + 100.0 * 0.15;
        assert!((WeightTable::TRACKING.composite(&summary) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_perfect_summary_scores_hundred() {
        let summary = MetricSummary {
            accuracy: 100.0,
            consistency_score: 100.0,
            movement_smoothness: 100.0,
            adaptability: 100.0,
            velocity_matching: 100.0,
            reaction_speed: 100.0,
            correction_control: 100.0,
            overshoot_control: 100.0,
            ..MetricSummary::default()
        };
        for table in WeightTable::ALL {
            assert!((table.composite(&summary) - 100.0).abs() < 1e-9);
        }
    }
}
