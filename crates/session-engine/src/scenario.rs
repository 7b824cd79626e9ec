//! Scenario descriptors.
//!
//! One parameterised pipeline serves every mini-game. A descriptor selects
//! the target layout, classifier thresholds, weight table and run bound.

use std::fmt;

use aimforge_common::error::{AimError, AimResult};
use aimforge_scoring_core::targets::FlickRoute;
use aimforge_scoring_core::{
    ClassifierConfig, ScoringMode, SummaryContext, TargetLayout, WeightTable,
};

/// The mini-games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioKind {
    GridShot,
    Flick,
    Tracking,
    Consistency,
    CrosshairPlacement,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 5] = [
        ScenarioKind::GridShot,
        ScenarioKind::Flick,
        ScenarioKind::Tracking,
        ScenarioKind::Consistency,
        ScenarioKind::CrosshairPlacement,
    ];

    /// Identifier used in setup records and submissions.
    pub fn test_type(&self) -> &'static str {
        match self {
            ScenarioKind::GridShot => "grid-shot",
            ScenarioKind::Flick => "flick",
            ScenarioKind::Tracking => "tracking",
            ScenarioKind::Consistency => "consistency",
            ScenarioKind::CrosshairPlacement => "crosshair-placement",
        }
    }

    pub fn from_test_type(test_type: &str) -> AimResult<Self> {
        let normalized = test_type.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.test_type() == normalized)
            .ok_or_else(|| AimError::scenario(format!("Unknown test type: {test_type}")))
    }

    /// Whether the scenario uses the centre/peripheral flick state machine.
    pub fn uses_flick_phases(&self) -> bool {
        matches!(self, ScenarioKind::Flick | ScenarioKind::Consistency)
    }

    pub fn descriptor(&self) -> ScenarioDescriptor {
        ScenarioDescriptor::for_kind(*self)
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.test_type())
    }
}

/// What ends a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunBound {
    /// Fixed duration in milliseconds.
    Duration(f64),
    /// Fixed number of scored attempts, capped by the descriptor's
    /// `max_duration_ms`.
    Attempts(u32),
}

/// Complete parameterisation of one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioDescriptor {
    pub kind: ScenarioKind,
    pub bound: RunBound,
    pub layout: TargetLayout,
    pub classifier: ClassifierConfig,
    pub weights: WeightTable,
    pub mode: ScoringMode,
    /// Average reaction time that scores 100.
    pub reaction_fast_ms: f64,
    /// Average reaction time that scores 0.
    pub reaction_slow_ms: f64,
    pub rate_penalty: f64,
    pub adaptability_scale: f64,
    pub smoothness_floor_px_s: f64,
    /// Hard cap on run length, also for attempt-bounded runs.
    pub max_duration_ms: f64,
}

impl ScenarioDescriptor {
    pub fn for_kind(kind: ScenarioKind) -> Self {
        let classifier = ClassifierConfig::default();
        match kind {
            ScenarioKind::GridShot => Self {
                kind,
                bound: RunBound::Duration(30_000.0),
                layout: TargetLayout::SpawnedStatic {
                    cols: 5,
                    rows: 3,
                    radius: 28.0,
                    lifetime_ms: 1500.0,
                    spawn_interval_ms: 600.0,
                    max_active: 3,
                },
                classifier: ClassifierConfig {
                    correction_floor_px_s: 100.0,
                    ..classifier
                },
                weights: WeightTable::GRID_SHOT,
                mode: ScoringMode::Discrete,
                reaction_fast_ms: 250.0,
                reaction_slow_ms: 1000.0,
                rate_penalty: 2.0,
                adaptability_scale: 10.0,
                smoothness_floor_px_s: 10.0,
                max_duration_ms: 30_000.0,
            },
            ScenarioKind::Flick => Self {
                kind,
                bound: RunBound::Attempts(20),
                layout: TargetLayout::FlickPair {
                    center_radius: 22.0,
                    flick_radius: 18.0,
                    min_distance: 150.0,
                    max_distance: 320.0,
                    lifetime_ms: Some(2000.0),
                    route: FlickRoute::Random,
                },
                classifier: ClassifierConfig {
                    correction_floor_px_s: 120.0,
                    ..classifier
                },
                weights: WeightTable::FLICK,
                mode: ScoringMode::Discrete,
                reaction_fast_ms: 200.0,
                reaction_slow_ms: 800.0,
                rate_penalty: 2.0,
                adaptability_scale: 10.0,
                smoothness_floor_px_s: 10.0,
                max_duration_ms: 60_000.0,
            },
            ScenarioKind::Tracking => Self {
                kind,
                bound: RunBound::Duration(30_000.0),
                layout: TargetLayout::Bouncing {
                    count: 1,
                    radius: 32.0,
                    min_speed_px_s: 120.0,
                    max_speed_px_s: 360.0,
                    redirect_interval_ms: 900.0,
                    redirect_jitter_ms: 300.0,
                    bounce_jitter: 0.15,
                },
                classifier: ClassifierConfig {
                    correction_floor_px_s: 80.0,
                    ..classifier
                },
                weights: WeightTable::TRACKING,
                mode: ScoringMode::Continuous,
                reaction_fast_ms: 200.0,
                reaction_slow_ms: 800.0,
                rate_penalty: 2.0,
                adaptability_scale: 8.0,
                smoothness_floor_px_s: 10.0,
                max_duration_ms: 30_000.0,
            },
            ScenarioKind::Consistency => Self {
                kind,
                bound: RunBound::Attempts(24),
                layout: TargetLayout::FlickPair {
                    center_radius: 22.0,
                    flick_radius: 20.0,
                    min_distance: 200.0,
                    max_distance: 200.0,
                    lifetime_ms: None,
                    route: FlickRoute::Ring { points: 8 },
                },
                classifier: ClassifierConfig {
                    correction_floor_px_s: 100.0,
                    ..classifier
                },
                weights: WeightTable::CONSISTENCY,
                mode: ScoringMode::Discrete,
                reaction_fast_ms: 200.0,
                reaction_slow_ms: 800.0,
                rate_penalty: 2.0,
                adaptability_scale: 10.0,
                smoothness_floor_px_s: 10.0,
                max_duration_ms: 60_000.0,
            },
            ScenarioKind::CrosshairPlacement => Self {
                kind,
                bound: RunBound::Duration(30_000.0),
                layout: TargetLayout::LinearSweep {
                    half_width: 36.0,
                    half_height: 14.0,
                    speed_px_s: 260.0,
                    head_level_ratio: 0.38,
                    margin: 40.0,
                },
                classifier: ClassifierConfig {
                    correction_multiplier: 1.8,
                    correction_floor_px_s: 120.0,
                    ..classifier
                },
                weights: WeightTable::CROSSHAIR_PLACEMENT,
                mode: ScoringMode::Continuous,
                reaction_fast_ms: 200.0,
                reaction_slow_ms: 800.0,
                rate_penalty: 2.0,
                adaptability_scale: 10.0,
                smoothness_floor_px_s: 10.0,
                max_duration_ms: 30_000.0,
            },
        }
    }

    /// Override the length of a duration-bounded run, or the cap of an
    /// attempt-bounded one.
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        let duration_ms = duration_ms.max(0.0);
        if let RunBound::Duration(_) = self.bound {
            self.bound = RunBound::Duration(duration_ms);
        }
        self.max_duration_ms = duration_ms;
        self
    }

    /// Override the attempt count. No effect on duration-bounded runs.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        if let RunBound::Attempts(_) = self.bound {
            self.bound = RunBound::Attempts(attempts.max(1));
        }
        self
    }

    pub fn test_type(&self) -> &'static str {
        self.kind.test_type()
    }

    /// Whether targets are cleared by clicking.
    pub fn requires_click(&self) -> bool {
        self.mode == ScoringMode::Discrete
    }

    /// Time after which the run completes regardless of attempts.
    pub fn duration_ms(&self) -> f64 {
        match self.bound {
            RunBound::Duration(ms) => ms,
            RunBound::Attempts(_) => self.max_duration_ms,
        }
    }

    pub fn attempt_limit(&self) -> Option<u32> {
        match self.bound {
            RunBound::Attempts(n) => Some(n),
            RunBound::Duration(_) => None,
        }
    }

    pub fn summary_context(&self, duration_ms: f64) -> SummaryContext {
        SummaryContext {
            duration_ms,
            mode: self.mode,
            reaction_fast_ms: self.reaction_fast_ms,
            reaction_slow_ms: self.reaction_slow_ms,
            rate_penalty: self.rate_penalty,
            adaptability_scale: self.adaptability_scale,
            smoothness_floor_px_s: self.smoothness_floor_px_s,
        }
    }
}
