//! Per-run metric reduction.
//!
//! [`MetricAggregator`] accumulates tallies while a run is in progress and
//! reduces them once, at run end, into a [`MetricSummary`]. Every score is a
//! finite value in `[0, 100]`; empty inputs and zero denominators yield 0.

use aimforge_run_model::event::ClassifiedKind;
use aimforge_run_model::sample::VelocitySample;

use crate::classifier::{Classification, Observation};
use crate::weights::ScoreFactor;

/// Clamp a score into `[0, 100]`. Non-finite values become 0.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// `numerator / denominator * 100`, clamped; 0 for a zero denominator.
pub fn ratio_percent(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 && denominator.is_finite() {
        clamp_score(numerator / denominator * 100.0)
    } else {
        0.0
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    m.is_finite().then_some(m)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    let sd = variance.sqrt();
    sd.is_finite().then_some(sd)
}

/// Minimum number of data points for a consistency score.
pub const MIN_CONSISTENCY_POINTS: usize = 5;

/// `max(0, 100 - stddev / mean * 100)` over reaction or movement times.
///
/// Fewer than [`MIN_CONSISTENCY_POINTS`] values, or a non-positive mean,
/// scores 0.
pub fn consistency_score(times_ms: &[f64]) -> f64 {
    if times_ms.len() < MIN_CONSISTENCY_POINTS {
        return 0.0;
    }
    match (mean(times_ms), std_dev(times_ms)) {
        (Some(m), Some(sd)) if m > 0.0 => clamp_score(100.0 - sd / m * 100.0),
        _ => 0.0,
    }
}

/// Movement smoothness over sliding 3-sample velocity windows.
///
/// Each window whose average speed exceeds `noise_floor_px_s` scores
/// `max(0, 1 - |dv| / avg)`, where `|dv|` is the mean absolute change
/// between consecutive samples in the window. The result is the average
/// window score times 100, or 0 when no window qualifies.
pub fn movement_smoothness(velocities: &[f64], noise_floor_px_s: f64) -> f64 {
    let scores: Vec<f64> = velocities
        .windows(3)
        .filter_map(|w| {
            let avg = (w[0] + w[1] + w[2]) / 3.0;
            if avg.is_nan() || avg <= noise_floor_px_s {
                return None;
            }
            let dv = ((w[1] - w[0]).abs() + (w[2] - w[1]).abs()) / 2.0;
            Some((1.0 - dv / avg).max(0.0))
        })
        .collect();

    mean(&scores).map_or(0.0, |m| clamp_score(m * 100.0))
}

/// Linear map of an average reaction time from `[fast, slow]` onto
/// `[100, 0]`.
pub fn reaction_speed_score(avg_reaction_ms: Option<f64>, fast_ms: f64, slow_ms: f64) -> f64 {
    let Some(avg) = avg_reaction_ms else {
        return 0.0;
    };
    if slow_ms <= fast_ms {
        return if avg <= fast_ms { 100.0 } else { 0.0 };
    }
    clamp_score((slow_ms - avg) / (slow_ms - fast_ms) * 100.0)
}

/// `max(0, 100 - rate * penalty)` for an event rate in percent.
pub fn control_score(rate: f64, penalty: f64) -> f64 {
    clamp_score(100.0 - rate * penalty)
}

/// How accuracy is measured for a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    /// Click-cleared targets: hits over targets spawned.
    Discrete,
    /// Continuously present targets: time on target over run duration.
    Continuous,
}

/// Scenario parameters the final reduction needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryContext {
    pub duration_ms: f64,
    pub mode: ScoringMode,
    pub reaction_fast_ms: f64,
    pub reaction_slow_ms: f64,
    /// Points of control score lost per percent of event rate.
    pub rate_penalty: f64,
    /// Adaptability points per pixel of average improvement.
    pub adaptability_scale: f64,
    pub smoothness_floor_px_s: f64,
}

/// Reduced metrics of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSummary {
    pub accuracy: f64,
    pub consistency_score: f64,
    pub movement_smoothness: f64,
    pub adaptability: f64,
    pub velocity_matching: f64,
    pub reaction_speed: f64,
    pub correction_rate: f64,
    pub overshoot_rate: f64,
    pub undershoot_rate: f64,
    pub correction_control: f64,
    pub overshoot_control: f64,
    pub avg_reaction_ms: Option<f64>,
    pub avg_reacquisition_ms: Option<f64>,
    pub hits: u32,
    pub misses: u32,
    pub spawned: u32,
    pub stray_clicks: u32,
    pub switches: u32,
    pub reacquisitions: u32,
    pub corrections: u32,
    pub overshoots: u32,
    pub undershoots: u32,
    pub moving_samples: u32,
    pub time_on_target_ms: f64,
}

impl MetricSummary {
    /// Value of one weighted factor, in `[0, 100]`.
    pub fn factor(&self, factor: ScoreFactor) -> f64 {
        match factor {
            ScoreFactor::Accuracy => self.accuracy,
            ScoreFactor::Consistency => self.consistency_score,
            ScoreFactor::Smoothness => self.movement_smoothness,
            ScoreFactor::Adaptability => self.adaptability,
            ScoreFactor::VelocityMatching => self.velocity_matching,
            ScoreFactor::ReactionSpeed => self.reaction_speed,
            ScoreFactor::OvershootControl => self.overshoot_control,
            ScoreFactor::CorrectionControl => self.correction_control,
        }
    }
}

/// Running tallies for one run.
#[derive(Debug, Default)]
pub struct MetricAggregator {
    hits: u32,
    misses: u32,
    spawned: u32,
    stray_clicks: u32,
    switches: u32,
    corrections: u32,
    overshoots: u32,
    undershoots: u32,
    moving_samples: u32,
    time_on_target_ms: f64,
    reaction_times: Vec<f64>,
    reacquisition_times: Vec<f64>,
    improvements: Vec<f64>,
    velocity_matches: Vec<f64>,
    acquired: bool,
    off_target_since: Option<f64>,
}

impl MetricAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one classified observation into the tallies.
    pub fn record(&mut self, observation: &Observation, classification: &Classification) {
        let now = observation.sample.timestamp_ms;

        if observation.moved && observation.velocity.is_some() {
            self.moving_samples += 1;
        }
        if classification.dwell_ms.is_finite() {
            self.time_on_target_ms += classification.dwell_ms.max(0.0);
        }

        for event in &classification.events {
            match event.kind {
                ClassifiedKind::TargetSwitch { .. } => self.switches += 1,
                ClassifiedKind::Correction { .. } => self.corrections += 1,
                ClassifiedKind::Overshoot { .. } => self.overshoots += 1,
                ClassifiedKind::Undershoot { .. } => self.undershoots += 1,
                _ => {}
            }
        }

        if let Some(improvement) = classification.improvement.filter(|i| i.is_finite()) {
            self.improvements.push(improvement.max(0.0));
        }
        if let Some(ratio) = classification.velocity_match.filter(|r| r.is_finite()) {
            self.velocity_matches.push(ratio);
        }

        match classification.on_target {
            Some(_) => {
                if let Some(since) = self.off_target_since.take() {
                    self.reacquisition_times.push((now - since).max(0.0));
                }
                self.acquired = true;
            }
            None => {
                if self.acquired && self.off_target_since.is_none() {
                    self.off_target_since = Some(now);
                }
            }
        }
    }

    /// A target was clicked `reaction_ms` after it appeared.
    pub fn record_hit(&mut self, reaction_ms: f64) {
        self.hits += 1;
        if reaction_ms.is_finite() && reaction_ms >= 0.0 {
            self.reaction_times.push(reaction_ms);
        }
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// A click that landed outside every active zone.
    pub fn record_stray_click(&mut self) {
        self.stray_clicks += 1;
    }

    /// Total scored targets spawned so far.
    pub fn set_spawned(&mut self, spawned: u32) {
        self.spawned = spawned;
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn time_on_target_ms(&self) -> f64 {
        self.time_on_target_ms
    }

    /// Accuracy so far, for the live readout.
    pub fn live_accuracy(&self, elapsed_ms: f64, mode: ScoringMode) -> f64 {
        match mode {
            ScoringMode::Continuous => ratio_percent(self.time_on_target_ms, elapsed_ms),
            ScoringMode::Discrete => ratio_percent(self.hits as f64, self.spawned as f64),
        }
    }

    /// Reduce the tallies and the run's velocity stream into final metrics.
    pub fn finish(&self, context: &SummaryContext, velocities: &[VelocitySample]) -> MetricSummary {
        let accuracy = match context.mode {
            ScoringMode::Continuous => ratio_percent(self.time_on_target_ms, context.duration_ms),
            ScoringMode::Discrete => ratio_percent(self.hits as f64, self.spawned as f64),
        };

        let timing = match context.mode {
            ScoringMode::Discrete => &self.reaction_times,
            ScoringMode::Continuous => &self.reacquisition_times,
        };

        let speeds: Vec<f64> = velocities.iter().map(|v| v.velocity_px_s).collect();
        let moving = self.moving_samples as f64;
        let correction_rate = ratio_percent(self.corrections as f64, moving);
        let overshoot_rate = ratio_percent(self.overshoots as f64, moving);
        let undershoot_rate = ratio_percent(self.undershoots as f64, moving);

        let avg_reaction_ms = mean(&self.reaction_times);

        MetricSummary {
            accuracy,
            consistency_score: consistency_score(timing),
            movement_smoothness: movement_smoothness(&speeds, context.smoothness_floor_px_s),
            adaptability: mean(&self.improvements)
                .map_or(0.0, |m| clamp_score(m * context.adaptability_scale)),
            velocity_matching: mean(&self.velocity_matches).map_or(0.0, |m| clamp_score(m * 100.0)),
            reaction_speed: reaction_speed_score(
                avg_reaction_ms,
                context.reaction_fast_ms,
                context.reaction_slow_ms,
            ),
            correction_rate,
            overshoot_rate,
            undershoot_rate,
            correction_control: control_score(correction_rate, context.rate_penalty),
            overshoot_control: control_score(overshoot_rate, context.rate_penalty),
            avg_reaction_ms,
            avg_reacquisition_ms: mean(&self.reacquisition_times),
            hits: self.hits,
            misses: self.misses,
            spawned: self.spawned,
            stray_clicks: self.stray_clicks,
            switches: self.switches,
            reacquisitions: self.reacquisition_times.len() as u32,
            corrections: self.corrections,
            overshoots: self.overshoots,
            undershoots: self.undershoots,
            moving_samples: self.moving_samples,
            time_on_target_ms: self.time_on_target_ms,
        }
    }
}
