//! Behavioural event classification.
//!
//! Consumes one [`Observation`] per sample (or one hold observation for a
//! frame without pointer movement) together with the frame's authoritative
//! target set, and emits:
//!
//! - dwell ticks while the pointer is inside a target
//! - target switches between two live targets
//! - corrections (sudden velocity change against the recent window)
//! - overshoots (approach then recede past the target)
//! - undershoots (deceleration short of the target)
//!
//! Thresholds live in [`ClassifierConfig`] so each scenario can tune them.

use std::collections::VecDeque;

use aimforge_run_model::event::{ClassifiedEvent, ClassifiedKind, TargetId};
use aimforge_run_model::sample::{Sample, VelocitySample};

use crate::targets::{nearest_of, Target};

/// Named thresholds for event classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierConfig {
    /// Velocity jump, as a multiple of the window mean, that counts as a
    /// correction.
    pub correction_multiplier: f64,
    /// Minimum current velocity (px/s) for a correction.
    pub correction_floor_px_s: f64,
    /// Number of velocity samples in the correction window, current included.
    pub correction_window: usize,
    /// Number of distances kept for overshoot detection.
    pub overshoot_window: usize,
    /// Consecutive approaching steps required before the recede.
    pub overshoot_min_approach_steps: usize,
    /// Final distance must reach `window_min * ratio`.
    pub overshoot_recede_ratio: f64,
    /// Velocity below which an approach counts as stalled (px/s).
    pub undershoot_max_velocity_px_s: f64,
    /// Distance, in target reaches, beyond which a stall is an undershoot.
    pub undershoot_radius_factor: f64,
    /// Lower bound on the target speed used to normalise velocity matching.
    pub velocity_match_floor_px_s: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            correction_multiplier: 1.5,
            correction_floor_px_s: 100.0,
            correction_window: 4,
            overshoot_window: 5,
            overshoot_min_approach_steps: 2,
            overshoot_recede_ratio: 1.3,
            undershoot_max_velocity_px_s: 50.0,
            undershoot_radius_factor: 1.5,
            velocity_match_floor_px_s: 50.0,
        }
    }
}

/// One classifier input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub sample: Sample,
    pub velocity: Option<VelocitySample>,
    /// False for a hold observation synthesised on a frame without movement.
    pub moved: bool,
}

impl Observation {
    pub fn moved(sample: Sample, velocity: Option<VelocitySample>) -> Self {
        Self {
            sample,
            velocity,
            moved: true,
        }
    }

    /// The pointer stayed put; only dwell and on-target tracking apply.
    pub fn hold(sample: Sample) -> Self {
        Self {
            sample,
            velocity: None,
            moved: false,
        }
    }
}

/// Result of classifying one observation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    /// Nearest target whose zone contains the pointer.
    pub on_target: Option<TargetId>,
    /// Nearest active target regardless of containment.
    pub nearest: Option<TargetId>,
    pub events: Vec<ClassifiedEvent>,
    /// Time on target accrued by this observation.
    pub dwell_ms: f64,
    /// Distance gained toward the nearest target since the previous moved
    /// sample on the same target (negative when moving away).
    pub improvement: Option<f64>,
    /// How closely pointer speed matched the on-target target's speed,
    /// in `[0, 1]`.
    pub velocity_match: Option<f64>,
}

/// Stateful per-run classifier.
#[derive(Debug)]
pub struct EventClassifier {
    config: ClassifierConfig,
    last_timestamp_ms: Option<f64>,
    previous_on_target: Option<TargetId>,
    velocities: VecDeque<f64>,
    distances: VecDeque<f64>,
    distance_target: Option<TargetId>,
    switches: u32,
}

impl EventClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            last_timestamp_ms: None,
            previous_on_target: None,
            velocities: VecDeque::with_capacity(config.correction_window),
            distances: VecDeque::with_capacity(config.overshoot_window),
            distance_target: None,
            switches: 0,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Target switches seen so far.
    pub fn switches(&self) -> u32 {
        self.switches
    }

    /// Target the pointer was on at the previous observation.
    pub fn current_target(&self) -> Option<TargetId> {
        self.previous_on_target
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    /// Classify one observation against the frame's targets.
    pub fn observe(&mut self, observation: &Observation, targets: &[Target]) -> Classification {
        let now = observation.sample.timestamp_ms;
        let position = observation.sample.position;

        let on_target = nearest_of(
            targets.iter().filter(|t| t.active && t.contains(&position)),
            &position,
        );
        let nearest = nearest_of(targets.iter().filter(|t| t.active), &position);

        let mut classification = Classification {
            on_target: on_target.map(|t| t.id),
            nearest: nearest.map(|t| t.id),
            ..Classification::default()
        };
        let mut emit = |target: Option<TargetId>, kind: ClassifiedKind| {
            classification
                .events
                .push(ClassifiedEvent::new(now, position, target, kind));
        };

        if let (Some(from), Some(to)) = (self.previous_on_target, classification_on(on_target)) {
            if from != to {
                self.switches += 1;
                emit(Some(to), ClassifiedKind::TargetSwitch { from });
            }
        }
        self.previous_on_target = on_target.map(|t| t.id);

        let mut dwell_ms = 0.0;
        if let (Some(target), Some(last)) = (on_target, self.last_timestamp_ms) {
            dwell_ms = (now - last).max(0.0);
            if dwell_ms > 0.0 {
                emit(Some(target.id), ClassifiedKind::DwellTick { dwell_ms });
            }
        }
        self.last_timestamp_ms = Some(now);

        let mut improvement = None;
        let mut velocity_match = None;

        if observation.moved {
            let velocity = observation.velocity.map(|v| v.velocity_px_s);

            if let Some(v) = velocity {
                push_bounded(&mut self.velocities, v, self.config.correction_window);
                let window: Vec<f64> = self.velocities.iter().copied().collect();
                if let Some(check) = detect_correction(&window, &self.config) {
                    emit(
                        classification_on(nearest),
                        ClassifiedKind::Correction {
                            velocity_px_s: v,
                            delta_px_s: check.delta_px_s,
                            window_mean_px_s: check.window_mean_px_s,
                        },
                    );
                }
            }

            match nearest {
                Some(target) => {
                    let distance = target.distance_to(&position);
                    if self.distance_target != Some(target.id) {
                        self.distances.clear();
                        self.distance_target = Some(target.id);
                    }
                    let previous = self.distances.back().copied();
                    push_bounded(&mut self.distances, distance, self.config.overshoot_window);
                    improvement = previous.map(|p| p - distance);

                    let window: Vec<f64> = self.distances.iter().copied().collect();
                    if let Some(window_min) = detect_overshoot(&window, &self.config) {
                        emit(
                            Some(target.id),
                            ClassifiedKind::Overshoot {
                                distance,
                                window_min,
                            },
                        );
                    }

                    if let (Some(v), Some(previous)) = (velocity, previous) {
                        let stalled = v < self.config.undershoot_max_velocity_px_s;
                        let approaching = previous > distance;
                        let short = distance
                            > self.config.undershoot_radius_factor * target.shape.reach();
                        if stalled && approaching && short {
                            emit(
                                Some(target.id),
                                ClassifiedKind::Undershoot {
                                    distance,
                                    velocity_px_s: v,
                                },
                            );
                        }
                    }
                }
                None => {
                    self.distances.clear();
                    self.distance_target = None;
                }
            }

            if let (Some(target), Some(v)) = (on_target, velocity) {
                velocity_match = Some(velocity_match_ratio(
                    v,
                    target.speed_px_s(),
                    self.config.velocity_match_floor_px_s,
                ));
            }
        }

        classification.dwell_ms = dwell_ms;
        classification.improvement = improvement;
        classification.velocity_match = velocity_match;

        tracing::trace!(
            t = now,
            on_target = ?classification.on_target,
            events = classification.events.len(),
            "Observation classified"
        );

        classification
    }
}

fn classification_on(target: Option<&Target>) -> Option<TargetId> {
    target.map(|t| t.id)
}

fn push_bounded(window: &mut VecDeque<f64>, value: f64, capacity: usize) {
    window.push_back(value);
    while window.len() > capacity.max(1) {
        window.pop_front();
    }
}

/// Measurements behind a detected correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionCheck {
    pub delta_px_s: f64,
    pub window_mean_px_s: f64,
}

/// Correction test over a velocity history whose last value is the current
/// sample.
///
/// Uses the last `correction_window` values (current included). Fires when
/// `|current - previous| > multiplier * mean` and `current > floor`.
pub fn detect_correction(velocities: &[f64], config: &ClassifierConfig) -> Option<CorrectionCheck> {
    let size = config.correction_window.max(2);
    if velocities.len() < size {
        return None;
    }

    let window = &velocities[velocities.len() - size..];
    let mean = window.iter().sum::<f64>() / size as f64;
    let current = window[size - 1];
    let previous = window[size - 2];
    let delta = (current - previous).abs();

    if delta > config.correction_multiplier * mean && current > config.correction_floor_px_s {
        Some(CorrectionCheck {
            delta_px_s: delta,
            window_mean_px_s: mean,
        })
    } else {
        None
    }
}

/// Overshoot test over a distance history whose last value is the current
/// sample. Returns the window minimum when it fires.
///
/// Requires a receding final step, at least `overshoot_min_approach_steps`
/// consecutive approaching steps right before it, and a final distance of at
/// least `window_min * overshoot_recede_ratio`.
pub fn detect_overshoot(distances: &[f64], config: &ClassifierConfig) -> Option<f64> {
    let approach_steps = config.overshoot_min_approach_steps.max(1);
    let start = distances.len().saturating_sub(config.overshoot_window.max(approach_steps + 2));
    let window = &distances[start..];
    let n = window.len();
    if n < approach_steps + 2 {
        return None;
    }

    let last = window[n - 1];
    if last <= window[n - 2] {
        return None;
    }

    let approaching = (1..n - 1)
        .rev()
        .take_while(|&i| window[i] < window[i - 1])
        .count();
    if approaching < approach_steps {
        return None;
    }

    let window_min = window.iter().copied().fold(f64::INFINITY, f64::min);
    (last >= window_min * config.overshoot_recede_ratio).then_some(window_min)
}

/// `max(0, 1 - |pointer - target| / max(target, floor))`.
pub fn velocity_match_ratio(pointer_px_s: f64, target_px_s: f64, floor_px_s: f64) -> f64 {
    let scale = target_px_s.max(floor_px_s).max(f64::EPSILON);
    let ratio = 1.0 - (pointer_px_s - target_px_s).abs() / scale;
    if ratio.is_finite() {
        ratio.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimforge_run_model::frame::TargetShape;
    use aimforge_run_model::geometry::Point2D;

    fn sample(t: f64, x: f64, y: f64) -> Sample {
        Sample {
            position: Point2D::new(x, y),
            timestamp_ms: t,
            elapsed_ms: t,
        }
    }

    fn moved(t: f64, x: f64, v: f64) -> Observation {
        Observation::moved(
            sample(t, x, 100.0),
            Some(VelocitySample {
                velocity_px_s: v,
                timestamp_ms: t,
            }),
        )
    }

    fn circle(id: u64, x: f64, radius: f64) -> Target {
        Target::stationary(
            TargetId(id),
            Point2D::new(x, 100.0),
            TargetShape::Circle { radius },
        )
    }

    #[test]
    fn test_correction_boundaries() {
        let config = ClassifierConfig::default();
        assert!(detect_correction(&[100.0, 105.0, 98.0, 260.0], &config).is_none());

        let fired = detect_correction(&[100.0, 105.0, 98.0, 360.0], &config).unwrap();
        assert!((fired.delta_px_s - 262.0).abs() < 1e-9);
        assert!((fired.window_mean_px_s - 165.75).abs() < 1e-9);

        let looser = ClassifierConfig {
            correction_multiplier: 1.3,
            ..config
        };
        assert!(detect_correction(&[100.0, 105.0, 98.0, 300.0], &looser).is_some());
    }

    #[test]
    fn test_correction_needs_full_window_and_floor() {
        let config = ClassifierConfig::default();
        assert!(detect_correction(&[10.0, 400.0], &config).is_none());

        // Large relative jump, but current speed below the floor.
        let slow = ClassifierConfig {
            correction_floor_px_s: 120.0,
            ..config
        };
        assert!(detect_correction(&[5.0, 5.0, 5.0, 110.0], &slow).is_none());
        assert!(detect_correction(&[5.0, 5.0, 5.0, 130.0], &slow).is_some());
    }

    #[test]
    fn test_overshoot_sequences() {
        let config = ClassifierConfig::default();
        assert_eq!(detect_overshoot(&[50.0, 40.0, 30.0, 45.0], &config), Some(30.0));
        assert_eq!(detect_overshoot(&[50.0, 40.0, 35.0, 33.0], &config), None);
        // Recede too small: 38 < 30 * 1.3.
        assert_eq!(detect_overshoot(&[50.0, 40.0, 30.0, 38.0], &config), None);
        // Only one approaching step before the recede.
        assert_eq!(detect_overshoot(&[40.0, 45.0, 30.0, 60.0], &config), None);
        assert_eq!(detect_overshoot(&[50.0, 40.0, 30.0, 40.0], &config), Some(30.0));
    }

    #[test]
    fn test_overshoot_uses_last_window_only() {
        let config = ClassifierConfig::default();
        // The early 5 falls outside the 5-wide window.
        let distances = [5.0, 80.0, 70.0, 60.0, 50.0, 60.0];
        assert_eq!(detect_overshoot(&distances, &config), None);
        let distances = [5.0, 80.0, 70.0, 60.0, 50.0, 66.0];
        assert_eq!(detect_overshoot(&distances, &config), Some(50.0));
    }

    #[test]
    fn test_switch_counting_ignores_null_transitions() {
        let a = circle(1, 100.0, 20.0);
        let b = circle(2, 300.0, 20.0);
        let targets = [a, b];
        let mut classifier = EventClassifier::new(ClassifierConfig::default());

        // [null, A, A, B, null, B]
        let xs = [200.0, 100.0, 105.0, 300.0, 200.0, 300.0];
        let mut switch_events = 0;
        for (i, x) in xs.iter().enumerate() {
            let c = classifier.observe(&Observation::hold(sample(i as f64 * 10.0, *x, 100.0)), &targets);
            switch_events += c.events.iter().filter(|e| e.is_switch()).count();
        }
        assert_eq!(switch_events, 1);
        assert_eq!(classifier.switches(), 1);
    }

    #[test]
    fn test_dwell_integrates_irregular_intervals() {
        let targets = [circle(1, 100.0, 20.0)];
        let mut classifier = EventClassifier::new(ClassifierConfig::default());

        let mut total = 0.0;
        for (t, x) in [(0.0, 300.0), (7.0, 100.0), (40.0, 100.0), (45.0, 300.0), (90.0, 101.0)] {
            total += classifier
                .observe(&Observation::hold(sample(t, x, 100.0)), &targets)
                .dwell_ms;
        }
        // 7 + 33 + 45
        assert!((total - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_overlap_resolves_to_nearest_target() {
        let targets = [circle(1, 100.0, 60.0), circle(2, 140.0, 60.0)];
        let mut classifier = EventClassifier::new(ClassifierConfig::default());
        let c = classifier.observe(&Observation::hold(sample(0.0, 130.0, 100.0)), &targets);
        assert_eq!(c.on_target, Some(TargetId(2)));
    }

    #[test]
    fn test_overshoot_fires_on_fourth_moved_sample() {
        let targets = [circle(1, 0.0, 5.0)];
        let mut classifier = EventClassifier::new(ClassifierConfig::default());

        let mut fired_at = Vec::new();
        for (i, x) in [50.0, 40.0, 30.0, 45.0].iter().enumerate() {
            let c = classifier.observe(&moved(i as f64 * 16.0, *x, 600.0), &targets);
            if c.events.iter().any(|e| e.is_overshoot()) {
                fired_at.push(i);
            }
        }
        assert_eq!(fired_at, vec![3]);
    }

    #[test]
    fn test_hold_observations_do_not_feed_windows() {
        let targets = [circle(1, 0.0, 5.0)];
        let mut classifier = EventClassifier::new(ClassifierConfig::default());
        classifier.observe(&moved(0.0, 50.0, 600.0), &targets);
        classifier.observe(&moved(16.0, 40.0, 600.0), &targets);
        classifier.observe(&Observation::hold(sample(32.0, 40.0, 100.0)), &targets);
        classifier.observe(&Observation::hold(sample(48.0, 40.0, 100.0)), &targets);
        classifier.observe(&moved(64.0, 30.0, 600.0), &targets);
        let c = classifier.observe(&moved(80.0, 45.0, 600.0), &targets);
        assert!(c.events.iter().any(|e| e.is_overshoot()));
    }

    #[test]
    fn test_distance_window_resets_on_nearest_change() {
        let targets = [circle(1, 0.0, 5.0), circle(2, 200.0, 5.0)];
        let mut classifier = EventClassifier::new(ClassifierConfig::default());
        // Approach target 1, then cross the midpoint so target 2 is nearest.
        for (i, x) in [50.0, 40.0, 30.0].iter().enumerate() {
            classifier.observe(&moved(i as f64 * 16.0, *x, 600.0), &targets);
        }
        let c = classifier.observe(&moved(48.0, 150.0, 600.0), &targets);
        assert_eq!(c.nearest, Some(TargetId(2)));
        assert!(c.improvement.is_none());
        assert!(!c.events.iter().any(|e| e.is_overshoot()));
    }

    #[test]
    fn test_undershoot_requires_slow_approach_outside_reach() {
        let targets = [circle(1, 0.0, 20.0)];
        let mut classifier = EventClassifier::new(ClassifierConfig::default());
        classifier.observe(&moved(0.0, 100.0, 400.0), &targets);

        let c = classifier.observe(&moved(16.0, 90.0, 30.0), &targets);
        assert!(c.events.iter().any(|e| e.is_undershoot()));
        assert_eq!(c.improvement, Some(10.0));

        // Inside 1.5 reaches: no undershoot.
        let c = classifier.observe(&moved(32.0, 25.0, 30.0), &targets);
        assert!(!c.events.iter().any(|e| e.is_undershoot()));

        // Moving away slowly: no undershoot.
        let c = classifier.observe(&moved(48.0, 80.0, 30.0), &targets);
        assert!(!c.events.iter().any(|e| e.is_undershoot()));
    }

    #[test]
    fn test_velocity_match_ratio() {
        assert_eq!(velocity_match_ratio(200.0, 200.0, 50.0), 1.0);
        assert!((velocity_match_ratio(150.0, 200.0, 50.0) - 0.75).abs() < 1e-9);
        assert_eq!(velocity_match_ratio(600.0, 200.0, 50.0), 0.0);
        // Stationary target: normalised by the floor.
        assert!((velocity_match_ratio(25.0, 0.0, 50.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_match_only_on_target() {
        let moving = circle(1, 100.0, 30.0).with_velocity(Point2D::new(200.0, 0.0));
        let targets = [moving];
        let mut classifier = EventClassifier::new(ClassifierConfig::default());
        let c = classifier.observe(&moved(0.0, 110.0, 150.0), &targets);
        assert!((c.velocity_match.unwrap() - 0.75).abs() < 1e-9);
        let c = classifier.observe(&moved(16.0, 400.0, 150.0), &targets);
        assert!(c.velocity_match.is_none());
    }
}
