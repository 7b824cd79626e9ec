//! Pointer sampling and velocity estimation.

use aimforge_run_model::geometry::{Playfield, Point2D};
use aimforge_run_model::sample::{Sample, TimestampMs, VelocitySample};

/// Lower bound on the time between two samples when deriving velocity.
/// Duplicate-timestamp events would otherwise divide by zero.
pub const MIN_TIME_DELTA_MS: f64 = 1.0;

/// Records pointer samples for one run and derives their velocities.
#[derive(Debug, Clone)]
pub struct PointerSampler {
    playfield: Playfield,
    run_start_ms: TimestampMs,
    samples: Vec<Sample>,
    velocities: Vec<VelocitySample>,
}

impl PointerSampler {
    pub fn new(playfield: Playfield, run_start_ms: TimestampMs) -> Self {
        Self {
            playfield,
            run_start_ms,
            samples: Vec::new(),
            velocities: Vec::new(),
        }
    }

    /// Record a pointer move.
    ///
    /// The position is clamped to the playfield. The first sample of a run
    /// has no velocity.
    pub fn on_pointer_move(
        &mut self,
        raw_x: f64,
        raw_y: f64,
        timestamp_ms: TimestampMs,
    ) -> (Sample, Option<VelocitySample>) {
        let timestamp_ms = if timestamp_ms.is_finite() {
            timestamp_ms
        } else {
            self.samples
                .last()
                .map_or(self.run_start_ms, |s| s.timestamp_ms)
        };

        let sample = Sample {
            position: self.playfield.clamp(Point2D::new(raw_x, raw_y)),
            timestamp_ms,
            elapsed_ms: (timestamp_ms - self.run_start_ms).max(0.0),
        };

        let velocity = self
            .samples
            .last()
            .map(|previous| velocity_between(previous, &sample));

        if let Some(v) = velocity {
            self.velocities.push(v);
        }
        self.samples.push(sample);

        (sample, velocity)
    }

    pub fn last_sample(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn last_position(&self) -> Option<Point2D> {
        self.samples.last().map(|s| s.position)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn velocities(&self) -> &[VelocitySample] {
        &self.velocities
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn playfield(&self) -> Playfield {
        self.playfield
    }

    /// Discard all samples and re-anchor to a new run start.
    pub fn reset(&mut self, run_start_ms: TimestampMs) {
        self.run_start_ms = run_start_ms;
        self.samples.clear();
        self.velocities.clear();
    }
}

/// Velocity from `previous` to `next` in pixels per second.
pub fn velocity_between(previous: &Sample, next: &Sample) -> VelocitySample {
    let dt = (next.timestamp_ms - previous.timestamp_ms).max(MIN_TIME_DELTA_MS);
    let distance = previous.position.distance_to(&next.position);
    let velocity = distance / dt * 1000.0;

    VelocitySample {
        velocity_px_s: if velocity.is_finite() { velocity } else { 0.0 },
        timestamp_ms: next.elapsed_ms,
    }
}
