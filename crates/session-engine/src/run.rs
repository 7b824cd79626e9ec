//! A single scenario run.
//!
//! [`Run`] owns everything one configuration needs: the frame driver, the
//! pointer sampler, the target field, the classifier and the aggregator.
//! Nothing is shared across runs; starting over means building a new value.
//!
//! Each [`Run::step`] processes one frame in a fixed order:
//!
//! 1. sample the frame's pointer moves
//! 2. resolve clicks against the targets the player saw
//! 3. advance target motion, expire and spawn targets
//! 4. classify the frame's samples against the updated targets
//! 5. tick the frame driver
//! 6. build the readout

use std::path::{Path, PathBuf};

use aimforge_common::clock::{DriverState, FrameDriver};
use aimforge_common::error::AimResult;
use aimforge_input_tracker::writer::TelemetryWriter;
use aimforge_input_tracker::{FrameInput, PointerSampler};
use aimforge_run_model::conversion::{cm_per_360, inches_per_360};
use aimforge_run_model::event::{ClassifiedEvent, ClassifiedKind, MissCause, TargetId};
use aimforge_run_model::frame::FrameView;
use aimforge_run_model::geometry::{Playfield, Point2D};
use aimforge_run_model::result::{RunResult, ScenarioDetail};
use aimforge_run_model::sample::{InputEvent, Sample, SampleStreamHeader};
use aimforge_run_model::setup::SetupRecord;
use aimforge_scoring_core::{
    EventClassifier, MetricAggregator, MetricSummary, Observation, TargetField, TargetRole,
};

use crate::scenario::{ScenarioDescriptor, ScenarioKind};

/// Telemetry schema version written to export headers.
pub const TELEMETRY_SCHEMA_VERSION: &str = "1.0";

/// Parameters of one battery configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunConfiguration {
    pub index: usize,
    /// Effective DPI (base times multiplier).
    pub dpi: f64,
    /// Effective in-game sensitivity (base times multiplier).
    pub sensitivity: f64,
    pub dpi_multiplier: f64,
    pub sensitivity_multiplier: f64,
    pub counts_per_360: f64,
}

impl RunConfiguration {
    pub fn from_setup(
        index: usize,
        setup: &SetupRecord,
        dpi_multiplier: f64,
        sensitivity_multiplier: f64,
    ) -> Self {
        Self {
            index,
            dpi: setup.dpi * dpi_multiplier,
            sensitivity: setup.sensitivity * sensitivity_multiplier,
            dpi_multiplier,
            sensitivity_multiplier,
            counts_per_360: setup.game.counts_per_360(),
        }
    }

    /// Pointer gain relative to the base setup.
    pub fn gain(&self) -> f64 {
        self.dpi_multiplier * self.sensitivity_multiplier
    }

    pub fn inches_per_360(&self) -> f64 {
        inches_per_360(self.dpi, self.sensitivity, self.counts_per_360)
    }

    pub fn cm_per_360(&self) -> f64 {
        cm_per_360(self.dpi, self.sensitivity, self.counts_per_360)
    }
}

/// State machine for flick-style scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlickPhase {
    /// The centre target is up; clicking it presents the next flick.
    WaitingForCenter,
    /// A peripheral target is up.
    WaitingForFlick,
    /// The attempt bound has been reached.
    Complete,
}

/// One timed or attempt-bounded execution of a scenario.
pub struct Run {
    descriptor: ScenarioDescriptor,
    configuration: RunConfiguration,
    playfield: Playfield,
    driver: FrameDriver,
    sampler: PointerSampler,
    field: TargetField,
    classifier: EventClassifier,
    aggregator: MetricAggregator,
    events: Vec<ClassifiedEvent>,
    phase: Option<FlickPhase>,
    attempts: u32,
    pointer: Point2D,
    on_target: Option<TargetId>,
    view: FrameView,
    result: Option<RunResult>,
}

impl Run {
    pub fn new(
        descriptor: ScenarioDescriptor,
        configuration: RunConfiguration,
        playfield: Playfield,
        seed: u64,
    ) -> Self {
        let field = TargetField::new(descriptor.layout.clone(), playfield, seed);
        let classifier = EventClassifier::new(descriptor.classifier);
        let phase = descriptor
            .kind
            .uses_flick_phases()
            .then_some(FlickPhase::WaitingForCenter);

        Self {
            view: FrameView::idle(configuration.index, playfield),
            descriptor,
            configuration,
            playfield,
            driver: FrameDriver::new(),
            sampler: PointerSampler::new(playfield, 0.0),
            field,
            classifier,
            aggregator: MetricAggregator::new(),
            events: Vec::new(),
            phase,
            attempts: 0,
            pointer: playfield.center(),
            on_target: None,
            result: None,
        }
    }

    /// Begin the run at `now_ms`. Has no effect once started.
    pub fn start(&mut self, now_ms: f64) -> FrameView {
        if self.driver.state() != DriverState::Idle {
            return self.view.clone();
        }

        self.driver.start(self.descriptor.duration_ms(), now_ms);
        self.sampler.reset(now_ms);
        self.field.start(now_ms);
        self.sync_spawns();

        tracing::info!(
            scenario = %self.descriptor.kind,
            run = self.configuration.index,
            dpi = self.configuration.dpi,
            sensitivity = self.configuration.sensitivity,
            duration_ms = self.descriptor.duration_ms(),
            "Run started"
        );

        self.view = self.readout(now_ms);
        self.view.clone()
    }

    /// Process one frame of input at `now_ms` and return the readout.
    ///
    /// Once the run is no longer running this returns the last readout
    /// unchanged.
    pub fn step(&mut self, now_ms: f64, input: FrameInput) -> FrameView {
        if !self.driver.is_running() {
            return self.view.clone();
        }

        let mut observations = Vec::with_capacity(input.moves.len().max(1));
        for event in &input.moves {
            if let InputEvent::PointerMove { x, y, timestamp_ms } = *event {
                let timestamp_ms = timestamp_ms.min(now_ms);
                let (sample, velocity) = self.sampler.on_pointer_move(x, y, timestamp_ms);
                self.pointer = sample.position;
                observations.push(Observation::moved(sample, velocity));
            }
        }

        for event in &input.clicks {
            if let InputEvent::Click {
                x, y, timestamp_ms, ..
            } = *event
            {
                let at = if timestamp_ms.is_finite() {
                    timestamp_ms.min(now_ms)
                } else {
                    now_ms
                };
                let point = self.playfield.clamp(Point2D::new(x, y));
                self.resolve_click(point, at, now_ms);
            }
        }

        if self.driver.is_running() {
            for expired in self.field.update(now_ms) {
                self.record_miss(
                    expired.id,
                    expired.role,
                    expired.position,
                    now_ms,
                    MissCause::Expired,
                );
                if expired.role == TargetRole::Peripheral {
                    self.finish_attempt(now_ms);
                }
            }
            self.sync_spawns();
        }

        if observations.is_empty() {
            observations.push(Observation::hold(Sample {
                position: self.pointer,
                timestamp_ms: now_ms,
                elapsed_ms: self.driver.elapsed_ms(now_ms),
            }));
        }
        for observation in &observations {
            let classification = self.classifier.observe(observation, self.field.targets());
            self.aggregator.record(observation, &classification);
            self.on_target = classification.on_target;
            self.events.extend(classification.events);
        }

        if let Some(tick) = self.driver.tick(now_ms) {
            if tick.completed {
                tracing::info!(
                    run = self.configuration.index,
                    frames = tick.frame,
                    "Run duration elapsed"
                );
            }
        }

        self.view = self.readout(now_ms);
        self.view.clone()
    }

    /// Timer path for the terminal transition. Returns true if this call
    /// completed the run.
    pub fn expire(&mut self, now_ms: f64) -> bool {
        let completed = self.driver.complete(now_ms);
        if completed {
            tracing::info!(run = self.configuration.index, "Run deadline reached");
            self.view = self.readout(now_ms);
        }
        completed
    }

    /// Halt the run. Safe to call any number of times, including after
    /// completion.
    pub fn stop(&mut self) {
        if self.driver.is_running() {
            tracing::info!(run = self.configuration.index, "Run stopped");
        }
        self.driver.stop();
        self.view.completed = true;
    }

    fn resolve_click(&mut self, point: Point2D, at_ms: f64, now_ms: f64) {
        if !self.descriptor.requires_click() {
            return;
        }

        let Some(target) = self.field.nearest_containing(&point) else {
            self.aggregator.record_stray_click();
            tracing::trace!(x = point.x, y = point.y, "Click outside every target");
            return;
        };
        let (id, role, spawn_ms) = (target.id, target.role, target.spawn_ms);

        match (self.phase, role) {
            (None, _) => self.record_hit(id, point, at_ms, spawn_ms),
            (Some(FlickPhase::WaitingForCenter), TargetRole::Center) => {
                self.field.remove(id);
                if self.field.spawn_flick(now_ms).is_some() {
                    self.phase = Some(FlickPhase::WaitingForFlick);
                }
            }
            (Some(FlickPhase::WaitingForFlick), TargetRole::Peripheral) => {
                self.record_hit(id, point, at_ms, spawn_ms);
                self.finish_attempt(now_ms);
            }
            _ => {}
        }
        self.sync_spawns();
    }

    fn record_hit(&mut self, id: TargetId, point: Point2D, at_ms: f64, spawn_ms: f64) {
        self.field.remove(id);
        let reaction_ms = (at_ms - spawn_ms).max(0.0);
        self.aggregator.record_hit(reaction_ms);
        self.events.push(ClassifiedEvent::new(
            at_ms,
            point,
            Some(id),
            ClassifiedKind::Hit { reaction_ms },
        ));
        tracing::debug!(target_id = %id, reaction_ms, "Target hit");
    }

    fn record_miss(
        &mut self,
        id: TargetId,
        role: TargetRole,
        position: Point2D,
        now_ms: f64,
        cause: MissCause,
    ) {
        if role == TargetRole::Center {
            return;
        }
        self.aggregator.record_miss();
        self.events.push(ClassifiedEvent::new(
            now_ms,
            position,
            Some(id),
            ClassifiedKind::Miss { cause },
        ));
        tracing::debug!(target_id = %id, ?cause, "Target missed");
    }

    /// Close a flick attempt and either present the centre again or complete.
    fn finish_attempt(&mut self, now_ms: f64) {
        self.attempts += 1;
        let limit = self.descriptor.attempt_limit().unwrap_or(u32::MAX);
        if self.attempts >= limit {
            self.phase = Some(FlickPhase::Complete);
            if self.driver.complete(now_ms) {
                tracing::info!(
                    run = self.configuration.index,
                    attempts = self.attempts,
                    "Attempt bound reached"
                );
            }
        } else {
            self.field.spawn_center(now_ms);
            self.phase = Some(FlickPhase::WaitingForCenter);
        }
    }

    /// Keep the aggregator's spawn count in line with scored targets.
    fn sync_spawns(&mut self) {
        let scored = if self.phase.is_some() {
            self.attempts
                + u32::from(
                    self.field
                        .targets()
                        .iter()
                        .any(|t| t.role == TargetRole::Peripheral),
                )
        } else {
            self.field.spawned_count()
        };
        self.aggregator.set_spawned(scored);
    }

    fn readout(&self, now_ms: f64) -> FrameView {
        let elapsed_ms = self.driver.elapsed_ms(now_ms);
        let remaining_ms = (self.driver.deadline_ms() - now_ms).max(0.0);
        let objective = match self.phase {
            Some(_) => self.field.targets().first().map(|t| t.id),
            None => None,
        };

        FrameView {
            run_index: self.configuration.index,
            now_ms,
            elapsed_ms,
            remaining_ms,
            playfield: self.playfield,
            targets: self.field.views(),
            objective,
            requires_click: self.descriptor.requires_click(),
            on_target: self.on_target,
            hits: self.aggregator.hits(),
            live_accuracy: self.aggregator.live_accuracy(elapsed_ms, self.descriptor.mode),
            completed: !self.driver.is_running(),
        }
    }

    /// Reduce the run into its result. Stops the run if it is still going;
    /// targets still up count as misses. Later calls return the same result.
    pub fn finish(&mut self, now_ms: f64) -> RunResult {
        if let Some(result) = &self.result {
            return result.clone();
        }
        self.stop();

        let end_ms = self.driver.completed_at_ms().unwrap_or(now_ms);
        if self.descriptor.requires_click() {
            for target in self.field.clear() {
                self.record_miss(
                    target.id,
                    target.role,
                    target.position,
                    end_ms,
                    MissCause::RunEnded,
                );
            }
        }

        let duration_ms = (end_ms - self.driver.start_ms()).max(0.0);
        let summary = self.aggregator.finish(
            &self.descriptor.summary_context(duration_ms),
            self.sampler.velocities(),
        );
        let composite_score = self.descriptor.weights.composite(&summary);

        let result = RunResult {
            run_index: self.configuration.index,
            test_type: self.descriptor.test_type().to_string(),
            dpi: self.configuration.dpi,
            sensitivity: self.configuration.sensitivity,
            inches_per_360: self.configuration.inches_per_360(),
            cm_per_360: self.configuration.cm_per_360(),
            accuracy: summary.accuracy,
            consistency_score: summary.consistency_score,
            movement_smoothness: summary.movement_smoothness,
            correction_rate: summary.correction_rate,
            overshoot_rate: summary.overshoot_rate,
            undershoot_rate: summary.undershoot_rate,
            avg_reaction_ms: summary.avg_reaction_ms,
            composite_score,
            hits: summary.hits,
            misses: summary.misses,
            time_on_target_ms: summary.time_on_target_ms,
            duration_ms,
            sample_count: self.sampler.len(),
            completed_at: chrono::Utc::now().to_rfc3339(),
            detail: self.detail(&summary),
        };

        tracing::info!(
            run = result.run_index,
            composite = result.composite_score,
            accuracy = result.accuracy,
            hits = result.hits,
            misses = result.misses,
            samples = result.sample_count,
            "Run finished"
        );

        self.result = Some(result.clone());
        result
    }

    fn detail(&self, summary: &MetricSummary) -> ScenarioDetail {
        match self.descriptor.kind {
            ScenarioKind::GridShot => ScenarioDetail::GridShot {
                targets_spawned: summary.spawned,
                stray_clicks: summary.stray_clicks,
            },
            ScenarioKind::Flick => ScenarioDetail::Flick {
                attempts: self.attempts,
                stray_clicks: summary.stray_clicks,
            },
            ScenarioKind::Tracking => ScenarioDetail::Tracking {
                target_switches: summary.switches,
                adaptability: summary.adaptability,
                velocity_matching: summary.velocity_matching,
            },
            ScenarioKind::Consistency => ScenarioDetail::Consistency {
                attempts: self.attempts,
                stray_clicks: summary.stray_clicks,
            },
            ScenarioKind::CrosshairPlacement => ScenarioDetail::CrosshairPlacement {
                reacquisitions: summary.reacquisitions,
                avg_reacquisition_ms: summary.avg_reacquisition_ms.unwrap_or(0.0),
            },
        }
    }

    /// Write the sample stream and the classified events as two JSONL files
    /// under `dir`. Returns the sample file path.
    pub fn write_telemetry(&self, dir: &Path, started_at: &str) -> AimResult<PathBuf> {
        let header = SampleStreamHeader {
            schema_version: TELEMETRY_SCHEMA_VERSION.to_string(),
            test_type: self.descriptor.test_type().to_string(),
            run_index: self.configuration.index,
            started_at: started_at.to_string(),
            playfield: self.playfield,
            dpi: self.configuration.dpi,
            sensitivity: self.configuration.sensitivity,
        };

        let stem = format!("{}-run-{}", self.descriptor.test_type(), self.configuration.index);
        let samples_path = dir.join(format!("{stem}.samples.jsonl"));
        let mut samples = TelemetryWriter::new(&samples_path, &header)?;
        samples.write_samples(self.sampler.samples())?;
        samples.flush()?;

        let mut events = TelemetryWriter::new(dir.join(format!("{stem}.events.jsonl")), &header)?;
        events.write_events(&self.events)?;
        events.flush()?;

        tracing::debug!(
            path = %samples_path.display(),
            samples = samples.records_written(),
            events = events.records_written(),
            "Telemetry written"
        );
        Ok(samples_path)
    }

    pub fn descriptor(&self) -> &ScenarioDescriptor {
        &self.descriptor
    }

    pub fn configuration(&self) -> &RunConfiguration {
        &self.configuration
    }

    pub fn state(&self) -> DriverState {
        self.driver.state()
    }

    pub fn is_running(&self) -> bool {
        self.driver.is_running()
    }

    /// Clock time at which the duration bound expires.
    pub fn deadline_ms(&self) -> f64 {
        self.driver.deadline_ms()
    }

    pub fn phase(&self) -> Option<FlickPhase> {
        self.phase
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn frames(&self) -> u64 {
        self.driver.frames()
    }

    pub fn view(&self) -> &FrameView {
        &self.view
    }

    pub fn samples(&self) -> &[Sample] {
        self.sampler.samples()
    }

    pub fn events(&self) -> &[ClassifiedEvent] {
        &self.events
    }

    pub fn targets(&self) -> &TargetField {
        &self.field
    }
}
