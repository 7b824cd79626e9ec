//! Battery orchestration.
//!
//! A battery runs one scenario once per configuration, strictly one after
//! another: countdown, timed frame loop, aggregation, submission, pause.
//! Nothing from a finished run's timers outlives it. After the last
//! configuration the best result is selected by composite score.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use aimforge_common::clock::{FramePacer, SessionClock};
use aimforge_common::config::BatteryDefaults;
use aimforge_common::error::{AimError, AimResult};
use aimforge_input_tracker::{InputQueue, PointerSource, RunContext};
use aimforge_run_model::geometry::Playfield;
use aimforge_run_model::result::{select_best, RunResult};
use aimforge_run_model::setup::SetupRecord;

use crate::run::{Run, RunConfiguration};
use crate::scenario::ScenarioDescriptor;
use crate::submit::ResultSink;

/// How a battery is laid out in time and space.
#[derive(Debug, Clone)]
pub struct BatteryPlan {
    /// `(dpi_multiplier, sensitivity_multiplier)` per run, in order.
    pub configurations: Vec<(f64, f64)>,
    pub countdown_ms: u64,
    pub pause_ms: u64,
    pub frame_hz: u32,
    pub playfield: Playfield,
    /// Base seed for target placement; run `i` uses `seed + i`.
    pub seed: u64,
    /// Directory for per-run JSONL telemetry, if exporting.
    pub telemetry_dir: Option<PathBuf>,
}

impl BatteryPlan {
    pub fn from_defaults(defaults: &BatteryDefaults, playfield: Playfield) -> Self {
        Self {
            configurations: defaults.multiplier_pairs(),
            countdown_ms: defaults.countdown_ms,
            pause_ms: defaults.pause_ms,
            frame_hz: defaults.frame_hz,
            playfield,
            seed: 0,
            telemetry_dir: None,
        }
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Outcome of a battery.
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryReport {
    pub results: Vec<RunResult>,
    /// Index into `results` of the highest composite score.
    pub best_index: Option<usize>,
    /// True when the battery was stopped before every configuration ran.
    pub stopped: bool,
}

impl BatteryReport {
    pub fn best(&self) -> Option<&RunResult> {
        self.best_index.and_then(|i| self.results.get(i))
    }

    /// Sensitivity of the best configuration.
    pub fn recommended_sensitivity(&self) -> Option<f64> {
        self.best().map(|r| r.sensitivity)
    }

    pub fn recommended_inches_per_360(&self) -> Option<f64> {
        self.best().map(|r| r.inches_per_360)
    }
}

/// Sequences runs across configurations.
pub struct Battery {
    setup: SetupRecord,
    descriptor: ScenarioDescriptor,
    plan: BatteryPlan,
    sink: Arc<dyn ResultSink>,
    stop_flag: Arc<AtomicBool>,
}

impl Battery {
    /// Create a battery. Fails if the setup record is invalid or the plan
    /// has no configurations.
    pub fn new(
        setup: SetupRecord,
        descriptor: ScenarioDescriptor,
        plan: BatteryPlan,
        sink: Arc<dyn ResultSink>,
    ) -> AimResult<Self> {
        setup.validate()?;
        if plan.configurations.is_empty() {
            return Err(AimError::config("Battery has no configurations"));
        }
        if let Some((dpi, sens)) = plan
            .configurations
            .iter()
            .find(|(dpi, sens)| !(is_positive(*dpi) && is_positive(*sens)))
        {
            return Err(AimError::config(format!(
                "Invalid multiplier pair ({dpi}, {sens})"
            )));
        }

        Ok(Self {
            setup,
            descriptor,
            plan,
            sink,
            stop_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Load the setup record from `path` and create a battery. A missing
    /// record is a precondition failure.
    pub fn from_setup_path(
        path: impl AsRef<Path>,
        descriptor: ScenarioDescriptor,
        plan: BatteryPlan,
        sink: Arc<dyn ResultSink>,
    ) -> AimResult<Self> {
        let setup = SetupRecord::load(path)?;
        Self::new(setup, descriptor, plan, sink)
    }

    /// Flag that halts the battery at the next frame when set.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Request a stop. Safe to call repeatedly.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    pub fn setup(&self) -> &SetupRecord {
        &self.setup
    }

    pub fn plan(&self) -> &BatteryPlan {
        &self.plan
    }

    fn stop_requested(&self) -> bool {
        self.stop_flag.load(Ordering::SeqCst)
    }

    /// Run every configuration in order, driving input from `source`.
    pub async fn run(&mut self, source: &mut dyn PointerSource) -> AimResult<BatteryReport> {
        let clock = SessionClock::start();
        let total = self.plan.configurations.len();
        let mut results = Vec::with_capacity(total);
        let mut stopped = false;

        tracing::info!(
            scenario = %self.descriptor.kind,
            user = %self.setup.user,
            configurations = total,
            source = source.name(),
            sink = self.sink.name(),
            "Battery started"
        );

        for (index, &(dpi_multiplier, sensitivity_multiplier)) in
            self.plan.configurations.iter().enumerate()
        {
            if self.stop_requested() {
                stopped = true;
                break;
            }

            let configuration = RunConfiguration::from_setup(
                index,
                &self.setup,
                dpi_multiplier,
                sensitivity_multiplier,
            );
            let mut run = Run::new(
                self.descriptor.clone(),
                configuration,
                self.plan.playfield,
                self.plan.seed.wrapping_add(index as u64),
            );
            source.begin_run(RunContext {
                run_index: index,
                gain: configuration.gain(),
            });

            if self.plan.countdown_ms > 0 {
                tracing::debug!(run = index, countdown_ms = self.plan.countdown_ms, "Countdown");
                tokio::time::sleep(Duration::from_millis(self.plan.countdown_ms)).await;
            }

            let started_at = chrono::Utc::now().to_rfc3339();
            let result = self.drive(&clock, &mut run, source).await;
            if self.stop_requested() {
                tracing::info!(run = index, "Run stopped, result discarded");
                stopped = true;
                break;
            }

            if let Some(dir) = &self.plan.telemetry_dir {
                if let Err(e) = run.write_telemetry(dir, &started_at) {
                    tracing::warn!(run = index, error = %e, "Failed to export telemetry");
                }
            }

            self.sink.submit(result.to_submission(&self.setup));
            results.push(result);

            if index + 1 < total && self.plan.pause_ms > 0 && !self.stop_requested() {
                tokio::time::sleep(Duration::from_millis(self.plan.pause_ms)).await;
            }
        }

        let best_index = select_best(&results);
        if let Some(best) = best_index.and_then(|i| results.get(i)) {
            tracing::info!(
                run = best.run_index,
                composite = best.composite_score,
                sensitivity = best.sensitivity,
                inches_per_360 = best.inches_per_360,
                "Best configuration selected"
            );
        }
        if stopped {
            tracing::info!(completed = results.len(), total, "Battery stopped early");
        }

        Ok(BatteryReport {
            results,
            best_index,
            stopped,
        })
    }

    /// Frame loop for one run. Returns once the run is complete, its
    /// deadline fires or a stop is requested.
    async fn drive(
        &self,
        clock: &SessionClock,
        run: &mut Run,
        source: &mut dyn PointerSource,
    ) -> RunResult {
        let pacer = FramePacer::new(self.plan.frame_hz);
        let mut queue = InputQueue::new();

        let mut view = run.start(clock.now_ms());
        let deadline = tokio::time::sleep_until(clock.instant_at(run.deadline_ms()));
        tokio::pin!(deadline);

        let mut frames = tokio::time::interval(pacer.interval());
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = &mut deadline => {
                    run.expire(clock.now_ms());
                    break;
                }
                _ = frames.tick() => {
                    if self.stop_requested() {
                        run.stop();
                        break;
                    }

                    let now = clock.now_ms();
                    view.now_ms = now;
                    queue.extend(source.poll(&view));
                    view = run.step(now, queue.drain_frame());
                    if view.completed {
                        break;
                    }
                }
            }
        }

        run.finish(clock.now_ms())
    }
}
