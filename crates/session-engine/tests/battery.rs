use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use aimforge_input_tracker::sources::AimBot;
use aimforge_input_tracker::{PointerSource, RunContext};
use aimforge_run_model::frame::FrameView;
use aimforge_run_model::geometry::Playfield;
use aimforge_run_model::result::{select_best, TestSubmission};
use aimforge_run_model::sample::InputEvent;
use aimforge_run_model::SetupRecord;
use aimforge_session_engine::{Battery, BatteryPlan, ResultSink, ScenarioKind};

#[derive(Default)]
struct RecordingSink {
    submissions: Mutex<Vec<TestSubmission>>,
}

impl RecordingSink {
    fn count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }
}

impl ResultSink for RecordingSink {
    fn submit(&self, submission: TestSubmission) {
        self.submissions.lock().unwrap().push(submission);
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Requests a stop on the first poll of the given run.
struct StoppingSource {
    flag: Arc<AtomicBool>,
    stop_in_run: usize,
    current_run: usize,
}

impl PointerSource for StoppingSource {
    fn poll(&mut self, _view: &FrameView) -> Vec<InputEvent> {
        if self.current_run == self.stop_in_run {
            self.flag.store(true, Ordering::SeqCst);
        }
        Vec::new()
    }

    fn name(&self) -> &str {
        "stopping"
    }

    fn begin_run(&mut self, context: RunContext) {
        self.current_run = context.run_index;
    }
}

fn setup() -> SetupRecord {
    SetupRecord::new(800.0, 1.0, "tester", "tracking")
}

fn plan() -> BatteryPlan {
    BatteryPlan {
        configurations: vec![(1.0, 0.5), (1.0, 0.75), (1.0, 1.0), (1.0, 1.25), (1.0, 1.5)],
        countdown_ms: 100,
        pause_ms: 50,
        frame_hz: 60,
        playfield: Playfield::new(800.0, 600.0),
        seed: 11,
        telemetry_dir: None,
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("aimforge_battery_{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[tokio::test(start_paused = true)]
async fn battery_runs_every_configuration_and_picks_the_best() {
    let sink = Arc::new(RecordingSink::default());
    let descriptor = ScenarioKind::Tracking.descriptor().with_duration_ms(500.0);
    let mut battery = Battery::new(setup(), descriptor, plan(), sink.clone()).unwrap();
    let mut bot = AimBot::with_seed(3);

    let report = battery.run(&mut bot).await.unwrap();

    assert!(!report.stopped);
    assert_eq!(report.results.len(), 5);
    assert_eq!(sink.count(), 5);
    for (i, result) in report.results.iter().enumerate() {
        assert_eq!(result.run_index, i);
        assert_eq!(result.test_type, "tracking");
        assert!((0.0..=100.0).contains(&result.composite_score));
    }

    let best = report.best_index.unwrap();
    assert_eq!(Some(best), select_best(&report.results));
    let best_score = report.results[best].composite_score;
    assert!(report.results.iter().all(|r| r.composite_score <= best_score));
    assert!(report.results[..best].iter().all(|r| r.composite_score < best_score));
    assert_eq!(report.recommended_sensitivity(), Some(report.results[best].sensitivity));

    let sensitivities: Vec<f64> = sink
        .submissions
        .lock()
        .unwrap()
        .iter()
        .map(|s| s.in_game_sensitivity)
        .collect();
    assert_eq!(sensitivities, vec![0.5, 0.75, 1.0, 1.25, 1.5]);
}

#[tokio::test(start_paused = true)]
async fn attempt_bounded_battery_completes() {
    let sink = Arc::new(RecordingSink::default());
    let descriptor = ScenarioKind::Flick
        .descriptor()
        .with_attempts(3)
        .with_duration_ms(20_000.0);
    let mut plan = plan();
    plan.configurations.truncate(2);
    let mut battery = Battery::new(setup(), descriptor, plan, sink.clone()).unwrap();
    let mut bot = AimBot::with_seed(5);

    let report = battery.run(&mut bot).await.unwrap();

    assert_eq!(report.results.len(), 2);
    assert_eq!(sink.count(), 2);
    assert!(report.results.iter().all(|r| r.test_type == "flick"));
}

#[tokio::test(start_paused = true)]
async fn telemetry_is_exported_per_run() {
    let dir = scratch_dir("telemetry");
    let sink = Arc::new(RecordingSink::default());
    let descriptor = ScenarioKind::GridShot.descriptor().with_duration_ms(300.0);
    let mut plan = plan();
    plan.configurations.truncate(2);
    plan.telemetry_dir = Some(dir.clone());
    let mut battery = Battery::new(setup(), descriptor, plan, sink).unwrap();

    battery.run(&mut AimBot::with_seed(1)).await.unwrap();

    for i in 0..2 {
        assert!(dir.join(format!("grid-shot-run-{i}.samples.jsonl")).exists());
        assert!(dir.join(format!("grid-shot-run-{i}.events.jsonl")).exists());
    }
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test(start_paused = true)]
async fn missing_setup_prevents_the_battery() {
    let dir = scratch_dir("missing_setup");
    let sink = Arc::new(RecordingSink::default());
    let err = match Battery::from_setup_path(
        dir.join("setup.json"),
        ScenarioKind::Tracking.descriptor(),
        plan(),
        sink.clone(),
    ) {
        Ok(_) => panic!("battery created without a setup record"),
        Err(e) => e,
    };

    assert!(err.is_precondition());
    assert_eq!(sink.count(), 0);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn invalid_plans_are_rejected() {
    let sink: Arc<dyn ResultSink> = Arc::new(RecordingSink::default());

    let mut empty = plan();
    empty.configurations.clear();
    assert!(Battery::new(setup(), ScenarioKind::Flick.descriptor(), empty, sink.clone()).is_err());

    let mut zero = plan();
    zero.configurations.push((1.0, 0.0));
    assert!(Battery::new(setup(), ScenarioKind::Flick.descriptor(), zero, sink.clone()).is_err());

    let bad_setup = SetupRecord::new(-400.0, 1.0, "tester", "flick");
    let err = match Battery::new(bad_setup, ScenarioKind::Flick.descriptor(), plan(), sink) {
        Ok(_) => panic!("battery accepted a negative dpi"),
        Err(e) => e,
    };
    assert!(err.is_precondition());
}

#[tokio::test(start_paused = true)]
async fn stop_before_start_runs_nothing() {
    let sink = Arc::new(RecordingSink::default());
    let mut battery =
        Battery::new(setup(), ScenarioKind::Tracking.descriptor(), plan(), sink.clone()).unwrap();

    battery.stop();
    battery.stop();
    let report = battery.run(&mut AimBot::with_seed(2)).await.unwrap();

    assert!(report.stopped);
    assert!(report.results.is_empty());
    assert_eq!(report.best_index, None);
    assert_eq!(sink.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn stop_mid_battery_keeps_finished_runs() {
    let sink = Arc::new(RecordingSink::default());
    let descriptor = ScenarioKind::Tracking.descriptor().with_duration_ms(400.0);
    let mut battery = Battery::new(setup(), descriptor, plan(), sink.clone()).unwrap();
    let mut source = StoppingSource {
        flag: battery.stop_flag(),
        stop_in_run: 2,
        current_run: 0,
    };

    let report = battery.run(&mut source).await.unwrap();

    assert!(report.stopped);
    assert_eq!(report.results.len(), 2);
    assert_eq!(sink.count(), 2);
    assert!(report.best_index.is_some());
}
