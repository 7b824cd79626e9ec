//! Run a battery with the synthetic player.

use std::path::PathBuf;

use aimforge_common::config::AppConfig;
use aimforge_input_tracker::sources::AimBot;
use aimforge_run_model::{Playfield, SetupRecord};
use aimforge_session_engine::{sink_for, Battery, BatteryPlan, BatteryReport, ScenarioKind};

pub struct SimulateArgs {
    pub scenario: Option<String>,
    pub setup: Option<PathBuf>,
    pub duration_ms: Option<f64>,
    pub attempts: Option<u32>,
    pub seed: u64,
    pub width: f64,
    pub height: f64,
    pub no_wait: bool,
    pub telemetry: Option<PathBuf>,
    pub submit: bool,
    pub json: bool,
}

pub async fn run(config: &AppConfig, args: SimulateArgs) -> anyhow::Result<()> {
    let setup_path = args.setup.unwrap_or_else(|| config.setup_path.clone());
    let setup = SetupRecord::load(&setup_path).map_err(|e| {
        if e.is_precondition() {
            anyhow::anyhow!("{e}\nRun `aimforge setup` first to record your DPI and sensitivity.")
        } else {
            anyhow::anyhow!("Failed to load setup record: {e}")
        }
    })?;

    let kind = ScenarioKind::from_test_type(args.scenario.as_deref().unwrap_or(&setup.test_type))?;
    let mut descriptor = kind.descriptor();
    if let Some(ms) = args.duration_ms {
        descriptor = descriptor.with_duration_ms(ms);
    }
    if let Some(n) = args.attempts {
        descriptor = descriptor.with_attempts(n);
    }

    let mut plan = BatteryPlan::from_defaults(
        &config.battery,
        Playfield::new(args.width, args.height),
    );
    plan.seed = args.seed;
    plan.telemetry_dir = args.telemetry;
    if args.no_wait {
        plan.countdown_ms = 0;
        plan.pause_ms = 0;
    }

    let mut api = config.api.clone();
    api.enabled |= args.submit;
    let sink = sink_for(&api)?;

    let mut battery = Battery::new(setup, descriptor, plan, sink)?;

    let stop_flag = battery.stop_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, stopping battery");
            stop_flag.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    });

    if !args.json {
        println!("Simulating {kind} battery for {}", battery.setup().user);
        println!(
            "  Base: {} dpi @ {} ({})",
            battery.setup().dpi,
            battery.setup().sensitivity,
            battery.setup().game
        );
        println!("  Configurations: {}", battery.plan().configurations.len());
        println!();
    }

    let mut bot = AimBot::with_seed(args.seed);
    let report = battery.run(&mut bot).await?;

    if args.json {
        print_json(&report)?;
    } else {
        print_table(&report);
    }

    Ok(())
}

fn print_table(report: &BatteryReport) {
    println!(
        "{:>3}  {:>6}  {:>8}  {:>7}  {:>8}  {:>8}  {:>8}  {:>9}",
        "run", "dpi", "sens", "in/360", "accuracy", "consist", "smooth", "composite"
    );
    for result in &report.results {
        let marker = if Some(result.run_index) == report.best().map(|b| b.run_index) {
            "*"
        } else {
            " "
        };
        println!(
            "{:>3}{} {:>6.0}  {:>8.3}  {:>7.2}  {:>8.1}  {:>8.1}  {:>8.1}  {:>9.1}",
            result.run_index,
            marker,
            result.dpi,
            result.sensitivity,
            result.inches_per_360,
            result.accuracy,
            result.consistency_score,
            result.movement_smoothness,
            result.composite_score
        );
    }
    println!();

    if report.stopped {
        println!("Battery stopped after {} run(s).", report.results.len());
    }
    match (report.recommended_sensitivity(), report.best()) {
        (Some(sensitivity), Some(best)) => {
            println!(
                "Recommended: sensitivity {sensitivity:.3} ({:.2} in/360, {:.1} cm/360)",
                best.inches_per_360, best.cm_per_360
            );
        }
        _ => println!("No completed runs."),
    }
}

fn print_json(report: &BatteryReport) -> anyhow::Result<()> {
    let value = serde_json::json!({
        "results": report.results,
        "bestIndex": report.best_index,
        "stopped": report.stopped,
        "recommendedSensitivity": report.recommended_sensitivity(),
        "recommendedInchesPer360": report.recommended_inches_per_360(),
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
