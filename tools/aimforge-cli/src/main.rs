//! AimForge CLI: simulate sensitivity batteries and manage the setup record.
//!
//! Usage:
//!   aimforge simulate [OPTIONS]   Run a battery with the synthetic player
//!   aimforge convert [OPTIONS]    Convert DPI and sensitivity to distance per 360
//!   aimforge setup [OPTIONS]      Write the setup record
//!   aimforge scenarios            List the available scenarios

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "aimforge",
    about = "Aim-trainer telemetry and sensitivity optimisation",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON logs
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a sensitivity battery driven by the synthetic player
    Simulate {
        /// Scenario test type (defaults to the setup record's)
        #[arg(short, long)]
        scenario: Option<String>,

        /// Setup record path (defaults to the configured location)
        #[arg(long)]
        setup: Option<PathBuf>,

        /// Override the run duration in milliseconds
        #[arg(long)]
        duration_ms: Option<f64>,

        /// Override the attempt count of flick-style scenarios
        #[arg(long)]
        attempts: Option<u32>,

        /// Seed for target placement and the synthetic player
        #[arg(long, default_value = "1")]
        seed: u64,

        /// Playfield width in pixels
        #[arg(long, default_value = "1280")]
        width: f64,

        /// Playfield height in pixels
        #[arg(long, default_value = "720")]
        height: f64,

        /// Skip the countdown and pauses between runs
        #[arg(long)]
        no_wait: bool,

        /// Export per-run JSONL telemetry into this directory
        #[arg(long)]
        telemetry: Option<PathBuf>,

        /// Post results to the configured API
        #[arg(long)]
        submit: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert DPI and sensitivity to distance per 360 degrees
    Convert {
        /// Mouse DPI
        #[arg(long)]
        dpi: f64,

        /// In-game sensitivity
        #[arg(long, default_value = "1.0")]
        sens: f64,

        /// Game profile (cs2, apex, valorant, overwatch2, generic) or a
        /// counts-per-360 constant
        #[arg(long, default_value = "generic")]
        game: String,

        /// Solve for the sensitivity giving this many inches per 360
        #[arg(long)]
        target_inches: Option<f64>,
    },

    /// Write the setup record a battery starts from
    Setup {
        /// Mouse DPI
        #[arg(long)]
        dpi: f64,

        /// In-game sensitivity
        #[arg(long)]
        sens: f64,

        /// User identifier sent with results
        #[arg(short, long)]
        user: String,

        /// Scenario test type
        #[arg(short, long, default_value = "tracking")]
        test_type: String,

        /// Game profile
        #[arg(long, default_value = "generic")]
        game: String,

        /// Output path (defaults to the configured location)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the available scenarios
    Scenarios,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = aimforge_common::config::AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    logging.json |= cli.json_logs;
    aimforge_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Simulate {
            scenario,
            setup,
            duration_ms,
            attempts,
            seed,
            width,
            height,
            no_wait,
            telemetry,
            submit,
            json,
        } => {
            commands::simulate::run(
                &config,
                commands::simulate::SimulateArgs {
                    scenario,
                    setup,
                    duration_ms,
                    attempts,
                    seed,
                    width,
                    height,
                    no_wait,
                    telemetry,
                    submit,
                    json,
                },
            )
            .await
        }
        Commands::Convert {
            dpi,
            sens,
            game,
            target_inches,
        } => commands::convert::run(dpi, sens, &game, target_inches),
        Commands::Setup {
            dpi,
            sens,
            user,
            test_type,
            game,
            output,
        } => commands::setup::run(
            dpi,
            sens,
            user,
            test_type,
            &game,
            output.unwrap_or_else(|| config.setup_path.clone()),
        ),
        Commands::Scenarios => commands::scenarios::run(),
    }
}
