//! Write the setup record.

use std::path::PathBuf;

use aimforge_run_model::SetupRecord;
use aimforge_session_engine::ScenarioKind;

use super::parse_game;

pub fn run(
    dpi: f64,
    sens: f64,
    user: String,
    test_type: String,
    game: &str,
    output: PathBuf,
) -> anyhow::Result<()> {
    let kind = ScenarioKind::from_test_type(&test_type)?;

    let mut record = SetupRecord::new(dpi, sens, user, kind.test_type());
    record.game = parse_game(game)?;
    record.validate()?;
    record.save(&output)?;

    println!("Setup saved to {}", output.display());
    println!("  User: {}", record.user);
    println!("  Scenario: {}", record.test_type);
    println!(
        "  {} dpi @ {} ({}) = {:.2} in/360",
        record.dpi,
        record.sensitivity,
        record.game,
        record.inches_per_360()
    );

    Ok(())
}
