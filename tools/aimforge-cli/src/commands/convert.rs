//! Sensitivity conversion.

use aimforge_run_model::conversion::{cm_per_360, inches_per_360, sensitivity_for_inches};

use super::parse_game;

pub fn run(dpi: f64, sens: f64, game: &str, target_inches: Option<f64>) -> anyhow::Result<()> {
    let profile = parse_game(game)?;
    let k = profile.counts_per_360();
    if !(dpi.is_finite() && dpi > 0.0) {
        anyhow::bail!("dpi must be positive, got {dpi}");
    }

    println!("Game: {profile} ({k:.1} counts/360 at sensitivity 1.0)");

    match target_inches {
        Some(inches) => {
            let solved = sensitivity_for_inches(inches, dpi, k);
            if solved == 0.0 {
                anyhow::bail!("target inches must be positive, got {inches}");
            }
            println!("  {dpi} dpi @ {solved:.4} -> {inches:.2} in/360");
            println!("  eDPI: {:.1}", dpi * solved);
        }
        None => {
            println!(
                "  {dpi} dpi @ {sens} -> {:.2} in/360 ({:.1} cm/360)",
                inches_per_360(dpi, sens, k),
                cm_per_360(dpi, sens, k)
            );
            println!("  eDPI: {:.1}", dpi * sens);
        }
    }

    Ok(())
}
