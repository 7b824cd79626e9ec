pub mod convert;
pub mod scenarios;
pub mod setup;
pub mod simulate;

use aimforge_run_model::GameProfile;

/// Resolve a game profile name given on the command line.
pub fn parse_game(name: &str) -> anyhow::Result<GameProfile> {
    GameProfile::from_name(name).ok_or_else(|| anyhow::anyhow!("Unknown game profile: {name}"))
}
