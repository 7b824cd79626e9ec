use std::path::PathBuf;

use aimforge_common::error::AimError;
use aimforge_run_model::{GameProfile, SetupRecord};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("aimforge_setup_{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn missing_setup_is_a_precondition_failure() {
    let dir = scratch_dir("missing");
    let err = SetupRecord::load(dir.join("setup.json")).unwrap_err();
    assert!(matches!(err, AimError::MissingSetup { .. }));
    assert!(err.is_precondition());
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn setup_round_trips_through_disk() {
    let dir = scratch_dir("roundtrip");
    let path = dir.join("nested").join("setup.json");

    let mut record = SetupRecord::new(1600.0, 0.45, "player-1", "tracking");
    record.game = GameProfile::Valorant;
    record.save(&path).unwrap();

    let loaded = SetupRecord::load(&path).unwrap();
    assert_eq!(loaded, record);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn setup_without_game_defaults_to_generic() {
    let dir = scratch_dir("legacy");
    let path = dir.join("setup.json");
    std::fs::write(
        &path,
        r#"{"dpi":800,"sensitivity":1.0,"user":"u","test_type":"flick"}"#,
    )
    .unwrap();

    let loaded = SetupRecord::load(&path).unwrap();
    assert_eq!(loaded.game, GameProfile::Generic);
    assert!((loaded.inches_per_360() - 12.6).abs() < 1e-9);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn invalid_values_are_rejected() {
    let dir = scratch_dir("invalid");
    let path = dir.join("setup.json");

    std::fs::write(
        &path,
        r#"{"dpi":0,"sensitivity":1.0,"user":"u","test_type":"flick"}"#,
    )
    .unwrap();
    assert!(matches!(
        SetupRecord::load(&path),
        Err(AimError::InvalidSetup { .. })
    ));

    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        SetupRecord::load(&path),
        Err(AimError::InvalidSetup { .. })
    ));

    let blank_user = SetupRecord::new(800.0, 1.0, "  ", "flick");
    assert!(blank_user.validate().is_err());
    std::fs::remove_dir_all(&dir).ok();
}
