#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use std::fs;
use std::path::PathBuf;

use flapevo::config::{Config, ConfigError};
use flapevo::simulation::params::ScoringPolicy;

fn scratch_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("flapevo_{}_{name}", std::process::id()));
    fs::write(&path, contents).expect("Failed to write test file");
    path
}

#[test]
fn shipped_config_matches_defaults() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/flapevo.json");
    let config = Config::load(path).expect("Failed to load shipped config");
    assert_eq!(config, Config::default());
}

#[test]
fn missing_fields_fall_back_to_defaults() {
    let path = scratch_file(
        "partial.json",
        r#"{ "simulation": { "gap_size": 120.0, "scoring_policy": "every_passer" },
             "evaluation": { "seed": 7 } }"#,
    );
    let config = Config::load(&path).expect("Failed to load partial config");
    fs::remove_file(&path).ok();

    assert_eq!(config.simulation.gap_size, 120.0);
    assert_eq!(config.simulation.scoring_policy, ScoringPolicy::EveryPasser);
    assert_eq!(config.simulation.track_width, 288.0);
    assert_eq!(config.evaluation.seed, 7);
    assert_eq!(config.evolution, Config::default().evolution);
}

#[test]
fn missing_file_is_an_io_error() {
    let err = Config::load("/nonexistent/flapevo.json").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let path = scratch_file("malformed.json", "{ simulation: ");
    let err = Config::load(&path).unwrap_err();
    fs::remove_file(&path).ok();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn invalid_values_are_rejected() {
    let path = scratch_file("bad_sim.json", r#"{ "simulation": { "scroll_speed": 0.0 } }"#);
    let err = Config::load(&path).unwrap_err();
    fs::remove_file(&path).ok();
    assert!(matches!(err, ConfigError::Simulation(_)));

    let path = scratch_file("bad_evo.json", r#"{ "evolution": { "population_size": 0 } }"#);
    let err = Config::load(&path).unwrap_err();
    fs::remove_file(&path).ok();
    assert!(matches!(err, ConfigError::Evolution(_)));
}

#[test]
fn save_then_load_keeps_settings() {
    let mut config = Config::default();
    config.evolution.hidden_layers = vec![8, 4];
    config.evaluation.max_ticks = None;

    let path = scratch_file("saved.json", "");
    config.save(&path).expect("Failed to save config");
    let loaded = Config::load(&path).expect("Failed to load config");
    fs::remove_file(&path).ok();

    assert_eq!(loaded, config);
}
