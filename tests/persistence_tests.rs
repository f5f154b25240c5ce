#![allow(missing_docs)]

use std::fs;
use std::path::PathBuf;

use flapevo::config::Config;
use flapevo::evolution::population::EvolutionConfig;
use flapevo::persistence::{PersistenceError, SavedCandidate};
use flapevo::simulation::decision::DecisionFunction;
use flapevo::training::{Trainer, TrainingError};

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("flapevo_{}_{name}", std::process::id()))
}

#[test]
fn trained_champion_survives_save_and_load() {
    let config = Config {
        evolution: EvolutionConfig {
            population_size: 8,
            max_generations: 2,
            ..EvolutionConfig::default()
        },
        ..Config::default()
    };
    let mut trainer = Trainer::new(&config).expect("Failed to set up training");
    let champion = trainer.run().expect("Training failed").clone();

    let saved = SavedCandidate::from_genome(&champion);
    assert_eq!(saved.fitness, champion.fitness.unwrap_or(0));
    assert!(chrono::DateTime::parse_from_rfc3339(&saved.saved_at).is_ok());

    let path = scratch_path("champion.json");
    saved.save_to_file(&path).expect("Failed to save candidate");
    let loaded = SavedCandidate::load_from_file(&path).expect("Failed to load candidate");
    fs::remove_file(&path).ok();

    assert_eq!(loaded.fitness, saved.fitness);
    assert_eq!(loaded.generation, saved.generation);
    assert_eq!(loaded.saved_at, saved.saved_at);
    assert_eq!(loaded.brain.layer_sizes(), vec![4, 6, 1]);

    // The loaded network makes the same decisions.
    let inputs = [256.0, 300.0, 136.0, 296.0];
    let diff = loaded.brain.activate(&inputs) - champion.brain.activate(&inputs);
    assert!(diff.abs() < 1e-6);
}

#[test]
fn missing_candidate_is_an_io_error() {
    let err = SavedCandidate::load_from_file(scratch_path("does_not_exist.json")).unwrap_err();
    assert!(matches!(err, PersistenceError::Io { .. }));
}

#[test]
fn garbage_candidate_is_a_format_error() {
    let path = scratch_path("garbage.json");
    fs::write(&path, "{\"brain\": 3}").expect("Failed to write test file");
    let err = SavedCandidate::load_from_file(&path).unwrap_err();
    fs::remove_file(&path).ok();
    assert!(matches!(err, PersistenceError::Format { .. }));
}

#[test]
fn trainer_saves_its_champion_after_the_first_generation() {
    let config = Config {
        evolution: EvolutionConfig {
            population_size: 6,
            max_generations: 3,
            ..EvolutionConfig::default()
        },
        ..Config::default()
    };
    let mut trainer = Trainer::new(&config).expect("Failed to set up training");
    while trainer.population().history().is_empty() {
        trainer.advance(50).expect("Training failed");
    }

    let path = scratch_path("midway.json");
    let saved = trainer
        .save_champion(&path)
        .expect("Failed to save champion");
    let loaded = SavedCandidate::load_from_file(&path).expect("Failed to load candidate");
    fs::remove_file(&path).ok();

    let champion = trainer.champion().expect("No champion after one generation");
    assert_eq!(loaded.saved_at, saved.saved_at);
    assert_eq!(loaded.fitness, champion.fitness.unwrap_or(0));
    assert_eq!(loaded.generation, champion.birth_generation);

    let inputs = [120.0, 200.0, 150.0, 310.0];
    let diff = loaded.brain.activate(&inputs) - champion.brain.activate(&inputs);
    assert!(diff.abs() < 1e-6);
}

#[test]
fn unwritable_champion_path_is_a_persistence_error() {
    let config = Config {
        evolution: EvolutionConfig {
            population_size: 4,
            max_generations: 1,
            ..EvolutionConfig::default()
        },
        ..Config::default()
    };
    let mut trainer = Trainer::new(&config).expect("Failed to set up training");
    trainer.run().expect("Training failed");

    let path = scratch_path("missing_dir").join("champion.json");
    let err = trainer.save_champion(&path).unwrap_err();
    assert!(matches!(
        err,
        TrainingError::Persistence(PersistenceError::Io { .. })
    ));
}
