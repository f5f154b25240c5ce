//! Training loop tying the population search to the episode runner.
//!
//! [`Trainer::advance`] runs a bounded number of ticks so a renderer can
//! interleave frames with simulation; [`Trainer::run`] goes to completion
//! as fast as possible. Both produce identical results for the same seed.

use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::evolution::population::{EvolutionError, Genome, Population};
use crate::persistence::{PersistenceError, SavedCandidate};
use crate::simulation::episode::Episode;
use crate::simulation::error::SimError;
use crate::simulation::runner::{EpisodeBatchRunner, Evaluation};

/// Failure during training.
#[derive(Debug, Error)]
pub enum TrainingError {
    /// The simulation failed, e.g. a brain produced a non-finite output.
    #[error(transparent)]
    Simulation(#[from] SimError),
    /// The population search failed.
    #[error(transparent)]
    Evolution(#[from] EvolutionError),
    /// The champion could not be written.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    /// Training ended without any evaluated genome.
    #[error("training finished without an evaluated genome")]
    NoChampion,
}

/// Where training stands after a call to [`Trainer::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerStatus {
    /// A generation is being evaluated or about to be.
    Evaluating,
    /// The stop condition was met.
    Finished,
}

/// Drives generations until the population's stop condition holds.
#[derive(Debug)]
pub struct Trainer {
    runner: EpisodeBatchRunner,
    population: Population,
    evaluation: Option<Evaluation>,
    base_seed: u64,
    finished: bool,
}

impl Trainer {
    /// Builds generation zero and the runner from a validated config.
    pub fn new(config: &Config) -> Result<Self, TrainingError> {
        let runner = EpisodeBatchRunner::new(&config.simulation, &config.evaluation)?;
        let population = Population::new(&config.evolution, config.evaluation.seed)?;
        Ok(Self {
            runner,
            population,
            evaluation: None,
            base_seed: config.evaluation.seed,
            finished: false,
        })
    }

    /// Runs at most `budget` ticks of the current generation's episode,
    /// breeding the next generation when it ends.
    pub fn advance(&mut self, budget: u64) -> Result<TrainerStatus, TrainingError> {
        if self.finished {
            return Ok(TrainerStatus::Finished);
        }

        let evaluation = match &mut self.evaluation {
            Some(evaluation) => evaluation,
            slot @ None => {
                let seed = self
                    .base_seed
                    .wrapping_add(u64::from(self.population.generation()));
                slot.insert(self.runner.begin(self.population.candidates(), seed)?)
            }
        };

        let Some(fitness) = evaluation.advance(budget)? else {
            return Ok(TrainerStatus::Evaluating);
        };
        self.evaluation = None;
        self.population.assign_fitness(&fitness)?;

        if self.population.should_stop() {
            self.finished = true;
            if let Some(champion) = self.population.champion() {
                info!(
                    generation = self.population.generation(),
                    fitness = champion.fitness.unwrap_or(0),
                    "training finished"
                );
            }
            return Ok(TrainerStatus::Finished);
        }

        self.population.advance_generation()?;
        Ok(TrainerStatus::Evaluating)
    }

    /// Trains to completion and returns the best genome seen.
    pub fn run(&mut self) -> Result<&Genome, TrainingError> {
        while self.advance(u64::MAX)? == TrainerStatus::Evaluating {}
        self.champion().ok_or(TrainingError::NoChampion)
    }

    /// Writes the best genome seen so far to `path`.
    pub fn save_champion<P: AsRef<Path>>(&self, path: P) -> Result<SavedCandidate, TrainingError> {
        let path = path.as_ref();
        let champion = self.champion().ok_or(TrainingError::NoChampion)?;
        let saved = SavedCandidate::from_genome(champion);
        saved.save_to_file(path)?;
        info!(
            id = champion.id,
            fitness = saved.fitness,
            generation = saved.generation,
            path = %path.display(),
            "champion saved"
        );
        Ok(saved)
    }

    /// Best genome seen so far.
    pub fn champion(&self) -> Option<&Genome> {
        self.population.champion()
    }

    /// The population being trained.
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Episode of the generation currently being evaluated.
    pub fn episode(&self) -> Option<&Episode> {
        self.evaluation.as_ref().map(Evaluation::episode)
    }

    /// True once the stop condition was met.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
