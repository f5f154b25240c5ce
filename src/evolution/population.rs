//! Generational search over brains.
//!
//! Each generation is evaluated as a whole by the episode runner. The fittest
//! genomes survive unchanged (elitism), the rest of the next generation is
//! bred from the top fraction through weighted crossover and mutation with a
//! log-uniformly sampled mutation scale.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::brain::Brain;
use crate::simulation::runner::{CandidateId, Fitness};

/// Inputs of every brain: `[agent_y, gap_x, gap_top, gap_bottom]`.
pub const INPUT_SIZE: usize = 4;
/// Outputs of every brain: the flap signal.
pub const OUTPUT_SIZE: usize = 1;

/// Errors raised by the population search.
#[derive(Debug, Error)]
pub enum EvolutionError {
    /// The evolution settings are unusable.
    #[error("invalid evolution config: {0}")]
    InvalidConfig(String),
    /// A fitness value refers to a genome outside the current generation.
    #[error("fitness reported for unknown candidate {0}")]
    UnknownCandidate(CandidateId),
    /// A genome of the current generation was never evaluated.
    #[error("candidate {0} has no fitness")]
    MissingFitness(CandidateId),
}

/// Settings of the population search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Genomes per generation.
    pub population_size: usize,
    /// Hidden layer widths between the 4 inputs and the single output.
    pub hidden_layers: Vec<usize>,
    /// Initial weights are uniform in `[-init_scale, init_scale]`.
    pub init_scale: f32,
    /// Best genomes copied unchanged into the next generation.
    pub elitism: usize,
    /// Fraction of the ranked generation allowed to breed.
    pub survival_fraction: f32,
    /// Probability that a child is bred from two parents instead of one.
    pub crossover_probability: f32,
    /// Lower bound of the log-uniform mutation scale.
    pub mutation_scale_min: f32,
    /// Upper bound of the log-uniform mutation scale.
    pub mutation_scale_max: f32,
    /// Stop once a genome reaches this fitness.
    pub fitness_threshold: u32,
    /// Stop after this many evaluated generations.
    pub max_generations: u32,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            hidden_layers: vec![6],
            init_scale: 1.0,
            elitism: 2,
            survival_fraction: 0.2,
            crossover_probability: 0.5,
            mutation_scale_min: 0.002,
            mutation_scale_max: 0.2,
            fitness_threshold: 100,
            max_generations: 200,
        }
    }
}

impl EvolutionConfig {
    /// Full layer sizes including input and output.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![INPUT_SIZE];
        sizes.extend(&self.hidden_layers);
        sizes.push(OUTPUT_SIZE);
        sizes
    }

    /// Rejects settings the search cannot run with.
    pub fn validate(&self) -> Result<(), EvolutionError> {
        if self.population_size == 0 {
            return Err(EvolutionError::InvalidConfig(
                "population_size must be > 0".to_string(),
            ));
        }
        if self.elitism > self.population_size {
            return Err(EvolutionError::InvalidConfig(
                "elitism cannot exceed population_size".to_string(),
            ));
        }
        if self.hidden_layers.contains(&0) {
            return Err(EvolutionError::InvalidConfig(
                "hidden layers must not be empty".to_string(),
            ));
        }
        if !(self.survival_fraction > 0.0 && self.survival_fraction <= 1.0) {
            return Err(EvolutionError::InvalidConfig(
                "survival_fraction must be in (0, 1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.crossover_probability) {
            return Err(EvolutionError::InvalidConfig(
                "crossover_probability must be in [0, 1]".to_string(),
            ));
        }
        if !(self.mutation_scale_min > 0.0 && self.mutation_scale_min < self.mutation_scale_max) {
            return Err(EvolutionError::InvalidConfig(
                "need 0 < mutation_scale_min < mutation_scale_max".to_string(),
            ));
        }
        if self.max_generations == 0 {
            return Err(EvolutionError::InvalidConfig(
                "max_generations must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// One candidate network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    /// Unique across the whole run.
    pub id: CandidateId,
    /// The decision function.
    pub brain: Brain,
    /// Score from the latest evaluation, `None` until evaluated.
    pub fitness: Option<u32>,
    /// Generation in which this genome was created.
    pub birth_generation: u32,
}

/// Fitness summary of one evaluated generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation index, starting at zero.
    pub generation: u32,
    /// Highest fitness.
    pub best: u32,
    /// Mean fitness.
    pub mean: f32,
    /// Lowest fitness.
    pub worst: u32,
}

/// The evolving set of genomes.
#[derive(Debug, Clone)]
pub struct Population {
    config: EvolutionConfig,
    genomes: Vec<Genome>,
    generation: u32,
    next_id: CandidateId,
    champion: Option<Genome>,
    history: Vec<GenerationStats>,
    rng: ChaCha8Rng,
}

impl Population {
    /// Creates generation zero with random brains.
    pub fn new(config: &EvolutionConfig, seed: u64) -> Result<Self, EvolutionError> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let layer_sizes = config.layer_sizes();

        let genomes = (0..config.population_size as CandidateId)
            .map(|id| Genome {
                id,
                brain: Brain::new(&layer_sizes, config.init_scale, &mut rng),
                fitness: None,
                birth_generation: 0,
            })
            .collect();

        Ok(Self {
            config: config.clone(),
            genomes,
            generation: 0,
            next_id: config.population_size as CandidateId,
            champion: None,
            history: Vec::new(),
            rng,
        })
    }

    /// Current generation index.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Genomes of the current generation.
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    /// `(id, brain)` pairs to hand to the episode runner.
    pub fn candidates(&self) -> Vec<(CandidateId, Brain)> {
        self.genomes
            .iter()
            .map(|genome| (genome.id, genome.brain.clone()))
            .collect()
    }

    /// Stores evaluation results for the current generation.
    pub fn assign_fitness(
        &mut self,
        results: &[Fitness],
    ) -> Result<GenerationStats, EvolutionError> {
        for result in results {
            let genome = self
                .genomes
                .iter_mut()
                .find(|genome| genome.id == result.candidate)
                .ok_or(EvolutionError::UnknownCandidate(result.candidate))?;
            genome.fitness = Some(result.score);
        }

        let mut scores = Vec::with_capacity(self.genomes.len());
        for genome in &self.genomes {
            scores.push(genome.fitness.ok_or(EvolutionError::MissingFitness(genome.id))?);
        }

        let stats = GenerationStats {
            generation: self.generation,
            best: scores.iter().copied().max().unwrap_or(0),
            mean: scores.iter().sum::<u32>() as f32 / scores.len() as f32,
            worst: scores.iter().copied().min().unwrap_or(0),
        };

        if let Some(best) = self.best().cloned() {
            let improved = self
                .champion
                .as_ref()
                .is_none_or(|champion| best.fitness > champion.fitness);
            if improved {
                self.champion = Some(best);
            }
        }

        info!(
            generation = stats.generation,
            best = stats.best,
            mean = stats.mean,
            worst = stats.worst,
            "generation evaluated"
        );
        self.history.push(stats);
        Ok(stats)
    }

    /// Fittest evaluated genome of the current generation.
    pub fn best(&self) -> Option<&Genome> {
        self.genomes
            .iter()
            .filter(|genome| genome.fitness.is_some())
            .max_by(|a, b| a.fitness.cmp(&b.fitness).then(b.id.cmp(&a.id)))
    }

    /// Fittest genome seen in any generation.
    pub fn champion(&self) -> Option<&Genome> {
        self.champion.as_ref()
    }

    /// Per-generation fitness summaries.
    pub fn history(&self) -> &[GenerationStats] {
        &self.history
    }

    /// True once the fitness threshold is reached or the generation budget
    /// is spent.
    pub fn should_stop(&self) -> bool {
        let reached = self
            .champion
            .as_ref()
            .and_then(|champion| champion.fitness)
            .is_some_and(|fitness| fitness >= self.config.fitness_threshold);
        reached || self.generation + 1 >= self.config.max_generations
    }

    /// Breeds the next generation from the evaluated current one.
    pub fn advance_generation(&mut self) -> Result<(), EvolutionError> {
        let mut ranked = self.genomes.clone();
        for genome in &ranked {
            if genome.fitness.is_none() {
                return Err(EvolutionError::MissingFitness(genome.id));
            }
        }
        ranked.sort_by(|a, b| b.fitness.cmp(&a.fitness).then(a.id.cmp(&b.id)));

        let size = self.config.population_size;
        let breeders = (size as f32 * self.config.survival_fraction).ceil() as usize;
        let breeders = breeders.clamp(1, size);
        let next_generation = self.generation + 1;

        let mut next: Vec<Genome> = ranked
            .iter()
            .take(self.config.elitism)
            .map(|elite| Genome {
                fitness: None,
                ..elite.clone()
            })
            .collect();

        while next.len() < size {
            let mutation_scale = self.sample_mutation_scale();
            let parent_1 = &ranked[self.rng.random_range(0..breeders)];

            let crossover = self.rng.random::<f32>() < self.config.crossover_probability;

            let brain = if breeders >= 2 && crossover {
                let mut parent_2 = &ranked[self.rng.random_range(0..breeders)];
                while parent_2.id == parent_1.id {
                    parent_2 = &ranked[self.rng.random_range(0..breeders)];
                }
                let weight = self.rng.random::<f32>();
                let mut child = Brain::crossover_weighted(&parent_1.brain, &parent_2.brain, weight);
                child.mutate(mutation_scale * 0.5, &mut self.rng);
                child
            } else {
                let mut child = parent_1.brain.clone();
                child.mutate(mutation_scale, &mut self.rng);
                child
            };

            next.push(Genome {
                id: self.next_id,
                brain,
                fitness: None,
                birth_generation: next_generation,
            });
            self.next_id += 1;
        }

        self.genomes = next;
        self.generation = next_generation;
        Ok(())
    }

    /// Samples a mutation scale using logarithmic random distribution.
    fn sample_mutation_scale(&mut self) -> f32 {
        let log_min = self.config.mutation_scale_min.ln();
        let log_max = self.config.mutation_scale_max.ln();
        self.rng.random_range(log_min..log_max).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EvolutionConfig {
        EvolutionConfig {
            population_size: 10,
            elitism: 2,
            max_generations: 5,
            fitness_threshold: 7,
            ..EvolutionConfig::default()
        }
    }

    fn score_by_id(population: &Population) -> Vec<Fitness> {
        population
            .genomes()
            .iter()
            .map(|genome| Fitness {
                candidate: genome.id,
                score: (genome.id % 5) as u32,
            })
            .collect()
    }

    #[test]
    fn generation_zero_has_configured_size() {
        let population = Population::new(&config(), 1).unwrap();
        assert_eq!(population.genomes().len(), 10);
        assert_eq!(population.generation(), 0);
        assert_eq!(population.genomes()[0].brain.layer_sizes(), vec![4, 6, 1]);
    }

    #[test]
    fn stats_summarise_fitness() {
        let mut population = Population::new(&config(), 1).unwrap();
        let stats = population.assign_fitness(&score_by_id(&population)).unwrap();
        assert_eq!(stats.best, 4);
        assert_eq!(stats.worst, 0);
        assert!((stats.mean - 2.0).abs() < 1e-6);
        assert_eq!(population.best().map(|g| g.id), Some(4));
    }

    #[test]
    fn elites_survive_and_size_is_kept() {
        let mut population = Population::new(&config(), 2).unwrap();
        population.assign_fitness(&score_by_id(&population)).unwrap();
        let elite_brains: Vec<Brain> = [4, 9]
            .iter()
            .map(|id| population.genomes()[*id].brain.clone())
            .collect();

        population.advance_generation().unwrap();
        assert_eq!(population.genomes().len(), 10);
        assert_eq!(population.generation(), 1);
        assert_eq!(population.genomes()[0].brain, elite_brains[0]);
        assert_eq!(population.genomes()[1].brain, elite_brains[1]);
        assert!(population.genomes().iter().all(|g| g.fitness.is_none()));
    }

    #[test]
    fn advancing_unevaluated_generation_fails() {
        let mut population = Population::new(&config(), 3).unwrap();
        assert!(matches!(
            population.advance_generation(),
            Err(EvolutionError::MissingFitness(_))
        ));
    }

    #[test]
    fn unknown_candidate_is_rejected() {
        let mut population = Population::new(&config(), 3).unwrap();
        let err = population
            .assign_fitness(&[Fitness {
                candidate: 999,
                score: 1,
            }])
            .unwrap_err();
        assert!(matches!(err, EvolutionError::UnknownCandidate(999)));
    }

    #[test]
    fn stops_at_threshold() {
        let mut population = Population::new(&config(), 4).unwrap();
        let mut results = score_by_id(&population);
        results[3].score = 7;
        population.assign_fitness(&results).unwrap();
        assert!(population.should_stop());
        assert_eq!(population.champion().and_then(|g| g.fitness), Some(7));
    }

    #[test]
    fn stops_after_generation_budget() {
        let mut population = Population::new(&config(), 5).unwrap();
        for _ in 0..4 {
            assert!(!population.should_stop());
            population.assign_fitness(&score_by_id(&population)).unwrap();
            population.advance_generation().unwrap();
        }
        assert!(population.should_stop());
    }

    #[test]
    fn empty_population_is_invalid() {
        let config = EvolutionConfig {
            population_size: 0,
            ..EvolutionConfig::default()
        };
        assert!(Population::new(&config, 0).is_err());
    }
}
