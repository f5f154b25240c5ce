//! Evaluates one generation of candidates in a single shared episode.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::agent::{Agent, AgentId};
use super::decision::{DecisionFunction, NetworkDecision, TickInput};
use super::episode::Episode;
use super::error::SimError;
use super::params::Params;

/// Identifier the search algorithm uses for a candidate.
pub type CandidateId = u64;

/// Fitness of one candidate: gap-pairs passed before death or cut-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fitness {
    /// The candidate.
    pub candidate: CandidateId,
    /// Non-negative score, higher is better.
    pub score: u32,
}

/// Controls how an evaluation episode is seeded and bounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Base seed for the course of generation zero.
    pub seed: u64,
    /// Stop an episode after this many ticks even if agents survive.
    pub max_ticks: Option<u64>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_ticks: Some(50_000),
        }
    }
}

/// Builds and runs evaluation episodes.
#[derive(Debug, Clone)]
pub struct EpisodeBatchRunner {
    params: Params,
    max_ticks: Option<u64>,
}

impl EpisodeBatchRunner {
    /// Creates a runner after validating the parameters.
    pub fn new(params: &Params, config: &EvaluationConfig) -> Result<Self, SimError> {
        params.validate()?;
        Ok(Self {
            params: params.clone(),
            max_ticks: config.max_ticks,
        })
    }

    /// Starts an episode with one network-driven agent per candidate, in
    /// input order.
    pub fn begin<I, F>(&self, candidates: I, seed: u64) -> Result<Evaluation, SimError>
    where
        I: IntoIterator<Item = (CandidateId, F)>,
        F: DecisionFunction + 'static,
    {
        let mut ids = Vec::new();
        let mut agents = Vec::new();
        for (index, (candidate, function)) in candidates.into_iter().enumerate() {
            ids.push(candidate);
            agents.push(Agent::new(
                AgentId(index),
                &self.params,
                Box::new(NetworkDecision::new(function)),
            ));
        }

        let episode = Episode::new(&self.params, agents, ChaCha8Rng::seed_from_u64(seed))?;
        Ok(Evaluation {
            episode,
            candidates: ids,
            max_ticks: self.max_ticks,
        })
    }

    /// Runs a whole episode and returns one fitness per candidate, in input
    /// order.
    pub fn evaluate<I, F>(&self, candidates: I, seed: u64) -> Result<Vec<Fitness>, SimError>
    where
        I: IntoIterator<Item = (CandidateId, F)>,
        F: DecisionFunction + 'static,
    {
        let mut evaluation = self.begin(candidates, seed)?;
        loop {
            if let Some(fitness) = evaluation.advance(u64::MAX)? {
                return Ok(fitness);
            }
        }
    }
}

/// An evaluation episode that can be advanced incrementally, e.g. a few
/// ticks per rendered frame.
#[derive(Debug)]
pub struct Evaluation {
    episode: Episode,
    candidates: Vec<CandidateId>,
    max_ticks: Option<u64>,
}

impl Evaluation {
    /// Runs at most `budget` ticks. Returns the fitness list once the
    /// episode is over.
    pub fn advance(&mut self, budget: u64) -> Result<Option<Vec<Fitness>>, SimError> {
        if self.is_finished() {
            return Ok(Some(self.fitness()));
        }

        let input = TickInput::default();
        let mut spent = 0;
        while spent < budget && !self.is_finished() {
            self.episode.step(&input)?;
            spent += 1;
        }

        if !self.is_finished() {
            return Ok(None);
        }
        if self.episode.is_running() {
            warn!(
                tick = self.episode.tick(),
                survivors = self.episode.active_agents().len(),
                "episode cut off at max_ticks"
            );
        }
        Ok(Some(self.fitness()))
    }

    /// True once every agent died or the tick limit was hit.
    pub fn is_finished(&self) -> bool {
        !self.episode.is_running()
            || self
                .max_ticks
                .is_some_and(|limit| self.episode.tick() >= limit)
    }

    /// Current score of every candidate, in input order.
    pub fn fitness(&self) -> Vec<Fitness> {
        self.episode
            .outcomes()
            .into_iter()
            .map(|outcome| Fitness {
                candidate: self.candidates[outcome.id.0],
                score: outcome.score,
            })
            .collect()
    }

    /// The running episode.
    pub fn episode(&self) -> &Episode {
        &self.episode
    }
}
