//! # Flapevo - Neuro-evolution of gap-passing agents
//!
//! Agents fall under gravity through a vertically bounded course and may flap
//! to rise. Two gap-pairs scroll towards them; passing through a gap earns a
//! point and hitting a block ends the agent's run. Each agent is driven by a
//! small neural network, and a population search scores candidate networks by
//! the gaps they pass. A trained network can then race a human player.
//!
//! ## Features
//!
//! - Deterministic, seeded episode simulation
//! - Neural network brains (MLP with tanh activation)
//! - Genetic algorithm evolution (elitism, crossover and mutation)
//! - Incremental evaluation for live rendering
//! - Save/load of trained candidates
//!
//! ## Core Modules
//!
//! - [`simulation::episode`] - Tick loop, collisions and scoring
//! - [`simulation::track`] - Scrolling gap-pairs
//! - [`simulation::runner`] - Batch evaluation of candidates
//! - [`evolution::population`] - Population search
//! - [`training`] - Generation loop
//! - [`persistence`] - Candidate files

/// Episode simulation: course, agents, decisions and scoring.
pub mod simulation {
    /// Agent state and physics.
    pub mod agent;
    /// Decision sources for network and human agents.
    pub mod decision;
    /// A single episode and its tick loop.
    pub mod episode;
    /// Simulation errors.
    pub mod error;
    /// Simulation parameters.
    pub mod params;
    /// Evaluation of many candidates in one episode.
    pub mod runner;
    /// The scrolling obstacle course.
    pub mod track;
}

/// Population search over neural network brains.
pub mod evolution {
    /// Neural network implementation for agent brains.
    pub mod brain;
    /// Genomes, selection and breeding.
    pub mod population;
}

pub mod config;
pub mod persistence;
pub mod training;
