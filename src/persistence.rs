//! Saving and loading a trained candidate.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::evolution::brain::Brain;
use crate::evolution::population::Genome;

/// Failure to save or load a candidate.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The file could not be read or written.
    #[error("cannot access candidate file {path}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file does not contain a candidate.
    #[error("cannot decode candidate file {path}")]
    Format {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// A trained brain plus where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCandidate {
    /// The network.
    pub brain: Brain,
    /// Fitness reached during training.
    pub fitness: u32,
    /// Generation that produced it.
    pub generation: u32,
    /// RFC 3339 timestamp of the save.
    pub saved_at: String,
}

impl SavedCandidate {
    /// Wraps an evaluated genome, stamping the current time.
    pub fn from_genome(genome: &Genome) -> Self {
        Self {
            brain: genome.brain.clone(),
            fitness: genome.fitness.unwrap_or(0),
            generation: genome.birth_generation,
            saved_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Saves the candidate to a JSON file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| PersistenceError::Format {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads a candidate from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| PersistenceError::Format {
            path: path.to_path_buf(),
            source,
        })
    }
}
