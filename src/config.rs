//! Run configuration loaded from a JSON file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::evolution::population::{EvolutionConfig, EvolutionError};
use crate::simulation::error::SimError;
use crate::simulation::params::Params;
use crate::simulation::runner::EvaluationConfig;

/// Failure to obtain a usable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("cannot access config file {path}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid JSON for [`Config`].
    #[error("cannot parse config file {path}")]
    Parse {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// Simulation section failed validation.
    #[error(transparent)]
    Simulation(#[from] SimError),
    /// Evolution section failed validation.
    #[error(transparent)]
    Evolution(#[from] EvolutionError),
}

/// Everything a training or play run needs besides the CLI flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Course and physics.
    pub simulation: Params,
    /// Population search.
    pub evolution: EvolutionConfig,
    /// Episode seeding and cut-off.
    pub evaluation: EvaluationConfig,
}

impl Config {
    /// Reads and validates a configuration file. Missing sections and fields
    /// fall back to their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration as pretty JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.evolution.validate()?;
        Ok(())
    }
}
