//! Errors raised by the episode simulator.

use thiserror::Error;

use super::agent::AgentId;

/// Fatal errors surfaced while building or stepping an episode.
///
/// None of these are retried: a broken decision function or an inconsistent
/// parameter set is a programming error, not a transient fault.
#[derive(Debug, Error)]
pub enum SimError {
    /// A decision function returned NaN or an infinite value.
    #[error("decision function for agent {agent} returned non-finite output {value}")]
    InvalidDecisionOutput {
        /// Agent whose decision source failed.
        agent: AgentId,
        /// The offending raw output.
        value: f32,
    },
    /// Simulation parameters failed validation.
    #[error("invalid simulation parameters: {0}")]
    InvalidParams(String),
}
