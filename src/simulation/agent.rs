//! Agent kinematics, scoring state and collision box.
//!
//! AI- and human-controlled agents share the same physics; only the attached
//! [`DecisionSource`] differs.

use std::fmt;

use geo::{Rect, coord};
use serde::{Deserialize, Serialize};

use super::decision::{Action, DecisionSource, Role};
use super::params::Params;
use super::track::{GAP_COUNT, ObstacleTrack};

/// Stable identifier of an agent within an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub usize);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A flying agent.
pub struct Agent {
    /// Identifier, unique within an episode.
    pub id: AgentId,
    /// Fixed horizontal position.
    pub x: f32,
    /// Vertical position of the top edge (grows downwards).
    pub y: f32,
    /// Vertical velocity (positive falls).
    pub velocity: f32,
    /// Number of gap-pairs passed. Never decreases.
    pub score: u32,
    flapped: bool,
    last_scored_cycle: [Option<u64>; GAP_COUNT],
    decision: Box<dyn DecisionSource>,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("velocity", &self.velocity)
            .field("score", &self.score)
            .field("role", &self.role())
            .finish_non_exhaustive()
    }
}

impl Agent {
    /// Creates an agent at mid-height with the initial upward impulse.
    pub fn new(id: AgentId, params: &Params, decision: Box<dyn DecisionSource>) -> Self {
        Self {
            id,
            x: params.agent_x(),
            y: params.agent_start_y(),
            velocity: params.flap_impulse,
            score: 0,
            flapped: false,
            last_scored_cycle: [None; GAP_COUNT],
            decision,
        }
    }

    /// Who controls this agent.
    pub fn role(&self) -> Role {
        self.decision.role()
    }

    pub(crate) fn decision_mut(&mut self) -> &mut dyn DecisionSource {
        self.decision.as_mut()
    }

    /// Applies one tick of physics.
    ///
    /// A flap sets the velocity and suppresses gravity for that tick only.
    /// The move is capped so the agent lands exactly on the floor, and the
    /// position is clamped at the ceiling.
    pub fn apply_action(&mut self, action: Action, params: &Params) {
        if action == Action::Flap {
            self.velocity = params.flap_impulse;
            self.flapped = true;
        }

        if self.velocity < params.max_fall_velocity && !self.flapped {
            self.velocity += params.gravity;
        }
        self.flapped = false;

        let room_below = params.track_height - self.y - params.agent_height;
        self.y += self.velocity.min(room_below);
        self.y = self.y.max(0.0);
    }

    /// Bounding box at the current position.
    pub fn bounds(&self, params: &Params) -> Rect<f32> {
        Rect::new(
            coord! { x: self.x, y: self.y },
            coord! { x: self.x + params.agent_width, y: self.y + params.agent_height },
        )
    }

    /// True if the bounding box overlaps any block of either gap-pair.
    /// Boxes that only share an edge do not collide.
    pub fn collides_with(&self, track: &ObstacleTrack, params: &Params) -> bool {
        let bounds = self.bounds(params);
        track.blocks().any(|block| overlaps(&bounds, &block))
    }

    /// Scores a gap-pair pass for this agent if it has not scored the
    /// gap-pair's current cycle yet. Returns whether the score changed.
    pub(crate) fn score_cycle(&mut self, gap: usize, cycle: u64) -> bool {
        if self.last_scored_cycle[gap] == Some(cycle) {
            return false;
        }
        self.last_scored_cycle[gap] = Some(cycle);
        self.score += 1;
        true
    }

    /// Scores unconditionally, remembering the cycle.
    pub(crate) fn award(&mut self, gap: usize, cycle: u64) {
        self.last_scored_cycle[gap] = Some(cycle);
        self.score += 1;
    }
}

/// Strict overlap on both axes.
fn overlaps(a: &Rect<f32>, b: &Rect<f32>) -> bool {
    a.min().x < b.max().x
        && b.min().x < a.max().x
        && a.min().y < b.max().y
        && b.min().y < a.max().y
}
