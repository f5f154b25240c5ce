use serde::{Deserialize, Serialize};

use super::error::SimError;

/// How a gap-pair's pass is turned into score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// The first agent whose pass is processed scores; the shared flag then
    /// blocks every other agent until the gap-pair wraps.
    #[default]
    FirstPasser,
    /// Every surviving agent scores once per gap-pair cycle.
    EveryPasser,
}

/// Simulation parameters that control the course and agent physics.
///
/// Units are pixels and ticks. The defaults reproduce the classic 288×512
/// course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Course width.
    pub track_width: f32,
    /// Course height; the floor is at this y.
    pub track_height: f32,
    /// Vertical opening between upper and lower block.
    pub gap_size: f32,
    /// Width of a pipe block.
    pub pipe_width: f32,
    /// Height of a pipe block.
    pub pipe_height: f32,
    /// Horizontal distance a gap-pair scrolls per tick.
    pub scroll_speed: f32,
    /// Gap center for a sample of zero.
    pub gap_base_offset: f32,
    /// Gap center increment per sample unit.
    pub gap_step: f32,
    /// Relative weights of the gap-center samples `1..=gap_weights.len()`.
    pub gap_weights: Vec<u32>,
    /// Distance past the right edge at which the first gap-pair starts.
    pub first_gap_offset: f32,
    /// Extra spacing added to the half-width offset of the second gap-pair.
    pub second_gap_spacing: f32,
    /// Fixed horizontal position of agents as a fraction of `track_width`.
    pub agent_x_ratio: f32,
    /// Agent bounding box width.
    pub agent_width: f32,
    /// Agent bounding box height.
    pub agent_height: f32,
    /// Terminal downward velocity.
    pub max_fall_velocity: f32,
    /// Fastest upward velocity a flap can produce.
    pub min_rise_velocity: f32,
    /// Velocity gained per tick while falling.
    pub gravity: f32,
    /// Velocity set by a flap.
    pub flap_impulse: f32,
    /// Decision outputs at or above this value flap.
    pub decision_threshold: f32,
    /// Ticks per second for real-time pacing. Cosmetic only.
    pub tick_rate: u32,
    /// Pass-award rule.
    pub scoring_policy: ScoringPolicy,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            track_width: 288.0,
            track_height: 512.0,
            gap_size: 160.0,
            pipe_width: 52.0,
            pipe_height: 320.0,
            scroll_speed: 3.0,
            gap_base_offset: 106.0,
            gap_step: 30.0,
            gap_weights: vec![1, 2, 3, 4, 5, 4, 3, 2, 1],
            first_gap_offset: 100.0,
            second_gap_spacing: 10.0,
            agent_x_ratio: 0.2,
            agent_width: 34.0,
            agent_height: 24.0,
            max_fall_velocity: 10.0,
            min_rise_velocity: -8.0,
            gravity: 1.0,
            flap_impulse: -9.0,
            decision_threshold: 0.5,
            tick_rate: 200,
            scoring_policy: ScoringPolicy::FirstPasser,
        }
    }
}

impl Params {
    /// Fixed horizontal position shared by all agents.
    pub fn agent_x(&self) -> f32 {
        (self.track_width * self.agent_x_ratio).floor()
    }

    /// A gap-pair whose scoring position reaches this line counts as passed.
    pub fn scoring_line(&self) -> f32 {
        self.agent_x() - (self.agent_width / 2.0).floor()
    }

    /// Vertical start position of a fresh agent.
    pub fn agent_start_y(&self) -> f32 {
        self.track_height * 0.5
    }

    /// Checks the parameter set for values that would break the simulation.
    pub fn validate(&self) -> Result<(), SimError> {
        let positive = [
            ("track_width", self.track_width),
            ("track_height", self.track_height),
            ("gap_size", self.gap_size),
            ("pipe_width", self.pipe_width),
            ("pipe_height", self.pipe_height),
            ("scroll_speed", self.scroll_speed),
            ("agent_width", self.agent_width),
            ("agent_height", self.agent_height),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::InvalidParams(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.agent_height >= self.track_height {
            return Err(SimError::InvalidParams(
                "agent_height must be smaller than track_height".to_string(),
            ));
        }
        if self.gap_weights.is_empty() || self.gap_weights.iter().all(|&w| w == 0) {
            return Err(SimError::InvalidParams(
                "gap_weights needs at least one non-zero weight".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.agent_x_ratio) {
            return Err(SimError::InvalidParams(format!(
                "agent_x_ratio must be in [0, 1), got {}",
                self.agent_x_ratio
            )));
        }
        if self.flap_impulse < self.min_rise_velocity {
            return Err(SimError::InvalidParams(format!(
                "flap_impulse {} is faster than min_rise_velocity {}",
                self.flap_impulse, self.min_rise_velocity
            )));
        }
        if self.tick_rate == 0 {
            return Err(SimError::InvalidParams("tick_rate must be > 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn default_geometry_matches_classic_course() {
        let params = Params::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.agent_x(), 57.0);
        assert_eq!(params.scoring_line(), 40.0);
        assert_eq!(params.agent_start_y(), 256.0);
    }

    #[test]
    fn zero_weights_are_rejected() {
        let params = Params {
            gap_weights: vec![0, 0, 0],
            ..Params::default()
        };
        assert!(matches!(params.validate(), Err(SimError::InvalidParams(_))));
    }

    #[test]
    fn flap_faster_than_rise_limit_is_rejected() {
        let params = Params {
            flap_impulse: -12.0,
            ..Params::default()
        };
        assert!(params.validate().is_err());
    }
}
