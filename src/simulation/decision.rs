//! Decision sources supplying an agent's next action.
//!
//! Every tick the episode hands each agent's source a [`DecisionContext`] and
//! gets back an [`Action`]. The network variant thresholds an opaque decision
//! function; the human variant replays captured key presses.

use serde::{Deserialize, Serialize};

use super::agent::AgentId;
use super::error::SimError;
use super::track::Perception;

/// What an agent does this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Set velocity to the flap impulse.
    Flap,
    /// Let gravity act.
    Idle,
}

/// Who is behind a decision source. Used for rendering and logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Driven by a decision function.
    Network,
    /// Driven by captured keyboard input.
    Human,
}

/// External input gathered once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// The flap key went down since the previous tick.
    pub flap_pressed: bool,
    /// The player asked to quit. Checked before stepping, never by agents.
    pub quit: bool,
}

/// Everything a decision source may look at.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    /// Agent asking for a decision.
    pub agent: AgentId,
    /// Its current vertical position.
    pub agent_y: f32,
    /// Geometry of the relevant gap-pair.
    pub perception: Perception,
    /// Input captured for this tick.
    pub input: &'a TickInput,
    /// Outputs at or above this value flap.
    pub threshold: f32,
}

/// Opaque function from `[agent_y, gap_x, gap_top, gap_bottom]` to a scalar.
pub trait DecisionFunction {
    /// Evaluates the function. The range of the result is unspecified.
    fn activate(&self, inputs: &[f32; 4]) -> f32;
}

impl<F> DecisionFunction for F
where
    F: Fn(&[f32; 4]) -> f32,
{
    fn activate(&self, inputs: &[f32; 4]) -> f32 {
        self(inputs)
    }
}

/// Capability to produce an agent's next action.
pub trait DecisionSource {
    /// Chooses the action for this tick.
    fn next_action(&mut self, ctx: &DecisionContext<'_>) -> Result<Action, SimError>;

    /// Who drives this source.
    fn role(&self) -> Role;
}

/// Thresholds a decision function's output.
#[derive(Debug, Clone)]
pub struct NetworkDecision<F> {
    function: F,
}

impl<F: DecisionFunction> NetworkDecision<F> {
    /// Wraps a decision function.
    pub fn new(function: F) -> Self {
        Self { function }
    }
}

impl<F: DecisionFunction> DecisionSource for NetworkDecision<F> {
    fn next_action(&mut self, ctx: &DecisionContext<'_>) -> Result<Action, SimError> {
        let output = self.function.activate(&ctx.perception.inputs(ctx.agent_y));
        if !output.is_finite() {
            return Err(SimError::InvalidDecisionOutput {
                agent: ctx.agent,
                value: output,
            });
        }
        Ok(if output >= ctx.threshold {
            Action::Flap
        } else {
            Action::Idle
        })
    }

    fn role(&self) -> Role {
        Role::Network
    }
}

/// Flaps exactly on ticks where the flap key was pressed.
#[derive(Debug, Clone, Copy, Default)]
pub struct HumanDecision;

impl DecisionSource for HumanDecision {
    fn next_action(&mut self, ctx: &DecisionContext<'_>) -> Result<Action, SimError> {
        Ok(if ctx.input.flap_pressed {
            Action::Flap
        } else {
            Action::Idle
        })
    }

    fn role(&self) -> Role {
        Role::Human
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(input: &TickInput) -> DecisionContext<'_> {
        DecisionContext {
            agent: AgentId(3),
            agent_y: 100.0,
            perception: Perception {
                gap_x: 200.0,
                gap_top: 150.0,
                gap_bottom: 310.0,
            },
            input,
            threshold: 0.5,
        }
    }

    #[test]
    fn network_flaps_at_threshold() {
        let input = TickInput::default();
        let mut at = NetworkDecision::new(|_: &[f32; 4]| 0.5_f32);
        let mut below = NetworkDecision::new(|_: &[f32; 4]| 0.499_f32);
        assert_eq!(at.next_action(&ctx(&input)).unwrap(), Action::Flap);
        assert_eq!(below.next_action(&ctx(&input)).unwrap(), Action::Idle);
    }

    #[test]
    fn network_sees_agent_y_then_gap() {
        let input = TickInput::default();
        let mut source = NetworkDecision::new(|inputs: &[f32; 4]| {
            if *inputs == [100.0, 200.0, 150.0, 310.0] {
                1.0_f32
            } else {
                0.0
            }
        });
        assert_eq!(source.next_action(&ctx(&input)).unwrap(), Action::Flap);
    }

    #[test]
    fn non_finite_output_is_fatal() {
        let input = TickInput::default();
        let mut source = NetworkDecision::new(|_: &[f32; 4]| f32::NAN);
        let err = source.next_action(&ctx(&input)).unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidDecisionOutput {
                agent: AgentId(3),
                ..
            }
        ));
    }

    #[test]
    fn human_follows_key_presses() {
        let mut human = HumanDecision;
        let pressed = TickInput {
            flap_pressed: true,
            quit: false,
        };
        let idle = TickInput::default();
        assert_eq!(human.next_action(&ctx(&pressed)).unwrap(), Action::Flap);
        assert_eq!(human.next_action(&ctx(&idle)).unwrap(), Action::Idle);
    }
}
