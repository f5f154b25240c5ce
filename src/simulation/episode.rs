//! One run of the course, from spawn until every agent is dead.
//!
//! Each tick the episode computes the perception vector, scrolls the track,
//! asks every active agent for its action, applies physics and resolves
//! collisions and gap-pair passes. Agents are processed in insertion order,
//! which only matters for the shared pass-award flag.

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::agent::{Agent, AgentId};
use super::decision::{DecisionContext, Role, TickInput};
use super::error::SimError;
use super::params::{Params, ScoringPolicy};
use super::track::{GAP_COUNT, Gap, ObstacleTrack};

/// Lifecycle of an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeState {
    /// At least one agent is alive.
    Running,
    /// No agent is alive.
    Terminated,
}

/// Final or current result of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentOutcome {
    /// The agent.
    pub id: AgentId,
    /// Who drove it.
    pub role: Role,
    /// Gap-pairs passed.
    pub score: u32,
    /// Tick on which it collided, `None` while alive.
    pub death_tick: Option<u64>,
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Agents that collided this tick.
    pub deaths: Vec<AgentId>,
    /// Agents whose score went up this tick.
    pub scored: Vec<AgentId>,
}

/// Read-only view of an agent for renderers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    /// The agent.
    pub id: AgentId,
    /// Who drives it.
    pub role: Role,
    /// Horizontal position.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
    /// Current score.
    pub score: u32,
}

/// Read-only view of the whole episode for renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSnapshot {
    /// Ticks simulated so far.
    pub tick: u64,
    /// Lifecycle state.
    pub state: EpisodeState,
    /// Both gap-pairs.
    pub gaps: [Gap; GAP_COUNT],
    /// Active agents only.
    pub agents: Vec<AgentView>,
    /// Highest score reached by any agent, dead or alive.
    pub best_score: u32,
}

/// A single simulation run.
#[derive(Debug)]
pub struct Episode {
    params: Params,
    track: ObstacleTrack,
    active: Vec<Agent>,
    finished: Vec<AgentOutcome>,
    tick: u64,
    state: EpisodeState,
}

impl Episode {
    /// Creates an episode. An empty agent list starts out terminated.
    pub fn new(params: &Params, agents: Vec<Agent>, rng: ChaCha8Rng) -> Result<Self, SimError> {
        params.validate()?;
        let track = ObstacleTrack::new(params, rng)?;
        let state = if agents.is_empty() {
            EpisodeState::Terminated
        } else {
            EpisodeState::Running
        };
        Ok(Self {
            params: params.clone(),
            track,
            active: agents,
            finished: Vec::new(),
            tick: 0,
            state,
        })
    }

    /// Advances the simulation by one tick.
    ///
    /// `input` is captured once by the caller and shared by all agents.
    /// Stepping a terminated episode does nothing. Decision source errors
    /// are returned as-is.
    pub fn step(&mut self, input: &TickInput) -> Result<TickReport, SimError> {
        let mut report = TickReport::default();
        if self.state == EpisodeState::Terminated {
            return Ok(report);
        }

        let perception = self.track.perception();
        let positions = self.track.advance();
        self.tick += 1;

        let scoring_line = self.params.scoring_line();
        let mut i = 0;
        while i < self.active.len() {
            let agent = &mut self.active[i];
            let ctx = DecisionContext {
                agent: agent.id,
                agent_y: agent.y,
                perception,
                input,
                threshold: self.params.decision_threshold,
            };
            let action = agent.decision_mut().next_action(&ctx)?;
            agent.apply_action(action, &self.params);

            if agent.collides_with(&self.track, &self.params) {
                let agent = self.active.remove(i);
                debug!(agent = %agent.id, score = agent.score, tick = self.tick, "agent collided");
                report.deaths.push(agent.id);
                self.finished.push(AgentOutcome {
                    id: agent.id,
                    role: agent.role(),
                    score: agent.score,
                    death_tick: Some(self.tick),
                });
                continue;
            }

            let mut scored = false;
            for (gap, position) in positions.iter().enumerate() {
                if *position > scoring_line {
                    continue;
                }
                let Gap { awarded, cycle, .. } = self.track.gaps()[gap];
                match self.params.scoring_policy {
                    ScoringPolicy::FirstPasser => {
                        if !awarded {
                            self.track.mark_awarded(gap);
                            agent.award(gap, cycle);
                            scored = true;
                        }
                    }
                    ScoringPolicy::EveryPasser => {
                        if agent.score_cycle(gap, cycle) {
                            self.track.mark_awarded(gap);
                            scored = true;
                        }
                    }
                }
            }
            if scored {
                report.scored.push(agent.id);
            }
            i += 1;
        }

        if self.active.is_empty() {
            self.state = EpisodeState::Terminated;
        }
        Ok(report)
    }

    /// Runs up to `ticks` ticks for one rendered frame, stopping early if
    /// the episode terminates. A flap press applies to the first tick only.
    ///
    /// Returns `false` without stepping when `input.quit` is set.
    pub fn step_frame(&mut self, input: &TickInput, ticks: u64) -> Result<bool, SimError> {
        if input.quit {
            return Ok(false);
        }
        let mut input = *input;
        for _ in 0..ticks {
            if !self.is_running() {
                break;
            }
            self.step(&input)?;
            input.flap_pressed = false;
        }
        Ok(true)
    }

    /// Lifecycle state.
    pub fn state(&self) -> EpisodeState {
        self.state
    }

    /// True while at least one agent is alive.
    pub fn is_running(&self) -> bool {
        self.state == EpisodeState::Running
    }

    /// Ticks simulated so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Agents still alive, in processing order.
    pub fn active_agents(&self) -> &[Agent] {
        &self.active
    }

    /// The course.
    pub fn track(&self) -> &ObstacleTrack {
        &self.track
    }

    /// Parameters the episode runs with.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Outcome of every agent, dead or alive, ordered by id.
    pub fn outcomes(&self) -> Vec<AgentOutcome> {
        let mut outcomes: Vec<AgentOutcome> = self
            .finished
            .iter()
            .copied()
            .chain(self.active.iter().map(|agent| AgentOutcome {
                id: agent.id,
                role: agent.role(),
                score: agent.score,
                death_tick: None,
            }))
            .collect();
        outcomes.sort_by_key(|outcome| outcome.id);
        outcomes
    }

    /// Highest score reached by any agent.
    pub fn best_score(&self) -> u32 {
        self.finished
            .iter()
            .map(|outcome| outcome.score)
            .chain(self.active.iter().map(|agent| agent.score))
            .max()
            .unwrap_or(0)
    }

    /// Positions and scores for rendering.
    pub fn snapshot(&self) -> EpisodeSnapshot {
        EpisodeSnapshot {
            tick: self.tick,
            state: self.state,
            gaps: *self.track.gaps(),
            agents: self
                .active
                .iter()
                .map(|agent| AgentView {
                    id: agent.id,
                    role: agent.role(),
                    x: agent.x,
                    y: agent.y,
                    score: agent.score,
                })
                .collect(),
            best_score: self.best_score(),
        }
    }
}
