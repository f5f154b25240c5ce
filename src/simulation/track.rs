//! Scrolling course made of two independently cycling gap-pairs.
//!
//! Gap centers are sampled from a fixed, peaked discrete distribution so most
//! openings sit at medium heights and extreme ones are rare. The RNG is
//! injected so a seed fully determines the course.

use geo::{Rect, coord};
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::SimError;
use super::params::Params;

/// Number of gap-pairs on the course.
pub const GAP_COUNT: usize = 2;

/// One upper and one lower block forming a vertical opening.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    /// Left edge of both blocks.
    pub x: f32,
    /// Bottom edge of the upper block.
    pub top: f32,
    /// Top edge of the lower block.
    pub bottom: f32,
    /// Shared pass-award flag, cleared on wrap.
    pub awarded: bool,
    /// Number of times this gap-pair has wrapped.
    pub cycle: u64,
}

impl Gap {
    /// Upper and lower block of this gap-pair.
    pub fn blocks(&self, params: &Params) -> [Rect<f32>; 2] {
        let right = self.x + params.pipe_width;
        [
            Rect::new(
                coord! { x: self.x, y: self.top - params.pipe_height },
                coord! { x: right, y: self.top },
            ),
            Rect::new(
                coord! { x: self.x, y: self.bottom },
                coord! { x: right, y: self.bottom + params.pipe_height },
            ),
        ]
    }

    /// Horizontal position compared against an agent's scoring line.
    pub fn scoring_position(&self, params: &Params) -> f32 {
        self.x + params.pipe_width / 2.0
    }
}

/// Geometry of the gap-pair an agent should aim for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Perception {
    /// Left edge of the relevant gap-pair.
    pub gap_x: f32,
    /// Bottom edge of its upper block.
    pub gap_top: f32,
    /// Top edge of its lower block.
    pub gap_bottom: f32,
}

impl Perception {
    /// Decision function input: `[agent_y, gap_x, gap_top, gap_bottom]`.
    pub fn inputs(&self, agent_y: f32) -> [f32; 4] {
        [agent_y, self.gap_x, self.gap_top, self.gap_bottom]
    }
}

/// The pair of scrolling gaps.
#[derive(Debug, Clone)]
pub struct ObstacleTrack {
    gaps: [Gap; GAP_COUNT],
    params: Params,
    centers: WeightedIndex<u32>,
    rng: ChaCha8Rng,
}

impl ObstacleTrack {
    /// Creates the course with both gap-pairs off-screen to the right,
    /// offset from each other by half the track width.
    pub fn new(params: &Params, rng: ChaCha8Rng) -> Result<Self, SimError> {
        let centers = WeightedIndex::new(params.gap_weights.iter().copied())
            .map_err(|e| SimError::InvalidParams(format!("gap_weights: {e}")))?;

        let first_x = params.track_width + params.first_gap_offset;
        let second_x = first_x + params.second_gap_spacing + params.track_width / 2.0;

        let mut track = Self {
            gaps: [Gap::default(); GAP_COUNT],
            params: params.clone(),
            centers,
            rng,
        };
        for (i, x) in [first_x, second_x].into_iter().enumerate() {
            let (top, bottom) = track.sample_opening();
            track.gaps[i] = Gap {
                x,
                top,
                bottom,
                ..Gap::default()
            };
        }
        Ok(track)
    }

    /// Draws a new opening as `(top, bottom)`.
    fn sample_opening(&mut self) -> (f32, f32) {
        let sample = self.centers.sample(&mut self.rng) + 1;
        let center = self.params.gap_base_offset + self.params.gap_step * sample as f32;
        let half = self.params.gap_size / 2.0;
        (center - half, center + half)
    }

    /// Scrolls both gap-pairs one tick to the left.
    ///
    /// A gap-pair reaching the left edge wraps to `track_width` with a new
    /// opening and a cleared award flag. Returns the post-advance scoring
    /// position of each gap-pair.
    pub fn advance(&mut self) -> [f32; GAP_COUNT] {
        let mut positions = [0.0; GAP_COUNT];
        for i in 0..GAP_COUNT {
            self.gaps[i].x -= self.params.scroll_speed;

            if self.gaps[i].x <= 0.0 {
                let (top, bottom) = self.sample_opening();
                let gap = &mut self.gaps[i];
                gap.x = self.params.track_width;
                gap.top = top;
                gap.bottom = bottom;
                gap.awarded = false;
                gap.cycle += 1;
                debug!(gap = i, cycle = gap.cycle, top, bottom, "gap-pair wrapped");
            }

            positions[i] = self.gaps[i].scoring_position(&self.params);
        }
        positions
    }

    /// Picks the nearer gap-pair that has not been passed yet.
    pub fn perception(&self) -> Perception {
        let [a, b] = &self.gaps;
        let pick_a = if a.x == b.x {
            !a.awarded || b.awarded
        } else {
            (a.x < b.x && !a.awarded) || (b.x < a.x && b.awarded)
        };
        let gap = if pick_a { a } else { b };
        Perception {
            gap_x: gap.x,
            gap_top: gap.top,
            gap_bottom: gap.bottom,
        }
    }

    /// Current state of both gap-pairs.
    pub fn gaps(&self) -> &[Gap; GAP_COUNT] {
        &self.gaps
    }

    /// Sets the shared pass-award flag of one gap-pair.
    pub fn mark_awarded(&mut self, index: usize) {
        self.gaps[index].awarded = true;
    }

    /// All four obstacle blocks.
    pub fn blocks(&self) -> impl Iterator<Item = Rect<f32>> + '_ {
        self.gaps.iter().flat_map(|gap| gap.blocks(&self.params))
    }
}
