use clap::ValueEnum;
use flapevo::simulation::decision::Role;
use flapevo::simulation::episode::EpisodeSnapshot;
use flapevo::simulation::params::Params;
use macroquad::prelude::*;

/// Color scheme of the network-driven agents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Skin {
    /// Red body.
    Red,
    /// Yellow body.
    #[default]
    Yellow,
    /// Purple body.
    Mihto,
}

impl Skin {
    fn body(self) -> Color {
        match self {
            Skin::Red => Color::from_rgba(230, 80, 60, 255),
            Skin::Yellow => Color::from_rgba(250, 200, 40, 255),
            Skin::Mihto => Color::from_rgba(150, 90, 210, 255),
        }
    }
}

const SKY: Color = Color::new(0.31, 0.75, 0.79, 1.0);
const PIPE: Color = Color::new(0.45, 0.75, 0.18, 1.0);
const PIPE_EDGE: Color = Color::new(0.33, 0.5, 0.13, 1.0);
const HUMAN: Color = Color::new(0.95, 0.95, 0.95, 1.0);

/// Maps course coordinates into the window, keeping the aspect ratio and
/// centering the course horizontally.
struct Viewport {
    scale: f32,
    offset_x: f32,
}

impl Viewport {
    fn fit(params: &Params) -> Self {
        let scale =
            (screen_width() / params.track_width).min(screen_height() / params.track_height);
        Self {
            scale,
            offset_x: (screen_width() - params.track_width * scale) / 2.0,
        }
    }

    fn rect(&self, x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::new(
            self.offset_x + x * self.scale,
            y * self.scale,
            w * self.scale,
            h * self.scale,
        )
    }
}

/// Draws one frame of an episode. `header` is shown above the score.
pub fn draw_episode(snapshot: &EpisodeSnapshot, params: &Params, skin: Skin, header: &str) {
    clear_background(DARKGRAY);
    let view = Viewport::fit(params);

    let course = view.rect(0.0, 0.0, params.track_width, params.track_height);
    draw_rectangle(course.x, course.y, course.w, course.h, SKY);

    for gap in &snapshot.gaps {
        let upper = view.rect(
            gap.x,
            gap.top - params.pipe_height,
            params.pipe_width,
            params.pipe_height,
        );
        let lower = view.rect(gap.x, gap.bottom, params.pipe_width, params.pipe_height);
        for block in [upper, lower] {
            let Some(visible) = block.intersect(course) else {
                continue;
            };
            draw_rectangle(visible.x, visible.y, visible.w, visible.h, PIPE);
            draw_rectangle_lines(visible.x, visible.y, visible.w, visible.h, 2.0, PIPE_EDGE);
        }
    }

    for agent in &snapshot.agents {
        let body = view.rect(agent.x, agent.y, params.agent_width, params.agent_height);
        let color = match agent.role {
            Role::Network => skin.body(),
            Role::Human => HUMAN,
        };
        draw_rectangle(body.x, body.y, body.w, body.h, color);
        draw_rectangle_lines(body.x, body.y, body.w, body.h, 1.5, BLACK);
    }

    let font_size = 24.0 * view.scale.max(1.0);
    draw_text(header, course.x + 8.0, font_size, font_size, WHITE);
    draw_text(
        &format!("Max score: {}", snapshot.best_score),
        course.x + 8.0,
        font_size * 2.0,
        font_size,
        WHITE,
    );
}

/// Draws the final scores over the last frame.
pub fn draw_results(lines: &[String]) {
    let font_size = 30.0;
    let mut y = screen_height() / 2.0 - font_size * lines.len() as f32 / 2.0;
    for line in lines {
        let size = measure_text(line, None, font_size as _, 1.0);
        draw_text(line, screen_width() / 2.0 - size.width / 2.0, y, font_size, WHITE);
        y += font_size * 1.2;
    }
}
