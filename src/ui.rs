use egui_macroquad::egui;
use egui_plot::{Line, Plot, PlotPoints};
use flapevo::evolution::population::GenerationStats;
use flapevo::training::Trainer;

/// Settings the training panel lets the user change.
pub struct UIState {
    /// Multiplier on the ticks simulated per frame.
    pub simulation_speed: f32,
    pub rendering_enabled: bool,
}

impl UIState {
    pub fn new() -> Self {
        Self {
            simulation_speed: 1.0,
            rendering_enabled: true,
        }
    }
}

pub fn draw_training_ui(state: &mut UIState, trainer: &Trainer) {
    egui_macroquad::ui(|egui_ctx| {
        egui::Window::new("Training")
            .default_pos(egui::pos2(10.0, 80.0))
            .default_width(280.0)
            .resizable(true)
            .show(egui_ctx, |ui| {
                let population = trainer.population();
                ui.label(format!("Generation: {}", population.generation()));
                ui.label(format!("Population: {}", population.genomes().len()));
                if let Some(episode) = trainer.episode() {
                    ui.label(format!(
                        "Alive: {}  Tick: {}",
                        episode.active_agents().len(),
                        episode.tick()
                    ));
                }
                if let Some(champion) = trainer.champion() {
                    ui.label(format!(
                        "Champion: #{} with {} (gen {})",
                        champion.id,
                        champion.fitness.unwrap_or(0),
                        champion.birth_generation
                    ));
                }

                ui.separator();
                ui.add(
                    egui::Slider::new(&mut state.simulation_speed, 0.25..=50.0)
                        .logarithmic(true)
                        .text("Speed"),
                );
                ui.checkbox(&mut state.rendering_enabled, "Render episode");

                ui.separator();
                draw_fitness_plot(ui, population.history());
            });
    });
}

fn draw_fitness_plot(ui: &mut egui::Ui, history: &[GenerationStats]) {
    if history.is_empty() {
        ui.label("Collecting data...");
        return;
    }

    let best: PlotPoints = history
        .iter()
        .map(|stats| [f64::from(stats.generation), f64::from(stats.best)])
        .collect();
    let mean: PlotPoints = history
        .iter()
        .map(|stats| [f64::from(stats.generation), f64::from(stats.mean)])
        .collect();

    Plot::new("fitness_plot")
        .height(150.0)
        .show_axes([true, true])
        .legend(egui_plot::Legend::default())
        .label_formatter(|name, value| {
            format!("{}\nGeneration: {:.0}\nFitness: {:.1}", name, value.x, value.y)
        })
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(best)
                    .color(egui::Color32::from_rgb(255, 100, 100))
                    .name("Best"),
            );
            plot_ui.line(
                Line::new(mean)
                    .color(egui::Color32::from_rgb(100, 150, 255))
                    .name("Mean"),
            );
        });
}

pub fn process_egui() {
    egui_macroquad::draw();
}
