use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use flapevo::config::Config;
use flapevo::evolution::brain::Brain;
use flapevo::persistence::SavedCandidate;
use flapevo::simulation::agent::{Agent, AgentId};
use flapevo::simulation::decision::{HumanDecision, NetworkDecision, Role, TickInput};
use flapevo::simulation::episode::{AgentOutcome, Episode};
use flapevo::simulation::params::{Params, ScoringPolicy};
use flapevo::training::{Trainer, TrainerStatus};
use macroquad::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod render;
mod ui;

use render::Skin;

const DEFAULT_CONFIG: &str = "config/flapevo.json";
const FRAME_RATE: u32 = 60;
const PANEL_WIDTH: f32 = 300.0;
const WINDOW_SCALE: f32 = 1.5;

#[derive(Parser)]
#[command(name = "flapevo", version, about = "Evolve gap-passing agents and race them")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evolve a population and save the best candidate
    Train {
        /// Where the trained candidate is written
        #[arg(long)]
        genome_path: PathBuf,
        /// Configuration file
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
        /// Train without opening a window
        #[arg(long)]
        headless: bool,
        /// Overrides the configured seed
        #[arg(long)]
        seed: Option<u64>,
        /// Color of the network agents
        #[arg(long, value_enum, default_value_t = Skin::default())]
        skin: Skin,
    },
    /// Race a trained candidate
    Play {
        /// Candidate written by `train`
        #[arg(long)]
        genome_path: PathBuf,
        /// Configuration file
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
        /// Overrides the configured seed
        #[arg(long)]
        seed: Option<u64>,
        /// Color of the network agent
        #[arg(long, value_enum, default_value_t = Skin::default())]
        skin: Skin,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow!(err))?;

    match Cli::parse().command {
        Commands::Train {
            genome_path,
            config,
            headless,
            seed,
            skin,
        } => train(&genome_path, &config, headless, seed, skin),
        Commands::Play {
            genome_path,
            config,
            seed,
            skin,
        } => play(&genome_path, &config, seed, skin),
    }
}

fn load_config(path: &Path, seed: Option<u64>) -> Result<Config> {
    let mut config =
        Config::load(path).with_context(|| format!("loading config {}", path.display()))?;
    if let Some(seed) = seed {
        config.evaluation.seed = seed;
    }
    Ok(config)
}

fn window_conf(params: &Params, extra_width: f32, title: &str) -> Conf {
    Conf {
        window_title: title.to_owned(),
        window_width: (params.track_width * WINDOW_SCALE + extra_width) as i32,
        window_height: (params.track_height * WINDOW_SCALE) as i32,
        window_resizable: true,
        ..Default::default()
    }
}

fn ticks_per_frame(params: &Params) -> u64 {
    u64::from((params.tick_rate / FRAME_RATE).max(1))
}

/// Runs `future` inside a macroquad window and hands back its result once
/// the window loop ends.
fn run_in_window<T: 'static>(
    conf: Conf,
    future: impl Future<Output = Result<T>> + 'static,
) -> Result<T> {
    let outcome = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&outcome);
    macroquad::Window::from_config(conf, async move {
        *slot.borrow_mut() = Some(future.await);
    });
    let result = outcome.borrow_mut().take();
    result.ok_or_else(|| anyhow!("window closed before the run finished"))?
}

/// Keyboard and window state for the coming frame.
fn capture_input() -> TickInput {
    TickInput {
        flap_pressed: is_key_pressed(KeyCode::Space),
        quit: is_quit_requested() || is_key_pressed(KeyCode::Escape),
    }
}

fn train(
    genome_path: &Path,
    config_path: &Path,
    headless: bool,
    seed: Option<u64>,
    skin: Skin,
) -> Result<()> {
    let config = load_config(config_path, seed)?;
    let mut trainer = Trainer::new(&config).context("setting up training")?;
    info!(
        population = config.evolution.population_size,
        seed = config.evaluation.seed,
        headless,
        "training started"
    );

    if headless {
        trainer.run().context("training failed")?;
        save_champion(&trainer, genome_path)?;
        return Ok(());
    }

    let conf = window_conf(&config.simulation, PANEL_WIDTH, "flapevo - training");
    let ticks = ticks_per_frame(&config.simulation);
    let genome_path = genome_path.to_path_buf();
    run_in_window(conf, train_visual(trainer, genome_path, ticks, skin))
}

fn save_champion(trainer: &Trainer, genome_path: &Path) -> Result<()> {
    trainer
        .save_champion(genome_path)
        .with_context(|| format!("saving candidate to {}", genome_path.display()))?;
    Ok(())
}

/// Interleaves training ticks with frames and saves the champion before the
/// window loop ends, since the window may never hand control back. Nothing
/// is saved if the user quits.
async fn train_visual(
    mut trainer: Trainer,
    genome_path: PathBuf,
    ticks: u64,
    skin: Skin,
) -> Result<()> {
    prevent_quit();
    let mut ui_state = ui::UIState::new();

    loop {
        if capture_input().quit {
            info!("training aborted, nothing saved");
            return Ok(());
        }

        let budget = if ui_state.rendering_enabled {
            (ticks as f32 * ui_state.simulation_speed).round().max(1.0) as u64
        } else {
            u64::MAX
        };
        if trainer.advance(budget)? == TrainerStatus::Finished {
            break;
        }

        clear_background(DARKGRAY);
        if ui_state.rendering_enabled {
            if let Some(episode) = trainer.episode() {
                let header = format!("Generation {}", trainer.population().generation());
                render::draw_episode(&episode.snapshot(), episode.params(), skin, &header);
            }
        }
        ui::draw_training_ui(&mut ui_state, &trainer);
        ui::process_egui();

        next_frame().await;
    }

    save_champion(&trainer, &genome_path)
}

fn play(genome_path: &Path, config_path: &Path, seed: Option<u64>, skin: Skin) -> Result<()> {
    let config = load_config(config_path, seed)?;
    let candidate = SavedCandidate::load_from_file(genome_path)
        .with_context(|| format!("loading candidate {}", genome_path.display()))?;
    info!(
        fitness = candidate.fitness,
        generation = candidate.generation,
        saved_at = %candidate.saved_at,
        "candidate loaded"
    );

    let mut params = config.simulation.clone();
    params.scoring_policy = ScoringPolicy::EveryPasser;
    let conf = window_conf(&params, 0.0, "flapevo - play");
    let seed = config.evaluation.seed;
    let outcomes = run_in_window(conf, play_visual(params, candidate.brain, seed, skin))?;

    match outcomes {
        Some(outcomes) => {
            for outcome in outcomes {
                info!(
                    agent = %outcome.id,
                    role = ?outcome.role,
                    score = outcome.score,
                    "final score"
                );
            }
        }
        None => info!("game aborted"),
    }
    Ok(())
}

/// One episode of the trained network against the keyboard. Returns `None`
/// if the user quit before the end.
async fn play_visual(
    params: Params,
    brain: Brain,
    seed: u64,
    skin: Skin,
) -> Result<Option<Vec<AgentOutcome>>> {
    prevent_quit();
    let agents = vec![
        Agent::new(AgentId(0), &params, Box::new(NetworkDecision::new(brain))),
        Agent::new(AgentId(1), &params, Box::new(HumanDecision)),
    ];
    let mut episode = Episode::new(&params, agents, ChaCha8Rng::seed_from_u64(seed))?;
    let ticks = ticks_per_frame(&params);

    while episode.is_running() {
        if !episode.step_frame(&capture_input(), ticks)? {
            return Ok(None);
        }
        render::draw_episode(&episode.snapshot(), &params, skin, "Space to flap");
        next_frame().await;
    }

    let outcomes = episode.outcomes();
    let lines: Vec<String> = outcomes
        .iter()
        .map(|outcome| match outcome.role {
            Role::Network => format!("Network: {}", outcome.score),
            Role::Human => format!("You: {}", outcome.score),
        })
        .chain(std::iter::once("Press Enter".to_owned()))
        .collect();

    loop {
        if capture_input().quit || is_key_pressed(KeyCode::Enter) {
            break;
        }
        render::draw_episode(&episode.snapshot(), &params, skin, "Game over");
        render::draw_results(&lines);
        next_frame().await;
    }
    Ok(Some(outcomes))
}
