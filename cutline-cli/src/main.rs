//! Cutline CLI - Monte Carlo tournament cut simulator
//!
//! Commands:
//! - simulate: Run the simulation and write the JSON report
//! - validate: Check the input files without simulating

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use cutline_core::{TourFormat, TournamentState};
use cutline_sim::{SimSettings, SimulationDriver};
use tracing::info;

#[derive(Parser)]
#[command(name = "cutline")]
#[command(about = "Monte Carlo tournament cut-probability simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation and write the report
    Simulate {
        #[arg(long, default_value = "tour_format.json")]
        format: PathBuf,
        #[arg(long, default_value = "tour_state.json")]
        state: PathBuf,
        #[arg(long, default_value = "sim_settings.json")]
        settings: PathBuf,
        /// Write the report here instead of the settings' output_file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Load and cross-check the input files, then exit
    Validate {
        #[arg(long, default_value = "tour_format.json")]
        format: PathBuf,
        #[arg(long, default_value = "tour_state.json")]
        state: PathBuf,
        #[arg(long, default_value = "sim_settings.json")]
        settings: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            format,
            state,
            settings,
            output,
        } => simulate(&format, &state, &settings, output),
        Commands::Validate {
            format,
            state,
            settings,
        } => validate(&format, &state, &settings),
    }
}

fn load_inputs(
    format_path: &Path,
    state_path: &Path,
    settings_path: &Path,
) -> anyhow::Result<(TourFormat, TournamentState, SimSettings)> {
    let format = TourFormat::load(format_path)
        .with_context(|| format!("loading tournament format {}", format_path.display()))?;
    let state = TournamentState::load(state_path, &format)
        .with_context(|| format!("loading tournament state {}", state_path.display()))?;
    let settings = SimSettings::load(settings_path)
        .with_context(|| format!("loading simulation settings {}", settings_path.display()))?;
    Ok((format, state, settings))
}

fn simulate(
    format_path: &Path,
    state_path: &Path,
    settings_path: &Path,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let (format, state, settings) = load_inputs(format_path, state_path, settings_path)?;

    let report = SimulationDriver::new(&format, &state, &settings).run()?;

    let output_path = output.unwrap_or_else(|| settings.output_file.clone());
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(&report)?;
    fs::write(&output_path, json)
        .with_context(|| format!("writing report to {}", output_path.display()))?;
    info!(path = %output_path.display(), "report written");

    println!("{}: {} trials", report.tournament_name, report.total_trials);
    let mut by_win: Vec<_> = report.players.iter().collect();
    by_win.sort_by(|a, b| b.win_probability.total_cmp(&a.win_probability));
    for player in by_win.iter().take(8) {
        println!("  {:<24} win {:.1}%", player.name, player.win_probability * 100.0);
    }
    Ok(())
}

fn validate(format_path: &Path, state_path: &Path, settings_path: &Path) -> anyhow::Result<()> {
    let (format, state, settings) = load_inputs(format_path, state_path, settings_path)?;

    println!(
        "{}: {} rounds, {} players ({} active), next round {}",
        format.tournament_name,
        format.total_rounds(),
        state.players.len(),
        state.active_count(),
        state.next_round
    );
    println!(
        "settings: {} trials, {:.0}s budget, output {}",
        settings.number_of_sims,
        settings.duration_of_sim,
        settings.output_file.display()
    );
    Ok(())
}
