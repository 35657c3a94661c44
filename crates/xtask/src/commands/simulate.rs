//! Headless encounter simulation.
//!
//! Loads a roster and a combat config, lets seeded scripted providers play
//! both sides, and prints the event log as the encounter unfolds.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use combat_content::{ConfigLoader, RosterLoader, build_roster};
use combat_core::{ActionEvent, CombatConfig, Participant, PhaseEvent, TurnEvent};
use combat_runtime::{Event, Runtime, RuntimeConfig, ScriptedProvider, Topic};
use console::style;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::utils;

/// Run a headless encounter with scripted decisions
#[derive(Parser)]
pub struct Simulate {
    /// RON roster file (defaults to the bundled roster.ron)
    #[arg(short, long, value_name = "RON")]
    roster: Option<PathBuf>,

    /// TOML combat config (defaults to built-in values)
    #[arg(short, long, value_name = "TOML")]
    config: Option<PathBuf>,

    /// Seed for initiative jitter and scripted hit rolls
    #[arg(short, long, default_value_t = 7)]
    seed: u64,

    /// Give up after this many rounds
    #[arg(long, default_value_t = 20)]
    max_rounds: u32,

    /// Probability that a scripted swing lands
    #[arg(long, default_value_t = 0.6)]
    hit_chance: f64,

    /// Simulated seconds per wall-clock second
    #[arg(long, default_value_t = 50.0)]
    time_scale: f32,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// One readable line per notification
    Text,
    /// One JSON object per notification
    Json,
}

impl Simulate {
    pub fn execute(self) -> Result<()> {
        tokio::runtime::Runtime::new()
            .context("Failed to start tokio runtime")?
            .block_on(self.execute_async())
    }

    async fn execute_async(self) -> Result<()> {
        let roster_path = self.roster.clone().unwrap_or_else(utils::default_roster);
        let entries = RosterLoader::load(&roster_path)?;
        let combat = match &self.config {
            Some(path) => ConfigLoader::load(path)?,
            None => CombatConfig::default(),
        };

        let roster = build_roster(&entries);
        let participants = roster.iter().map(|p| p.as_participant());

        let config = RuntimeConfig {
            combat,
            tick_interval: Duration::from_millis(2),
            time_scale: self.time_scale,
            seed: Some(self.seed),
            ..RuntimeConfig::default()
        };

        let runtime = Runtime::builder()
            .config(config)
            .roster(participants)
            .player_provider(
                ScriptedProvider::new(roster.clone(), self.seed).with_hit_chance(self.hit_chance),
            )
            .ai_provider(
                ScriptedProvider::new(roster.clone(), self.seed.wrapping_add(1))
                    .with_hit_chance(self.hit_chance),
            )
            .build()
            .await?;

        if matches!(self.format, OutputFormat::Text) {
            println!(
                "{} {} ({} participants, seed {})",
                style("Roster:").bold().cyan(),
                roster_path.display(),
                roster.len(),
                self.seed
            );
        }

        let printer = spawn_printer(&runtime, self.format);
        let result = runtime.run_until_finished(Some(self.max_rounds)).await;
        runtime.shutdown().await?;
        printer.await.context("Event printer failed")?;

        let outcome = result.context("Encounter did not finish")?;
        if matches!(self.format, OutputFormat::Text) {
            println!("\n{} {}", style("Outcome:").bold().cyan(), style(outcome).bold());
            for participant in &roster {
                let status = if participant.is_alive() {
                    style("standing").green()
                } else {
                    style("down").red()
                };
                println!(
                    "  {:<16} {:<7} turns {:>2}  {}",
                    participant.name(),
                    participant.controller(),
                    participant.turns_started(),
                    status
                );
            }
        }
        Ok(())
    }
}

/// Prints every notification until the runtime shuts down.
fn spawn_printer(runtime: &Runtime, format: OutputFormat) -> JoinHandle<()> {
    let mut turns = runtime.subscribe(Topic::Turn);
    let mut phases = runtime.subscribe(Topic::Phase);
    let mut actions = runtime.subscribe(Topic::Action);

    tokio::spawn(async move {
        // Open flags per topic: turn, phase, action.
        let mut open = [true; 3];
        while open.iter().any(|o| *o) {
            let (slot, received) = tokio::select! {
                event = turns.recv(), if open[0] => (0, event),
                event = phases.recv(), if open[1] => (1, event),
                event = actions.recv(), if open[2] => (2, event),
            };
            match received {
                Ok(event) => print_event(&event, format),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event printer lagged");
                }
                Err(RecvError::Closed) => open[slot] = false,
            }
        }
    })
}

fn print_event(event: &Event, format: OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(error) => tracing::warn!(%error, "Failed to serialize event"),
        },
        OutputFormat::Text => {
            if let Some(line) = describe(event) {
                println!("{line}");
            }
        }
    }
}

fn describe(event: &Event) -> Option<String> {
    let line = match event {
        Event::Turn(TurnEvent::TurnStarted(turn)) => format!(
            "{} round {} {} ({}, initiative {:.1})",
            style("turn").yellow(),
            turn.round,
            style(&turn.name).bold(),
            turn.controller,
            turn.initiative
        ),
        Event::Turn(TurnEvent::TurnEnded(turn)) => format!(
            "{} {} after {} action(s)",
            style("end ").yellow(),
            turn.name,
            turn.actions_performed
        ),
        Event::Turn(TurnEvent::RoundCompleted { round }) => {
            format!("{} round {round} complete", style("----").dim())
        }
        Event::Turn(TurnEvent::QueueUpdated { .. }) => return None,
        Event::Phase(PhaseEvent::Changed { from, to }) => {
            format!("{} {from} -> {to}", style("phase").blue())
        }
        Event::Phase(PhaseEvent::HoldElapsed { .. }) => return None,
        Event::Action(ActionEvent::Started(tag)) => {
            format!("{} {} [{}]", style("act ").green(), tag.name, tag.category)
        }
        Event::Action(ActionEvent::Completed(tag)) => {
            format!("{} {}", style("done").green(), tag.name)
        }
        Event::Action(ActionEvent::Failed { action, reason }) => {
            format!("{} {}: {reason}", style("fail").red(), action.name)
        }
        Event::Action(ActionEvent::Cancelled(tag)) => {
            format!("{} {}", style("stop").red(), tag.name)
        }
        Event::Action(
            ActionEvent::Queued(_) | ActionEvent::QueueCleared { .. } | ActionEvent::QueueEmpty,
        ) => return None,
    };
    Some(line)
}
