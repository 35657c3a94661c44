//! Validate a combat config file and show what it resolves to.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use combat_content::ConfigLoader;
use combat_core::CombatConfig;
use console::style;

use crate::utils;

/// Load a combat config and print the effective values
#[derive(Parser)]
pub struct CheckConfig {
    /// TOML file to check (defaults to the bundled combat.toml)
    #[arg(value_name = "TOML")]
    path: Option<PathBuf>,

    /// Print the resolved config as JSON
    #[arg(long)]
    json: bool,
}

impl CheckConfig {
    pub fn execute(self) -> Result<()> {
        let path = self.path.unwrap_or_else(utils::default_config);
        let config = ConfigLoader::load(&path)?;

        if self.json {
            let json = serde_json::to_string_pretty(&config)
                .context("Failed to serialize config")?;
            println!("{json}");
            return Ok(());
        }

        println!("{} {}", style("Config:").bold().cyan(), path.display());
        print_config(&config);

        if config == CombatConfig::default() {
            println!("\n{}", style("All values match the defaults").dim());
        }
        Ok(())
    }
}

fn print_config(config: &CombatConfig) {
    let scheduler = &config.scheduler;
    println!("\n{}", style("[scheduler]").bold());
    println!("  order                 {}", scheduler.order);
    println!("  initiative_jitter     {}", scheduler.initiative_jitter);
    println!("  advance_on_force_end  {}", scheduler.advance_on_force_end);

    let phases = &config.phases;
    println!("\n{}", style("[phases]").bold());
    println!("  decision_timeout      {:?}", phases.decision_timeout());
    println!("  enemy_think           {:?}", phases.enemy_think());
    println!("  transition_hold       {:?}", phases.transition_hold());
    println!("  fixed_step            {:?}", phases.fixed_step());

    let runner = &config.runner;
    println!("\n{}", style("[runner]").bold());
    println!("  capacity              {}", runner.capacity);
    println!("  inter_action_delay    {:?}", runner.inter_action_delay());
    println!("  auto_execute          {}", runner.auto_execute);
    println!("  allow_cancel          {}", runner.allow_cancel);
    println!("  history_len           {}", runner.history_len);
}
