use anyhow::{Context, Result};
use detour_core::config::DetourConfig;
use owo_colors::OwoColorize;

pub fn run(init: bool) -> Result<()> {
    let path = DetourConfig::config_path()?;

    if init {
        if path.exists() {
            println!("{}", format!("  Config already exists: {}", path.display()).dimmed());
        } else {
            DetourConfig::create_default_config(&path)?;
            println!("{}", format!("  Created: {}", path.display()).green());
        }
    }

    let config = DetourConfig::load().context("Could not load config")?;

    println!("{} {}", "Config file:".bold(), path.display());
    if !path.exists() {
        println!("{}", "  (not created yet, run `detour config --init`)".dimmed());
    }
    println!();
    print!("{}", config.to_toml()?);

    Ok(())
}
