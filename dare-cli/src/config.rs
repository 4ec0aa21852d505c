//! Effective settings: config file and environment, then command-line flags.

use anyhow::{Context, Result};
use dare_core::Settings;

use crate::Cli;

/// Load settings and apply flag overrides.
pub fn effective_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load().context("Failed to load dare configuration")?;
    apply_flags(&mut settings, cli);
    Ok(settings)
}

fn apply_flags(settings: &mut Settings, cli: &Cli) {
    if let Some(model) = &cli.model {
        settings.model = model.clone();
    }
    if let Some(max_tokens) = cli.max_tokens {
        settings.max_tokens = Some(max_tokens);
    }
    if cli.no_stream {
        settings.no_stream = true;
    }
    if let Some(dir) = &cli.output_dir {
        settings.output_dir = dir.clone();
    }
}

/// Print the effective settings as TOML (for --show-config).
pub fn show_config(settings: &Settings) -> Result<()> {
    match Settings::config_path() {
        Some(path) if path.exists() => println!("# config file: {}", path.display()),
        Some(path) => println!("# config file: {} (not found, using defaults)", path.display()),
        None => println!("# config file: none"),
    }
    print!("{}", settings.to_toml()?);
    Ok(())
}
