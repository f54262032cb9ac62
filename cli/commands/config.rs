use anyhow::{Context, Result};
use colored::*;
use fileprompt_core::config::{DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILENAME};
use fileprompt_core::{AppError, Config};
use std::fs;
use std::path::Path;

use crate::cli_args::ConfigArgs;
use crate::output;

pub fn handle_config_command(args: &ConfigArgs, working_dir: &Path, quiet: bool) -> Result<()> {
    let content = Config::default()
        .to_toml_string()
        .context("Failed to render default configuration")?;

    if !args.save {
        let mut writer = output::open_output(None)?;
        return output::write_content(&mut *writer, &content);
    }

    let config_dir = working_dir.join(DEFAULT_CONFIG_DIR);
    let save_path = config_dir.join(DEFAULT_CONFIG_FILENAME);
    if save_path.exists() && !args.force {
        anyhow::bail!(AppError::InvalidArgument(format!(
            "Config file '{}' already exists. Use --force to overwrite.",
            save_path.display()
        )));
    }

    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create directory {}", config_dir.display()))?;
    fs::write(&save_path, &content).map_err(|e| AppError::FileWrite {
        path: save_path.clone(),
        source: e,
    })?;

    if !quiet {
        println!(
            "{} Default config saved to: {}",
            "✅".green(),
            save_path.display().to_string().blue()
        );
    }
    Ok(())
}
