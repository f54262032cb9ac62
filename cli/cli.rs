mod cli_args;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use std::path::Path;
use std::process;

use cli_args::{Cli, CollectArgs, Commands, ProjectConfigOpts};
use fileprompt_core::{AppError, Config};

pub const EXIT_MISSING_INPUT: i32 = 2;

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);

    let quiet = cli_args.quiet;

    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(cli_args, quiet) {
        Ok(code) => {
            log::info!("Application finished with code {}.", code);
            code
        }
        Err(e) => {
            let exit_code = exit_code_for(&e);
            if !quiet || exit_code == 1 || exit_code == 5 {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
            } else {
                log::error!("Application failed: {:#}", e);
            }
            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn exit_code_for(e: &anyhow::Error) -> i32 {
    match e.downcast_ref::<AppError>() {
        Some(AppError::Config(_))
        | Some(AppError::TomlParse(_))
        | Some(AppError::TomlSerialize(_))
        | Some(AppError::MalformedPrefixMap { .. }) => 1,
        Some(AppError::Io(_))
        | Some(AppError::FileRead { .. })
        | Some(AppError::FileWrite { .. })
        | Some(AppError::Ignore(_))
        | Some(AppError::Glob(_))
        | Some(AppError::InitialPathNotFound(_)) => EXIT_MISSING_INPUT,
        Some(AppError::InvalidArgument(_)) => 5,
        Some(AppError::JsonSerialize(_))
        | Some(AppError::YamlError(_))
        | Some(AppError::XmlSerialize(_)) => 6,
        Some(AppError::Cancelled) => 130,
        Some(_) => 1,
        None => 1,
    }
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn run_app(cli: Cli, quiet: bool) -> Result<i32> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(0);
    };
    match command {
        Commands::Generate(args) => {
            log::debug!("Executing 'generate' command...");
            let cancel = commands::install_cancel_handler();
            commands::generate::handle_generate_command(args, quiet, &cancel)
        }
        Commands::Tree(args) => {
            log::debug!("Executing 'tree' command...");
            let cancel = commands::install_cancel_handler();
            commands::tree::handle_tree_command(args, &cancel)
        }
        Commands::Completion(args) => {
            log::debug!("Executing 'completion' command...");
            commands::completion::handle_completion_command(&args)?;
            Ok(0)
        }
        Commands::Config(args) => {
            log::debug!("Executing 'config' command...");
            let working_dir = Config::determine_working_dir(args.working_dir.as_ref())
                .context("Failed to determine working directory for config command")?;
            commands::config::handle_config_command(&args, &working_dir, quiet)?;
            Ok(0)
        }
    }
}

fn merge_config_with_cli_overrides(mut config: Config, args: &CollectArgs) -> Config {
    log::trace!("Applying CLI overrides to config...");

    if args.ignore_toggles.no_gitignore {
        config.general.use_gitignore = false;
    }
    if args.ignore_toggles.gitignore {
        config.general.use_gitignore = true;
    }
    if args.ignore_toggles.show_hidden {
        config.general.show_hidden = true;
    }
    if args.ignore_toggles.ignore_hidden {
        config.general.show_hidden = false;
    }
    if let Some(max_depth) = args.resolve.max_depth {
        config.general.max_depth = max_depth;
    }

    if !args.filters.include.is_empty() {
        config.filters.include = args.filters.include.clone();
    }
    if !args.filters.exclude.is_empty() {
        config.filters.exclude = args.filters.exclude.clone();
    }
    if !args.resolve.instruction_ext.is_empty() {
        config.instructions.extensions = args.resolve.instruction_ext.clone();
    }
    if !args.resolve.prefix_map.is_empty() {
        config.resolve.prefix_map = args.resolve.prefix_map.clone();
    }

    log::trace!("Config after CLI overrides: {:?}", config);
    config
}

pub fn load_config_for_command(
    working_dir: &Path,
    project_opts: &ProjectConfigOpts,
    collect_args: Option<&CollectArgs>,
) -> Result<Config> {
    let config_path = Config::resolve_config_path(
        working_dir,
        project_opts.config_file.as_ref(),
        project_opts.no_config_file,
    )
    .context("Failed to resolve configuration path")?;

    let config = match &config_path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    Ok(match collect_args {
        Some(args) => merge_config_with_cli_overrides(config, args),
        None => config,
    })
}
