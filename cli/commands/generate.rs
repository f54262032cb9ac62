use crate::cli_args::GenerateArgs;
use crate::commands::{collect_inputs, report_missing_inputs};
use crate::load_config_for_command;
use crate::output;
use anyhow::{Context, Result};
use colored::Colorize;
use fileprompt_core::{Config, SourceContext};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn handle_generate_command(
    args: GenerateArgs,
    quiet: bool,
    cancel: &Arc<AtomicBool>,
) -> Result<i32> {
    let collect = &args.collect;
    let working_dir = Config::determine_working_dir(collect.project_config.working_dir.as_ref())
        .context("Failed to determine working directory")?;
    log::info!("Working directory determined: {}", working_dir.display());

    let config = load_config_for_command(&working_dir, &collect.project_config, Some(collect))
        .context("Failed to load configuration")?;
    let collection = collect_inputs(&config, &working_dir, &collect.paths, cancel)?;

    let mut writer = output::open_output(args.output.as_deref())?;
    if args.format_output.format == "text" {
        let context = SourceContext::paths_only(&collection.records, &working_dir)
            .context("Failed to build source tree")?;
        let unreadable = output::write_text_report(&mut writer, &context, &collection.records)?;
        if unreadable > 0 {
            log::warn!("{} file(s) could not be read as text.", unreadable);
        }
    } else {
        log::debug!("Building full context for {} output...", args.format_output.format);
        let context = SourceContext::build(&collection.records, &working_dir)
            .context("Failed to build source context")?;
        let content = output::serialize_output(&context, &args.format_output, "SourceContext")?;
        output::write_content(&mut *writer, &content)?;
    }
    drop(writer);

    if let Some(path) = &args.output {
        if !quiet {
            println!(
                "{} Report saved to: {}",
                "✅".green(),
                path.display().to_string().blue()
            );
        }
    }
    Ok(report_missing_inputs(&collection))
}
