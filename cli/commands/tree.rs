use crate::cli_args::TreeArgs;
use crate::commands::{collect_inputs, report_missing_inputs};
use crate::load_config_for_command;
use crate::output;
use anyhow::{Context, Result};
use fileprompt_core::{Config, source_tree};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn handle_tree_command(args: TreeArgs, cancel: &Arc<AtomicBool>) -> Result<i32> {
    let collect = &args.collect;
    let working_dir = Config::determine_working_dir(collect.project_config.working_dir.as_ref())
        .context("Failed to determine working directory")?;

    let config = load_config_for_command(&working_dir, &collect.project_config, Some(collect))
        .context("Failed to load configuration")?;
    let collection = collect_inputs(&config, &working_dir, &collect.paths, cancel)?;

    let sources: Vec<&Path> = collection.sources().into_iter().map(Path::new).collect();
    let tree = source_tree(&sources, &working_dir).context("Failed to build source tree")?;
    if !tree.is_empty() {
        let mut writer = output::open_output(None)?;
        output::write_content(&mut *writer, &tree)?;
    }
    Ok(report_missing_inputs(&collection))
}
