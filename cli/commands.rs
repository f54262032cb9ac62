pub mod completion;
pub mod config;
pub mod generate;
pub mod tree;

use anyhow::{Context, Result};
use colored::*;
use fileprompt_core::{Collection, Collector, Config};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub fn install_cancel_handler() -> Arc<AtomicBool> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        log::warn!("Could not install Ctrl-C handler: {}", e);
    }
    cancel
}

pub fn collect_inputs(
    config: &Config,
    working_dir: &Path,
    paths: &[String],
    cancel: &Arc<AtomicBool>,
) -> Result<Collection> {
    let fs_config = config
        .filesystem_config(working_dir)
        .context("Invalid reference-following configuration")?;
    let options = config
        .collector_options()
        .context("Invalid collection options")?;
    let collector = Collector::filesystem(fs_config, &options)
        .context("Failed to set up the file collector")?
        .with_cancel_flag(Arc::clone(cancel));
    log::debug!("Active plugins: {:?}", collector.plugin_names());

    let collection = collector
        .collect(paths)
        .context("Failed to collect files")?;

    let stats = &collection.stats;
    if stats.skipped() > 0 {
        log::warn!(
            "{} reference(s) skipped: {} unresolved, {} unreadable, {} beyond max depth.",
            stats.skipped(),
            stats.unresolved,
            stats.unreadable,
            stats.depth_limited
        );
    }
    log::info!(
        "Collected {} file(s) ({} duplicate(s), {} filtered, {} excluded).",
        stats.emitted,
        stats.duplicates,
        stats.filtered,
        stats.excluded
    );
    if collection.records.is_empty() {
        log::warn!("No files found matching the specified criteria");
    }
    Ok(collection)
}

pub fn report_missing_inputs(collection: &Collection) -> i32 {
    for missing in &collection.missing_inputs {
        eprintln!("{} {}", "Error:".red().bold(), missing);
    }
    if collection.missing_inputs.is_empty() {
        0
    } else {
        crate::EXIT_MISSING_INPUT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fileprompt_core::AppError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn raised_cancel_flag_aborts_collection() {
        let tmp = TempDir::new().unwrap();
        let root = fs::canonicalize(tmp.path()).unwrap();
        fs::write(root.join("a.rs"), "").unwrap();
        let cancel = Arc::new(AtomicBool::new(true));

        let err = collect_inputs(&Config::default(), &root, &[".".to_string()], &cancel)
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::Cancelled)
        ));
        assert_eq!(crate::exit_code_for(&err), 130);
    }

    #[test]
    fn lowered_cancel_flag_collects_normally() {
        let tmp = TempDir::new().unwrap();
        let root = fs::canonicalize(tmp.path()).unwrap();
        fs::write(root.join("a.rs"), "").unwrap();
        let cancel = Arc::new(AtomicBool::new(false));

        let collection =
            collect_inputs(&Config::default(), &root, &[".".to_string()], &cancel).unwrap();

        assert_eq!(collection.records.len(), 1);
    }
}
