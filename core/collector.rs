use crate::error::{AppError, Result};
use crate::filters::PathFilter;
use crate::plugin::{
    Discoveries, Entry, FileSystemConfig, FileSystemPlugin, Plugin, Record, SkipReason,
};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorOptions {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub max_depth: usize,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    pub emitted: usize,
    pub duplicates: usize,
    pub unresolved: usize,
    pub unreadable: usize,
    pub filtered: usize,
    pub excluded: usize,
    pub depth_limited: usize,
}

impl CollectStats {
    pub fn skipped(&self) -> usize {
        self.unresolved + self.unreadable + self.depth_limited
    }
}

#[derive(Debug)]
pub struct Collection {
    pub records: Vec<Box<dyn Record>>,
    pub stats: CollectStats,
    pub missing_inputs: Vec<AppError>,
}

impl Collection {
    pub fn sources(&self) -> Vec<&str> {
        self.records.iter().map(|record| record.source()).collect()
    }
}

#[derive(Debug, Default)]
struct ExplorationState {
    seen: HashSet<String>,
}

impl ExplorationState {
    fn visit(&mut self, key: &str) -> bool {
        self.seen.insert(key.to_string())
    }
}

pub struct Collector {
    plugins: Vec<Box<dyn Plugin>>,
    filter: PathFilter,
    max_depth: usize,
    cancel: Option<Arc<AtomicBool>>,
}

impl Collector {
    pub fn new(
        plugins: Vec<Box<dyn Plugin>>,
        options: &CollectorOptions,
        working_dir: &Path,
    ) -> Result<Self> {
        if plugins.is_empty() {
            return Err(AppError::Config(
                "Collector needs at least one plugin".to_string(),
            ));
        }
        Ok(Self {
            plugins,
            filter: PathFilter::new(&options.include, &options.exclude, working_dir)?,
            max_depth: options.max_depth,
            cancel: None,
        })
    }

    pub fn filesystem(config: FileSystemConfig, options: &CollectorOptions) -> Result<Self> {
        let working_dir = config.working_dir.clone();
        Self::new(
            vec![Box::new(FileSystemPlugin::new(config))],
            options,
            &working_dir,
        )
    }

    /// Checked once per processed entry; setting it aborts the run.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|plugin| plugin.name()).collect()
    }

    pub fn collect<S: AsRef<str>>(&self, initial: &[S]) -> Result<Collection> {
        log::info!("Collecting from {} input path(s)...", initial.len());
        let mut state = ExplorationState::default();
        let mut stats = CollectStats::default();
        let mut missing_inputs = Vec::new();
        let mut seeds = Vec::new();

        for source in initial {
            let source = source.as_ref();
            match self.dispatch(source) {
                Some(entry) => {
                    if state.visit(entry.source()) {
                        seeds.push(entry);
                    } else {
                        log::debug!("Duplicate input path skipped: {}", source);
                        stats.duplicates += 1;
                    }
                }
                None => {
                    log::error!("Input path not found: {}", source);
                    missing_inputs.push(AppError::InitialPathNotFound(source.to_string()));
                }
            }
        }

        let mut stack: Vec<(Entry, usize)> = Vec::new();
        push_in_order(&mut stack, seeds, 0);
        let mut records: Vec<Box<dyn Record>> = Vec::new();

        while let Some((entry, depth)) = stack.pop() {
            self.check_cancelled()?;
            match entry {
                Entry::Container(container) => {
                    log::trace!("Expanding container: {}", container.source());
                    let children =
                        self.admit(container.records(), depth + 1, &mut state, &mut stats);
                    push_in_order(&mut stack, children, depth + 1);
                }
                Entry::Record(record) => {
                    if !self.filter.allows(record.source()) {
                        stats.excluded += 1;
                        continue;
                    }
                    let mut discovered = Vec::new();
                    for plugin in &self.plugins {
                        let found = self.admit(
                            plugin.collect_records(record.as_ref()),
                            depth + 1,
                            &mut state,
                            &mut stats,
                        );
                        discovered.extend(found);
                    }
                    log::trace!("Emitting record: {}", record.source());
                    stats.emitted += 1;
                    records.push(record);
                    push_in_order(&mut stack, discovered, depth + 1);
                }
            }
        }

        log::info!(
            "Collection complete: {} record(s), {} duplicate(s), {} unresolved, {} unreadable, {} filtered, {} excluded.",
            stats.emitted,
            stats.duplicates,
            stats.unresolved,
            stats.unreadable,
            stats.filtered,
            stats.excluded
        );
        Ok(Collection {
            records,
            stats,
            missing_inputs,
        })
    }

    fn dispatch(&self, source: &str) -> Option<Entry> {
        self.plugins.iter().find_map(|plugin| {
            let entry = plugin.create_record_if_can_handle(source)?;
            log::debug!("Plugin '{}' claimed {}", plugin.name(), source);
            Some(entry)
        })
    }

    fn admit(
        &self,
        discoveries: Discoveries<'_>,
        depth: usize,
        state: &mut ExplorationState,
        stats: &mut CollectStats,
    ) -> Vec<Entry> {
        let mut admitted = Vec::new();
        for discovery in discoveries {
            match discovery {
                Ok(entry) => {
                    if depth > self.max_depth {
                        log::warn!(
                            "Depth limit {} reached, not following {}",
                            self.max_depth,
                            entry.source()
                        );
                        stats.depth_limited += 1;
                    } else if state.visit(entry.source()) {
                        admitted.push(entry);
                    } else {
                        log::trace!("Already explored: {}", entry.source());
                        stats.duplicates += 1;
                    }
                }
                Err(skipped) => {
                    log::debug!("Skipped reference {}", skipped);
                    match skipped.reason {
                        SkipReason::Unresolved => stats.unresolved += 1,
                        SkipReason::Unreadable => stats.unreadable += 1,
                        SkipReason::Filtered => stats.filtered += 1,
                    }
                }
            }
        }
        admitted
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => {
                log::warn!("Collection cancelled; discarding partial results.");
                Err(AppError::Cancelled)
            }
            _ => Ok(()),
        }
    }
}

// Reversed so entries pop in discovery order: references follow their instruction file.
fn push_in_order(stack: &mut Vec<(Entry, usize)>, entries: Vec<Entry>, depth: usize) {
    stack.extend(entries.into_iter().rev().map(|entry| (entry, depth)));
}
