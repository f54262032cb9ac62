use super::{
    Discoveries, Discovery, Entry, Plugin, Record, RecordContainer, SkipReason, Skipped,
    no_discoveries,
};
use crate::gitignore::{GitignoreFilter, IgnoreScope, is_hidden, is_vcs_dir};
use crate::instructions::InstructionParser;
use crate::prefix_map::PrefixMap;
use crate::resolve::{ResolutionContext, absolutize, resolve};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_INSTRUCTION_EXTENSION: &str = "txt";

#[derive(Debug, Clone)]
pub struct FileSystemConfig {
    pub working_dir: PathBuf,
    pub instruction_extensions: Vec<String>,
    pub prefix_map: PrefixMap,
    pub use_gitignore: bool,
    pub show_hidden: bool,
}

impl FileSystemConfig {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            instruction_extensions: vec![DEFAULT_INSTRUCTION_EXTENSION.to_string()],
            prefix_map: PrefixMap::default(),
            use_gitignore: true,
            show_hidden: false,
        }
    }
}

#[derive(Debug)]
struct Shared {
    config: FileSystemConfig,
    gitignore: GitignoreFilter,
    parser: InstructionParser,
}

impl Shared {
    fn is_instruction_file(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.config
            .instruction_extensions
            .iter()
            .any(|wanted| wanted.trim_start_matches('.') == ext)
    }

    fn make_entry(self: &Arc<Self>, canonical: PathBuf, is_dir: bool, scope: IgnoreScope) -> Entry {
        if is_dir {
            Entry::Container(Box::new(DirectoryRecord {
                source: canonical.to_string_lossy().into_owned(),
                path: canonical,
                scope,
                shared: Arc::clone(self),
            }))
        } else {
            Entry::Record(Box::new(FileRecord::new(canonical)))
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileSystemPlugin {
    shared: Arc<Shared>,
}

impl FileSystemPlugin {
    pub fn new(config: FileSystemConfig) -> Self {
        let parser = InstructionParser::new(config.prefix_map.prefixes().map(String::from));
        let gitignore = GitignoreFilter::new(config.use_gitignore);
        Self {
            shared: Arc::new(Shared {
                config,
                gitignore,
                parser,
            }),
        }
    }

    pub fn config(&self) -> &FileSystemConfig {
        &self.shared.config
    }

    pub fn is_instruction_file(&self, path: &Path) -> bool {
        self.shared.is_instruction_file(path)
    }

    fn entry_for_reference(&self, reference: &str, ctx: &ResolutionContext<'_>) -> Discovery {
        let shared = &self.shared;
        let Some(path) = resolve(reference, ctx) else {
            return Err(Skipped::new(reference, SkipReason::Unresolved));
        };
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                log::debug!("Reference '{}' -> {}: {}", reference, path.display(), e);
                return Err(Skipped::new(reference, SkipReason::Unresolved));
            }
        };
        let is_dir = metadata.is_dir();

        if !shared.config.show_hidden && is_hidden(&path) {
            log::trace!("Skipping hidden reference: {}", path.display());
            return Err(Skipped::new(reference, SkipReason::Filtered));
        }
        if is_dir && is_vcs_dir(&path) {
            return Err(Skipped::new(reference, SkipReason::Filtered));
        }
        if shared.gitignore.is_ignored(&path, is_dir) {
            log::trace!("Skipping gitignored reference: {}", path.display());
            return Err(Skipped::new(reference, SkipReason::Filtered));
        }

        let canonical = fs::canonicalize(&path).map_err(|e| {
            log::debug!("Cannot canonicalize {}: {}", path.display(), e);
            Skipped::new(reference, SkipReason::Unreadable)
        })?;
        let scope = if is_dir {
            shared.gitignore.scope_for(&canonical)
        } else {
            IgnoreScope::default()
        };
        Ok(shared.make_entry(canonical, is_dir, scope))
    }
}

impl Plugin for FileSystemPlugin {
    fn name(&self) -> &str {
        "filesystem"
    }

    fn create_record_if_can_handle(&self, source: &str) -> Option<Entry> {
        if source.is_empty() || source.contains('\0') {
            return None;
        }
        let path = absolutize(Path::new(source), &self.shared.config.working_dir);
        let canonical = match fs::canonicalize(&path) {
            Ok(canonical) => canonical,
            Err(e) => {
                log::debug!("Filesystem plugin cannot handle '{}': {}", source, e);
                return None;
            }
        };
        let is_dir = canonical.is_dir();
        let scope = if is_dir {
            self.shared.gitignore.scope_for(&canonical)
        } else {
            IgnoreScope::default()
        };
        Some(self.shared.make_entry(canonical, is_dir, scope))
    }

    fn collect_records<'a>(&'a self, record: &'a dyn Record) -> Discoveries<'a> {
        let Some(path) = record.local_path() else {
            return no_discoveries();
        };
        if !self.shared.is_instruction_file(path) {
            return no_discoveries();
        }
        let Some(content) = record.content() else {
            log::warn!("Could not read instruction file: {}", path.display());
            return Box::new(std::iter::once(Err(Skipped::new(
                record.source(),
                SkipReason::Unreadable,
            ))));
        };

        let config = &self.shared.config;
        let ctx = ResolutionContext::new(&config.working_dir, &config.prefix_map)
            .for_instruction_file(path);
        let references: Vec<String> = self
            .shared
            .parser
            .extract_references(&content)
            .map(String::from)
            .collect();
        log::debug!(
            "Instruction file {} yielded {} reference(s)",
            path.display(),
            references.len()
        );
        Box::new(
            references
                .into_iter()
                .map(move |reference| self.entry_for_reference(&reference, &ctx)),
        )
    }
}

#[derive(Debug, Clone)]
pub struct FileRecord {
    source: String,
    path: PathBuf,
}

impl FileRecord {
    pub fn new(path: PathBuf) -> Self {
        Self {
            source: path.to_string_lossy().into_owned(),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Record for FileRecord {
    fn source(&self) -> &str {
        &self.source
    }

    fn content(&self) -> Option<String> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::debug!("Error reading file {}: {}", self.path.display(), e);
                return None;
            }
        };
        match String::from_utf8(bytes) {
            Ok(content) => Some(content),
            Err(e) => {
                log::debug!("Skipping non-UTF-8 file: {} ({})", self.path.display(), e);
                None
            }
        }
    }

    fn local_path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

#[derive(Debug)]
pub struct DirectoryRecord {
    source: String,
    path: PathBuf,
    scope: IgnoreScope,
    shared: Arc<Shared>,
}

enum Child {
    Dir(PathBuf),
    File(PathBuf),
    Skip(Skipped),
    Vcs,
}

impl DirectoryRecord {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn classify(&self, path: PathBuf) -> Child {
        let config = &self.shared.config;
        let label = || path.to_string_lossy().into_owned();

        if !config.show_hidden && is_hidden(&path) {
            log::trace!("Skipping hidden entry: {}", path.display());
            return Child::Skip(Skipped::new(label(), SkipReason::Filtered));
        }
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!("Cannot stat {}: {}", path.display(), e);
                return Child::Skip(Skipped::new(label(), SkipReason::Unreadable));
            }
        };
        let is_dir = metadata.is_dir();
        if is_dir && is_vcs_dir(&path) {
            return Child::Vcs;
        }
        if self.scope.is_ignored(&path, is_dir) {
            return Child::Skip(Skipped::new(label(), SkipReason::Filtered));
        }
        match fs::canonicalize(&path) {
            Ok(canonical) if is_dir => Child::Dir(canonical),
            Ok(canonical) => Child::File(canonical),
            Err(e) => {
                log::warn!("Cannot canonicalize {}: {}", path.display(), e);
                Child::Skip(Skipped::new(label(), SkipReason::Unreadable))
            }
        }
    }
}

impl RecordContainer for DirectoryRecord {
    fn source(&self) -> &str {
        &self.source
    }

    /// Children in file-name order. Classification runs in parallel but is
    /// collected back in index order.
    fn records(&self) -> Discoveries<'_> {
        let listing = match fs::read_dir(&self.path) {
            Ok(listing) => listing,
            Err(e) => {
                log::warn!("Cannot list directory {}: {}", self.path.display(), e);
                return Box::new(std::iter::once(Err(Skipped::new(
                    self.source.clone(),
                    SkipReason::Unreadable,
                ))));
            }
        };
        let mut children: Vec<PathBuf> = listing
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    log::warn!("Error reading entry in {}: {}", self.path.display(), e);
                    None
                }
            })
            .collect();
        children.sort();
        log::trace!(
            "Listing {} entries in {}",
            children.len(),
            self.path.display()
        );

        let classified: Vec<Child> = children
            .into_par_iter()
            .map(|child| self.classify(child))
            .collect();

        let discoveries = classified.into_iter().filter_map(move |child| match child {
            Child::Dir(canonical) => {
                let scope = self.shared.gitignore.descend(&self.scope, &canonical);
                Some(Ok(self.shared.make_entry(canonical, true, scope)))
            }
            Child::File(canonical) => Some(Ok(self.shared.make_entry(
                canonical,
                false,
                IgnoreScope::default(),
            ))),
            Child::Skip(skipped) => Some(Err(skipped)),
            Child::Vcs => None,
        });
        Box::new(discoveries)
    }
}
