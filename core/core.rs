pub mod collector;
pub mod config;
pub mod context;
pub mod error;
pub mod filters;
pub mod gitignore;
pub mod instructions;
pub mod output_formats;
pub mod plugin;
pub mod prefix_map;
pub mod resolve;
pub mod tree;

pub use collector::{CollectStats, Collection, Collector, CollectorOptions};
pub use config::Config;
pub use context::{FileContextInfo, SourceContext};
pub use error::{AppError, Result};
pub use instructions::InstructionParser;
pub use output_formats::language_for_path;
pub use plugin::{
    DirectoryRecord, Entry, FileRecord, FileSystemConfig, FileSystemPlugin, Plugin, Record,
    RecordContainer, SkipReason, Skipped,
};
pub use prefix_map::PrefixMap;
pub use resolve::{ResolutionContext, resolve};
pub use tree::{TreeNode, source_tree};
