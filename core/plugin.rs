pub mod filesystem;

use std::fmt;
use std::path::Path;

pub use filesystem::{DirectoryRecord, FileRecord, FileSystemConfig, FileSystemPlugin};

pub trait Record: fmt::Debug {
    fn source(&self) -> &str;

    /// Fetched on every call; `None` for binary or unreadable sources.
    fn content(&self) -> Option<String>;

    fn local_path(&self) -> Option<&Path> {
        None
    }
}

pub trait RecordContainer: fmt::Debug {
    fn source(&self) -> &str;

    fn records(&self) -> Discoveries<'_>;
}

#[derive(Debug)]
pub enum Entry {
    Record(Box<dyn Record>),
    Container(Box<dyn RecordContainer>),
}

impl Entry {
    pub fn source(&self) -> &str {
        match self {
            Entry::Record(record) => record.source(),
            Entry::Container(container) => container.source(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Unresolved,
    Unreadable,
    Filtered,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SkipReason::Unresolved => "unresolved",
            SkipReason::Unreadable => "unreadable",
            SkipReason::Filtered => "filtered",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub reference: String,
    pub reason: SkipReason,
}

impl Skipped {
    pub fn new(reference: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            reference: reference.into(),
            reason,
        }
    }
}

impl fmt::Display for Skipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.reference, self.reason)
    }
}

pub type Discovery = Result<Entry, Skipped>;
pub type Discoveries<'a> = Box<dyn Iterator<Item = Discovery> + 'a>;

pub trait Plugin {
    fn name(&self) -> &str;

    fn create_record_if_can_handle(&self, source: &str) -> Option<Entry>;

    /// Expands a record into the entries it references. Records the plugin
    /// has nothing to say about yield an empty sequence.
    fn collect_records<'a>(&'a self, record: &'a dyn Record) -> Discoveries<'a>;
}

pub fn no_discoveries<'a>() -> Discoveries<'a> {
    Box::new(std::iter::empty())
}
