use crate::error::Result;
use crate::output_formats::language_for_path;
use crate::plugin::Record;
use crate::tree;
use chrono::{DateTime, Utc};
#[cfg(feature = "serde_support")]
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde_support", derive(Serialize))]
#[cfg_attr(feature = "serde_support", serde(rename_all = "camelCase"))]
pub struct FileContextInfo {
    pub path: String,
    #[cfg_attr(
        feature = "serde_support",
        serde(skip_serializing_if = "str::is_empty")
    )]
    pub language: &'static str,
    #[cfg_attr(
        feature = "serde_support",
        serde(skip_serializing_if = "Option::is_none")
    )]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde_support", derive(Serialize))]
#[cfg_attr(feature = "serde_support", serde(rename_all = "camelCase"))]
pub struct SourceContext {
    pub absolute_code_path: String,
    pub source_tree: String,
    pub files: Vec<FileContextInfo>,
    #[cfg_attr(
        feature = "serde_support",
        serde(skip_serializing_if = "Option::is_none")
    )]
    pub generated_at: Option<DateTime<Utc>>,
}

impl SourceContext {
    /// Reads every record's content. Prefer [`SourceContext::paths_only`]
    /// plus [`Record::content`] when streaming.
    pub fn build(records: &[Box<dyn Record>], working_dir: &Path) -> Result<Self> {
        log::info!("Reading content for {} file(s)...", records.len());
        let mut context = Self::paths_only(records, working_dir)?;
        for (info, record) in context.files.iter_mut().zip(records) {
            info.content = record.content();
            if info.content.is_none() {
                log::warn!("Unreadable or binary file: {}", record.source());
            }
        }
        context.generated_at = Some(Utc::now());
        Ok(context)
    }

    pub fn paths_only(records: &[Box<dyn Record>], working_dir: &Path) -> Result<Self> {
        let sources: Vec<PathBuf> = records
            .iter()
            .map(|record| PathBuf::from(record.source()))
            .collect();
        let source_tree = tree::source_tree(&sources, working_dir)?;
        let files = sources
            .iter()
            .map(|source| FileContextInfo {
                path: display_path(source, working_dir),
                language: language_for_path(source),
                content: None,
            })
            .collect();
        Ok(Self {
            absolute_code_path: working_dir.to_string_lossy().into_owned(),
            source_tree,
            files,
            generated_at: None,
        })
    }

    pub fn unreadable_count(&self) -> usize {
        self.files.iter().filter(|f| f.content.is_none()).count()
    }
}

pub fn display_path(path: &Path, working_dir: &Path) -> String {
    match path.strip_prefix(working_dir) {
        Ok(relative) if !relative.as_os_str().is_empty() => {
            relative.to_string_lossy().into_owned()
        }
        _ => path.to_string_lossy().into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct StaticRecord {
        source: String,
        content: Option<&'static str>,
    }

    impl Record for StaticRecord {
        fn source(&self) -> &str {
            &self.source
        }

        fn content(&self) -> Option<String> {
            self.content.map(String::from)
        }
    }

    fn records() -> Vec<Box<dyn Record>> {
        vec![
            Box::new(StaticRecord {
                source: "/work/src/main.rs".to_string(),
                content: Some("fn main() {}"),
            }),
            Box::new(StaticRecord {
                source: "/opt/blob.bin".to_string(),
                content: None,
            }),
        ]
    }

    #[test]
    fn builds_context_with_content_and_languages() {
        let context = SourceContext::build(&records(), Path::new("/work")).unwrap();

        assert_eq!(context.absolute_code_path, "/work");
        assert_eq!(context.files[0].path, "src/main.rs");
        assert_eq!(context.files[0].language, "rust");
        assert_eq!(context.files[0].content.as_deref(), Some("fn main() {}"));
        assert_eq!(context.files[1].path, "/opt/blob.bin");
        assert_eq!(context.unreadable_count(), 1);
        assert!(context.generated_at.is_some());
    }

    #[test]
    fn paths_only_reads_nothing() {
        let context = SourceContext::paths_only(&records(), Path::new("/work")).unwrap();
        assert!(context.files.iter().all(|f| f.content.is_none()));
        assert!(context.source_tree.contains("main.rs"));
    }
}
