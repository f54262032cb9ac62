use crate::error::{AppError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PathFilter {
    include: GlobSet,
    exclude: GlobSet,
    has_includes: bool,
    working_dir: PathBuf,
}

impl PathFilter {
    pub fn new(include: &[String], exclude: &[String], working_dir: &Path) -> Result<Self> {
        log::trace!("Building glob sets for filtering...");
        Ok(Self {
            include: build_glob_set_from_vec(include)?,
            exclude: build_glob_set_from_vec(exclude)?,
            has_includes: !include.is_empty(),
            working_dir: working_dir.to_path_buf(),
        })
    }

    pub fn allows(&self, source: &str) -> bool {
        let path = Path::new(source);
        let name = path.file_name().map(Path::new);
        let relative = pathdiff::diff_paths(path, &self.working_dir)
            .filter(|rel| !rel.starts_with(".."))
            .unwrap_or_else(|| path.to_path_buf());

        let matches = |set: &GlobSet| {
            set.is_match(&relative) || name.is_some_and(|name| set.is_match(name))
        };

        if matches(&self.exclude) {
            log::trace!("Path excluded by explicit exclude set: {}", source);
            return false;
        }
        if self.has_includes && !matches(&self.include) {
            log::trace!("Path not included by explicit include set: {}", source);
            return false;
        }
        true
    }
}

fn build_glob_set_from_vec(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern_str in patterns {
        let mut processed_pattern = pattern_str.trim().to_string();
        if processed_pattern.ends_with('/') && processed_pattern.len() > 1 {
            processed_pattern.push_str("**");
        }
        match Glob::new(&processed_pattern) {
            Ok(glob) => {
                log::trace!(
                    "Adding glob pattern: {} (processed as {})",
                    pattern_str,
                    processed_pattern
                );
                builder.add(glob);
            }
            Err(e) => {
                log::error!("Invalid glob pattern \"{}\": {}", pattern_str, e);
                return Err(AppError::Glob(format!(
                    "Invalid glob pattern \"{}\" (processed as \"{}\"): {}",
                    pattern_str, processed_pattern, e
                )));
            }
        }
    }
    builder.build().map_err(|e| {
        log::error!("Error building glob set: {}", e);
        AppError::Glob(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_filter_allows_everything() {
        let filter = PathFilter::new(&[], &[], Path::new("/work")).unwrap();
        assert!(filter.allows("/work/src/main.rs"));
        assert!(filter.allows("/elsewhere/x.bin"));
    }

    #[test]
    fn include_patterns_match_name_or_relative_path() {
        let filter =
            PathFilter::new(&strings(&["*.py", "docs/**"]), &[], Path::new("/work")).unwrap();
        assert!(filter.allows("/work/pkg/main.py"));
        assert!(filter.allows("/work/docs/guide.md"));
        assert!(!filter.allows("/work/src/main.rs"));
    }

    #[test]
    fn exclude_takes_precedence_over_include() {
        let filter = PathFilter::new(
            &strings(&["*.py"]),
            &strings(&["test_*.py"]),
            Path::new("/work"),
        )
        .unwrap();
        assert!(filter.allows("/work/src/app.py"));
        assert!(!filter.allows("/work/src/test_app.py"));
    }

    #[test]
    fn trailing_slash_excludes_a_whole_directory() {
        let filter = PathFilter::new(&[], &strings(&["vendor/"]), Path::new("/work")).unwrap();
        assert!(!filter.allows("/work/vendor/lib/x.rs"));
        assert!(filter.allows("/work/src/x.rs"));
    }

    #[test]
    fn invalid_glob_is_reported() {
        let err = PathFilter::new(&strings(&["a[b"]), &[], Path::new("/work")).unwrap_err();
        assert!(matches!(err, AppError::Glob(_)));
    }
}
