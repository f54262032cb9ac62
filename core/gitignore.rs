//! Hierarchical `.gitignore` matching and the hidden-entry policy.
//!
//! An [`IgnoreScope`] is an immutable chain of compiled matchers, one per
//! directory that carries a `.gitignore`, linked from the deepest directory
//! back to the filesystem root. Descending into a directory produces a new
//! scope that shares its parent's chain; dropping it releases the level.
//! Siblings therefore never observe each other's patterns.

use crate::error::Result;
use ignore::Match;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const GITIGNORE_FILENAME: &str = ".gitignore";
pub const VCS_DIR: &str = ".git";

#[derive(Debug)]
struct ScopeNode {
    dir: PathBuf,
    matcher: Arc<Gitignore>,
    parent: Option<Arc<ScopeNode>>,
}

#[derive(Debug, Clone, Default)]
pub struct IgnoreScope {
    head: Option<Arc<ScopeNode>>,
}

impl IgnoreScope {
    /// Deeper `.gitignore` files are consulted first; the first one with an
    /// opinion (ignore or `!` re-include) decides.
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        let mut node = self.head.as_deref();
        while let Some(current) = node {
            if path.starts_with(&current.dir) && path != current.dir {
                match current.matcher.matched_path_or_any_parents(path, is_dir) {
                    Match::Ignore(glob) => {
                        log::trace!(
                            "{} ignored by '{}' in {}",
                            path.display(),
                            glob.original(),
                            current.dir.display()
                        );
                        return true;
                    }
                    Match::Whitelist(glob) => {
                        log::trace!(
                            "{} re-included by '{}' in {}",
                            path.display(),
                            glob.original(),
                            current.dir.display()
                        );
                        return false;
                    }
                    Match::None => {}
                }
            }
            node = current.parent.as_deref();
        }
        false
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut node = self.head.as_deref();
        while let Some(current) = node {
            depth += 1;
            node = current.parent.as_deref();
        }
        depth
    }
}

#[derive(Debug, Default)]
pub struct GitignoreFilter {
    enabled: bool,
    cache: Mutex<HashMap<PathBuf, Option<Arc<Gitignore>>>>,
}

impl GitignoreFilter {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn descend(&self, scope: &IgnoreScope, dir: &Path) -> IgnoreScope {
        if !self.enabled {
            return IgnoreScope::default();
        }
        match self.load(dir) {
            Some(matcher) => IgnoreScope {
                head: Some(Arc::new(ScopeNode {
                    dir: dir.to_path_buf(),
                    matcher,
                    parent: scope.head.clone(),
                })),
            },
            None => scope.clone(),
        }
    }

    pub fn scope_for(&self, dir: &Path) -> IgnoreScope {
        if !self.enabled {
            return IgnoreScope::default();
        }
        let mut ancestors: Vec<&Path> = dir.ancestors().collect();
        ancestors.reverse();
        ancestors
            .into_iter()
            .fold(IgnoreScope::default(), |scope, ancestor| {
                self.descend(&scope, ancestor)
            })
    }

    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        if !self.enabled {
            return false;
        }
        match path.parent() {
            Some(parent) => self.scope_for(parent).is_ignored(path, is_dir),
            None => false,
        }
    }

    fn load(&self, dir: &Path) -> Option<Arc<Gitignore>> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = cache.get(dir) {
            return cached.clone();
        }
        let loaded = match compile(dir) {
            Ok(matcher) => matcher.map(Arc::new),
            Err(e) => {
                log::warn!(
                    "Error reading {} in {}: {}",
                    GITIGNORE_FILENAME,
                    dir.display(),
                    e
                );
                None
            }
        };
        cache.insert(dir.to_path_buf(), loaded.clone());
        loaded
    }
}

fn compile(dir: &Path) -> Result<Option<Gitignore>> {
    let file = dir.join(GITIGNORE_FILENAME);
    if !file.is_file() {
        return Ok(None);
    }
    let mut builder = GitignoreBuilder::new(dir);
    if let Some(err) = builder.add(&file) {
        log::warn!("Partially invalid {}: {}", file.display(), err);
    }
    let matcher = builder.build()?;
    log::debug!(
        "Loaded {} pattern(s) from {}",
        matcher.num_ignores() + matcher.num_whitelists(),
        file.display()
    );
    Ok(Some(matcher))
}

pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

pub fn is_vcs_dir(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == VCS_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::create_dir_all(root.join("b")).unwrap();
        fs::write(root.join(".gitignore"), "*.log\n").unwrap();
        fs::write(root.join("a/.gitignore"), "secret.txt\n!keep.log\n").unwrap();
        tmp
    }

    #[test]
    fn subdirectory_patterns_do_not_leak_to_siblings() {
        let tmp = setup();
        let root = tmp.path();
        let filter = GitignoreFilter::new(true);
        let root_scope = filter.scope_for(root);
        let a_scope = filter.descend(&root_scope, &root.join("a"));
        let b_scope = filter.descend(&root_scope, &root.join("b"));

        assert!(a_scope.is_ignored(&root.join("a/secret.txt"), false));
        assert!(!b_scope.is_ignored(&root.join("b/secret.txt"), false));
    }

    #[test]
    fn negation_reincludes_what_an_ancestor_ignores() {
        let tmp = setup();
        let root = tmp.path();
        let filter = GitignoreFilter::new(true);
        let root_scope = filter.scope_for(root);
        let a_scope = filter.descend(&root_scope, &root.join("a"));

        assert!(a_scope.is_ignored(&root.join("a/debug.log"), false));
        assert!(!a_scope.is_ignored(&root.join("a/keep.log"), false));
        assert!(root_scope.is_ignored(&root.join("top.log"), false));
    }

    #[test]
    fn directory_patterns_cover_nested_files() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("build/out")).unwrap();
        fs::write(root.join(".gitignore"), "build/\n").unwrap();
        let filter = GitignoreFilter::new(true);

        assert!(filter.is_ignored(&root.join("build"), true));
        assert!(filter.is_ignored(&root.join("build/out/app.bin"), false));
        assert!(!filter.is_ignored(&root.join("src.rs"), false));
    }

    #[test]
    fn disabled_filter_passes_everything() {
        let tmp = setup();
        let root = tmp.path();
        let filter = GitignoreFilter::new(false);
        let scope = filter.scope_for(&root.join("a"));

        assert_eq!(scope.depth(), 0);
        assert!(!scope.is_ignored(&root.join("a/secret.txt"), false));
        assert!(!filter.is_ignored(&root.join("x.log"), false));
    }

    #[test]
    fn dropping_a_child_scope_leaves_the_parent_intact() {
        let tmp = setup();
        let root = tmp.path();
        let filter = GitignoreFilter::new(true);
        let root_scope = filter.scope_for(root);
        let depth = root_scope.depth();
        {
            let child = filter.descend(&root_scope, &root.join("a"));
            assert_eq!(child.depth(), depth + 1);
        }
        assert_eq!(root_scope.depth(), depth);
        assert!(!root_scope.is_ignored(&root.join("a/secret.txt"), false));
    }

    #[test]
    fn hidden_names_start_with_a_dot() {
        assert!(is_hidden(Path::new("/x/.env")));
        assert!(!is_hidden(Path::new("/x/env")));
        assert!(is_vcs_dir(Path::new("/repo/.git")));
        assert!(!is_vcs_dir(Path::new("/repo/.github")));
    }
}
