//! Ordered `prefix=target` rewrite rules for symbolic path references.
//!
//! Rules are consulted in configuration order and the first rule whose
//! prefix matches a whole leading segment of the reference wins. A longer,
//! more specific prefix listed after a shorter one is never reached for
//! references the shorter one already covers.

use crate::error::{AppError, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_ROOT_ALIAS: &str = "google3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRule {
    pub prefix: String,
    pub target: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PrefixMap {
    rules: Vec<PrefixRule>,
}

pub fn default_prefix_map_entries() -> Vec<String> {
    vec![format!("{}=.", DEFAULT_ROOT_ALIAS)]
}

impl PrefixMap {
    /// Parses `prefix=target` entries. Any malformed entry fails the whole map.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
        let rules = entries
            .iter()
            .map(|entry| parse_entry(entry.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        log::debug!("Parsed prefix map with {} rule(s)", rules.len());
        Ok(Self { rules })
    }

    pub fn first_match(&self, reference: &str) -> Option<(&str, &Path)> {
        self.rules
            .iter()
            .find(|rule| matches_leading_segment(reference, &rule.prefix))
            .map(|rule| (rule.prefix.as_str(), rule.target.as_path()))
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.prefix.as_str())
    }

    pub fn rules(&self) -> &[PrefixRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn matches_leading_segment(reference: &str, prefix: &str) -> bool {
    match reference.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn parse_entry(entry: &str) -> Result<PrefixRule> {
    let malformed = |reason: &str| AppError::MalformedPrefixMap {
        entry: entry.to_string(),
        reason: reason.to_string(),
    };

    let (prefix, target) = entry
        .split_once('=')
        .ok_or_else(|| malformed("expected 'prefix=path'"))?;
    let prefix = prefix.trim().trim_end_matches('/');
    let target = target.trim();

    if prefix.is_empty() {
        return Err(malformed("prefix is empty"));
    }
    if target.is_empty() {
        return Err(malformed("target path is empty"));
    }
    if prefix.starts_with('/') || prefix.starts_with('.') {
        return Err(malformed(
            "prefix must be a symbolic name, not an absolute or relative path",
        ));
    }

    let target = PathBuf::from(shellexpand::tilde(target).as_ref());
    log::trace!("Prefix rule: '{}' -> {}", prefix, target.display());
    Ok(PrefixRule {
        prefix: prefix.to_string(),
        target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_in_order() {
        let map = PrefixMap::parse(&["lib=./vendor", "lib/special=./special"]).unwrap();
        let prefixes: Vec<&str> = map.prefixes().collect();
        assert_eq!(prefixes, vec!["lib", "lib/special"]);
        assert_eq!(map.rules()[0].target, PathBuf::from("./vendor"));
    }

    #[test]
    fn first_configured_rule_wins_over_longer_prefix() {
        let map = PrefixMap::parse(&["lib=./vendor", "lib/special=./special"]).unwrap();
        let (prefix, target) = map.first_match("lib/special/x.txt").unwrap();
        assert_eq!(prefix, "lib");
        assert_eq!(target, Path::new("./vendor"));
    }

    #[test]
    fn prefix_must_match_whole_segment() {
        let map = PrefixMap::parse(&["lib=./vendor"]).unwrap();
        assert!(map.first_match("library/x.txt").is_none());
        assert!(map.first_match("lib/x.txt").is_some());
        assert!(map.first_match("lib").is_some());
    }

    #[test]
    fn trailing_slash_on_prefix_is_ignored() {
        let map = PrefixMap::parse(&["src/=."]).unwrap();
        assert_eq!(map.rules()[0].prefix, "src");
    }

    #[test]
    fn rejects_malformed_entries() {
        for bad in ["no-separator", "=./x", "lib=", "/abs=./x", "./rel=./x"] {
            let err = PrefixMap::parse(&[bad]).unwrap_err();
            assert!(
                matches!(err, AppError::MalformedPrefixMap { .. }),
                "expected malformed error for {bad:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn default_entries_alias_root_to_working_dir() {
        let map = PrefixMap::parse(&default_prefix_map_entries()).unwrap();
        let (prefix, target) = map.first_match("google3/foo/bar.rs").unwrap();
        assert_eq!(prefix, DEFAULT_ROOT_ALIAS);
        assert_eq!(target, Path::new("."));
    }
}
