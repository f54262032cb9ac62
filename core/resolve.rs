use crate::prefix_map::PrefixMap;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ResolutionContext<'a> {
    instruction_dir: PathBuf,
    working_dir: &'a Path,
    prefix_map: &'a PrefixMap,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(working_dir: &'a Path, prefix_map: &'a PrefixMap) -> Self {
        Self {
            instruction_dir: working_dir.to_path_buf(),
            working_dir,
            prefix_map,
        }
    }

    pub fn for_instruction_file(&self, instruction_file: &Path) -> Self {
        let dir = instruction_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.working_dir.to_path_buf());
        Self {
            instruction_dir: absolutize(&dir, self.working_dir),
            working_dir: self.working_dir,
            prefix_map: self.prefix_map,
        }
    }

    pub fn instruction_dir(&self) -> &Path {
        &self.instruction_dir
    }

    pub fn working_dir(&self) -> &Path {
        self.working_dir
    }

    pub fn prefix_map(&self) -> &PrefixMap {
        self.prefix_map
    }
}

/// Turns a raw reference into a normalized absolute path.
///
/// Returns `None` when the reference is neither relative (`./`, `../`),
/// absolute, nor covered by a prefix rule. Existence is not checked.
pub fn resolve(reference: &str, ctx: &ResolutionContext<'_>) -> Option<PathBuf> {
    if reference.is_empty() || reference.contains('\0') {
        return None;
    }

    let selected = if reference.starts_with("./") || reference.starts_with("../") {
        ctx.instruction_dir.join(reference)
    } else if Path::new(reference).is_absolute() {
        PathBuf::from(reference)
    } else if let Some((prefix, target)) = ctx.prefix_map.first_match(reference) {
        let remainder = reference[prefix.len()..].trim_start_matches('/');
        let mapped = if remainder.is_empty() {
            target.to_path_buf()
        } else {
            target.join(remainder)
        };
        log::trace!(
            "Reference '{}' mapped via prefix '{}' to {}",
            reference,
            prefix,
            mapped.display()
        );
        absolutize(&mapped, ctx.working_dir)
    } else {
        log::trace!("'{}' is not a path reference", reference);
        return None;
    };

    Some(normalize_lexically(&selected))
}

pub(crate) fn absolutize(path: &Path, working_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    }
}

pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let at_root = normalized
                    .components()
                    .next_back()
                    .is_none_or(|c| matches!(c, Component::RootDir | Component::Prefix(_)));
                if !at_root {
                    normalized.pop();
                }
            }
            Component::Normal(name) => normalized.push(name),
        }
    }
    normalized
}
