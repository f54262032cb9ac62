use crate::collector::{CollectorOptions, DEFAULT_MAX_DEPTH};
use crate::error::{AppError, Result};
use crate::plugin::FileSystemConfig;
use crate::plugin::filesystem::DEFAULT_INSTRUCTION_EXTENSION;
use crate::prefix_map::{PrefixMap, default_prefix_map_entries};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_DIR: &str = ".xtools/fileprompt";
pub const DEFAULT_CONFIG_FILENAME: &str = "fileprompt.toml";
pub const WORKING_DIR_ENV: &str = "FILEPROMPT_ROOT";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub instructions: InstructionsConfig,
    #[serde(default)]
    pub resolve: ResolveConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    #[serde(default = "default_true")]
    pub use_gitignore: bool,
    #[serde(default)]
    pub show_hidden: bool,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct FiltersConfig {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InstructionsConfig {
    #[serde(default = "default_instruction_extensions")]
    pub extensions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ResolveConfig {
    /// Ordered `prefix=target` entries; the first matching prefix wins.
    #[serde(default = "default_prefix_map_entries")]
    pub prefix_map: Vec<String>,
}

fn default_true() -> bool {
    true
}
fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}
fn default_instruction_extensions() -> Vec<String> {
    vec![DEFAULT_INSTRUCTION_EXTENSION.to_string()]
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            use_gitignore: default_true(),
            show_hidden: false,
            max_depth: default_max_depth(),
        }
    }
}
impl Default for InstructionsConfig {
    fn default() -> Self {
        Self {
            extensions: default_instruction_extensions(),
        }
    }
}
impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            prefix_map: default_prefix_map_entries(),
        }
    }
}

impl Config {
    pub fn determine_working_dir(cli_working_dir: Option<&PathBuf>) -> Result<PathBuf> {
        let path_str_opt = cli_working_dir
            .map(|p| p.to_string_lossy().to_string())
            .or_else(|| env::var(WORKING_DIR_ENV).ok().filter(|s| !s.is_empty()));

        let path_to_resolve = match path_str_opt {
            Some(p_str) => PathBuf::from(shellexpand::tilde(&p_str).as_ref()),
            None => env::current_dir().map_err(AppError::Io)?,
        };

        path_to_resolve.canonicalize().map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to canonicalize working directory '{}': {}",
                    path_to_resolve.display(),
                    e
                ),
            ))
        })
    }

    pub fn resolve_config_path(
        working_dir: &Path,
        cli_config_file: Option<&String>,
        cli_disable_config: bool,
    ) -> Result<Option<PathBuf>> {
        if cli_disable_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        let Some(p_str) = cli_config_file else {
            let default_path = working_dir
                .join(DEFAULT_CONFIG_DIR)
                .join(DEFAULT_CONFIG_FILENAME);
            if default_path.exists() {
                log::debug!("Using default config file path: {}", default_path.display());
                return Ok(Some(default_path));
            }
            log::debug!(
                "No config file specified and default not found at: {}",
                default_path.display()
            );
            return Ok(None);
        };

        let mut path = PathBuf::from(shellexpand::tilde(p_str).as_ref());
        let looks_like_path =
            path.is_absolute() || path.components().count() > 1 || p_str.contains(['/', '\\']);

        if looks_like_path {
            if !path.exists() && path.extension().is_none() {
                path.set_extension("toml");
            }
            if !path.exists() {
                return Err(AppError::Config(format!(
                    "Specified config file not found at path: {}",
                    path.display()
                )));
            }
            log::debug!("Using specified config file path: {}", path.display());
            return Ok(Some(path));
        }

        let filename = if path.extension().is_none_or(|e| e != "toml") {
            format!("{}.toml", path.to_string_lossy())
        } else {
            path.to_string_lossy().to_string()
        };
        let config_dir = working_dir.join(DEFAULT_CONFIG_DIR);
        let full_path = config_dir.join(filename);
        if !full_path.exists() {
            return Err(AppError::Config(format!(
                "Specified config file '{}' not found in default directory: {}",
                path.display(),
                config_dir.display()
            )));
        }
        log::debug!(
            "Using specified config filename in default directory: {}",
            full_path.display()
        );
        Ok(Some(full_path))
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&toml_content).map_err(|e| match e {
            AppError::TomlParse(msg) => AppError::TomlParse(format!(
                "Error parsing config file '{}': {}",
                config_path.display(),
                msg
            )),
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str::<Config>(content).map_err(|e| {
            AppError::TomlParse(format!("{}. Check TOML syntax and structure.", e))
        })
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Parses `resolve.prefix_map`. Malformed entries are reported here,
    /// before any traversal starts.
    pub fn prefix_map(&self) -> Result<PrefixMap> {
        PrefixMap::parse(&self.resolve.prefix_map)
    }

    pub fn filesystem_config(&self, working_dir: &Path) -> Result<FileSystemConfig> {
        let extensions = self
            .instructions
            .extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();
        Ok(FileSystemConfig {
            working_dir: working_dir.to_path_buf(),
            instruction_extensions: extensions,
            prefix_map: self.prefix_map()?,
            use_gitignore: self.general.use_gitignore,
            show_hidden: self.general.show_hidden,
        })
    }

    pub fn collector_options(&self) -> Result<CollectorOptions> {
        if self.general.max_depth == 0 {
            return Err(AppError::InvalidArgument(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(CollectorOptions {
            include: self.filters.include.clone(),
            exclude: self.filters.exclude.clone(),
            max_depth: self.general.max_depth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_options() {
        let config = Config::default();
        assert!(config.general.use_gitignore);
        assert!(!config.general.show_hidden);
        assert_eq!(config.general.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.instructions.extensions, vec!["txt"]);
        assert_eq!(config.resolve.prefix_map, vec!["google3=."]);
        assert!(config.filters.include.is_empty());
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_fields() {
        let config = Config::from_toml_str(
            r#"
            [general]
            show_hidden = true

            [resolve]
            prefix_map = ["lib=./vendor"]
            "#,
        )
        .unwrap();
        assert!(config.general.show_hidden);
        assert!(config.general.use_gitignore);
        assert_eq!(config.resolve.prefix_map, vec!["lib=./vendor"]);
        assert_eq!(config.instructions.extensions, vec!["txt"]);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = Config::from_toml_str("[general]\nfollow_links = true\n").unwrap_err();
        assert!(matches!(err, AppError::TomlParse(_)));
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let rendered = Config::default().to_toml_string().unwrap();
        assert_eq!(Config::from_toml_str(&rendered).unwrap(), Config::default());
    }

    #[test]
    fn malformed_prefix_map_fails_before_traversal() {
        let mut config = Config::default();
        config.resolve.prefix_map = vec!["no-equals-sign".to_string()];
        assert!(matches!(
            config.filesystem_config(Path::new("/work")),
            Err(AppError::MalformedPrefixMap { .. })
        ));
    }

    #[test]
    fn instruction_extensions_are_normalized() {
        let mut config = Config::default();
        config.instructions.extensions =
            vec![".md".to_string(), " txt ".to_string(), String::new()];
        let fs_config = config.filesystem_config(Path::new("/work")).unwrap();
        assert_eq!(fs_config.instruction_extensions, vec!["md", "txt"]);
    }

    #[test]
    fn zero_max_depth_is_invalid() {
        let mut config = Config::default();
        config.general.max_depth = 0;
        assert!(matches!(
            config.collector_options(),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn resolves_default_and_named_config_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        assert_eq!(Config::resolve_config_path(root, None, false).unwrap(), None);

        let config_dir = root.join(DEFAULT_CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(DEFAULT_CONFIG_FILENAME), "").unwrap();
        fs::write(config_dir.join("strict.toml"), "").unwrap();

        assert_eq!(
            Config::resolve_config_path(root, None, false).unwrap(),
            Some(config_dir.join(DEFAULT_CONFIG_FILENAME))
        );
        assert_eq!(
            Config::resolve_config_path(root, Some(&"strict".to_string()), false).unwrap(),
            Some(config_dir.join("strict.toml"))
        );
        assert_eq!(Config::resolve_config_path(root, None, true).unwrap(), None);
        assert!(Config::resolve_config_path(root, Some(&"missing".to_string()), false).is_err());
    }

    #[test]
    fn explicit_working_dir_is_canonicalized() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a");
        fs::create_dir(&nested).unwrap();
        let given = nested.join("..").join("a");
        let resolved = Config::determine_working_dir(Some(&given)).unwrap();
        assert_eq!(resolved, nested.canonicalize().unwrap());
    }
}
