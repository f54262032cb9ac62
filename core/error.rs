use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("TOML Parsing Error: {0}")]
    TomlParse(String),

    #[error("TOML Serialization Error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[cfg(feature = "serde_support")]
    #[error("JSON Serialization Error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[cfg(feature = "serde_support")]
    #[error("YAML Serialization Error: {0}")]
    YamlError(#[from] serde_yml::Error),

    #[error("XML Serialization Error: {0}")]
    XmlSerialize(String),

    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File Read Error: Path '{path}', Error: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File Write Error: Path '{path}', Error: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Ignore Error: {0}")]
    Ignore(#[from] ignore::Error),

    #[error("Glob Pattern Error: {0}")]
    Glob(String),

    #[error("Invalid Argument: {0}")]
    InvalidArgument(String),

    #[error("Malformed prefix map entry '{entry}': {reason}")]
    MalformedPrefixMap { entry: String, reason: String },

    #[error("Input path not found: {0}")]
    InitialPathNotFound(String),

    #[error("Tree Error: {0}")]
    Tree(String),

    #[error("Collection cancelled")]
    Cancelled,
}

#[cfg(feature = "serde_support")]
impl From<quick_xml::se::SeError> for AppError {
    fn from(err: quick_xml::se::SeError) -> Self {
        AppError::XmlSerialize(err.to_string())
    }
}

impl From<globset::Error> for AppError {
    fn from(err: globset::Error) -> Self {
        AppError::Glob(format!("Globset error: {}", err))
    }
}
