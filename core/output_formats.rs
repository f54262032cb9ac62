use crate::error::Result;
use once_cell::sync::Lazy;
#[cfg(feature = "serde_support")]
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

static LANGUAGE_BY_EXTENSION: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("py", "python"),
        ("js", "javascript"),
        ("json", "json"),
        ("svg", "svg"),
        ("html", "html"),
        ("css", "css"),
        ("md", "markdown"),
        ("yaml", "yaml"),
        ("yml", "yaml"),
        ("sh", "bash"),
        ("bash", "bash"),
        ("rs", "rust"),
        ("go", "go"),
        ("java", "java"),
        ("cpp", "cpp"),
        ("c", "c"),
        ("ts", "typescript"),
        ("toml", "toml"),
    ])
});

pub fn language_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .and_then(|ext| LANGUAGE_BY_EXTENSION.get(ext.as_str()).copied())
        .unwrap_or("")
}

#[cfg(feature = "serde_support")]
pub fn serialize_context_to_json<T: Serialize>(data: &T, pretty: bool) -> Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(data)?)
    } else {
        Ok(serde_json::to_string(data)?)
    }
}

#[cfg(feature = "serde_support")]
pub fn serialize_context_to_yaml<T: Serialize>(data: &T) -> Result<String> {
    Ok(serde_yml::to_string(data)?)
}

#[cfg(feature = "serde_support")]
pub fn serialize_context_to_xml<T: Serialize>(
    data: &T,
    root_name: &str,
    pretty: bool,
) -> Result<String> {
    let mut buffer = String::new();
    let mut serializer = quick_xml::se::Serializer::with_root(&mut buffer, Some(root_name))?;
    if pretty {
        serializer.indent(' ', 2);
    }
    data.serialize(serializer)?;
    Ok(buffer)
}
