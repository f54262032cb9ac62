use anyhow::{Context, Result};
use fileprompt_core::{Record, SourceContext, output_formats};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::cli_args::FormatOutputOpts;

const UNREADABLE_PLACEHOLDER: &str = "[content unavailable: unreadable or not valid UTF-8]";

/// Writes the fixed text report, reading one file's content at a time.
/// `context` only needs paths; `records` must be in the same order.
/// Returns how many files had no readable content.
pub fn write_text_report<W: Write>(
    writer: &mut W,
    context: &SourceContext,
    records: &[Box<dyn Record>],
) -> Result<usize> {
    writeln!(writer, "Project Path: {}", context.absolute_code_path)?;
    writeln!(writer)?;
    writeln!(writer, "Source Tree:")?;
    writeln!(writer)?;
    writeln!(writer, "```")?;
    writeln!(writer, "{}", context.source_tree)?;
    writeln!(writer, "```")?;
    writeln!(writer)?;

    let mut unreadable = 0;
    for (info, record) in context.files.iter().zip(records) {
        let content = match info.content.clone().or_else(|| record.content()) {
            Some(content) => content,
            None => {
                log::warn!("Unreadable or binary file: {}", record.source());
                unreadable += 1;
                UNREADABLE_PLACEHOLDER.to_string()
            }
        };
        writeln!(writer, "`{}`:", info.path)?;
        writeln!(writer)?;
        writeln!(writer, "```{}", info.language)?;
        writer.write_all(content.as_bytes())?;
        if !content.ends_with('\n') {
            writeln!(writer)?;
        }
        writeln!(writer, "```")?;
        writeln!(writer)?;
    }
    writer.flush().context("Failed to flush report output")?;
    Ok(unreadable)
}

pub fn serialize_output<T: Serialize>(
    data: &T,
    format_opts: &FormatOutputOpts,
    xml_root: &str,
) -> Result<String> {
    let content = match format_opts.format.to_lowercase().as_str() {
        "yaml" | "yml" => output_formats::serialize_context_to_yaml(data)?,
        "xml" => output_formats::serialize_context_to_xml(data, xml_root, format_opts.pretty)?,
        _ => output_formats::serialize_context_to_json(data, format_opts.pretty)?,
    };
    Ok(content)
}

pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create file {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

pub fn write_content<W: Write + ?Sized>(writer: &mut W, content: &str) -> Result<()> {
    writer
        .write_all(content.as_bytes())
        .context("Failed to write output")?;
    if !content.ends_with('\n') {
        writer
            .write_all(b"\n")
            .context("Failed to write trailing newline")?;
    }
    writer.flush().context("Failed to flush output")?;
    Ok(())
}
