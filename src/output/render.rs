use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

use super::tables::{value_table, Column};
use crate::config::OutputFormat;

/// Where and how command results are written.
#[derive(Debug, Clone)]
pub struct OutputSettings {
    pub format: OutputFormat,
    pub pretty: bool,
    pub path: Option<PathBuf>,
}

impl OutputSettings {
    /// Writes `value` to the output file, or stdout when none is set.
    pub fn emit<T: Serialize + ?Sized>(&self, value: &T, columns: &[Column]) -> Result<()> {
        match &self.path {
            Some(path) => {
                let mut buffer = Vec::new();
                render(value, self.format, self.pretty, columns, &mut buffer)?;
                std::fs::write(path, buffer)
                    .with_context(|| format!("Failed to write output: {}", path.display()))?;
                info!("Output written to: {}", path.display());
            }
            None => {
                let stdout = std::io::stdout();
                render(value, self.format, self.pretty, columns, &mut stdout.lock())?;
            }
        }
        Ok(())
    }
}

/// Renders a result as JSON, YAML or a table.
pub fn render<T: Serialize + ?Sized>(
    value: &T,
    format: OutputFormat,
    pretty: bool,
    columns: &[Column],
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = if pretty {
                serde_json::to_string_pretty(value)?
            } else {
                serde_json::to_string(value)?
            };
            writeln!(output, "{json}")?;
        }
        OutputFormat::Yaml => {
            write!(output, "{}", serde_yaml::to_string(value)?)?;
        }
        OutputFormat::Table => {
            let table = value_table(&serde_json::to_value(value)?, columns);
            writeln!(output, "{table}")?;
        }
    }
    Ok(())
}
