//! Output formatting for CLI commands

use crate::error::CwpError;
use colored::Colorize;
use serde::Serialize;
use std::fmt::Display;

/// Supported output formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON payload on stdout (default)
    #[default]
    Json,
    /// Human-readable table format
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            _ => Err(format!(
                "Unknown output format '{}'. Valid options: json, table",
                s
            )),
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
        }
    }
}

/// Output formatter for consistent CLI output
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print the structured result payload on stdout
    pub fn json<T: Serialize>(&self, data: &T) {
        match serde_json::to_string_pretty(data) {
            Ok(json) => println!("{}", json),
            Err(e) => self.warning(&format!("Failed to serialize to JSON: {}", e)),
        }
    }

    /// Print the `{error, code}` payload on stdout
    pub fn error(&self, err: &CwpError) {
        println!("{}", serde_json::json!(err.to_response()));
        if self.format == OutputFormat::Table {
            eprintln!("{} {}", "✗".red(), err);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print a simple key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Print a table header
    pub fn table_header(&self, columns: &[&str]) {
        let header: Vec<_> = columns.iter().map(|c| c.bold().to_string()).collect();
        println!("{}", header.join("  "));
        println!("{}", "-".repeat(columns.iter().map(|c| c.len() + 2).sum()));
    }

    /// Print a table row
    pub fn table_row(&self, values: &[&str]) {
        println!("{}", values.join("  "));
    }
}
