use console::style;
use serde::Serialize;
use std::fmt::Display;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

/// Output format mode
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Human,
    Json,
}

pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Human
            },
        }
    }

    /// Human-mode status line; JSON mode reports only the final result
    pub fn success(&self, message: impl Display) {
        if let OutputFormat::Human = self.format {
            println!("{} {}", style("✓").green().bold(), message);
        }
    }

    pub fn info(&self, message: impl Display) {
        if let OutputFormat::Human = self.format {
            println!("{} {}", style("ℹ").blue().bold(), message);
        }
    }

    pub fn warning(&self, message: impl Display) {
        match self.format {
            OutputFormat::Human => {
                eprintln!("{} {}", style("⚠").yellow().bold(), message);
            }
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "status": "warning",
                    "message": message.to_string(),
                });
                eprintln!("{}", output);
            }
        }
    }

    /// Rows as a rounded table; nothing in JSON mode, where rows travel in the result
    pub fn table<T: Tabled>(&self, data: &[T]) {
        if let OutputFormat::Human = self.format {
            if data.is_empty() {
                println!("{}", style("(no data)").dim());
            } else {
                let mut table = Table::new(data);
                table.with(Style::rounded());
                println!("{}", table);
            }
        }
    }

    /// A labelled numeric grid
    pub fn grid(&self, corner: &str, columns: &[String], rows: &[(String, Vec<f64>)]) {
        if let OutputFormat::Human = self.format {
            let mut builder = Builder::default();
            builder.push_record(std::iter::once(corner.to_string()).chain(columns.iter().cloned()));
            for (label, values) in rows {
                builder.push_record(
                    std::iter::once(label.clone()).chain(values.iter().map(|v| format!("{:.4}", v))),
                );
            }
            let mut table = builder.build();
            table.with(Style::rounded());
            println!("{}", table);
        }
    }

    /// Final command result; JSON mode wraps it as `{"status", "data"}`
    pub fn result<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if let OutputFormat::Json = self.format {
            let output = serde_json::json!({
                "status": "success",
                "data": data,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Ok(())
    }

    pub fn kv(&self, key: impl Display, value: impl Display) {
        if let OutputFormat::Human = self.format {
            println!("{}: {}", style(key).bold(), value);
        }
    }

    pub fn section(&self, title: impl Display) {
        if let OutputFormat::Human = self.format {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }
}
