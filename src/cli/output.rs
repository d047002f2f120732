//! Output formatting for CLI commands

use std::io::IsTerminal;

use serde::Serialize;

use crate::domain::PriorityTier;
pub use crate::storage::OutputFormat;

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
    color: bool,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        let color = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self { format, color }
    }

    /// Prints a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "status": "ok",
                        "message": message
                    })
                );
            }
        }
    }

    /// Prints a structured error body (JSON mode only)
    pub fn error_payload(&self, payload: &serde_json::Value) {
        if self.format == OutputFormat::Json {
            println!("{}", payload);
        }
    }

    /// Prints structured data
    pub fn data<T: Serialize>(&self, data: &T) {
        match self.format {
            OutputFormat::Text => {
                // Callers render text themselves; this is a pretty-printed fallback
                if let Ok(json) = serde_json::to_string_pretty(data) {
                    println!("{}", json);
                }
            }
            OutputFormat::Json => {
                if let Ok(json) = serde_json::to_string(data) {
                    println!("{}", json);
                }
            }
        }
    }

    /// Returns true if using JSON format
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Pads `text` to `width` and colors it by tier on terminals
    pub fn tier_cell(&self, tier: PriorityTier, text: &str, width: usize) -> String {
        let padded = format!("{:<width$}", text, width = width);
        if !self.color {
            return padded;
        }

        let code = match tier {
            PriorityTier::High => "31",
            PriorityTier::Medium => "33",
            PriorityTier::Low => "32",
        };
        format!("\x1b[{}m{}\x1b[0m", code, padded)
    }
}

/// Truncates a string to `max_len` characters, ending with "..." when cut
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
