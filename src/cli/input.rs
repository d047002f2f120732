//! Reading task payloads from a file or stdin

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::domain::{AnalysisError, ValidationError};

/// Reads a JSON payload
///
/// `path` of `-` means stdin. With no path, stdin is read unless it is a
/// terminal. Returns `None` when nothing was supplied (a terminal, or blank
/// input). Malformed JSON is a validation error so callers can report it
/// like any other rejected batch.
pub fn read_payload(path: Option<&Path>) -> Result<Option<Value>> {
    let text = match path {
        Some(p) if p != Path::new("-") => {
            debug!(path = %p.display(), "reading payload from file");
            fs::read_to_string(p)
                .with_context(|| format!("Failed to read input file: {}", p.display()))?
        }
        Some(_) => read_stdin()?,
        None if io::stdin().is_terminal() => {
            debug!("stdin is a terminal, no payload supplied");
            return Ok(None);
        }
        None => read_stdin()?,
    };

    parse_payload_text(&text)
}

fn read_stdin() -> Result<String> {
    debug!("reading payload from stdin");
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read stdin")?;
    Ok(text)
}

/// Parses payload text, treating blank input as "nothing supplied"
pub fn parse_payload_text(text: &str) -> Result<Option<Value>> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    let value = serde_json::from_str(text).map_err(|e| {
        AnalysisError::from(ValidationError::Payload(format!("malformed JSON: {}", e)))
    })?;

    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn blank_text_is_no_payload() {
        assert_eq!(parse_payload_text("  \n").unwrap(), None);
    }

    #[test]
    fn malformed_json_is_validation_error() {
        let err = parse_payload_text("{ not json").unwrap_err();
        let analysis = err.downcast_ref::<AnalysisError>().unwrap();
        assert_eq!(analysis.kind(), "validation");
    }

    #[test]
    fn reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, r#"[{"title": "A"}]"#).unwrap();

        let value = read_payload(Some(&path)).unwrap().unwrap();
        assert_eq!(value[0]["title"], "A");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = read_payload(Some(&dir.path().join("absent.json")));
        assert!(result.is_err());
    }
}
