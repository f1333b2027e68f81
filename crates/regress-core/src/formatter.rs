//! Boundary to the external citation formatter.

use crate::domain::{RegressError, StyleRef};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

pub const DEFAULT_FORMATTER_PROGRAM: &str = "citeproc";

#[derive(Debug, Clone, Copy)]
pub struct FormatRequest<'a> {
    pub style: &'a StyleRef,
    pub fixture: &'a Path,
    pub references: Option<&'a Path>,
}

impl FormatRequest<'_> {
    /// `[--references <path>] --style <style-ref> <fixture-path>`
    pub fn arguments(&self) -> Vec<OsString> {
        let mut arguments = Vec::with_capacity(5);
        if let Some(references) = self.references {
            arguments.push(OsString::from("--references"));
            arguments.push(references.as_os_str().to_os_string());
        }
        arguments.push(OsString::from("--style"));
        arguments.push(OsString::from(self.style.as_str()));
        arguments.push(self.fixture.as_os_str().to_os_string());
        arguments
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatterOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Anything that can format a fixture with a style and hand back the
/// captured output streams.
pub trait CitationFormatter {
    fn format(&self, request: &FormatRequest<'_>) -> Result<FormatterOutput, FormatterError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FormatterError {
    #[error("failed to execute formatter '{}': {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<FormatterError> for RegressError {
    fn from(error: FormatterError) -> Self {
        RegressError::io_system("IO.FORMATTER_SPAWN", error.to_string())
    }
}

/// Runs the formatter as a child process and waits for it to exit.
#[derive(Debug, Clone)]
pub struct ProcessFormatter {
    program: PathBuf,
}

impl ProcessFormatter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for ProcessFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_FORMATTER_PROGRAM)
    }
}

impl CitationFormatter for ProcessFormatter {
    fn format(&self, request: &FormatRequest<'_>) -> Result<FormatterOutput, FormatterError> {
        let arguments = request.arguments();
        debug!(
            program = %self.program.display(),
            ?arguments,
            "invoking formatter"
        );

        let output = Command::new(&self.program)
            .args(&arguments)
            .output()
            .map_err(|source| FormatterError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        debug!(status = %output.status, "formatter exited");
        Ok(FormatterOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Parsed formatter standard output.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FormatterResult {
    #[serde(default, deserialize_with = "deserialize_warnings")]
    pub warnings: Vec<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl FormatterResult {
    pub fn parse(stdout: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(stdout)
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

// `null` means no warnings; non-string entries are kept as their JSON text.
fn deserialize_warnings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let warnings = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.into_iter().map(warning_message).collect(),
        Some(other) => vec![warning_message(other)],
    };
    Ok(warnings)
}

fn warning_message(value: Value) -> String {
    match value {
        Value::String(message) => message,
        other => other.to_string(),
    }
}
