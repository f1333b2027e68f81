//! Per-fixture evaluation: decide which styles apply, run the formatter
//! once per style and compare its output with the recorded expectation.

use crate::catalog::StyleCatalog;
use crate::diff::{unified_diff, value_lines};
use crate::domain::{
    FixtureOutcome, FixtureReport, RegressError, RegressResult, ResolutionWarning, StyleId,
    StyleRef, StyleVerdict, Verdict, WarningReason,
};
use crate::fixture::{Fixture, embedded_identifier, style_specific_outputs};
use crate::formatter::{CitationFormatter, FormatRequest, FormatterResult};
use crate::report::ReportSink;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const WARNINGS_FIELD: &str = "warnings";

/// What to do with a style-specific output whose identifier is not in the
/// catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownStylePolicy {
    /// Abandon the whole fixture, including outputs already recognized.
    #[default]
    AbortFixture,
    /// Warn about the unrecognized output and test the remaining ones.
    SkipStyle,
}

#[derive(Debug, Clone, Default)]
pub struct EvaluationOptions {
    pub quiet: bool,
    /// Passed to the formatter only if the file exists at invocation time.
    pub references_path: Option<PathBuf>,
    pub unknown_style_policy: UnknownStylePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStyle {
    pub style_id: StyleId,
    pub style_ref: StyleRef,
    pub expected_path: PathBuf,
}

impl ResolvedStyle {
    fn new(style: (&StyleId, &StyleRef), expected_path: PathBuf) -> Self {
        Self {
            style_id: style.0.clone(),
            style_ref: style.1.clone(),
            expected_path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved {
        styles: Vec<ResolvedStyle>,
        skipped_outputs: Vec<ResolutionWarning>,
    },
    Abandoned {
        warning: ResolutionWarning,
        skipped_outputs: Vec<ResolutionWarning>,
    },
}

/// Pairs each applicable style with the expected-output file it is checked
/// against.
pub fn resolve_styles(
    fixture: &Fixture,
    catalog: &StyleCatalog,
    policy: UnknownStylePolicy,
) -> Resolution {
    let generic_output = fixture.generic_output_path();
    let mut skipped_outputs = Vec::new();

    let styles = if !generic_output.exists() {
        if catalog.single().is_some() {
            return Resolution::Abandoned {
                warning: ResolutionWarning::NoOutputFile,
                skipped_outputs,
            };
        }

        let mut styles = Vec::new();
        for path in style_specific_outputs(fixture) {
            let warning = match embedded_identifier(&path) {
                Some(identifier) => match catalog.get(&identifier) {
                    Some(style) => {
                        styles.push(ResolvedStyle::new(style, path));
                        continue;
                    }
                    None => ResolutionWarning::UnknownStyle { identifier, path },
                },
                None => ResolutionWarning::MalformedIdentifier { path },
            };

            match policy {
                UnknownStylePolicy::AbortFixture => {
                    return Resolution::Abandoned {
                        warning,
                        skipped_outputs,
                    };
                }
                UnknownStylePolicy::SkipStyle => skipped_outputs.push(warning),
            }
        }
        styles
    } else if let Some(style) = catalog.single() {
        vec![ResolvedStyle::new(style, generic_output)]
    } else {
        embedded_identifier(&generic_output)
            .and_then(|identifier| catalog.get(&identifier))
            .map(|style| ResolvedStyle::new(style, generic_output.clone()))
            .into_iter()
            .collect()
    };

    if styles.is_empty() {
        return Resolution::Abandoned {
            warning: ResolutionWarning::NoStyles,
            skipped_outputs,
        };
    }

    Resolution::Resolved {
        styles,
        skipped_outputs,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("failed to read expected output '{}': {source}", .path.display())]
    ReadExpected {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse expected output '{}': {source}", .path.display())]
    ParseExpected {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("expected output '{}' must contain a JSON object", .path.display())]
    ExpectedNotAnObject { path: PathBuf },
}

impl From<EvaluationError> for RegressError {
    fn from(error: EvaluationError) -> Self {
        let message = error.to_string();
        match error {
            EvaluationError::ReadExpected { .. } => {
                RegressError::io_system("IO.EXPECTED_OUTPUT", message)
            }
            EvaluationError::ParseExpected { .. } | EvaluationError::ExpectedNotAnObject { .. } => {
                RegressError::input_validation("INPUT.EXPECTED_OUTPUT", message)
            }
        }
    }
}

/// Evaluates every applicable style of one fixture.
///
/// Test-level problems become verdicts and warnings on `sink`. Only an
/// unusable expected-output file or a formatter that cannot be started is
/// returned as an error.
pub fn evaluate_fixture<F, S>(
    fixture: &Fixture,
    catalog: &StyleCatalog,
    formatter: &F,
    options: &EvaluationOptions,
    sink: &mut S,
) -> RegressResult<FixtureReport>
where
    F: CitationFormatter + ?Sized,
    S: ReportSink + ?Sized,
{
    let (styles, skipped_outputs) =
        match resolve_styles(fixture, catalog, options.unknown_style_policy) {
            Resolution::Resolved {
                styles,
                skipped_outputs,
            } => {
                for warning in &skipped_outputs {
                    report_resolution_warning(fixture, warning, sink);
                }
                (styles, skipped_outputs)
            }
            Resolution::Abandoned {
                warning,
                skipped_outputs,
            } => {
                for skipped in &skipped_outputs {
                    report_resolution_warning(fixture, skipped, sink);
                }
                report_resolution_warning(fixture, &warning, sink);
                return Ok(FixtureReport {
                    fixture_path: fixture.path().to_path_buf(),
                    outcome: FixtureOutcome::Skipped(warning),
                    skipped_outputs,
                });
            }
        };

    debug!(
        fixture = %fixture.path().display(),
        styles = styles.len(),
        "resolved styles"
    );

    let mut verdicts = Vec::with_capacity(styles.len());
    for style in styles {
        let references = options
            .references_path
            .as_deref()
            .filter(|path| path.is_file());
        let verdict = evaluate_style(fixture, &style, references, formatter, options.quiet, sink)?;
        info!(
            fixture = %fixture.path().display(),
            style = %style.style_id,
            ?verdict,
            "evaluated style"
        );
        verdicts.push(StyleVerdict {
            style_id: style.style_id,
            style_ref: style.style_ref,
            expected_path: style.expected_path,
            verdict,
        });
    }

    Ok(FixtureReport {
        fixture_path: fixture.path().to_path_buf(),
        outcome: FixtureOutcome::Evaluated(verdicts),
        skipped_outputs,
    })
}

fn evaluate_style<F, S>(
    fixture: &Fixture,
    style: &ResolvedStyle,
    references: Option<&Path>,
    formatter: &F,
    quiet: bool,
    sink: &mut S,
) -> RegressResult<Verdict>
where
    F: CitationFormatter + ?Sized,
    S: ReportSink + ?Sized,
{
    let expected = load_expected_output(&style.expected_path)?;
    let output = formatter.format(&FormatRequest {
        style: &style.style_ref,
        fixture: fixture.path(),
        references,
    })?;

    let result = match FormatterResult::parse(&output.stdout) {
        Ok(result) => result,
        Err(error) => {
            sink.warning(&format!(
                "{}: [FORMAT.UNPARSABLE] style {} produced unparsable output ({}); stderr:\n{}",
                fixture.path().display(),
                style.style_id,
                error,
                output.stderr.trim_end()
            ));
            return Ok(Verdict::Warning {
                reason: WarningReason::UnparsableOutput {
                    stderr: output.stderr,
                },
            });
        }
    };

    if !result.warnings.is_empty() {
        for message in &result.warnings {
            sink.warning(&format!(
                "{}: [FORMAT.WARNING] style {}: {}",
                fixture.path().display(),
                style.style_id,
                message
            ));
        }
        return Ok(Verdict::Warning {
            reason: WarningReason::FormatterWarnings {
                messages: result.warnings,
            },
        });
    }

    for (key, expected_value) in &expected {
        let actual_value = if key == WARNINGS_FIELD {
            Value::from(result.warnings.clone())
        } else {
            result.field(key).cloned().unwrap_or(Value::Null)
        };
        if actual_value == *expected_value {
            continue;
        }

        if !quiet {
            sink.diff(&mismatch_report(style, key, expected_value, &actual_value));
        }
        return Ok(Verdict::Failure { key: key.clone() });
    }

    Ok(Verdict::Success)
}

// Values that differ but render to identical lines still get a report
// naming the field.
fn mismatch_report(
    style: &ResolvedStyle,
    key: &str,
    expected: &Value,
    actual: &Value,
) -> String {
    let from = style.expected_path.display().to_string();
    let to = format!("actual output from {}", style.style_ref);
    let diff = unified_diff(&value_lines(expected), &value_lines(actual), &from, &to);
    if !diff.is_empty() {
        return diff;
    }
    format!("--- {from}\n+++ {to}\n@@ field '{key}' differs: expected {expected}, got {actual} @@\n")
}

fn load_expected_output(path: &Path) -> Result<Map<String, Value>, EvaluationError> {
    let content = fs::read_to_string(path).map_err(|source| EvaluationError::ReadExpected {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: Value =
        serde_json::from_str(&content).map_err(|source| EvaluationError::ParseExpected {
            path: path.to_path_buf(),
            source,
        })?;
    match parsed {
        Value::Object(fields) => Ok(fields),
        _ => Err(EvaluationError::ExpectedNotAnObject {
            path: path.to_path_buf(),
        }),
    }
}

fn report_resolution_warning<S>(fixture: &Fixture, warning: &ResolutionWarning, sink: &mut S)
where
    S: ReportSink + ?Sized,
{
    sink.warning(&format!(
        "{}: [{}] {}",
        fixture.path().display(),
        warning.code(),
        warning
    ));
}
