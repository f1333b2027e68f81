pub mod errors;

pub use errors::{RegressError, RegressErrorCategory, RegressResult};

use std::borrow::Borrow;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Short token naming a citation style, e.g. `apa`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleId(String);

impl StyleId {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self(identifier.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for StyleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Display for StyleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Style path or name handed to the formatter's `--style` argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StyleRef(String);

impl StyleRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StyleRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningReason {
    UnparsableOutput { stderr: String },
    FormatterWarnings { messages: Vec<String> },
}

/// Outcome of one (fixture, style) test. Exactly one of the three counters
/// moves per verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Failure { key: String },
    Warning { reason: WarningReason },
}

/// Reason a fixture, or one of its style-specific outputs, was not tested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionWarning {
    NoOutputFile,
    UnknownStyle { identifier: String, path: PathBuf },
    MalformedIdentifier { path: PathBuf },
    NoStyles,
}

impl ResolutionWarning {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoOutputFile => "RESOLVE.NO_OUTPUT",
            Self::UnknownStyle { .. } => "RESOLVE.UNKNOWN_STYLE",
            Self::MalformedIdentifier { .. } => "RESOLVE.MALFORMED_STYLE",
            Self::NoStyles => "RESOLVE.NO_STYLES",
        }
    }
}

impl Display for ResolutionWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoOutputFile => f.write_str("no output file matching this fixture"),
            Self::UnknownStyle { identifier, path } => write!(
                f,
                "unknown style '{}' in output file '{}'",
                identifier,
                path.display()
            ),
            Self::MalformedIdentifier { path } => write!(
                f,
                "cannot determine style identifier of output file '{}'",
                path.display()
            ),
            Self::NoStyles => f.write_str("no styles found for this fixture"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleVerdict {
    pub style_id: StyleId,
    pub style_ref: StyleRef,
    pub expected_path: PathBuf,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureOutcome {
    Skipped(ResolutionWarning),
    Evaluated(Vec<StyleVerdict>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureReport {
    pub fixture_path: PathBuf,
    pub outcome: FixtureOutcome,
    /// Unrecognized style-specific outputs passed over under the lenient
    /// unknown-style policy.
    pub skipped_outputs: Vec<ResolutionWarning>,
}

impl FixtureReport {
    pub fn skipped(fixture_path: &Path, warning: ResolutionWarning) -> Self {
        Self {
            fixture_path: fixture_path.to_path_buf(),
            outcome: FixtureOutcome::Skipped(warning),
            skipped_outputs: Vec::new(),
        }
    }

    pub fn verdicts(&self) -> &[StyleVerdict] {
        match &self.outcome {
            FixtureOutcome::Skipped(_) => &[],
            FixtureOutcome::Evaluated(verdicts) => verdicts,
        }
    }

    pub fn tally(&self) -> FixtureTally {
        let mut tally = match &self.outcome {
            FixtureOutcome::Skipped(_) => FixtureTally {
                warnings: 1,
                ..FixtureTally::default()
            },
            FixtureOutcome::Evaluated(verdicts) => {
                let mut tally = FixtureTally::default();
                for style in verdicts {
                    tally.record(&style.verdict);
                }
                tally
            }
        };
        tally.warnings += self.skipped_outputs.len();
        tally
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixtureTally {
    pub tests_run: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub warnings: usize,
}

impl FixtureTally {
    fn record(&mut self, verdict: &Verdict) {
        self.tests_run += 1;
        match verdict {
            Verdict::Success => self.succeeded += 1,
            Verdict::Failure { .. } => self.failed += 1,
            Verdict::Warning { .. } => self.warnings += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunTotals {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub warnings: usize,
}

impl RunTotals {
    pub fn add(&mut self, tally: FixtureTally) {
        self.attempted += tally.tests_run;
        self.succeeded += tally.succeeded;
        self.failed += tally.failed;
        self.warnings += tally.warnings;
    }

    pub const fn is_clean(&self) -> bool {
        self.failed == 0 && self.warnings == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{
        FixtureOutcome, FixtureReport, FixtureTally, ResolutionWarning, RunTotals, StyleId,
        StyleRef, StyleVerdict, Verdict, WarningReason,
    };
    use std::path::{Path, PathBuf};

    fn style_verdict(id: &str, verdict: Verdict) -> StyleVerdict {
        StyleVerdict {
            style_id: StyleId::new(id),
            style_ref: StyleRef::new(format!("styles/{id}.csl")),
            expected_path: PathBuf::from(format!("tests/basic.{id}.out.json")),
            verdict,
        }
    }

    #[test]
    fn skipped_fixture_counts_one_warning_and_no_tests() {
        let report = FixtureReport::skipped(
            Path::new("tests/basic.in.json"),
            ResolutionWarning::NoOutputFile,
        );

        assert_eq!(
            report.tally(),
            FixtureTally {
                tests_run: 0,
                succeeded: 0,
                failed: 0,
                warnings: 1,
            }
        );
        assert!(report.verdicts().is_empty());
    }

    #[test]
    fn evaluated_fixture_tally_moves_one_counter_per_verdict() {
        let report = FixtureReport {
            fixture_path: PathBuf::from("tests/basic.in.json"),
            outcome: FixtureOutcome::Evaluated(vec![
                style_verdict("apa", Verdict::Success),
                style_verdict(
                    "mla",
                    Verdict::Failure {
                        key: "citations".to_string(),
                    },
                ),
                style_verdict(
                    "ieee",
                    Verdict::Warning {
                        reason: WarningReason::FormatterWarnings {
                            messages: vec!["unknown field 'page'".to_string()],
                        },
                    },
                ),
            ]),
            skipped_outputs: vec![ResolutionWarning::UnknownStyle {
                identifier: "bogus".to_string(),
                path: PathBuf::from("tests/basic.bogus.out.json"),
            }],
        };

        let tally = report.tally();
        assert_eq!(tally.tests_run, 3);
        assert_eq!(tally.succeeded, 1);
        assert_eq!(tally.failed, 1);
        assert_eq!(tally.warnings, 2);
    }

    #[test]
    fn run_totals_accumulate_and_report_cleanliness() {
        let mut totals = RunTotals::default();
        assert!(totals.is_clean());

        totals.add(FixtureTally {
            tests_run: 2,
            succeeded: 2,
            failed: 0,
            warnings: 0,
        });
        assert!(totals.is_clean());

        totals.add(FixtureTally {
            tests_run: 0,
            succeeded: 0,
            failed: 0,
            warnings: 1,
        });
        assert_eq!(totals.attempted, 2);
        assert_eq!(totals.succeeded, 2);
        assert_eq!(totals.warnings, 1);
        assert!(!totals.is_clean());
    }

    #[test]
    fn resolution_warning_messages_name_the_offending_file() {
        let warning = ResolutionWarning::UnknownStyle {
            identifier: "bogus".to_string(),
            path: PathBuf::from("tests/basic.bogus.out.json"),
        };
        assert_eq!(warning.code(), "RESOLVE.UNKNOWN_STYLE");
        assert_eq!(
            warning.to_string(),
            "unknown style 'bogus' in output file 'tests/basic.bogus.out.json'"
        );
    }
}
