use crate::catalog::{StyleCatalog, load_style_catalog};
use crate::domain::{FixtureReport, RegressResult, RunTotals};
use crate::evaluator::{EvaluationOptions, UnknownStylePolicy, evaluate_fixture};
use crate::fixture::{
    DEFAULT_FIXTURE_DIR, DEFAULT_FIXTURE_GLOB, DEFAULT_REFERENCES_PATH, Fixture,
    discover_fixtures,
};
use crate::formatter::{CitationFormatter, DEFAULT_FORMATTER_PROGRAM, ProcessFormatter};
use crate::report::ReportSink;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Explicit fixtures; discovery is used when empty.
    pub fixtures: Vec<PathBuf>,
    pub fixture_dir: PathBuf,
    pub fixture_pattern: String,
    pub styles_path: PathBuf,
    pub references_path: PathBuf,
    pub formatter_program: PathBuf,
    pub stop_on_first_failure: bool,
    pub quiet: bool,
    pub unknown_style_policy: UnknownStylePolicy,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            fixtures: Vec::new(),
            fixture_dir: PathBuf::from(DEFAULT_FIXTURE_DIR),
            fixture_pattern: DEFAULT_FIXTURE_GLOB.to_string(),
            styles_path: PathBuf::from("styles"),
            references_path: PathBuf::from(DEFAULT_REFERENCES_PATH),
            formatter_program: PathBuf::from(DEFAULT_FORMATTER_PROGRAM),
            stop_on_first_failure: false,
            quiet: false,
            unknown_style_policy: UnknownStylePolicy::default(),
        }
    }
}

impl RunnerConfig {
    pub fn evaluation_options(&self) -> EvaluationOptions {
        EvaluationOptions {
            quiet: self.quiet,
            references_path: Some(self.references_path.clone()),
            unknown_style_policy: self.unknown_style_policy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunOutcome {
    pub totals: RunTotals,
    pub reports: Vec<FixtureReport>,
    pub stopped_early: bool,
}

impl RunOutcome {
    pub fn fixtures_evaluated(&self) -> usize {
        self.reports.len()
    }

    /// Non-zero whenever a failure or a warning was recorded.
    pub const fn exit_code(&self) -> i32 {
        if self.totals.is_clean() { 0 } else { 1 }
    }
}

/// Loads the catalog, finds the fixtures and runs them through the
/// formatter configured in `config`.
pub fn run_regression<S>(config: &RunnerConfig, sink: &mut S) -> RegressResult<RunOutcome>
where
    S: ReportSink + ?Sized,
{
    let catalog = load_style_catalog(&config.styles_path)?;
    let fixtures = if config.fixtures.is_empty() {
        discover_fixtures(&config.fixture_dir, &config.fixture_pattern)?
    } else {
        config.fixtures.iter().cloned().map(Fixture::new).collect()
    };
    info!(
        fixtures = fixtures.len(),
        styles = catalog.len(),
        "starting regression run"
    );

    let formatter = ProcessFormatter::new(&config.formatter_program);
    run_fixtures(
        &fixtures,
        &catalog,
        &formatter,
        &config.evaluation_options(),
        config.stop_on_first_failure,
        sink,
    )
}

/// Evaluates fixtures in order, accumulating totals, and writes the summary.
pub fn run_fixtures<F, S>(
    fixtures: &[Fixture],
    catalog: &StyleCatalog,
    formatter: &F,
    options: &EvaluationOptions,
    stop_on_first_failure: bool,
    sink: &mut S,
) -> RegressResult<RunOutcome>
where
    F: CitationFormatter + ?Sized,
    S: ReportSink + ?Sized,
{
    let mut outcome = RunOutcome::default();
    for fixture in fixtures {
        let report = evaluate_fixture(fixture, catalog, formatter, options, sink)?;
        let tally = report.tally();
        outcome.totals.add(tally);
        outcome.reports.push(report);

        if stop_on_first_failure && tally.failed > 0 {
            warn!(
                fixture = %fixture.path().display(),
                "stopping after first failing fixture"
            );
            outcome.stopped_early = true;
            break;
        }
    }

    for line in render_summary(&outcome.totals) {
        sink.summary(&line);
    }
    Ok(outcome)
}

pub fn render_summary(totals: &RunTotals) -> Vec<String> {
    let mut lines = vec![format!(
        "Ran {} tests: {} succeeded, {} failed.",
        totals.attempted, totals.succeeded, totals.failed
    )];
    match totals.warnings {
        0 => {}
        1 => lines.push("There was 1 warning.".to_string()),
        count => lines.push(format!("There were {count} warnings.")),
    }
    lines
}
