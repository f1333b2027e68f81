use super::CliError;
use regress_core::evaluator::UnknownStylePolicy;
use regress_core::fixture::{DEFAULT_FIXTURE_DIR, DEFAULT_FIXTURE_GLOB, DEFAULT_REFERENCES_PATH};
use regress_core::formatter::DEFAULT_FORMATTER_PROGRAM;
use regress_core::report::ConsoleSink;
use regress_core::runner::{RunnerConfig, run_regression};
use std::path::PathBuf;
use tracing::info;

#[derive(clap::Args)]
pub(super) struct RegressionArgs {
    /// Fixtures to run (default: every tests/*.in.json)
    #[arg(value_name = "FIXTURE")]
    fixtures: Vec<PathBuf>,

    /// Stop after the first fixture containing a failure
    #[arg(short = 's', long)]
    early_stop: bool,

    /// Print only the totals, without per-failure diffs
    #[arg(long)]
    summary: bool,

    /// Style catalog: a directory of .csl files or a JSON identifier map
    #[arg(long, default_value = "styles")]
    styles: PathBuf,

    /// Formatter executable
    #[arg(long, default_value = DEFAULT_FORMATTER_PROGRAM)]
    formatter: PathBuf,

    /// References file passed to the formatter when it exists
    #[arg(long, default_value = DEFAULT_REFERENCES_PATH)]
    references: PathBuf,

    /// Directory searched for fixtures when none are given
    #[arg(long, default_value = DEFAULT_FIXTURE_DIR)]
    fixture_dir: PathBuf,

    /// Skip style-specific outputs with an unknown style instead of the whole fixture
    #[arg(long)]
    skip_unknown_styles: bool,
}

impl RegressionArgs {
    fn into_config(self) -> RunnerConfig {
        let unknown_style_policy = if self.skip_unknown_styles {
            UnknownStylePolicy::SkipStyle
        } else {
            UnknownStylePolicy::AbortFixture
        };

        RunnerConfig {
            fixtures: self.fixtures,
            fixture_dir: self.fixture_dir,
            fixture_pattern: DEFAULT_FIXTURE_GLOB.to_string(),
            styles_path: self.styles,
            references_path: self.references,
            formatter_program: self.formatter,
            stop_on_first_failure: self.early_stop,
            quiet: self.summary,
            unknown_style_policy,
        }
    }
}

pub(super) fn run_regression_command(args: RegressionArgs) -> Result<i32, CliError> {
    let config = args.into_config();
    let outcome = run_regression(&config, &mut ConsoleSink).map_err(CliError::Run)?;
    info!(
        fixtures = outcome.fixtures_evaluated(),
        stopped_early = outcome.stopped_early,
        "regression run finished"
    );
    Ok(outcome.exit_code())
}
