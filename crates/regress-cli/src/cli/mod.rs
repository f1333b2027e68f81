mod commands;
mod logging;

use clap::Parser;
use regress_core::domain::RegressError;

const PROGRAM_NAME: &str = "citeproc-regress";

pub fn run_from_env() -> i32 {
    let args = std::env::args().skip(1).collect::<Vec<_>>();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let error = error.as_regress_error();
            eprintln!("{}", error.diagnostic_line());
            eprintln!("{}", error.fatal_exit_line());
            error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once(PROGRAM_NAME.to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            logging::init(cli.verbose)?;
            commands::run_regression_command(cli.regression)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "citeproc-regress",
    version,
    about = "Run citeproc against recorded fixtures and report regressions"
)]
struct Cli {
    #[command(flatten)]
    regression: commands::RegressionArgs,

    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Run(RegressError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_regress_error(&self) -> RegressError {
        match self {
            Self::Usage(message) => {
                RegressError::input_validation("INPUT.CLI_USAGE", message.trim_end())
            }
            Self::Run(error) => error.clone(),
            Self::Internal(error) => RegressError::internal("SYS.CLI", format!("{error:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, CliError};
    use clap::Parser;
    use regress_core::domain::RegressError;

    #[test]
    fn verbose_flag_counts_occurrences() {
        let cli = Cli::try_parse_from(["citeproc-regress", "-vv"]).expect("args should parse");
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn usage_errors_map_to_input_validation_exit_code() {
        let error = CliError::Usage("error: unexpected argument '--bogus'\n".to_string());
        let mapped = error.as_regress_error();
        assert_eq!(mapped.exit_code(), 2);
        assert_eq!(
            mapped.diagnostic_line(),
            "ERROR: [INPUT.CLI_USAGE] error: unexpected argument '--bogus'"
        );
    }

    #[test]
    fn run_errors_keep_their_category() {
        let error = CliError::Run(RegressError::io_system(
            "IO.STYLE_CATALOG",
            "style catalog 'styles' does not exist",
        ));
        assert_eq!(error.as_regress_error().exit_code(), 3);
    }

    #[test]
    fn internal_errors_render_full_context_chain() {
        let error = CliError::from(
            anyhow::anyhow!("subscriber already installed").context("failed to initialise logging"),
        );
        let mapped = error.as_regress_error();
        assert_eq!(mapped.code(), "SYS.CLI");
        assert_eq!(
            mapped.message(),
            "failed to initialise logging: subscriber already installed"
        );
    }
}
