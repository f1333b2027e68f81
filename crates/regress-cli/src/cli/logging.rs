use super::CliError;
use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Overrides the verbosity flags when set.
pub(super) const LOG_ENV_VAR: &str = "CITEPROC_REGRESS_LOG";

pub(super) fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Installs the stderr log subscriber. Report output never goes through it.
pub(super) fn init(verbosity: u8) -> Result<(), CliError> {
    let filter = match EnvFilter::try_from_env(LOG_ENV_VAR) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive(verbosity))
            .context("failed to build default log filter")?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
        .context("failed to install log subscriber")?;
    Ok(())
}
