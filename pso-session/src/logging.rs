//! Tracing subscriber setup.

use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{Result, SessionError};

/// Install the global subscriber described by `config`. `RUST_LOG`, when
/// set, takes precedence over the configured directives.
///
/// # Errors
/// [`SessionError::Logging`] for an invalid directive string or when a
/// global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| SessionError::Logging(e.to_string()))?,
    };
    subscriber(config.format, filter, std::io::stdout)
        .try_init()
        .map_err(|e| SessionError::Logging(e.to_string()))
}

fn subscriber<W>(format: LogFormat, filter: EnvFilter, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(writer);
    match format {
        LogFormat::Pretty => Box::new(builder.pretty().finish()),
        LogFormat::Json => Box::new(builder.json().finish()),
    }
}
