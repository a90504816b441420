//! Structured logging setup for the command-line exporter.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable that overrides the computed filter.
pub const LOG_ENV: &str = "LOREKEEP_LOG";

/// Maps the `-v` count to a filter directive.
pub fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "lorekeep=warn",
        1 => "lorekeep=info",
        2 => "lorekeep=debug",
        _ => "lorekeep=trace",
    }
}

/// Initialize logging to stderr.
///
/// `LOREKEEP_LOG` (or `RUST_LOG`) takes precedence over the verbosity flag.
pub fn init_tracing(verbose: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .try_init()?;

    Ok(())
}
