// Structured logging setup
//
// Installs the global tracing subscriber. Level comes from the config (or
// --verbose) and can be refined per target through RUST_LOG.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Filter for the configured level; RUST_LOG directives take precedence.
pub fn env_filter(config: &LoggingConfig, verbose: bool) -> Result<EnvFilter> {
    let level = if verbose {
        Level::DEBUG
    } else {
        config
            .level
            .to_lowercase()
            .parse::<Level>()
            .map_err(|e| anyhow::anyhow!("Failed to parse log level: {}", e))?
    };

    Ok(EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy())
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let filter = env_filter(config, verbose)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match config.format.to_lowercase().as_str() {
        "json" => builder.json().flatten_event(true).try_init(),
        "pretty" => builder.pretty().try_init(),
        _ => builder.compact().try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}
