use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Filter directive for the given verbosity; `0` keeps the configured level.
fn directive(verbose: u8, config: &LoggingConfig) -> &str {
    match verbose {
        0 => config.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays machine readable. `RUST_LOG` wins over everything else.
///
/// # Errors
/// If a global subscriber is already installed.
pub fn init(verbose: u8, json: bool, config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive(verbose, config)));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if json || config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow!("failed to initialize logging: {e}"))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_overrides_configured_level() {
        let config = LoggingConfig {
            level: "error".to_owned(),
            json: false,
        };
        assert_eq!(directive(0, &config), "error");
        assert_eq!(directive(1, &config), "info");
        assert_eq!(directive(2, &config), "debug");
        assert_eq!(directive(7, &config), "trace");
    }
}
