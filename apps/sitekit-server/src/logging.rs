//! Logging initialization.
//!
//! Filter precedence: `RUST_LOG` -> `-v` count -> `logging.level` from config.
//! Logs go to stderr so `check`/`routes` output on stdout stays clean.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

fn filter_directive(config: &LoggingConfig, verbose: u8) -> String {
    match verbose {
        0 => config.level.clone(),
        1 => "info".to_owned(),
        2 => "debug".to_owned(),
        _ => "trace".to_owned(),
    }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(config: &LoggingConfig, verbose: u8) {
    let env_filter = match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::try_new(filter_directive(config, verbose))
            .unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let ansi = std::env::var_os("NO_COLOR").is_none();
    let (json_layer, text_layer) = if config.json {
        (
            Some(fmt::layer().json().with_writer(std::io::stderr)),
            None,
        )
    } else {
        (
            None,
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(ansi)
                    .with_writer(std::io::stderr),
            ),
        )
    };

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init();
    if let Err(e) = result {
        tracing::debug!(error = %e, "Logging already initialized");
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn verbosity_overrides_configured_level() {
        let config = LoggingConfig {
            level: "warn".to_owned(),
            json: false,
        };
        assert_eq!(filter_directive(&config, 0), "warn");
        assert_eq!(filter_directive(&config, 1), "info");
        assert_eq!(filter_directive(&config, 2), "debug");
        assert_eq!(filter_directive(&config, 5), "trace");
    }
}
