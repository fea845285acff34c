//! Process-wide log subscriber setup.

use tracing_subscriber::EnvFilter;

/// Filter used when the configured level cannot be parsed.
pub const FALLBACK_FILTER: &str = "info";

/// Build the log filter. `RUST_LOG` wins over the configured level.
pub fn log_filter(configured: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| config_filter(configured))
}

fn config_filter(configured: Option<&str>) -> EnvFilter {
    configured
        .filter(|level| !level.trim().is_empty())
        .and_then(|level| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new(FALLBACK_FILTER))
}

/// Initialize logging with optional level from config.
/// Falls back to INFO if level is None or invalid.
pub fn init_logging(log_level: Option<&str>) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(log_level))
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_is_used() {
        assert_eq!(config_filter(Some("debug")).to_string(), "debug");
        assert_eq!(
            config_filter(Some("rs_curtains=trace")).to_string(),
            "rs_curtains=trace"
        );
    }

    #[test]
    fn missing_or_blank_level_falls_back() {
        assert_eq!(config_filter(None).to_string(), FALLBACK_FILTER);
        assert_eq!(config_filter(Some("  ")).to_string(), FALLBACK_FILTER);
    }
}
