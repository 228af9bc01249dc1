//! Tracing setup

use crate::settings::Settings;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directive
pub const LOG_ENV: &str = "RECODE_LOG";

/// Filter used when neither the environment nor the settings name one
pub const DEFAULT_FILTER: &str = "warn";

/// Pick the filter directive: `RECODE_LOG`, then settings, then `warn`
#[must_use]
pub fn filter_directive(env: Option<&str>, settings: &Settings) -> String {
    env.filter(|v| !v.trim().is_empty())
        .or(settings.log_filter.as_deref())
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

/// Install the `fmt` subscriber writing to stderr
///
/// A directive that does not parse falls back to [`DEFAULT_FILTER`]. A
/// subscriber installed earlier is kept.
pub fn init(settings: &Settings) {
    let env = std::env::var(LOG_ENV).ok();
    let directive = filter_directive(env.as_deref(), settings);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|err| {
        eprintln!("recode: ignoring invalid log filter '{directive}': {err}");
        EnvFilter::new(DEFAULT_FILTER)
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_wins() {
        let settings = Settings::default().with_log_filter("info");
        assert_eq!(filter_directive(Some("debug"), &settings), "debug");
    }

    #[test]
    fn settings_then_default() {
        let settings = Settings::default().with_log_filter("info");
        assert_eq!(filter_directive(None, &settings), "info");
        assert_eq!(filter_directive(Some("  "), &settings), "info");
        assert_eq!(filter_directive(None, &Settings::default()), "warn");
    }
}
