//! Tracing setup for the `uniserial` binary.

use crate::settings::{LogFormat, LoggingSettings};
use parking_lot::Once;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

fn do_init(settings: &LoggingSettings) {
    // RUST_LOG wins over the settings file.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(&settings.level));

    // Logs go to stderr; stdout carries command output.
    let layer = match settings.format {
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    };

    if tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .is_ok()
    {
        debug!("Logging with {} format", settings.format);
    }
}

/// Initialize tracing.
///
/// Will only initialize once, so tests may call this.
pub fn init(settings: &LoggingSettings) {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| do_init(settings));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() {
        let settings = LoggingSettings {
            level: "uniserial=trace".to_string(),
            format: LogFormat::Compact,
        };
        init(&settings);
        init(&LoggingSettings::default());
        tracing::info!("still logging after a second init");
    }
}
