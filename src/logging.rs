//! Tracing subscriber setup.
//!
//! Logs go to stderr so JSON reports on stdout stay machine-readable.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::settings::LogSettings;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level. Only the first call in a
/// process takes effect.
pub fn init(settings: &LogSettings) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_str()));

    if settings.format == "json" {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        let settings = LogSettings::default();
        init(&settings);
        init(&settings);
        tracing::info!("still logging");
    }
}
