use tracing::Level;

use crate::config::LogSettings;

/// Max level for a configured level name. Unknown names fall back to `info`.
pub fn level(settings: &LogSettings) -> Level {
    match settings.level.trim().to_lowercase().as_str() {
        "warning" => Level::WARN,
        name => name.parse().unwrap_or(Level::INFO),
    }
}

/// Install the global fmt subscriber for the relay's `log` settings.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init(settings: &LogSettings) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level(settings))
        .with_target(false)
        .try_init();
}
