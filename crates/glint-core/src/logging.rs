//! Logging setup based on `tracing-subscriber`.

use tracing_subscriber::EnvFilter;

/// Environment variable read by [`init`] for the log filter.
pub const LOG_ENV: &str = "GLINT_LOG";

/// Filter used when [`LOG_ENV`] is unset or invalid.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn,cosmic_text=warn";

/// Install a global fmt subscriber.
///
/// The filter comes from `GLINT_LOG` and falls back to [`DEFAULT_FILTER`].
/// Calling this more than once is harmless; later calls are ignored.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    install(filter);
}

/// Install a global fmt subscriber with an explicit filter directive,
/// e.g. `"debug,glint_text=trace"`.
pub fn init_with_filter(directives: &str) {
    install(EnvFilter::new(directives));
}

fn install(filter: EnvFilter) {
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("global subscriber already installed");
    }
}
