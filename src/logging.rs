//! Diagnostic logging setup.
//!
//! Logs go to stderr so stdout stays reserved for command output (plans,
//! summaries, JSON). The filter is read from `FORKLINE_LOG` using the usual
//! `EnvFilter` directive syntax.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "FORKLINE_LOG";

const DEFAULT_FILTER: &str = "forkline=info";
const VERBOSE_FILTER: &str = "forkline=debug";

/// Filter used when `FORKLINE_LOG` is unset or invalid.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER }
}

/// Install the global subscriber. `verbose` overrides `FORKLINE_LOG`.
///
/// Calling this twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(default_filter(true))
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter(false)))
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
