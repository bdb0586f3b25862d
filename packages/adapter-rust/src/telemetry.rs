//! Tracing subscriber setup for applications embedding the adapter.
//!
//! The adapter itself only emits `tracing` events and `metrics` counters;
//! installing a subscriber or a metrics recorder is the application's call.

use tracing_subscriber::EnvFilter;

/// Output format for [`init_tracing`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Installs a global fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.is_ok()
}

/// Counter names emitted by the adapter.
pub mod metric_names {
    /// Lookups answered from the cache.
    pub const CACHE_HITS: &str = "stowage_cache_hits_total";
    /// Lookups that had to go to the store.
    pub const CACHE_MISSES: &str = "stowage_cache_misses_total";
    /// Store calls, labelled by `operation` and `outcome`.
    pub const STORE_OPERATIONS: &str = "stowage_store_operations_total";
}
