//! Observability: tracing init.
//!
//! Uses config::ObservabilityConfig for MODBOX_QUIET, MODBOX_LOG_LEVEL, MODBOX_LOG_JSON.

use tracing_subscriber::{prelude::*, EnvFilter};

/// Initialize tracing. Call at process startup.
/// When MODBOX_QUIET=1, only WARN and above are logged.
pub fn init_tracing() {
    let cfg = crate::config::ObservabilityConfig::from_env();
    let level: String = if cfg.quiet {
        "modbox=warn".to_string()
    } else {
        cfg.log_level.clone()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    // Logs go to stderr so command output on stdout stays clean.
    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    };
}

/// Whether lifecycle info lines should be suppressed.
pub fn is_quiet() -> bool {
    crate::config::ObservabilityConfig::from_env().quiet
}
