//! Quiet-mode aware logging. When MODBOX_QUIET=1, suppress lifecycle [INFO] lines.
//! Uses `tracing::info!` so output is captured by the tracing subscriber.

#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {{
        if !$crate::log::is_quiet() {
            tracing::info!($($arg)*);
        }
    }};
}

pub fn is_quiet() -> bool {
    modbox_core::observability::is_quiet()
}
