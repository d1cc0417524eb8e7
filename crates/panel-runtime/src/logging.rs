/// Centralized logging macros for the actor engine
///
/// These macros provide consistent logging across all actors with:
/// - Debug-only compilation (stripped from release builds)
/// - Consistent formatting with actor context
///
/// Log debug-level message (only in debug builds)
///
/// # Example
/// ```
/// use panel_runtime::actor_debug;
/// actor_debug!("LinkActor: {:?} → {:?}", "Disconnected", "Connecting");
/// ```
#[macro_export]
macro_rules! actor_debug {
    ($($arg:tt)*) => {{
        #[cfg(debug_assertions)]
        {
            eprintln!("[DEBUG] {}", format!($($arg)*));
        }
    }};
}

/// Log info-level message (only in debug builds)
///
/// Use for important state changes and user-facing events
#[macro_export]
macro_rules! actor_info {
    ($($arg:tt)*) => {{
        #[cfg(debug_assertions)]
        {
            eprintln!("[INFO] {}", format!($($arg)*));
        }
    }};
}

/// Log warning-level message (only in debug builds)
///
/// Use for recoverable errors and unexpected conditions
#[macro_export]
macro_rules! actor_warn {
    ($($arg:tt)*) => {{
        #[cfg(debug_assertions)]
        {
            eprintln!("[WARN] {}", format!($($arg)*));
        }
    }};
}

/// Log error-level message (always compiled, even in release)
///
/// Use for critical errors that should always be visible
#[macro_export]
macro_rules! actor_error {
    ($($arg:tt)*) => {
        {
            eprintln!("[ERROR] {}", format!($($arg)*));
        }
    };
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    #[test]
    fn test_logging_macros_compile() {
        // Just verify macros compile
        actor_debug!("test debug");
        actor_info!("test info");
        actor_warn!("test warn");
        actor_error!("test error");
    }

    #[test]
    fn test_logging_with_format_args() {
        actor_debug!("LinkActor: {} → {}", "Connecting", "Connected");
        actor_info!("Session opened on {}", "mqtt://broker:1883");
        actor_warn!("Dropped {} stale session events", 2);
        actor_error!("Failed to open session: {}", "connection refused");
    }
}
