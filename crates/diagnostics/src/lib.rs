//! Logging for the dataset repository crates.
//!
//! All crates in the workspace log through the macros below so that a single
//! environment variable controls output:
//! - `DSREPO_LOG=off` (default) - no logs
//! - `DSREPO_LOG=info` - resolution and dataset lifecycle events
//! - `DSREPO_LOG=debug` - qualification steps, listing details

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable consulted by [`init_diagnostics`]
pub const LOG_ENV: &str = "DSREPO_LOG";

static INIT: Once = Once::new();

/// Parsed value of the `DSREPO_LOG` variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSetting {
    Off,
    Level(emit::Level),
    /// An unrecognized value; treated as `info`
    Unknown,
}

impl LogSetting {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "off" => LogSetting::Off,
            "debug" => LogSetting::Level(emit::Level::Debug),
            "info" => LogSetting::Level(emit::Level::Info),
            "warn" => LogSetting::Level(emit::Level::Warn),
            "error" => LogSetting::Level(emit::Level::Error),
            _ => LogSetting::Unknown,
        }
    }

    /// Minimum level to emit, or `None` when logging is disabled
    pub fn min_level(&self) -> Option<emit::Level> {
        match self {
            LogSetting::Off => None,
            LogSetting::Level(level) => Some(*level),
            LogSetting::Unknown => Some(emit::Level::Info),
        }
    }
}

/// Initialize diagnostics based on the `DSREPO_LOG` environment variable
///
/// Call once at application startup. Subsequent calls are ignored.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let raw = std::env::var(LOG_ENV).unwrap_or_else(|_| "off".to_string());
        let setting = LogSetting::parse(&raw);

        let Some(level) = setting.min_level() else {
            return;
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        if setting == LogSetting::Unknown {
            emit::warn!("Unknown {var} value '{value}', using 'info'", var: LOG_ENV, value: raw);
        }

        // The runtime lives for the rest of the process.
        std::mem::forget(rt);
    });
}

/// Log resolution and dataset lifecycle events
///
/// Examples: "Opened repository", "Created dataset"
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log detailed diagnostics (qualification steps, listing counts, etc.)
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log conditions that don't prevent the operation
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log failures
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

/// Re-export the init function for convenience
pub use init_diagnostics as init;
