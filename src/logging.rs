//! Logging setup.
//!
//! Library code only emits `tracing` events; this module installs the
//! subscriber once at startup. `RUST_LOG` takes precedence over the
//! `[logging]` config section:
//!
//! ```bash
//! RUST_LOG=barcode_catalog=debug barcode-catalog list prices.xlsx
//! ```

use std::fs::OpenOptions;
use std::sync::{Mutex, Once};
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Where log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// stderr, or the configured file
    Terminal,
    /// The configured file only. Without one, logging stays off so the
    /// terminal UI is not drawn over.
    FileOnly,
}

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(config.filter_directives())
    }
}

/// Initialize logging with configuration.
///
/// Only the first call takes effect. An unopenable log file falls back to
/// stderr for `LogTarget::Terminal` and to no logging for `FileOnly`.
pub fn init_with_config(config: &LoggingConfig, target: LogTarget) {
    INIT.call_once(|| {
        let file = config.file.as_ref().and_then(|path| {
            OpenOptions::new().create(true).append(true).open(path).ok()
        });

        match (file, target) {
            (Some(file), _) => {
                let layer = tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_timer(CompactTime)
                    .with_writer(Mutex::new(file))
                    .with_filter(build_filter(config));
                tracing_subscriber::registry().with(layer).init();
            }
            (None, LogTarget::Terminal) => {
                let layer = tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_timer(CompactTime)
                    .with_writer(std::io::stderr)
                    .with_filter(build_filter(config));
                tracing_subscriber::registry().with(layer).init();
            }
            (None, LogTarget::FileOnly) => {}
        }
    });
}
