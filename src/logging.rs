//! Tracing initialization.
//!
//! Logs go to stderr only; stdout carries the JSON report.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "PII_REDACTOR_LOG";

static INIT: Once = Once::new();

/// Filter used when `PII_REDACTOR_LOG` is unset or invalid.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "pii_redactor=debug,info"
    } else {
        "info"
    }
}

/// Installs the global subscriber. Later calls are ignored.
///
/// `verbose` raises the crate's own events to debug unless
/// `PII_REDACTOR_LOG` says otherwise.
pub fn init_logging(verbose: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_names(true),
            )
            .with(filter)
            .try_init();
    });
}
