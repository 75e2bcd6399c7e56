//! Log subscriber setup.
//!
//! Filters come from the `LUSP_LOG` environment variable using
//! `tracing-subscriber`'s `EnvFilter` syntax, defaulting to `warn`. Output
//! goes to stderr so it never mixes with program output.

use lusp_foundation::{Error, ErrorKind, Result};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "LUSP_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Builds the filter from `LUSP_LOG`, adding VM instruction tracing if asked.
///
/// # Errors
///
/// Returns an error if `LUSP_LOG` holds an invalid directive.
pub fn filter(trace_vm: bool) -> Result<EnvFilter> {
    let filter = match std::env::var(LOG_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .map_err(|e| Error::new(ErrorKind::Internal(format!("invalid {LOG_ENV}: {e}"))))?,
        _ => EnvFilter::new(DEFAULT_FILTER),
    };
    Ok(if trace_vm {
        filter.add_directive(
            "lusp_language=trace"
                .parse()
                .map_err(|e| Error::new(ErrorKind::Internal(format!("{e}"))))?,
        )
    } else {
        filter
    })
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a subscriber is already set.
pub fn init(trace_vm: bool) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(trace_vm)?)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .map_err(|e| Error::new(ErrorKind::Internal(format!("logging: {e}"))))
}
