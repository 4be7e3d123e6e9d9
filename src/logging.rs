//! Subscriber setup for the `projector` binary.
//!
//! Library code only emits through the `tracing` macros re-exported here.

pub use tracing::{debug, error, info, trace, warn};

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::{ProjectorError, ProjectorResult};

/// Install the global subscriber: stderr with uptime stamps, plus an
/// append-only plain-text copy when `log_file` is given. `RUST_LOG` overrides
/// the default `info` level.
pub fn init(log_file: Option<&Path>) -> ProjectorResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(fmt::time::uptime());

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ProjectorError::io(format!("opening log file {}", path.display()), e))?;
            Some(
                fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ProjectorError::config("logging", e.to_string()))
}
