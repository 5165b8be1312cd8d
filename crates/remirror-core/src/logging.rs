//! Optional log output for applications embedding the manager.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Install a tracing subscriber for manager diagnostics.
///
/// Log levels come from `RUST_LOG`, defaulting to `info`, which shows
/// lifecycle transitions. `debug` adds ordering, schema assembly and
/// dispatch details. Fails if a global subscriber is already installed.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Targets tell model, core and extension logs apart
    let fmt_layer = fmt::layer().with_target(true).with_level(true).compact();

    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_init() {
        // Only the first init in a process succeeds
        let _ = init();
        assert!(init().is_err());
        tracing::info!(phase = "idle", "Logging initialised");
    }
}
