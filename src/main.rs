//! cardiocheck: cardiovascular disease classifier
//!
//! Reads one JSON patient record per line on stdin and writes one JSON
//! response per line on stdout.

use anyhow::{Context, Result};

use cardiocheck::config::Settings;
use cardiocheck::{host, telemetry, PredictionService};

fn main() -> Result<()> {
    let settings = Settings::from_env().context("Invalid configuration")?;
    let _guard = telemetry::init_logging(&settings.log).context("Failed to initialize logging")?;

    tracing::info!("Starting cardiocheck...");

    // Load once; a missing or unverifiable model stops the process here.
    let service = PredictionService::from_settings(&settings)
        .context("Failed to load classifier")?;

    let stats = host::serve(&service, std::io::stdin().lock(), std::io::stdout().lock())
        .context("Request stream failed")?;

    tracing::info!(
        answered = stats.answered,
        rejected = stats.rejected,
        "cardiocheck shutdown complete."
    );
    Ok(())
}
