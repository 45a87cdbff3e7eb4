use anyhow::{Context, Result};
use locale_sync::{telemetry, Config, LocaleSync};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when the variables come from the environment)
    let _ = dotenvy::dotenv();

    let config = Config::from_env().context("Failed to load configuration")?;
    telemetry::init_tracing(config.debug);

    let project = std::env::var("LOCALE_SYNC_PROJECT").context("LOCALE_SYNC_PROJECT not set")?;

    info!("Starting locale sync for project {}", project);

    let mut engine = LocaleSync::new(config).context("Failed to initialize locale sync")?;
    engine.use_project(&project)?;

    let report = engine
        .sync()
        .await
        .with_context(|| format!("Synchronization of {} failed", project))?;

    if report.fast_path {
        info!("Cache already current, no downloads needed");
    }
    for outcome in &report.outcomes {
        info!(
            "{}: {:?} after {} attempt(s)",
            outcome.locale, outcome.status, outcome.attempts
        );
    }

    let stale = report.stale_locales();
    if !stale.is_empty() {
        warn!("Stale locales: {}", stale.join(", "));
    }

    info!(
        "Locales available: {}",
        engine.translator().locales()?.join(", ")
    );
    Ok(())
}
