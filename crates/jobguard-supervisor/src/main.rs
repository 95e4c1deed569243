//! JobGuard Supervisor Daemon

use std::sync::Arc;

use clap::Parser;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use jobguard_core::JobContext;
use jobguard_supervisor::seed::Seed;
use jobguard_supervisor::{
    Config, InMemoryJobManager, InMemoryLockRegistry, InMemoryStatusRepository, Supervisor,
    SupervisorMetrics,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let locks = Arc::new(InMemoryLockRegistry::new());
    let statuses = Arc::new(InMemoryStatusRepository::new());
    let jobs = Arc::new(InMemoryJobManager::new());

    if let Some(path) = &config.seed {
        Seed::load(path)?.apply(&locks, &statuses, &jobs).await?;
    }

    let supervisor = Arc::new(
        Supervisor::new(locks, statuses, jobs)
            .with_latest_only(config.latest_only)
            .with_filter(config.status_filter()),
    );
    let metrics = SupervisorMetrics::new();

    info!(
        interval_secs = config.interval_secs,
        latest_only = config.latest_only,
        once = config.once,
        "Starting JobGuard supervisor"
    );

    let mut ticker = tokio::time::interval(config.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
        }

        // Await each pass before the next tick so passes of this process never overlap.
        let outcome = supervisor.spawn_pass(JobContext::supervisor()).await;
        if let Err(e) = &outcome {
            error!(error = %e, "Supervisor pass failed");
        }
        metrics.record(&outcome);
        info!(passes = metrics.passes_total(), "Supervisor metrics\n{}", metrics.render());

        if config.once {
            break;
        }
    }

    info!(passes = metrics.passes_total(), "Supervisor stopped");

    Ok(())
}
