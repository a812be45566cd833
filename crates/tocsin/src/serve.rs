// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tocsin serve` command implementation.
//!
//! Restores the state snapshot, connects the issue tracker and Telegram,
//! then runs the bot loop with the escalation scheduler beside it until a
//! shutdown signal arrives. The store is saved once more on the way out.

use std::sync::Arc;

use tocsin_agent::{BotLoop, EscalationScheduler, shutdown};
use tocsin_config::TocsinConfig;
use tocsin_core::{
    Authorizer, ChatTransport, Clock, HealthStatus, PluginAdapter, SystemClock, TocsinError,
};
use tocsin_store::{LoadOutcome, StateStore};
use tocsin_telegram::TelegramTransport;
use tracing::{debug, error, info, warn};

/// Runs the `tocsin serve` command.
pub async fn run_serve(config: TocsinConfig) -> Result<(), TocsinError> {
    // Initialize tracing subscriber.
    init_tracing(&config.bot.log_level);

    info!(name = %config.bot.name, "starting tocsin serve");

    let store = Arc::new(StateStore::new(&config.storage.state_path));
    let report = store.load().await;
    match report.outcome {
        LoadOutcome::Corrupt => {
            warn!(path = %store.path().display(), "state file unreadable, previous records are lost");
        }
        LoadOutcome::Missing | LoadOutcome::Loaded => {}
    }
    if report.dropped > 0 {
        warn!(dropped = report.dropped, "skipped invalid entries in state file");
    }

    let tracker = tocsin_tracker::build_tracker(&config)?;
    match tracker.health_check().await {
        Ok(HealthStatus::Healthy) => debug!(tracker = tracker.name(), "tracker reachable"),
        Ok(status) => warn!(tracker = tracker.name(), ?status, "tracker unhealthy, alarms may get local ids"),
        Err(e) => warn!(tracker = tracker.name(), error = %e, "tracker health check failed"),
    }

    let mut telegram = TelegramTransport::new(&config.telegram)?;
    telegram.connect().await?;
    let chat: Arc<dyn ChatTransport> = Arc::new(telegram);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let auth: Arc<dyn Authorizer> = Arc::new(config.roles());
    let mut bot = BotLoop::new(
        chat.clone(),
        store.clone(),
        tracker.clone(),
        auth,
        clock.clone(),
        &config,
    )?;

    // Install signal handler.
    let cancel = shutdown::install_signal_handler();

    let scheduler = EscalationScheduler::new(
        store.clone(),
        bot.dispatcher(),
        clock,
        config.escalation.clone(),
    );
    let scheduler_task = tokio::spawn(scheduler.run(cancel.clone()));

    let outcome = bot.run(cancel.clone()).await;

    // The loop may also stop because the transport closed.
    cancel.cancel();
    if let Err(e) = scheduler_task.await {
        error!(error = %e, "escalation scheduler task failed");
    }

    if let Err(e) = store.save().await {
        error!(error = %e, "final state save failed");
    }

    if let Err(e) = chat.shutdown().await {
        warn!(adapter = chat.name(), error = %e, "adapter shutdown failed");
    }
    if let Err(e) = tracker.shutdown().await {
        warn!(adapter = tracker.name(), error = %e, "adapter shutdown failed");
    }

    info!("tocsin serve shutdown complete");
    outcome
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tocsin={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
