//! Background loops started by the server binary.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::error::AppError;
use crate::services::{ExpirationSweeper, OutboxRelay, TemplateImportConsumer};

fn log_tick_failure(job: &str, error: &AppError) {
    if error.is_transient() {
        log::warn!("{} failed, retrying next tick: {}", job, error);
    } else {
        log::error!("{} failed: {}", job, error);
    }
}

/// Runs the expiration sweep every `period`. A failed tick is logged and the loop keeps going.
pub fn spawn_sweep_loop(sweeper: ExpirationSweeper, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = sweeper.run_sweep(Utc::now()).await {
                log_tick_failure("Expiration sweep", &e);
            }
        }
    })
}

pub fn spawn_relay_loop(relay: Arc<OutboxRelay>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = relay.relay_pending().await {
                log_tick_failure("Outbox relay", &e);
            }
        }
    })
}

pub fn spawn_template_import(consumer: TemplateImportConsumer) -> JoinHandle<()> {
    tokio::spawn(consumer.run())
}
