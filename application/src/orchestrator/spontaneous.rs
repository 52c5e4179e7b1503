//! Idle timer for spontaneous generation.
//!
//! The countdown restarts on every publish and again whenever the bus
//! finishes an event.

use crate::events::{EventPublisher, PublishError};
use orca_domain::OrchestrationEvent;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Publishes [`OrchestrationEvent::RebuildPrompt`] then
/// [`OrchestrationEvent::SpontaneousGeneration`] after `idle` without any bus
/// activity. A countdown that runs out while a handler is still running is
/// started over.
pub struct SpontaneousTimer {
    idle: Duration,
    publisher: EventPublisher,
}

impl SpontaneousTimer {
    pub fn new(idle: Duration, publisher: EventPublisher) -> Self {
        Self { idle, publisher }
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(self, shutdown: CancellationToken) {
        let activity = self.publisher.activity();
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = activity.notified() => continue,
                _ = tokio::time::sleep(self.idle) => {
                    if self.publisher.is_busy() {
                        continue;
                    }
                    debug!("Idle for {:?}, queueing spontaneous generation", self.idle);
                    if self.publish_idle_events().await.is_err() {
                        break;
                    }
                }
            }
        }
        debug!("Spontaneous timer stopped");
    }

    async fn publish_idle_events(&self) -> Result<(), PublishError> {
        self.publisher
            .publish(OrchestrationEvent::RebuildPrompt)
            .await?;
        self.publisher
            .publish(OrchestrationEvent::SpontaneousGeneration)
            .await
    }
}
