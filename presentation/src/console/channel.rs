//! Stdin console channel
//!
//! Lets the person at the terminal take part in the conversation as one
//! participant. Each line becomes an event on the orchestrator's bus.

use super::input::ConsoleInput;
use crate::output::console::ConsoleFormatter;
use orca_application::{EventPublisher, PublishError};
use orca_domain::{OrchestrationEvent, Participant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Console participant feeding an [`EventPublisher`].
pub struct ConsoleChannel {
    participant: Participant,
    publisher: EventPublisher,
    shutdown: CancellationToken,
}

impl ConsoleChannel {
    pub fn new(
        participant: Participant,
        publisher: EventPublisher,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            participant,
            publisher,
            shutdown,
        }
    }

    /// Read lines until `/quit`, end of input or shutdown.
    ///
    /// Connects on entry and disconnects on exit. Leaving through `/quit`
    /// or end of input requests orchestrator shutdown.
    pub async fn run<R>(self, reader: R) -> Result<(), PublishError>
    where
        R: AsyncBufRead + Unpin,
    {
        let id = self.participant.id.clone();
        self.publisher
            .publish(OrchestrationEvent::ClientConnected {
                participant: self.participant.clone(),
            })
            .await?;

        let mut lines = reader.lines();
        let result = loop {
            let line = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break Ok(()),
                line = lines.next_line() => line,
            };

            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("Console input closed");
                    self.shutdown.cancel();
                    break Ok(());
                }
                Err(e) => {
                    warn!("Console read failed: {}", e);
                    break Ok(());
                }
            };

            match ConsoleInput::parse(&line) {
                ConsoleInput::Quit => {
                    self.shutdown.cancel();
                    break Ok(());
                }
                ConsoleInput::Help => println!("{}", ConsoleFormatter::help()),
                ConsoleInput::Invalid(reason) => {
                    println!("{}", reason);
                    println!("Type /help for available commands");
                }
                input => {
                    if let Some(event) = input.into_event(&id)
                        && let Err(e) = self.publisher.publish(event).await
                    {
                        break Err(e);
                    }
                }
            }
        };

        // The bus may already be gone during shutdown.
        let _ = self
            .publisher
            .publish(OrchestrationEvent::ClientDisconnected { participant_id: id })
            .await;
        result
    }
}
