//! Single-consumer event bus.
//!
//! Producers publish through cloned [`EventPublisher`]s; exactly one task
//! drains the [`EventBus`] and applies each event to the
//! [`OrchestrationState`] before dequeuing the next. A handler that suspends
//! on I/O therefore holds up everything queued behind it.
//!
//! Handler failures never stop the loop: returned errors and panics are both
//! caught, logged with the event kind and counted. Returned errors are logged
//! with their full source chain.

use crate::state::OrchestrationState;
use crate::use_cases::process_event::ProcessEvent;
use futures::FutureExt;
use orca_domain::{EventKind, OrchestrationEvent};
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// The consumer side is gone; the orchestrator has stopped.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Event bus closed, dropped {0} event")]
pub struct PublishError(pub EventKind);

#[derive(Clone)]
enum Sender {
    Unbounded(mpsc::UnboundedSender<OrchestrationEvent>),
    Bounded(mpsc::Sender<OrchestrationEvent>),
}

enum Receiver {
    Unbounded(mpsc::UnboundedReceiver<OrchestrationEvent>),
    Bounded(mpsc::Receiver<OrchestrationEvent>),
}

impl Receiver {
    async fn recv(&mut self) -> Option<OrchestrationEvent> {
        match self {
            Receiver::Unbounded(rx) => rx.recv().await,
            Receiver::Bounded(rx) => rx.recv().await,
        }
    }
}

/// Cloneable producer handle.
#[derive(Clone)]
pub struct EventPublisher {
    sender: Sender,
    activity: Arc<Notify>,
    busy: Arc<AtomicBool>,
}

impl EventPublisher {
    /// Enqueue an event.
    ///
    /// Returns immediately on an unbounded bus; on a bounded bus waits for
    /// capacity.
    pub async fn publish(&self, event: OrchestrationEvent) -> Result<(), PublishError> {
        let kind = event.kind();
        match &self.sender {
            Sender::Unbounded(tx) => tx.send(event).map_err(|_| PublishError(kind))?,
            Sender::Bounded(tx) => tx.send(event).await.map_err(|_| PublishError(kind))?,
        }
        self.activity.notify_one();
        Ok(())
    }

    /// Signalled once per successful publish and again when the consumer
    /// finishes dispatching an event. Used by the idle timer.
    pub fn activity(&self) -> Arc<Notify> {
        self.activity.clone()
    }

    /// True while the consumer is inside an event handler.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        match &self.sender {
            Sender::Unbounded(tx) => tx.is_closed(),
            Sender::Bounded(tx) => tx.is_closed(),
        }
    }
}

/// What happened to one dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    Failed,
    Panicked,
}

/// Running totals for the lifetime of a bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    pub handled: u64,
    pub failed: u64,
    pub panicked: u64,
}

impl BusStats {
    pub fn total(&self) -> u64 {
        self.handled + self.failed + self.panicked
    }
}

pub struct EventBus {
    publisher: EventPublisher,
    receiver: Receiver,
    stats: BusStats,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl EventBus {
    pub fn unbounded() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self::from_parts(Sender::Unbounded(tx), Receiver::Unbounded(rx))
    }

    /// A bus whose publishers wait once `capacity` events are queued.
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self::from_parts(Sender::Bounded(tx), Receiver::Bounded(rx))
    }

    fn from_parts(sender: Sender, receiver: Receiver) -> Self {
        Self {
            publisher: EventPublisher {
                sender,
                activity: Arc::new(Notify::new()),
                busy: Arc::new(AtomicBool::new(false)),
            },
            receiver,
            stats: BusStats::default(),
        }
    }

    pub fn publisher(&self) -> EventPublisher {
        self.publisher.clone()
    }

    pub fn stats(&self) -> BusStats {
        self.stats
    }

    /// Wait for the next event and apply it.
    ///
    /// Returns `None` once every publisher is gone and the queue is drained.
    /// The bus itself holds a publisher, so this only happens after
    /// [`close`](Self::close).
    pub async fn run_once(
        &mut self,
        state: &mut OrchestrationState,
    ) -> Option<(EventKind, DispatchOutcome)> {
        let event = self.receiver.recv().await?;
        let kind = event.kind();
        Some((kind, self.dispatch(event, state).await))
    }

    /// Consume events until `shutdown` fires or the queue closes.
    ///
    /// Shutdown is only observed between events; an in-flight handler runs
    /// to completion.
    pub async fn run(&mut self, state: &mut OrchestrationState, shutdown: &CancellationToken) {
        info!("Event loop started");
        loop {
            let event = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                event = self.receiver.recv() => event,
            };
            match event {
                Some(event) => {
                    self.dispatch(event, state).await;
                }
                None => break,
            }
        }
        let stats = self.stats;
        info!(
            "Event loop stopped: {} handled, {} failed, {} panicked",
            stats.handled, stats.failed, stats.panicked
        );
    }

    /// Stop accepting events from every publisher. Events already queued
    /// can still be drained with [`run_once`](Self::run_once).
    pub fn close(&mut self) {
        match &mut self.receiver {
            Receiver::Unbounded(rx) => rx.close(),
            Receiver::Bounded(rx) => rx.close(),
        }
    }

    async fn dispatch(
        &mut self,
        event: OrchestrationEvent,
        state: &mut OrchestrationState,
    ) -> DispatchOutcome {
        let kind = event.kind();
        debug!(event = %kind, "Processing event");
        self.publisher.busy.store(true, Ordering::Release);

        let outcome = match AssertUnwindSafe(event.process(state)).catch_unwind().await {
            Ok(Ok(())) => {
                self.stats.handled += 1;
                DispatchOutcome::Handled
            }
            Ok(Err(e)) => {
                self.stats.failed += 1;
                error!(event = %kind, "Event handler failed: {}", failure_report(&e));
                DispatchOutcome::Failed
            }
            Err(panic) => {
                self.stats.panicked += 1;
                error!(
                    event = %kind,
                    "Event handler panicked: {}",
                    panic_message(panic.as_ref())
                );
                state.recover();
                DispatchOutcome::Panicked
            }
        };
        self.publisher.busy.store(false, Ordering::Release);
        self.publisher.activity.notify_one();
        debug!(event = %kind, ?outcome, "Event done");
        outcome
    }
}

/// `error` followed by each of its sources, one per line, plus a backtrace
/// when `RUST_BACKTRACE` enables capture.
fn failure_report(error: &dyn std::error::Error) -> String {
    let mut report = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        report.push_str("\n  caused by: ");
        report.push_str(&cause.to_string());
        source = cause.source();
    }
    let backtrace = Backtrace::capture();
    if backtrace.status() == BacktraceStatus::Captured {
        report.push_str("\n");
        report.push_str(&backtrace.to_string());
    }
    report
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
