//! Access event delivery.
//!
//! Request paths publish through an [`AccessEventSink`], which must never
//! block. The channel sink buffers into a bounded queue and drops the newest
//! event when the queue is full; a background consumer drains the queue into
//! an [`AccessEventHandler`].

use std::sync::Arc;

use async_trait::async_trait;
use coshare_types::AccessEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default queue depth for [`ChannelEventSink`].
pub const DEFAULT_EVENT_CAPACITY: usize = 1000;

/// Fire-and-forget publisher for access events.
pub trait AccessEventSink: Send + Sync {
    fn notify(&self, event: AccessEvent);
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl AccessEventSink for NoopEventSink {
    fn notify(&self, _event: AccessEvent) {}
}

/// Bounded, non-blocking queue in front of an event consumer.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    sender: mpsc::Sender<AccessEvent>,
}

impl ChannelEventSink {
    /// Create a sink and the receiver that drains it. A zero capacity is
    /// raised to one.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AccessEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl AccessEventSink for ChannelEventSink {
    fn notify(&self, event: AccessEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(
                    action = event.action.as_str(),
                    "access event queue full, dropping event"
                );
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                debug!(
                    action = event.action.as_str(),
                    "access event consumer gone, dropping event"
                );
            }
        }
    }
}

/// Consumer-side processing of access events.
#[async_trait]
pub trait AccessEventHandler: Send + Sync {
    async fn handle(&self, event: AccessEvent);
}

/// Writes each event as a structured log line on the `coshare::access`
/// target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventHandler;

#[async_trait]
impl AccessEventHandler for TracingEventHandler {
    async fn handle(&self, event: AccessEvent) {
        let collection_id = event.collection_id.map(|id| id.to_string());
        let user = event.actor.map(|actor| actor.user.to_string());
        let org = event.actor.map(|actor| actor.org.to_string());
        info!(
            target: "coshare::access",
            action = event.action.as_str(),
            collection_id = collection_id.as_deref().unwrap_or("-"),
            user = user.as_deref().unwrap_or("anonymous"),
            org = org.as_deref().unwrap_or("-"),
            occurred_at = %event.occurred_at,
            "access event"
        );
    }
}

/// Handle to a running event consumer.
pub struct EventConsumerHandle {
    task: JoinHandle<u64>,
    stop: mpsc::Sender<()>,
}

impl EventConsumerHandle {
    /// Stop the consumer after it has handled everything already queued.
    /// Returns the total number of events handled.
    pub async fn stop(self) -> u64 {
        let _ = self.stop.send(()).await;
        self.task.await.unwrap_or_else(|e| {
            warn!(error = %e, "access event consumer task failed");
            0
        })
    }
}

/// Spawn a task that feeds queued events into `handler` until every sink is
/// dropped or the returned handle is stopped.
pub fn spawn_event_consumer<H>(
    mut receiver: mpsc::Receiver<AccessEvent>,
    handler: Arc<H>,
) -> EventConsumerHandle
where
    H: AccessEventHandler + ?Sized + 'static,
{
    let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);

    let task = tokio::spawn(async move {
        let mut handled = 0u64;
        loop {
            tokio::select! {
                event = receiver.recv() => match event {
                    Some(event) => {
                        handler.handle(event).await;
                        handled += 1;
                    }
                    None => {
                        debug!("access event queue closed");
                        break;
                    }
                },
                Some(()) = stop_rx.recv() => {
                    receiver.close();
                    while let Some(event) = receiver.recv().await {
                        handler.handle(event).await;
                        handled += 1;
                    }
                    debug!(handled, "access event consumer stopped");
                    break;
                }
            }
        }
        handled
    });

    EventConsumerHandle {
        task,
        stop: stop_tx,
    }
}
