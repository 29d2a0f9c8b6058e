//! Push of pipeline status changes to connected subscribers

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::PipelineRegistry;
use crate::models::{StatusEvent, StatusMap};

pub type EventSender = mpsc::Sender<StatusEvent>;
pub type EventReceiver = mpsc::Receiver<StatusEvent>;

/// A registered subscriber's end of the event stream
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
    receiver: EventReceiver,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next event, or `None` once the subscriber has been removed
    pub async fn recv(&mut self) -> Option<StatusEvent> {
        self.receiver.recv().await
    }

    /// Next event if one is already queued
    pub fn try_recv(&mut self) -> Option<StatusEvent> {
        self.receiver.try_recv().ok()
    }
}

/// Fans status events out to every subscriber.
///
/// Each subscriber owns a bounded queue, so events reach it in the order they
/// were produced. Delivery never waits: an event for a full queue is dropped.
#[derive(Debug, Clone)]
pub struct StatusBroadcaster {
    subscribers: Arc<RwLock<HashMap<Uuid, EventSender>>>,
    buffer: usize,
}

impl StatusBroadcaster {
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            buffer: buffer.max(1),
        }
    }

    /// Register a subscriber and queue a snapshot of every known pipeline.
    ///
    /// Snapshots are queued while the subscriber set is write-locked, so no
    /// update can reach the new subscriber ahead of them.
    pub async fn subscribe(&self, registry: &PipelineRegistry) -> Subscription {
        let mut subscribers = self.subscribers.write().await;

        let pipelines = registry.list().await;
        let (sender, receiver) = mpsc::channel(self.buffer.max(pipelines.len() + 1));
        for pipeline in &pipelines {
            let event = StatusEvent::snapshot(pipeline.name(), pipeline.statuses().await);
            if sender.try_send(event).is_err() {
                warn!(pipeline = %pipeline.name(), "Dropped snapshot for new subscriber");
            }
        }

        let id = Uuid::new_v4();
        subscribers.insert(id, sender);
        info!(
            subscriber_id = %id,
            snapshots = pipelines.len(),
            subscribers = subscribers.len(),
            "Subscriber connected"
        );

        Subscription { id, receiver }
    }

    /// Push the full status map of `pipeline` to every subscriber
    pub async fn notify(&self, pipeline: &str, statuses: StatusMap) {
        let event = StatusEvent::update(pipeline, statuses);
        let mut closed = Vec::new();
        {
            let subscribers = self.subscribers.read().await;
            for (id, sender) in subscribers.iter() {
                match sender.try_send(event.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        warn!(subscriber_id = %id, pipeline, "Subscriber queue full, dropping update");
                    }
                    Err(TrySendError::Closed(_)) => closed.push(*id),
                }
            }
        }

        if !closed.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in closed {
                subscribers.remove(&id);
                debug!(subscriber_id = %id, "Pruned closed subscriber");
            }
        }
    }

    /// Remove a subscriber; removing an unknown id is a no-op
    pub async fn unsubscribe(&self, id: Uuid) {
        if self.subscribers.write().await.remove(&id).is_some() {
            info!(subscriber_id = %id, "Subscriber disconnected");
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }
}
