/*!
Single-slot live distribution of accepted notifications
*/

use tokio::sync::{Mutex, mpsc};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};

use crate::core::{error::DeliveryError, record::NotificationRecord};

/// Destination for serialized records. Delivery must not block.
pub trait EventSink: Send + Sync {
    fn name(&self) -> &str;

    fn success(&self, payload: &str) -> Result<(), DeliveryError>;
}

/// Live stream of serialized records handed to a subscriber. It ends when the
/// subscriber is evicted or unsubscribed.
pub type NotificationStream = UnboundedReceiverStream<String>;

/// Sink feeding an unbounded channel, so a slow reader never stalls ingestion
pub struct ChannelSink {
    name: String,
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelSink {
    pub fn new(name: impl Into<String>) -> (Self, NotificationStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Self { name: name.into(), tx };
        (sink, UnboundedReceiverStream::new(rx))
    }
}

impl EventSink for ChannelSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn success(&self, payload: &str) -> Result<(), DeliveryError> {
        self.tx
            .send(payload.to_string())
            .map_err(|_| DeliveryError::Closed(self.name.clone()))
    }
}

/// Result of pushing one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    NoSubscriber,
    /// The sink failed and was evicted from the slot
    Failed,
}

/// Holds at most one subscriber sink.
///
/// A second `subscribe` evicts the first. `push` checks and delivers while
/// holding the slot lock, so it never races an `unsubscribe`.
#[derive(Default)]
pub struct Distributor {
    slot: Mutex<Option<Box<dyn EventSink>>>,
}

impl Distributor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a sink. Returns true if a previous sink was evicted.
    pub async fn subscribe(&self, sink: Box<dyn EventSink>) -> bool {
        let mut slot = self.slot.lock().await;
        let name = sink.name().to_string();
        let previous = slot.replace(sink);

        match previous {
            Some(old) => {
                info!("Subscriber {} replaced {}", name, old.name());
                true
            }
            None => {
                info!("Subscriber {} attached", name);
                false
            }
        }
    }

    /// Clear the slot. Safe to call repeatedly.
    pub async fn unsubscribe(&self) {
        if let Some(old) = self.slot.lock().await.take() {
            info!("Subscriber {} detached", old.name());
        }
    }

    pub async fn has_subscriber(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// Deliver a record to the current sink, if any. Failures are logged and
    /// never returned to the caller.
    pub async fn push(&self, record: &NotificationRecord) -> DeliveryOutcome {
        let payload = match serde_json::to_string(record) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Dropping delivery of {}: {}", record.key, DeliveryError::from(e));
                return DeliveryOutcome::Failed;
            }
        };

        let mut slot = self.slot.lock().await;
        let Some(sink) = slot.as_ref() else {
            return DeliveryOutcome::NoSubscriber;
        };

        match sink.success(&payload) {
            Ok(()) => {
                debug!("Delivered {} to {}", record.key, sink.name());
                DeliveryOutcome::Delivered
            }
            Err(e) => {
                warn!("Delivery of {} failed, evicting subscriber: {}", record.key, e);
                *slot = None;
                DeliveryOutcome::Failed
            }
        }
    }
}
