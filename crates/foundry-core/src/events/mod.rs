//! Pipeline event distribution
//!
//! A broadcast-based bus scoped to one session. Displays subscribe to it to
//! follow pipeline progress without the pipeline knowing who is watching.

use std::sync::Arc;
use tokio::sync::broadcast;

/// Progress events published while a pipeline runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    PipelineStarted {
        name: String,
    },

    PipelineFinished {
        name: String,
        success: bool,
    },

    ItemStarted {
        item_id: String,
    },

    ItemFinished {
        item_id: String,
        success: bool,
    },
}

impl PipelineEvent {
    pub fn pipeline_started(name: impl Into<String>) -> Self {
        Self::PipelineStarted { name: name.into() }
    }

    pub fn pipeline_finished(name: impl Into<String>, success: bool) -> Self {
        Self::PipelineFinished {
            name: name.into(),
            success,
        }
    }

    pub fn item_started(item_id: impl Into<String>) -> Self {
        Self::ItemStarted {
            item_id: item_id.into(),
        }
    }

    pub fn item_finished(item_id: impl Into<String>, success: bool) -> Self {
        Self::ItemFinished {
            item_id: item_id.into(),
            success,
        }
    }

    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PipelineStarted { .. } => "pipeline_started",
            Self::PipelineFinished { .. } => "pipeline_finished",
            Self::ItemStarted { .. } => "item_started",
            Self::ItemFinished { .. } => "item_finished",
        }
    }
}

/// Event bus for one session
///
/// Each subscriber receives a copy of every event published after it
/// subscribed.
///
/// # Example
///
/// ```rust
/// use foundry_core::events::{EventBus, PipelineEvent};
///
/// #[tokio::main]
/// async fn main() {
///     let bus = EventBus::new(16);
///     let mut subscriber = bus.subscribe();
///
///     bus.publish(PipelineEvent::pipeline_started("tests"));
///
///     let event = subscriber.recv().await.unwrap();
///     assert_eq!(event.event_type(), "pipeline_started");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PipelineEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new event bus with the specified capacity
    ///
    /// Slow subscribers start losing events once `capacity` are buffered.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    /// Publish an event, returning how many subscribers will see it
    pub fn publish(&self, event: PipelineEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

pub type SharedEventBus = Arc<EventBus>;

/// Subscription that only yields events with the given type names
pub struct FilteredSubscriber {
    receiver: broadcast::Receiver<PipelineEvent>,
    types: Vec<&'static str>,
}

impl FilteredSubscriber {
    pub fn new(bus: &EventBus, types: Vec<&'static str>) -> Self {
        Self {
            receiver: bus.subscribe(),
            types,
        }
    }

    /// Receive the next matching event.
    ///
    /// Lagging is skipped over; the subscriber only fails once the bus is gone.
    pub async fn recv(&mut self) -> Result<PipelineEvent, broadcast::error::RecvError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.types.contains(&event.event_type()) => return Ok(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Event subscriber lagged");
                }
                Err(err) => return Err(err),
            }
        }
    }
}
