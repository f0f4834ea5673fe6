//! # Change Notifications
//!
//! Every write that goes through this service publishes a [`Change`]. Admin
//! dashboards hold a server-sent-events stream and refetch on any signal.
//!
//! - Best effort: no ordering, no replay
//! - A subscriber that falls behind gets one `resync` instead of the backlog
use axum::response::sse::Event;
use futures_util::{Stream, stream};
use serde::Serialize;
use tokio::sync::broadcast::{self, Receiver, Sender, error::RecvError};
use tracing::{debug, warn};

pub const EVENT_NAME: &str = "change";

const CAPACITY: usize = 64;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    Resync,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub table: &'static str,
    pub kind: ChangeKind,
    pub id: Option<String>,
}

impl Change {
    pub fn new(table: &'static str, kind: ChangeKind, id: &str) -> Self {
        Self {
            table,
            kind,
            id: Some(id.to_string()),
        }
    }

    fn resync() -> Self {
        Self {
            table: "*",
            kind: ChangeKind::Resync,
            id: None,
        }
    }
}

pub struct Changes {
    sender: Sender<Change>,
}

impl Default for Changes {
    fn default() -> Self {
        Self::new()
    }
}

impl Changes {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CAPACITY);

        Self { sender }
    }

    pub fn publish(&self, change: Change) {
        // Err only means nobody is listening
        if let Ok(listeners) = self.sender.send(change) {
            debug!("Change sent to {listeners} listeners");
        }
    }

    pub fn subscribe(&self) -> Receiver<Change> {
        self.sender.subscribe()
    }
}

/// Next change for a subscriber. A lag collapses into a single resync.
async fn next_change(receiver: &mut Receiver<Change>) -> Option<Change> {
    match receiver.recv().await {
        Ok(change) => Some(change),
        Err(RecvError::Lagged(skipped)) => {
            warn!("Admin stream skipped {skipped} changes, asking for resync");
            Some(Change::resync())
        }
        Err(RecvError::Closed) => None,
    }
}

pub fn event_stream(receiver: Receiver<Change>) -> impl Stream<Item = Result<Event, axum::Error>> {
    stream::unfold(receiver, |mut receiver| async move {
        let change = next_change(&mut receiver).await?;
        let event = Event::default().event(EVENT_NAME).json_data(&change);

        Some((event, receiver))
    })
}
