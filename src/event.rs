// MIT License - Copyright (c) 2026 Peter Wright

use crate::error::{EnvisalinkError, Result};
use crate::registry::{DefaultStatus, EventKind, ResponseDescriptor};

/// A published panel state change.
///
/// Emitted once per received line whose target is present in
/// configuration; unnamed targets are filtered before publication.
#[derive(Debug, Clone)]
pub struct StateChange {
    /// Target kind (partition or zone)
    pub kind: EventKind,
    /// Response code that produced the event
    pub code: u16,
    /// Partition or zone number
    pub target: u16,
    /// Static descriptor for the response code
    pub descriptor: &'static ResponseDescriptor,
    /// Human-readable message with names resolved
    pub message: String,
    /// Baseline status template for the target kind
    pub status: DefaultStatus,
}

/// All events emitted by a session.
///
/// Subscribers receive these via `handle.subscribe()` as a
/// `tokio::sync::broadcast::Receiver<SessionEvent>`.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// TCP connection to the panel interface established
    Connected,
    /// TCP connection lost; the session will reconnect
    Disconnected,
    /// Login handshake completed
    LoggedIn,
    /// A partition or zone state change
    StateChange(StateChange),
}

/// Action requests fed into the session from external callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    /// Arm partition 1 in away mode
    Arm,
    /// Arm partition 1 in stay mode
    StayArm,
    /// Arm partition 1, supplying a usercode
    ArmWithCode { code: String },
    /// Disarm partition 1; falls back to the configured alarm code
    Disarm { code: Option<String> },
    /// Request a fresh status report
    Refresh,
    /// Trigger a programmable output (not yet wired to a command)
    Pgm,
}

/// Type alias for the broadcast sender.
pub type EventSender = tokio::sync::broadcast::Sender<SessionEvent>;

/// Type alias for the broadcast receiver.
pub type EventReceiver = tokio::sync::broadcast::Receiver<SessionEvent>;

/// Type alias for the action-request sender.
pub type ActionSender = tokio::sync::mpsc::Sender<ActionRequest>;

/// Type alias for the action-request receiver.
pub type ActionReceiver = tokio::sync::mpsc::Receiver<ActionRequest>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    tokio::sync::broadcast::channel(capacity)
}

/// Create a new action-request channel with the given capacity.
pub fn action_channel(capacity: usize) -> (ActionSender, ActionReceiver) {
    tokio::sync::mpsc::channel(capacity)
}

/// External endpoint for one session: event fan-out and action fan-in.
///
/// Cloneable; external components interact with the session exclusively
/// through a handle, never by touching session state directly.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    event_tx: EventSender,
    action_tx: ActionSender,
}

impl SessionHandle {
    pub(crate) fn new(event_tx: EventSender, action_tx: ActionSender) -> Self {
        Self { event_tx, action_tx }
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> EventReceiver {
        self.event_tx.subscribe()
    }

    /// Submit an action request to the session.
    ///
    /// Delivery means the session accepted the request, not that the
    /// panel executed it; failures past this point surface in the logs
    /// and as absent state-change events.
    pub async fn request(&self, action: ActionRequest) -> Result<()> {
        self.action_tx
            .send(action)
            .await
            .map_err(|_| EnvisalinkError::ChannelClosed)
    }
}
