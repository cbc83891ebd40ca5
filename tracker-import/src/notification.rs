//! Deferred notification hand-off.
//!
//! Persisters only describe what happened. Descriptors are collected during
//! the run and handed to a [`NotificationDispatcher`] after the transaction
//! commits; composing and sending messages is the dispatcher's business.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use tracker_model::UserInfo;
use tracker_types::{TrackerType, Uid};

/// A state transition a notification may be sent for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationTrigger {
    /// An event's status moved into COMPLETED.
    EventCompletion,
}

/// One persisted object a notification may be sent for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDescriptor {
    pub tracker_type: TrackerType,
    pub uid: Uid,
    pub triggers: Vec<NotificationTrigger>,
    pub actor: UserInfo,
}

/// Consumes descriptors of a committed run.
pub trait NotificationDispatcher {
    fn dispatch(&self, descriptors: Vec<NotificationDescriptor>);
}

/// Pushes descriptors into an unbounded channel drained by the caller.
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
    sender: mpsc::UnboundedSender<NotificationDescriptor>,
}

impl ChannelDispatcher {
    pub fn new(sender: mpsc::UnboundedSender<NotificationDescriptor>) -> Self {
        Self { sender }
    }

    /// Creates a dispatcher together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<NotificationDescriptor>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl NotificationDispatcher for ChannelDispatcher {
    fn dispatch(&self, descriptors: Vec<NotificationDescriptor>) {
        debug!(count = descriptors.len(), "dispatching notification descriptors");
        for descriptor in descriptors {
            if self.sender.send(descriptor).is_err() {
                warn!("notification receiver dropped, discarding descriptors");
                return;
            }
        }
    }
}
