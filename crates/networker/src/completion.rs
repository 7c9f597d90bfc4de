//! Delivery of finished requests back to the collaborator.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use shared::domain::{Classification, RequestKey};

use crate::request::{NetRequest, RequestKind};

/// Invoked once on the networker thread for every request that ran.
pub type ResponseHandler = Arc<dyn Fn(&NetRequest) + Send + Sync>;

/// Owned snapshot of a finished request, suitable for sending across threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOutcome {
    pub key: RequestKey,
    pub kind: RequestKind,
    pub classification: Classification,
    pub url: String,
    pub status: i32,
    pub response: String,
    pub additional_data: String,
}

impl From<&NetRequest> for RequestOutcome {
    fn from(request: &NetRequest) -> Self {
        Self {
            key: request.key(),
            kind: request.kind(),
            classification: request.classification(),
            url: request.url().to_string(),
            status: request.status(),
            response: request.response().to_string(),
            additional_data: request.additional_data().to_string(),
        }
    }
}

impl RequestOutcome {
    pub fn is_success(&self) -> bool {
        shared::status::is_success(self.status)
    }
}

/// A handler that forwards outcomes to a single consumer thread.
pub fn channel_handler(tx: Sender<RequestOutcome>) -> ResponseHandler {
    Arc::new(move |request: &NetRequest| {
        match tx.try_send(RequestOutcome::from(request)) {
            Ok(()) => {}
            Err(TrySendError::Full(outcome)) => {
                tracing::warn!(key = outcome.key.0, "completion queue is full; dropping outcome")
            }
            Err(TrySendError::Disconnected(outcome)) => {
                tracing::debug!(key = outcome.key.0, "completion receiver is gone")
            }
        }
    })
}

/// Unbounded completion channel: the handler to give the pool and the
/// receiver the UI drains.
pub fn completion_channel() -> (ResponseHandler, Receiver<RequestOutcome>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (channel_handler(tx), rx)
}
