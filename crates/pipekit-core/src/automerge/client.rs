//! Boundary to the remote change-review service.

use crate::retry::NetworkKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a reviewable change (pull request number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeId(pub u64);

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeState {
    Open,
    Closed,
}

/// What `fetch` observed about a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSnapshot {
    pub state: ChangeState,
    /// Head commit the merge must be applied against.
    pub head_ref: String,
    pub merged: bool,
    pub draft: bool,
}

/// Result of a merge call that did not fail at the transport level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResponse {
    /// False when the service accepted the request but did not merge.
    pub merged: bool,
    pub message: String,
}

/// Failure talking to the remote service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The service answered with a non-success HTTP status.
    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },
    /// No response was received.
    #[error("{kind} error: {message}")]
    Network { kind: NetworkKind, message: String },
    /// A response arrived but could not be understood.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        TransportError::Status {
            code,
            message: message.into(),
        }
    }
}

/// Remote change-review service. Implementations must be safe to share;
/// the workflow adds no locking around them.
#[async_trait]
pub trait ChangeReviewClient: Send + Sync {
    async fn fetch(&self, change: ChangeId) -> Result<ChangeSnapshot, TransportError>;

    async fn merge(&self, change: ChangeId, head_ref: &str)
        -> Result<MergeResponse, TransportError>;
}
