//! Decode pull-request API responses.

use crate::automerge::{ChangeSnapshot, ChangeState, MergeResponse, TransportError};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct PullRequest {
    state: ChangeState,
    #[serde(default)]
    merged: bool,
    #[serde(default)]
    draft: bool,
    head: Head,
}

#[derive(Debug, Deserialize)]
struct Head {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct MergeBody {
    #[serde(default)]
    merged: bool,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Parse a `GET /pulls/{n}` body.
pub fn parse_pull(body: &[u8]) -> Result<ChangeSnapshot, TransportError> {
    let pr: PullRequest =
        serde_json::from_slice(body).map_err(|e| TransportError::Decode(e.to_string()))?;
    Ok(ChangeSnapshot {
        state: pr.state,
        head_ref: pr.head.sha,
        merged: pr.merged,
        draft: pr.draft,
    })
}

/// Parse a successful `PUT /pulls/{n}/merge` body.
pub fn parse_merge(body: &[u8]) -> Result<MergeResponse, TransportError> {
    let merge: MergeBody =
        serde_json::from_slice(body).map_err(|e| TransportError::Decode(e.to_string()))?;
    Ok(MergeResponse {
        merged: merge.merged,
        message: merge.message,
    })
}

/// Human-readable message from an error body: the API's `message` field if
/// present, otherwise the trimmed raw body.
pub fn error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<ApiError>(body) {
        Ok(err) => err.message,
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    }
}
