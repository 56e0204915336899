//! Pull-request client for the GitHub REST API.
//!
//! Uses the curl crate (libcurl). Requests are blocking and run on tokio's
//! blocking pool so the retry loop stays asynchronous.

mod parse;

pub use parse::{error_message, parse_merge, parse_pull};

use crate::automerge::{
    ChangeId, ChangeReviewClient, ChangeSnapshot, MergeResponse, TransportError,
};
use crate::retry::{classify_curl_error, NetworkKind};
use async_trait::async_trait;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("pipekit/", env!("CARGO_PKG_VERSION"));

impl From<curl::Error> for TransportError {
    fn from(e: curl::Error) -> Self {
        TransportError::Network {
            kind: classify_curl_error(&e),
            message: e.to_string(),
        }
    }
}

/// Client for one repository (`owner/name`).
#[derive(Debug, Clone)]
pub struct GithubClient {
    api_url: String,
    repository: String,
    token: String,
    timeout: Duration,
}

impl GithubClient {
    pub fn new(repository: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            repository: repository.into(),
            token: token.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn pull_url(&self, change: ChangeId) -> String {
        format!("{}/repos/{}/pulls/{}", self.api_url, self.repository, change.0)
    }

    /// Perform one request; returns the body of a 2xx response.
    fn request(
        &self,
        method: &str,
        url: &str,
        body: Option<&[u8]>,
    ) -> Result<Vec<u8>, TransportError> {
        let mut response = Vec::new();
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.custom_request(method)?;
        easy.useragent(USER_AGENT)?;
        easy.follow_location(true)?;
        easy.connect_timeout(Duration::from_secs(15))?;
        easy.timeout(self.timeout)?;

        let mut headers = curl::easy::List::new();
        headers.append("Accept: application/vnd.github+json")?;
        headers.append("X-GitHub-Api-Version: 2022-11-28")?;
        headers.append(&format!("Authorization: Bearer {}", self.token))?;
        if let Some(body) = body {
            headers.append("Content-Type: application/json")?;
            easy.post_fields_copy(body)?;
        }
        easy.http_headers(headers)?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                response.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        tracing::debug!(method, url, code, "github api response");
        if !(200..300).contains(&code) {
            let code = u16::try_from(code).unwrap_or(u16::MAX);
            return Err(TransportError::status(code, error_message(&response)));
        }
        Ok(response)
    }

    pub fn fetch_blocking(&self, change: ChangeId) -> Result<ChangeSnapshot, TransportError> {
        let body = self.request("GET", &self.pull_url(change), None)?;
        parse_pull(&body)
    }

    pub fn merge_blocking(
        &self,
        change: ChangeId,
        head_ref: &str,
    ) -> Result<MergeResponse, TransportError> {
        let url = format!("{}/merge", self.pull_url(change));
        let payload = serde_json::json!({ "sha": head_ref }).to_string();
        let body = self.request("PUT", &url, Some(payload.as_bytes()))?;
        parse_merge(&body)
    }
}

async fn blocking<T, F>(f: F) -> Result<T, TransportError>
where
    F: FnOnce() -> Result<T, TransportError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| TransportError::Network {
            kind: NetworkKind::Other,
            message: format!("request task failed: {}", e),
        })?
}

#[async_trait]
impl ChangeReviewClient for GithubClient {
    async fn fetch(&self, change: ChangeId) -> Result<ChangeSnapshot, TransportError> {
        let client = self.clone();
        blocking(move || client.fetch_blocking(change)).await
    }

    async fn merge(
        &self,
        change: ChangeId,
        head_ref: &str,
    ) -> Result<MergeResponse, TransportError> {
        let client = self.clone();
        let head_ref = head_ref.to_string();
        blocking(move || client.merge_blocking(change, &head_ref)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_url_trims_trailing_slash() {
        let client =
            GithubClient::new("acme/widgets", "t").with_api_url("https://ghe.example/api/v3/");
        assert_eq!(
            client.pull_url(ChangeId(42)),
            "https://ghe.example/api/v3/repos/acme/widgets/pulls/42"
        );
    }

    #[test]
    fn curl_errors_become_network_errors() {
        let err: TransportError = curl::Error::new(28).into();
        assert!(matches!(
            err,
            TransportError::Network {
                kind: NetworkKind::Timeout,
                ..
            }
        ));
    }
}
