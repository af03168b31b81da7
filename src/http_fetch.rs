//! Blocking HTTP fetch adapter shared by catalog clients and the cover cache.

use std::io::Read;
use std::time::Duration;

use serde_json::Value;

/// Identifying client header sent on every outbound request.
pub const CLIENT_USER_AGENT: &str = "paneldex/0.1 (personal comic shelf; metadata fetch)";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(15);
/// At most one redirect hop is followed.
const MAX_REDIRECTS: u32 = 1;

/// Thin wrapper around one `ureq::Agent` with uniform error reporting.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(TRANSFER_TIMEOUT)
            .timeout_write(TRANSFER_TIMEOUT)
            .redirects(MAX_REDIRECTS)
            .build();
        Self { agent }
    }

    /// Issues a GET and parses the response body as JSON.
    pub fn get_json(&self, url: &str) -> Result<Value, String> {
        let response = self
            .agent
            .get(url)
            .set("User-Agent", CLIENT_USER_AGENT)
            .set("Accept", "application/json")
            .call()
            .map_err(|error| format!("Request failed: {error}"))?;
        response
            .into_json()
            .map_err(|error| format!("Invalid JSON response: {error}"))
    }

    /// Issues a GET and returns the raw response body.
    pub fn get_bytes(&self, url: &str, referer: Option<&str>) -> Result<Vec<u8>, String> {
        let mut request = self.agent.get(url).set("User-Agent", CLIENT_USER_AGENT);
        if let Some(referer) = referer {
            request = request.set("Referer", referer);
        }
        let response = request
            .call()
            .map_err(|error| format!("Request failed: {error}"))?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|error| format!("Failed to read response: {error}"))?;
        Ok(bytes)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}
