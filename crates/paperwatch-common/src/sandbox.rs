use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use tracing::warn;
use url::Url;
use crate::error::CommonError;

/// Identification string sent with every outbound fetch.
pub const USER_AGENT: &str = concat!("paperwatch/", env!("CARGO_PKG_VERSION"), " (research digest bot)");

/// Per-call timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// An HTTP client that only talks to approved hosts.
/// Every source fetcher owns one; nothing else in the pipeline makes outbound calls.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    /// Creates a client with the default allowlist and a 30s per-call timeout.
    pub fn new() -> Result<Self, CommonError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, CommonError> {
        let domains = [
            "export.arxiv.org",   // arXiv
            "arxiv.org",          // arXiv abs/pdf links
            "paperswithcode.com", // Papers with Code
            "huggingface.co",     // Hugging Face daily papers
            "localhost",
            "127.0.0.1",
        ];
        let allowlist = domains.iter().map(|d| d.to_string()).collect();

        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CommonError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Validates if a URL is permitted under the current policy.
    pub fn is_allowed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else { return false };
        let Some(host) = parsed.host_str() else { return false };
        // Exact match or a subdomain of an allowed host
        self.allowlist
            .iter()
            .any(|allowed| host == allowed || host.ends_with(&format!(".{}", allowed)))
    }

    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, CommonError> {
        if !self.is_allowed(url) {
            warn!(url, "Refusing request to host outside the allowlist");
            return Err(CommonError::SecurityError(format!(
                "domain not in allowlist for URL {}",
                url
            )));
        }
        Ok(self.client.get(url))
    }
}
