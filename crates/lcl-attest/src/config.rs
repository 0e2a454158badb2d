use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for signer clients and the publish flow.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AttestConfig {
    /// Base URL of the remote signer service.
    pub signer_url: String,
    /// Per-request timeout for the remote signer.
    pub timeout: Duration,
    /// Attempts at obtaining a signature, including the first.
    pub max_sign_attempts: u32,
    /// Attempts at committing a signed listing, including the first.
    pub max_commit_attempts: u32,
    /// Base delay between attempts; attempt `n` waits `n × backoff`.
    pub backoff: Duration,
}

impl Default for AttestConfig {
    fn default() -> Self {
        Self {
            signer_url: "http://127.0.0.1:8080".to_string(),
            timeout: Duration::from_secs(10),
            max_sign_attempts: 3,
            max_commit_attempts: 3,
            backoff: Duration::from_millis(250),
        }
    }
}

impl AttestConfig {
    pub fn with_signer_url(signer_url: impl Into<String>) -> Self {
        Self {
            signer_url: signer_url.into(),
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}
