use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use crate::config::AttestConfig;
use crate::error::{AttestError, AttestResult};
use crate::request::{ListingRequest, SignedListing};
use crate::signer::ListingSigner;

pub const LISTING_PATH: &str = "/api/catalog/listing";

/// Client for a remote signer service.
#[derive(Clone, Debug)]
pub struct HttpSigner {
    http: reqwest::Client,
    endpoint: Url,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpSigner {
    pub fn new(config: &AttestConfig) -> AttestResult<Self> {
        let mut base = Url::parse(&config.signer_url)
            .map_err(|e| AttestError::Config(format!("signer_url {:?}: {e}", config.signer_url)))?;
        // A path prefix in the base URL is kept: the listing path joins under it.
        if !base.path().ends_with('/') {
            let prefix = format!("{}/", base.path());
            base.set_path(&prefix);
        }
        let endpoint = base
            .join(LISTING_PATH.trim_start_matches('/'))
            .map_err(|e| AttestError::Config(e.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AttestError::Config(e.to_string()))?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ListingSigner for HttpSigner {
    async fn sign(&self, request: &ListingRequest) -> AttestResult<SignedListing> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| AttestError::unavailable(e.to_string(), true))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AttestError::unavailable(e.to_string(), true))?;

        if !status.is_success() {
            let reason = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            tracing::warn!(%status, %reason, "signer returned an error");
            // A client error will not go away on retry.
            return Err(AttestError::unavailable(
                format!("{status}: {reason}"),
                !status.is_client_error(),
            ));
        }

        serde_json::from_str(&body)
            .map_err(|e| AttestError::unavailable(format!("malformed signer response: {e}"), true))
    }
}
