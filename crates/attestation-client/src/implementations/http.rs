//! HTTP implementation of the DA proof transport.

use crate::proof::{decode_envelope, AttestationProof};
use crate::retriever::ProofTransport;
use crate::{AttestationError, ProofFetchError};
use async_trait::async_trait;
use attestation_config::ServiceConfig;
use attestation_types::{Bytes, SecretString};
use std::time::Duration;

const PROOF_PATH: &str = "/api/v0/fdc/get-proof-round-id-bytes";

/// Builds the HTTP client shared by the verifier and DA calls.
pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client, AttestationError> {
	reqwest::Client::builder()
		.timeout(timeout)
		.build()
		.map_err(|e| AttestationError::Configuration(format!("Failed to build HTTP client: {}", e)))
}

/// Fetches proofs from the data-availability service by round and request bytes.
pub struct HttpProofTransport {
	client: reqwest::Client,
	url: String,
	api_key: Option<SecretString>,
}

impl HttpProofTransport {
	pub fn new(service: &ServiceConfig, timeout: Duration) -> Result<Self, AttestationError> {
		Ok(Self {
			client: build_http_client(timeout)?,
			url: format!("{}{}", service.base_url.trim_end_matches('/'), PROOF_PATH),
			api_key: service.api_key.clone(),
		})
	}
}

#[async_trait]
impl ProofTransport for HttpProofTransport {
	async fn fetch_proof(
		&self,
		round_id: u64,
		request_bytes: &Bytes,
	) -> Result<AttestationProof, ProofFetchError> {
		let payload = serde_json::json!({
			"votingRoundId": round_id,
			"requestBytes": request_bytes,
		});

		let mut builder = self.client.post(&self.url).json(&payload);
		if let Some(key) = &self.api_key {
			builder = key.with_exposed(|k| builder.header("x-api-key", k));
		}

		let response = builder
			.send()
			.await
			.map_err(|e| ProofFetchError::Transport(e.to_string()))?;

		let status = response.status();
		let body = response
			.text()
			.await
			.map_err(|e| ProofFetchError::Transport(e.to_string()))?;
		if !status.is_success() {
			return Err(ProofFetchError::Status {
				status: status.as_u16(),
				body,
			});
		}
		if body.trim().is_empty() {
			return Err(ProofFetchError::NotAvailable("empty response body".into()));
		}

		let envelope: serde_json::Value = serde_json::from_str(&body)
			.map_err(|e| ProofFetchError::Malformed(format!("invalid JSON: {}", e)))?;
		decode_envelope(envelope)
	}
}
