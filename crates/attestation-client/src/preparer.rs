//! Request preparation through the verifier service.
//!
//! The verifier checks that the transaction exists and is attestable, and
//! returns the ABI-encoded request the hub contract expects. One call per
//! preparation; transient verifier failures are left to the caller.

use crate::implementations::http::build_http_client;
use crate::wait::run_or_cancel;
use crate::AttestationError;
use attestation_config::ServiceConfig;
use attestation_types::{
	truncate_id, AttestationKind, AttestationRequest, Bytes, EvmTransactionRequestBody,
	PaymentRequestBody, PreparedRequest, RequestStatus, SecretString,
};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Verifier answer to a prepare call.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrepareResponse {
	status: Option<String>,
	abi_encoded_request: Option<String>,
}

/// Client of the verifier's `prepareRequest` endpoints.
pub struct RequestPreparer {
	client: reqwest::Client,
	base_url: String,
	api_key: Option<SecretString>,
}

impl RequestPreparer {
	pub fn new(service: &ServiceConfig, timeout: Duration) -> Result<Self, AttestationError> {
		Ok(Self {
			client: build_http_client(timeout)?,
			base_url: service.base_url.trim_end_matches('/').to_string(),
			api_key: service.api_key.clone(),
		})
	}

	/// Endpoint serving the request's chain and attestation kind.
	pub fn endpoint(&self, request: &AttestationRequest) -> String {
		format!(
			"{}/verifier/{}/{}/prepareRequest",
			self.base_url,
			request.source_chain().short_name(),
			request.attestation_kind()
		)
	}

	/// Asks the verifier to validate and encode `request`.
	///
	/// A non-VALID verdict is returned as a `PreparedRequest` carrying that
	/// status; submission refuses it.
	pub async fn prepare(
		&self,
		request: &AttestationRequest,
		cancel: &CancellationToken,
	) -> Result<PreparedRequest, AttestationError> {
		run_or_cancel(self.prepare_inner(request), cancel).await
	}

	async fn prepare_inner(
		&self,
		request: &AttestationRequest,
	) -> Result<PreparedRequest, AttestationError> {
		let url = self.endpoint(request);
		let payload = serde_json::json!({
			"attestationType": request.attestation_kind().type_id(),
			"sourceId": request.source_chain().source_id(),
			"requestBody": request_body(request)?,
		});

		tracing::debug!(
			url = %url,
			tx_hash = %truncate_id(&request.transaction_hash().to_string()),
			"Preparing attestation request"
		);

		let mut builder = self.client.post(&url).json(&payload);
		if let Some(key) = &self.api_key {
			builder = key.with_exposed(|k| builder.header("X-API-KEY", k));
		}

		let response = builder.send().await.map_err(|e| {
			AttestationError::VerifierUnreachable(format!("Request to {} failed: {}", url, e))
		})?;

		let status = response.status();
		let body = response.text().await.map_err(|e| {
			AttestationError::VerifierUnreachable(format!(
				"Failed to read HTTP {} response body: {}",
				status.as_u16(),
				e
			))
		})?;
		if !status.is_success() {
			return Err(AttestationError::VerifierService {
				status: status.as_u16(),
				body,
			});
		}

		let parsed: PrepareResponse = serde_json::from_str(&body).map_err(|e| {
			AttestationError::MalformedVerifierResponse(format!("Invalid JSON: {}", e))
		})?;
		let verdict = parsed
			.status
			.as_deref()
			.map(RequestStatus::from_verifier)
			.ok_or_else(|| AttestationError::MalformedVerifierResponse("missing status".into()))?;

		let encoded_request = match parsed.abi_encoded_request.as_deref() {
			Some(hex) => Bytes::from_str(hex).map_err(|e| {
				AttestationError::MalformedVerifierResponse(format!(
					"abiEncodedRequest is not hex: {}",
					e
				))
			})?,
			None => Bytes::new(),
		};
		if verdict.is_valid() && encoded_request.is_empty() {
			return Err(AttestationError::MalformedVerifierResponse(
				"missing abiEncodedRequest".into(),
			));
		}

		tracing::info!(
			status = %verdict,
			encoded_len = encoded_request.len(),
			"Verifier prepared request"
		);

		Ok(PreparedRequest {
			encoded_request,
			status: verdict,
		})
	}
}

/// Kind-specific request body sent to the verifier.
fn request_body(request: &AttestationRequest) -> Result<serde_json::Value, AttestationError> {
	let body = match request.attestation_kind() {
		AttestationKind::EvmTransaction => serde_json::to_value(EvmTransactionRequestBody::new(
			request.transaction_hash(),
			request.required_confirmations(),
		)),
		AttestationKind::Payment => {
			serde_json::to_value(PaymentRequestBody::new(request.transaction_hash()))
		},
	};
	body.map_err(|e| AttestationError::Configuration(format!("Failed to encode request body: {}", e)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use attestation_types::{SourceChain, B256};
	use serde_json::json;
	use wiremock::matchers::{body_partial_json, header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn preparer(server: &MockServer, api_key: Option<&str>) -> RequestPreparer {
		let service = ServiceConfig {
			base_url: format!("{}/", server.uri()),
			api_key: api_key.map(SecretString::from),
		};
		RequestPreparer::new(&service, Duration::from_secs(5)).unwrap()
	}

	fn sepolia_request() -> AttestationRequest {
		AttestationRequest::new(SourceChain::Sepolia, B256::repeat_byte(0x11), 1).unwrap()
	}

	#[tokio::test]
	async fn test_prepare_evm_transaction() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/verifier/eth/EVMTransaction/prepareRequest"))
			.and(header("X-API-KEY", "verifier-key"))
			.and(body_partial_json(json!({
				"attestationType": AttestationKind::EvmTransaction.type_id(),
				"sourceId": SourceChain::Sepolia.source_id(),
				"requestBody": {
					"requiredConfirmations": "1",
					"provideInput": true,
					"listEvents": true,
					"logIndices": []
				}
			})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"status": "VALID",
				"abiEncodedRequest": "0x45564d5472616e73616374696f6e"
			})))
			.expect(1)
			.mount(&server)
			.await;

		let prepared = preparer(&server, Some("verifier-key"))
			.prepare(&sepolia_request(), &CancellationToken::new())
			.await
			.unwrap();

		assert_eq!(prepared.status, RequestStatus::Valid);
		assert_eq!(prepared.encoded_request.len(), 14);
	}

	#[tokio::test]
	async fn test_prepare_payment_uses_placeholder_utxos() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/verifier/xrp/Payment/prepareRequest"))
			.and(body_partial_json(json!({
				"requestBody": { "inUtxo": "0", "utxo": "0" }
			})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"status": "VALID",
				"abiEncodedRequest": "0x01"
			})))
			.expect(1)
			.mount(&server)
			.await;

		let request =
			AttestationRequest::new(SourceChain::XrplTestnet, B256::repeat_byte(0x22), 1).unwrap();
		let prepared = preparer(&server, None)
			.prepare(&request, &CancellationToken::new())
			.await
			.unwrap();
		assert!(prepared.status.is_valid());
	}

	#[tokio::test]
	async fn test_http_error_carries_status_and_body() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(503).set_body_string("verifier overloaded"))
			.expect(1)
			.mount(&server)
			.await;

		let err = preparer(&server, None)
			.prepare(&sepolia_request(), &CancellationToken::new())
			.await
			.unwrap_err();
		match err {
			AttestationError::VerifierService { status, body } => {
				assert_eq!(status, 503);
				assert_eq!(body, "verifier overloaded");
			},
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_timeout_is_unreachable_not_status() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
			.mount(&server)
			.await;
		let service = ServiceConfig {
			base_url: server.uri(),
			api_key: None,
		};

		let err = RequestPreparer::new(&service, Duration::from_millis(100))
			.unwrap()
			.prepare(&sepolia_request(), &CancellationToken::new())
			.await
			.unwrap_err();
		assert!(matches!(err, AttestationError::VerifierUnreachable(_)));
		assert!(err.is_recoverable());
	}

	#[tokio::test]
	async fn test_valid_without_encoded_request_is_malformed() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "VALID" })))
			.mount(&server)
			.await;

		let err = preparer(&server, None)
			.prepare(&sepolia_request(), &CancellationToken::new())
			.await
			.unwrap_err();
		assert!(matches!(err, AttestationError::MalformedVerifierResponse(_)));
	}

	#[tokio::test]
	async fn test_invalid_verdict_is_returned_not_raised() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(
				ResponseTemplate::new(200)
					.set_body_json(json!({ "status": "INVALID: transaction not found" })),
			)
			.mount(&server)
			.await;

		let prepared = preparer(&server, None)
			.prepare(&sepolia_request(), &CancellationToken::new())
			.await
			.unwrap();
		assert_eq!(prepared.status, RequestStatus::Invalid);
		assert!(prepared.encoded_request.is_empty());
	}

	#[tokio::test]
	async fn test_cancelled_before_response() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(
				ResponseTemplate::new(200)
					.set_delay(Duration::from_secs(10))
					.set_body_json(json!({ "status": "VALID", "abiEncodedRequest": "0x01" })),
			)
			.mount(&server)
			.await;

		let cancel = CancellationToken::new();
		cancel.cancel();
		let err = preparer(&server, None)
			.prepare(&sepolia_request(), &cancel)
			.await
			.unwrap_err();
		assert!(matches!(err, AttestationError::Cancelled));
	}
}
