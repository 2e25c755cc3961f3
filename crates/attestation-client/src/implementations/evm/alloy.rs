//! Alloy-backed hub and verification contract clients.
//!
//! Both clients share one provider. The provider carries the submission
//! signer, so hub transactions are signed locally and nonces, gas and chain
//! id are filled by alloy's recommended fillers.

use crate::abi::{EvmProof, IFdcHub, IFdcVerification, PaymentProof};
use crate::submitter::{HubInterface, SubmittedRequest};
use crate::verifier::VerificationInterface;
use crate::{AttestationError, ChainError};
use alloy::network::{EthereumWallet, ReceiptResponse};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::BlockNumberOrTag;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use attestation_config::{NetworkConfig, SubmissionConfig};
use attestation_types::{truncate_id, Address, Bytes, U256};
use std::time::Duration;

/// Connects a signing provider to the configured RPC endpoint.
pub fn connect(
	network: &NetworkConfig,
	submission: &SubmissionConfig,
) -> Result<DynProvider, AttestationError> {
	let signer = submission
		.private_key
		.with_exposed(|key| key.parse::<PrivateKeySigner>())
		.map_err(|e| {
			AttestationError::Configuration(format!("Invalid submission.private_key: {}", e))
		})?;

	let url = network.rpc_url.parse().map_err(|e| {
		AttestationError::Configuration(format!("Invalid network.rpc_url: {}", e))
	})?;

	tracing::info!(submitter = %signer.address(), "Connecting to RPC endpoint");

	Ok(ProviderBuilder::new()
		.wallet(EthereumWallet::from(signer))
		.connect_http(url)
		.erased())
}

/// Hub contract client that sends `requestAttestation` transactions.
pub struct AlloyHub {
	provider: DynProvider,
	hub_address: Address,
	confirmations: u64,
	confirmation_timeout: Duration,
}

impl AlloyHub {
	pub fn new(
		provider: DynProvider,
		hub_address: Address,
		submission: &SubmissionConfig,
	) -> Self {
		Self {
			provider,
			hub_address,
			confirmations: submission.confirmations,
			confirmation_timeout: Duration::from_secs(submission.confirmation_timeout_seconds),
		}
	}
}

#[async_trait]
impl HubInterface for AlloyHub {
	async fn request_attestation(
		&self,
		encoded_request: &Bytes,
		fee: U256,
	) -> Result<SubmittedRequest, ChainError> {
		let hub = IFdcHub::new(self.hub_address, self.provider.clone());

		let pending = hub
			.requestAttestation(encoded_request.clone())
			.value(fee)
			.send()
			.await
			.map_err(|e| ChainError::Send(e.to_string()))?;

		let transaction_hash = *pending.tx_hash();
		tracing::info!(
			tx_hash = %truncate_id(&transaction_hash.to_string()),
			confirmations = self.confirmations,
			"Submitted attestation request"
		);

		let receipt = pending
			.with_required_confirmations(self.confirmations)
			.with_timeout(Some(self.confirmation_timeout))
			.get_receipt()
			.await
			.map_err(|e| ChainError::Receipt {
				transaction_hash,
				reason: format!("no confirmed receipt: {}", e),
			})?;

		if !receipt.status() {
			return Err(ChainError::Receipt {
				transaction_hash,
				reason: "execution reverted".into(),
			});
		}

		let block_number = receipt.block_number.ok_or_else(|| ChainError::Receipt {
			transaction_hash,
			reason: "receipt has no block number".into(),
		})?;

		Ok(SubmittedRequest {
			transaction_hash,
			block_number,
		})
	}

	async fn block_timestamp(&self, block_number: u64) -> Result<u64, ChainError> {
		let block = self
			.provider
			.get_block_by_number(BlockNumberOrTag::Number(block_number))
			.await
			.map_err(|e| ChainError::Block(e.to_string()))?
			.ok_or_else(|| ChainError::Block(format!("block {} not found", block_number)))?;

		Ok(block.header.timestamp)
	}
}

/// Verification contract client. Calls are `eth_call`s and spend no gas.
pub struct AlloyVerification {
	provider: DynProvider,
	address: Address,
}

impl AlloyVerification {
	pub fn new(provider: DynProvider, address: Address) -> Self {
		Self { provider, address }
	}

	fn contract(&self) -> IFdcVerification::IFdcVerificationInstance<DynProvider> {
		IFdcVerification::new(self.address, self.provider.clone())
	}
}

#[async_trait]
impl VerificationInterface for AlloyVerification {
	async fn verify_evm_transaction(&self, proof: EvmProof) -> Result<bool, ChainError> {
		self.contract()
			.verifyEVMTransaction(proof)
			.call()
			.await
			.map_err(|e| ChainError::Call(e.to_string()))
	}

	async fn verify_payment(&self, proof: PaymentProof) -> Result<bool, ChainError> {
		self.contract()
			.verifyPayment(proof)
			.call()
			.await
			.map_err(|e| ChainError::Call(e.to_string()))
	}
}
