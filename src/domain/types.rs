//! Shared request/response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::chain::{Currency, Variant};
use super::error::FieldViolation;

/// Custom fee settings for EVM transactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Fee {
    /// Gas limit in gas units
    #[validate(length(min = 1, message = "Gas limit is required"))]
    #[schema(example = "40000")]
    pub gas_limit: String,
    /// Gas price in Gwei
    #[validate(length(min = 1, message = "Gas price is required"))]
    #[schema(example = "20")]
    pub gas_price: String,
}

/// Signing options shared by every mutating request.
///
/// Exactly one of `fromPrivateKey` (sign and broadcast now) or `signatureId`
/// (store for KMS signing) must be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_signer"))]
pub struct SigningOptions {
    /// Private key of the sender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 103, message = "Private key must be 1-103 characters"))]
    pub from_private_key: Option<String>,
    /// Identifier of the key held by the KMS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100, message = "Signature ID must be 1-100 characters"))]
    #[schema(example = "26d3883e-4e17-48b3-a0ee-09a3e484ac83")]
    pub signature_id: Option<String>,
    /// Derivation index of the KMS key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    /// Nonce to use for the transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    /// Custom fee
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub fee: Option<Fee>,
    /// Currency to pay the fee in (Celo only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "CUSD")]
    pub fee_currency: Option<String>,
}

fn validate_signer(options: &SigningOptions) -> Result<(), validator::ValidationError> {
    match (&options.from_private_key, &options.signature_id) {
        (Some(_), None) | (None, Some(_)) => Ok(()),
        _ => Err(validator::ValidationError::new("signer")
            .with_message("Exactly one of fromPrivateKey or signatureId is required".into())),
    }
}

/// Common view over requests that go through the dispatch workflow
pub trait SignableRequest: Serialize + Send + Sync {
    /// The requested chain
    fn chain(&self) -> &Currency;

    /// KMS key reference; selects the deferred-signing path when present
    fn signature_id(&self) -> Option<&str>;

    fn index(&self) -> Option<u32>;

    /// Plain unless the request carries cashback recipients
    fn variant(&self) -> Variant {
        Variant::Plain
    }
}

/// Acknowledgement of a transaction stored for KMS signing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignatureId {
    /// Reference of the stored transaction
    #[schema(example = "26d3883e-4e17-48b3-a0ee-09a3e484ac83")]
    pub signature_id: String,
}

/// Result of broadcasting a signed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionHash {
    /// Transaction hash / id on chain
    #[schema(example = "0xe6e7340394958674cdf8606936d292f565e4ecc476aaa8b258ec8a141f7c75d7")]
    pub tx_id: String,
    /// Set when the broadcast succeeded but KMS bookkeeping failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed: Option<bool>,
}

impl TransactionHash {
    pub fn new(tx_id: impl Into<String>) -> Self {
        Self {
            tx_id: tx_id.into(),
            failed: None,
        }
    }
}

/// Outcome of a mutating operation: exactly one of KMS ack or broadcast hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum DispatchResult {
    Signature(SignatureId),
    Broadcast(TransactionHash),
}

impl DispatchResult {
    #[must_use]
    pub fn signature(signature_id: String) -> Self {
        Self::Signature(SignatureId { signature_id })
    }
}

/// Health status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational
    Healthy,
    /// Some systems degraded but functional
    Degraded,
    /// Critical systems unavailable
    Unhealthy,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Overall system status
    pub status: HealthStatus,
    /// KMS transaction store status
    pub kms_store: HealthStatus,
    /// Node endpoint configuration status
    pub nodes: HealthStatus,
    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
    /// Application version
    #[schema(example = "0.1.0")]
    pub version: String,
}

impl HealthResponse {
    #[must_use]
    pub fn new(kms_store: HealthStatus, nodes: HealthStatus) -> Self {
        let status = match (&kms_store, &nodes) {
            (HealthStatus::Healthy, HealthStatus::Healthy) => HealthStatus::Healthy,
            // Broadcasting still works without the KMS store
            (HealthStatus::Unhealthy, HealthStatus::Healthy) => HealthStatus::Degraded,
            (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
            _ => HealthStatus::Degraded,
        };
        Self {
            status,
            kms_store,
            nodes,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error body returned for validation and domain errors
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    #[schema(example = "Unsupported chain MATIC.")]
    pub message: String,
    /// Machine-readable error code
    #[schema(example = "unsuported.chain")]
    pub code: String,
    /// Field violations, present for validation errors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldViolation>,
}

/// Rate limit exceeded response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RateLimitResponse {
    /// Error details
    pub message: String,
    /// Machine-readable error code
    #[schema(example = "rate.limited")]
    pub code: String,
    /// Seconds until a request will be accepted again
    #[schema(example = 1)]
    pub retry_after: u64,
}
