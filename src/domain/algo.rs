//! Request and response types of the Algorand endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use super::chain::Currency;
use super::types::SignableRequest;

/// Length of a base32 Algorand address
pub const ADDRESS_LENGTH: usize = 58;
/// Length of a base32 encoded 64-byte secret key
pub const SECRET_LENGTH: usize = 103;

static ALGO: Currency = Currency::Algo;

fn base32(value: &str) -> Result<(), ValidationError> {
    if value
        .bytes()
        .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b))
    {
        Ok(())
    } else {
        Err(ValidationError::new("base32").with_message("Must be upper-case base32".into()))
    }
}

fn microalgos(value: &str) -> Result<(), ValidationError> {
    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !whole.is_empty() && digits(whole) && digits(fraction) && fraction.len() <= 6 {
        Ok(())
    } else {
        Err(ValidationError::new("amount")
            .with_message("Must be a decimal with at most 6 fraction digits".into()))
    }
}

/// Optional mnemonic for wallet generation
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QueryMnemonic {
    /// 25-word Algorand mnemonic
    #[validate(length(max = 500, message = "Mnemonic must be at most 500 characters"))]
    pub mnemonic: Option<String>,
}

/// Account address in a path
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct PathAddress {
    #[validate(
        length(equal = 58, message = "Address must be 58 characters"),
        custom(function = "base32")
    )]
    #[param(example = "TMETT6BXL3QUH7AH5TS6IONU7LVTLKIGG54CFCNPMQXWGRIZFIESZBYWP4")]
    pub address: String,
}

/// Secret key in a path
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Path)]
pub struct GeneratePrivateKey {
    #[validate(
        length(equal = 103, message = "Private key must be 103 characters"),
        custom(function = "base32")
    )]
    pub from_private_key: String,
}

/// Block round in a path
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Path)]
pub struct PathRoundNumber {
    #[param(example = 16775567)]
    pub round_number: u64,
}

/// Transaction id in a path
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct PathTransactionId {
    #[validate(
        length(equal = 52, message = "Transaction id must be 52 characters"),
        custom(function = "base32")
    )]
    pub txid: String,
}

/// Time window of a payment history lookup
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct PathFromTo {
    /// RFC 3339 start time
    #[validate(length(min = 1, max = 64))]
    #[param(example = "2021-05-01T00:00:00Z")]
    pub from: String,
    /// RFC 3339 end time
    #[validate(length(min = 1, max = 64))]
    #[param(example = "2021-06-01T00:00:00Z")]
    pub to: String,
}

/// Indexer pagination
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    #[validate(range(min = 1, max = 1000, message = "Limit must be between 1 and 1000"))]
    pub limit: Option<u32>,
    /// Token returned by the previous page
    #[validate(length(min = 1, max = 200))]
    pub next: Option<String>,
}

/// Path segments of the node proxy
#[derive(Debug, Clone, Deserialize)]
pub struct NodePath {
    #[serde(rename = "xApiKey")]
    pub x_api_key: String,
    /// Remainder forwarded to the node
    #[serde(default)]
    pub path: Option<String>,
}

/// Algorand payment
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_signer"))]
pub struct AlgoTransaction {
    /// Recipient address
    #[validate(
        length(equal = 58, message = "Recipient address must be 58 characters"),
        custom(function = "base32")
    )]
    pub to: String,
    /// Amount in ALGO
    #[validate(custom(function = "microalgos"))]
    #[schema(example = "1.5")]
    pub amount: String,
    /// Fee in ALGO
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "microalgos"))]
    #[schema(example = "0.001")]
    pub fee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub note: Option<String>,
    /// Sender secret key (base32)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(equal = 103, message = "Private key must be 103 characters"))]
    pub from_private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100, message = "Signature ID must be 1-100 characters"))]
    pub signature_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

fn validate_signer(tx: &AlgoTransaction) -> Result<(), ValidationError> {
    if tx.from_private_key.is_some() == tx.signature_id.is_some() {
        return Err(ValidationError::new("signer")
            .with_message("Exactly one of fromPrivateKey or signatureId is required".into()));
    }
    Ok(())
}

impl SignableRequest for AlgoTransaction {
    fn chain(&self) -> &Currency {
        &ALGO
    }
    fn signature_id(&self) -> Option<&str> {
        self.signature_id.as_deref()
    }
    fn index(&self) -> Option<u32> {
        self.index
    }
}

/// Raw transaction to broadcast
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastTx {
    /// Hex encoded signed transaction
    #[validate(length(min = 1, max = 500_000, message = "Transaction data is required"))]
    pub tx_data: String,
    /// KMS transaction to complete after broadcasting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub signature_id: Option<String>,
}

/// Generated wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AlgoWallet {
    #[schema(example = "TMETT6BXL3QUH7AH5TS6IONU7LVTLKIGG54CFCNPMQXWGRIZFIESZBYWP4")]
    pub address: String,
    /// Base32 encoded 64-byte secret key
    pub secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AddressResponse {
    pub address: String,
}

/// Account balance in ALGO
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    #[schema(example = "12.5")]
    pub balance: String,
}

/// A page of payment transactions
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayTransactions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[schema(value_type = Vec<Object>)]
    pub transactions: Vec<serde_json::Value>,
}
