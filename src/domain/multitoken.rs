//! Request and response types of the ERC-1155 multi-token endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use super::chain::{Currency, Variant};
use super::types::{SignableRequest, SigningOptions};

const ADDRESS_LENGTH: usize = 42;

fn numeric(value: &str) -> Result<(), ValidationError> {
    let mut parts = value.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next();
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if digits(whole) && fraction.is_none_or(digits) {
        Ok(())
    } else {
        Err(ValidationError::new("numeric").with_message("Must be a numeric string".into()))
    }
}

fn token_id(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.len() > 78 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(
            ValidationError::new("token_id").with_message("Token ID must be 1-78 digits".into())
        );
    }
    Ok(())
}

fn token_ids(values: &[String]) -> Result<(), ValidationError> {
    values.iter().try_for_each(|v| token_id(v))
}

fn amounts(values: &[String]) -> Result<(), ValidationError> {
    values.iter().try_for_each(|v| numeric(v))
}

fn nested_token_ids(values: &[Vec<String>]) -> Result<(), ValidationError> {
    values.iter().try_for_each(|v| token_ids(v))
}

fn nested_amounts(values: &[Vec<String>]) -> Result<(), ValidationError> {
    values.iter().try_for_each(|v| amounts(v))
}

fn addresses(values: &[String]) -> Result<(), ValidationError> {
    if values.iter().all(|a| a.len() == ADDRESS_LENGTH) {
        Ok(())
    } else {
        Err(ValidationError::new("address")
            .with_message("Every address must be 42 characters".into()))
    }
}

fn nested_addresses(values: &[Vec<String>]) -> Result<(), ValidationError> {
    values.iter().try_for_each(|v| addresses(v))
}

fn same_length(left: usize, right: usize, what: &'static str) -> Result<(), ValidationError> {
    if left == right {
        Ok(())
    } else {
        Err(ValidationError::new("length_mismatch").with_message(what.into()))
    }
}

/// Transfer a single token id
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferMultiToken {
    #[schema(value_type = String, example = "ETH")]
    pub chain: Currency,
    /// Recipient address
    #[validate(length(equal = 42, message = "Recipient address must be 42 characters"))]
    #[schema(example = "0x687422eEA2cB73B5d3e242bA5456b782919AFc85")]
    pub to: String,
    #[validate(custom(function = "token_id"))]
    #[schema(example = "100000")]
    pub token_id: String,
    #[validate(custom(function = "numeric"))]
    #[schema(example = "1")]
    pub amount: String,
    #[validate(length(equal = 42, message = "Contract address must be 42 characters"))]
    #[schema(example = "0x687422eEA2cB73B5d3e242bA5456b782919AFc85")]
    pub contract_address: String,
    /// Extra data passed to the receiver hook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 130_000))]
    pub data: Option<String>,
    #[serde(flatten)]
    #[validate(nested)]
    pub signing: SigningOptions,
}

/// Transfer several token ids of one contract
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_transfer_batch"))]
pub struct TransferMultiTokenBatch {
    #[schema(value_type = String, example = "ETH")]
    pub chain: Currency,
    #[validate(length(equal = 42, message = "Recipient address must be 42 characters"))]
    pub to: String,
    #[validate(length(min = 1), custom(function = "token_ids"))]
    pub token_id: Vec<String>,
    #[validate(length(min = 1), custom(function = "amounts"))]
    pub amounts: Vec<String>,
    #[validate(length(equal = 42, message = "Contract address must be 42 characters"))]
    pub contract_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 130_000))]
    pub data: Option<String>,
    #[serde(flatten)]
    #[validate(nested)]
    pub signing: SigningOptions,
}

fn validate_transfer_batch(req: &TransferMultiTokenBatch) -> Result<(), ValidationError> {
    same_length(
        req.token_id.len(),
        req.amounts.len(),
        "tokenId and amounts must have the same length",
    )
}

/// Mint a single token id, optionally with author cashback
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_mint"))]
pub struct MintMultiToken {
    #[schema(value_type = String, example = "CELO")]
    pub chain: Currency,
    #[validate(length(equal = 42, message = "Recipient address must be 42 characters"))]
    pub to: String,
    #[validate(custom(function = "token_id"))]
    pub token_id: String,
    #[validate(custom(function = "numeric"))]
    pub amount: String,
    #[validate(length(equal = 42, message = "Contract address must be 42 characters"))]
    pub contract_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 130_000))]
    pub data: Option<String>,
    /// Royalty recipients; selects the cashback mint when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "addresses"))]
    pub author_addresses: Option<Vec<String>>,
    /// Royalty values, one per author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "amounts"))]
    pub cashback_values: Option<Vec<String>>,
    #[serde(flatten)]
    #[validate(nested)]
    pub signing: SigningOptions,
}

fn validate_mint(req: &MintMultiToken) -> Result<(), ValidationError> {
    match (&req.author_addresses, &req.cashback_values) {
        (None, None) => Ok(()),
        (Some(authors), Some(values)) => same_length(
            authors.len(),
            values.len(),
            "authorAddresses and cashbackValues must have the same length",
        ),
        _ => Err(ValidationError::new("cashback")
            .with_message("authorAddresses and cashbackValues must be given together".into())),
    }
}

/// Mint several token ids to several recipients
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_mint_batch"))]
pub struct MintMultiTokenBatch {
    #[schema(value_type = String, example = "BSC")]
    pub chain: Currency,
    #[validate(length(min = 1), custom(function = "addresses"))]
    pub to: Vec<String>,
    #[validate(length(min = 1), custom(function = "nested_token_ids"))]
    pub token_id: Vec<Vec<String>>,
    #[validate(length(min = 1), custom(function = "nested_amounts"))]
    pub amounts: Vec<Vec<String>>,
    #[validate(length(equal = 42, message = "Contract address must be 42 characters"))]
    pub contract_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 130_000))]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "nested_addresses"))]
    pub author_addresses: Option<Vec<Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "nested_amounts"))]
    pub cashback_values: Option<Vec<Vec<String>>>,
    #[serde(flatten)]
    #[validate(nested)]
    pub signing: SigningOptions,
}

fn validate_mint_batch(req: &MintMultiTokenBatch) -> Result<(), ValidationError> {
    same_length(
        req.to.len(),
        req.token_id.len(),
        "to and tokenId must have the same length",
    )?;
    same_length(
        req.token_id.len(),
        req.amounts.len(),
        "tokenId and amounts must have the same length",
    )?;
    if let Some(authors) = &req.author_addresses {
        same_length(
            authors.len(),
            req.to.len(),
            "authorAddresses and to must have the same length",
        )?;
    }
    Ok(())
}

/// Burn a single token id held by `account`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BurnMultiToken {
    #[schema(value_type = String, example = "ETH")]
    pub chain: Currency,
    /// Holder of the tokens
    #[validate(length(equal = 42, message = "Account address must be 42 characters"))]
    pub account: String,
    #[validate(custom(function = "token_id"))]
    pub token_id: String,
    #[validate(custom(function = "numeric"))]
    pub amount: String,
    #[validate(length(equal = 42, message = "Contract address must be 42 characters"))]
    pub contract_address: String,
    #[serde(flatten)]
    #[validate(nested)]
    pub signing: SigningOptions,
}

/// Burn several token ids held by `account`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_burn_batch"))]
pub struct BurnMultiTokenBatch {
    #[schema(value_type = String, example = "CELO")]
    pub chain: Currency,
    #[validate(length(equal = 42, message = "Account address must be 42 characters"))]
    pub account: String,
    #[validate(length(min = 1), custom(function = "token_ids"))]
    pub token_id: Vec<String>,
    #[validate(length(min = 1), custom(function = "amounts"))]
    pub amounts: Vec<String>,
    #[validate(length(equal = 42, message = "Contract address must be 42 characters"))]
    pub contract_address: String,
    #[serde(flatten)]
    #[validate(nested)]
    pub signing: SigningOptions,
}

fn validate_burn_batch(req: &BurnMultiTokenBatch) -> Result<(), ValidationError> {
    same_length(
        req.token_id.len(),
        req.amounts.len(),
        "tokenId and amounts must have the same length",
    )
}

/// Deploy a new ERC-1155 contract
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeployMultiToken {
    #[schema(value_type = String, example = "ETH")]
    pub chain: Currency,
    /// Metadata URI template
    #[validate(length(min = 1, max = 1024, message = "URI must be 1-1024 characters"))]
    #[schema(example = "https://example.com/{id}.json")]
    pub uri: String,
    /// Allow anyone to mint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_mint: Option<bool>,
    #[serde(flatten)]
    #[validate(nested)]
    pub signing: SigningOptions,
}

/// Update the cashback value of the calling author
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCashbackMultiToken {
    #[schema(value_type = String, example = "ETH")]
    pub chain: Currency,
    #[validate(custom(function = "token_id"))]
    pub token_id: String,
    /// New cashback value
    #[validate(custom(function = "numeric"))]
    #[schema(example = "0.5")]
    pub cashback_value: String,
    #[validate(length(equal = 42, message = "Contract address must be 42 characters"))]
    pub contract_address: String,
    #[serde(flatten)]
    #[validate(nested)]
    pub signing: SigningOptions,
}

macro_rules! signable {
    ($($ty:ty),+ $(,)?) => {$(
        impl SignableRequest for $ty {
            fn chain(&self) -> &Currency {
                &self.chain
            }
            fn signature_id(&self) -> Option<&str> {
                self.signing.signature_id.as_deref()
            }
            fn index(&self) -> Option<u32> {
                self.signing.index
            }
        }
    )+};
}

signable!(
    TransferMultiToken,
    TransferMultiTokenBatch,
    BurnMultiToken,
    BurnMultiTokenBatch,
    DeployMultiToken,
    UpdateCashbackMultiToken,
);

impl SignableRequest for MintMultiToken {
    fn chain(&self) -> &Currency {
        &self.chain
    }
    fn signature_id(&self) -> Option<&str> {
        self.signing.signature_id.as_deref()
    }
    fn index(&self) -> Option<u32> {
        self.signing.index
    }
    fn variant(&self) -> Variant {
        if self.author_addresses.is_some() {
            Variant::Cashback
        } else {
            Variant::Plain
        }
    }
}

impl SignableRequest for MintMultiTokenBatch {
    fn chain(&self) -> &Currency {
        &self.chain
    }
    fn signature_id(&self) -> Option<&str> {
        self.signing.signature_id.as_deref()
    }
    fn index(&self) -> Option<u32> {
        self.signing.index
    }
    fn variant(&self) -> Variant {
        if self.author_addresses.is_some() {
            Variant::Cashback
        } else {
            Variant::Plain
        }
    }
}

/// Path of the metadata and royalty lookups
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Path)]
pub struct TokenPath {
    /// Chain of the contract
    #[param(value_type = String, example = "ETH")]
    pub chain: Currency,
    #[validate(length(equal = 42, message = "Contract address must be 42 characters"))]
    pub contract_address: String,
    #[validate(custom(function = "token_id"))]
    pub token_id: String,
}

/// Path of the tokens-of-owner lookup
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Path)]
pub struct OwnerPath {
    #[param(value_type = String, example = "BSC")]
    pub chain: Currency,
    /// Token holder
    #[validate(length(equal = 42, message = "Address must be 42 characters"))]
    pub address: String,
    #[validate(length(equal = 42, message = "Contract address must be 42 characters"))]
    pub contract_address: String,
}

/// Path of the transaction lookup
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Path)]
pub struct TransactionPath {
    #[param(value_type = String, example = "CELO")]
    pub chain: Currency,
    /// Transaction hash
    #[validate(length(equal = 66, message = "Transaction hash must be 66 characters"))]
    pub hash: String,
}

/// Metadata URI of a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MetadataResponse {
    #[schema(example = "ipfs://QmXJJ6UF5WkF4WTJvsdhiA1etGwBLfpva7Vr9AudGMe3pj")]
    pub data: String,
}

/// Token ids held by an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokensResponse {
    #[schema(example = json!(["1", "2"]))]
    pub data: Vec<String>,
}

/// Royalty recipients and their cashback values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RoyaltyResponse {
    pub addresses: Vec<String>,
    /// Cashback values in whole coin units
    #[schema(example = json!(["0.5"]))]
    pub values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ADDR: &str = "0x687422eEA2cB73B5d3e242bA5456b782919AFc85";

    fn mint_json(chain: &str) -> serde_json::Value {
        json!({
            "chain": chain,
            "to": ADDR,
            "tokenId": "1",
            "amount": "10",
            "contractAddress": ADDR,
            "fromPrivateKey": "0x05e150c73f1920ec14caa1e0b6aa09940899678051a78542840c2668ce5080c2"
        })
    }

    #[test]
    fn test_mint_deserializes_flattened_signing() {
        let req: MintMultiToken = serde_json::from_value(mint_json("ETH")).unwrap();
        assert_eq!(req.chain, Currency::Eth);
        assert!(req.signing.from_private_key.is_some());
        assert!(req.validate().is_ok());
        assert_eq!(req.variant(), Variant::Plain);
    }

    #[test]
    fn test_mint_with_authors_is_cashback_variant() {
        let mut body = mint_json("CELO");
        body["authorAddresses"] = json!([ADDR]);
        body["cashbackValues"] = json!(["0.5"]);
        let req: MintMultiToken = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.variant(), Variant::Cashback);
    }

    #[test]
    fn test_mint_requires_matching_cashback_values() {
        let mut body = mint_json("ETH");
        body["authorAddresses"] = json!([ADDR]);
        let req: MintMultiToken = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_unknown_chain_deserializes() {
        let req: MintMultiToken = serde_json::from_value(mint_json("MATIC")).unwrap();
        assert_eq!(req.chain, Currency::Other("MATIC".to_string()));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_short_contract_address_rejected() {
        let mut body = mint_json("ETH");
        body["contractAddress"] = json!("0x123");
        let req: MintMultiToken = serde_json::from_value(body).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("contract_address"));
    }

    #[test]
    fn test_transfer_batch_length_mismatch_rejected() {
        let req: TransferMultiTokenBatch = serde_json::from_value(json!({
            "chain": "BSC",
            "to": ADDR,
            "tokenId": ["1", "2"],
            "amounts": ["1"],
            "contractAddress": ADDR,
            "signatureId": "26d3883e-4e17-48b3-a0ee-09a3e484ac83"
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_burn_batch_with_kms_signing() {
        let req: BurnMultiTokenBatch = serde_json::from_value(json!({
            "chain": "CELO",
            "account": ADDR,
            "tokenId": ["1", "2"],
            "amounts": ["1", "5"],
            "contractAddress": ADDR,
            "signatureId": "sig-1",
            "index": 2
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.signing.signature_id.as_deref(), Some("sig-1"));
        assert_eq!(req.signing.index, Some(2));
        assert_eq!(req.variant(), Variant::Plain);
    }

    #[test]
    fn test_numeric_strings() {
        assert!(numeric("10").is_ok());
        assert!(numeric("0.25").is_ok());
        assert!(numeric("").is_err());
        assert!(numeric("1.").is_err());
        assert!(numeric("-1").is_err());
        assert!(numeric("1e5").is_err());
    }

    #[test]
    fn test_missing_signer_rejected() {
        let mut body = mint_json("ETH");
        body.as_object_mut().unwrap().remove("fromPrivateKey");
        let req: MintMultiToken = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());
    }
}
