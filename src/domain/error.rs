//! Error types for the connector.
//!
//! [`AppError`] is the closed set of failures a collaborator or service can
//! produce. The HTTP layer translates it into one of three shapes:
//! validation (400), domain (passed through) or unexpected (wrapped).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::chain::Currency;

/// Machine-readable codes attached to domain errors.
pub mod codes {
    pub const NFT_FAILED: &str = "nft.erc721.failed";
    pub const TX_NOT_FOUND: &str = "tx.not.found";
    // The misspelling is part of the public error contract.
    pub const UNSUPPORTED_CHAIN: &str = "unsuported.chain";
    pub const MULTI_TOKEN: &str = "multitoken.error";
    pub const ALGO: &str = "algo.error";
    pub const ALGO_NODE: &str = "Algo.error";
    pub const VALIDATION: &str = "validation.failed";
}

/// Top-level application error
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Blockchain error: {0}")]
    Blockchain(#[from] BlockchainError),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Best-effort human readable reason, used when the error is reported
    /// as unexpected.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            AppError::Upstream(upstream) => upstream.reason(),
            AppError::Blockchain(err) => err.to_string(),
            AppError::Key(err) => err.to_string(),
            AppError::Database(err) => err.to_string(),
            AppError::Config(err) => err.to_string(),
            AppError::Domain(err) => err.message.clone(),
            AppError::Serialization(msg) | AppError::Internal(msg) => msg.clone(),
            AppError::Validation(err) => err.to_string(),
        }
    }

    #[must_use]
    pub fn is_domain(&self) -> bool {
        matches!(self, AppError::Domain(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldViolation {
    /// Dotted path of the offending field
    #[schema(example = "contractAddress")]
    pub field: String,
    /// What is wrong with it
    #[schema(example = "Contract address must be 42 characters")]
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Input validation errors
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("{} validation failure(s)", .0.len())]
    Multiple(Vec<FieldViolation>),

    #[error("Malformed request: {0}")]
    Malformed(String),
}

impl ValidationError {
    /// Flatten into the list reported to clients.
    #[must_use]
    pub fn violations(&self) -> Vec<FieldViolation> {
        match self {
            ValidationError::InvalidField { field, message } => {
                vec![FieldViolation::new(field.clone(), message.clone())]
            }
            ValidationError::Multiple(list) => list.clone(),
            ValidationError::Malformed(message) => vec![FieldViolation::new("body", message.clone())],
        }
    }
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut violations = Vec::new();
        collect_violations("", &errors, &mut violations);
        violations.sort_by(|a, b| a.field.cmp(&b.field));
        ValidationError::Multiple(violations)
    }
}

/// Field names are reported the way they appear on the wire
fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn collect_violations(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<FieldViolation>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        // Struct-level checks are keyed as "__all__"; report them on the parent.
        let path = match (prefix.is_empty(), field.as_ref()) {
            (true, "__all__") => "body".to_string(),
            (false, "__all__") => prefix.to_string(),
            (true, name) => camel_case(name),
            (false, name) => format!("{prefix}.{}", camel_case(name)),
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string());
                    out.push(FieldViolation::new(path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_violations(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_violations(&format!("{path}[{index}]"), inner, out);
                }
            }
        }
    }
}

/// Expected failure of a chain interaction, reported to clients verbatim
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, ToSchema)]
#[error("{message}")]
pub struct DomainError {
    /// Human-readable message
    #[schema(example = "Unsupported chain MATIC.")]
    pub message: String,
    /// Machine-readable error code
    #[schema(example = "unsuported.chain")]
    pub code: String,
}

impl DomainError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
        }
    }

    #[must_use]
    pub fn unsupported_chain(chain: &Currency) -> Self {
        Self::new(format!("Unsupported chain {chain}."), codes::UNSUPPORTED_CHAIN)
    }

    #[must_use]
    pub fn token_read_failed(cause: impl std::fmt::Display) -> Self {
        Self::new(
            format!("Unable to obtain information for token. {cause}"),
            codes::NFT_FAILED,
        )
    }

    #[must_use]
    pub fn transaction_not_found() -> Self {
        Self::new(
            "Transaction not found. Possible not exists or is still pending.",
            codes::TX_NOT_FOUND,
        )
    }
}

/// Failure reported by a remote HTTP collaborator (node, SDK, KMS).
///
/// Carries the same pieces a JavaScript HTTP client error exposes so the
/// handler can pick the most specific reason.
#[derive(Debug, Clone, Default, Error)]
#[error("{raw}")]
pub struct UpstreamError {
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    /// `message.message` of a structured error payload
    pub nested_message: Option<String>,
    /// Response payload (its `message` field when it is a JSON object)
    pub response_data: Option<String>,
    /// Transport level message, e.g. "Request failed with status code 400"
    pub message: Option<String>,
    /// Stringified error
    pub raw: String,
}

impl UpstreamError {
    /// Build from a non-success HTTP response.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let message_field = parsed.as_ref().and_then(|v| v.get("message"));

        let nested_message = message_field
            .and_then(|m| m.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string);
        let response_data = match message_field.and_then(|m| m.as_str()) {
            Some(message) => Some(message.to_string()),
            None if !body.trim().is_empty() => Some(body.trim().to_string()),
            None => None,
        };
        let message = format!("Request failed with status code {status}");

        Self {
            status: Some(status),
            nested_message,
            response_data,
            raw: message.clone(),
            message: Some(message),
        }
    }

    /// Build from a transport failure (no response received).
    #[must_use]
    pub fn transport(err: impl std::fmt::Display) -> Self {
        let message = err.to_string();
        Self {
            raw: message.clone(),
            message: Some(message),
            ..Default::default()
        }
    }

    /// Reason in priority order: nested message, response data, message, raw.
    #[must_use]
    pub fn reason(&self) -> String {
        self.nested_message
            .as_ref()
            .or(self.response_data.as_ref())
            .or(self.message.as_ref())
            .cloned()
            .unwrap_or_else(|| self.raw.clone())
    }
}

/// JSON-RPC and chain client errors
#[derive(Debug, Clone, Error)]
pub enum BlockchainError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Empty RPC response for {0}")]
    EmptyResponse(String),

    #[error("Contract call failed: {0}")]
    Contract(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Algorand key material that cannot be decoded
#[derive(Debug, Clone, Error)]
pub enum KeyError {
    #[error("Invalid mnemonic: {0}")]
    Mnemonic(String),

    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Invalid secret key: {0}")]
    Secret(String),
}

/// Database errors
#[derive(Debug, Clone, Error)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound(err.to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::Connection(err.to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DatabaseError::Duplicate(db_err.message().to_string())
            }
            _ => DatabaseError::Query(err.to_string()),
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("No node URL configured for {0}")]
    NoNodeUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_reason_prefers_nested_message() {
        let err = UpstreamError::from_response(
            400,
            r#"{"message":{"message":"account does not exist"}}"#,
        );
        assert_eq!(err.reason(), "account does not exist");
    }

    #[test]
    fn test_upstream_reason_falls_back_to_response_data() {
        let err = UpstreamError::from_response(404, r#"{"message":"no blocks found"}"#);
        assert_eq!(err.reason(), "no blocks found");

        let err = UpstreamError::from_response(502, "Bad Gateway");
        assert_eq!(err.reason(), "Bad Gateway");
    }

    #[test]
    fn test_upstream_reason_uses_status_message_without_body() {
        let err = UpstreamError::from_response(500, "");
        assert_eq!(err.reason(), "Request failed with status code 500");
        assert_eq!(err.status, Some(500));
    }

    #[test]
    fn test_upstream_transport_reason() {
        let err = UpstreamError::transport("connection refused");
        assert_eq!(err.reason(), "connection refused");
        assert!(err.status.is_none());
    }

    #[test]
    fn test_unsupported_chain_message() {
        let err = DomainError::unsupported_chain(&Currency::Other("MATIC".to_string()));
        assert_eq!(err.message, "Unsupported chain MATIC.");
        assert_eq!(err.code, codes::UNSUPPORTED_CHAIN);
    }

    #[test]
    fn test_app_error_reason_for_domain_and_upstream() {
        let domain: AppError = DomainError::transaction_not_found().into();
        assert!(domain.is_domain());
        assert!(domain.reason().starts_with("Transaction not found"));

        let upstream: AppError = UpstreamError::from_response(400, r#"{"message":"bad"}"#).into();
        assert!(!upstream.is_domain());
        assert_eq!(upstream.reason(), "bad");
    }

    #[test]
    fn test_key_error_is_not_a_validation_failure() {
        let err: AppError = KeyError::Mnemonic("Mnemonic checksum mismatch".to_string()).into();
        assert!(!err.is_domain());
        assert!(!matches!(err, AppError::Validation(_)));
        assert_eq!(err.reason(), "Invalid mnemonic: Mnemonic checksum mismatch");
    }

    #[test]
    fn test_validation_error_violations() {
        let err = ValidationError::InvalidField {
            field: "mnemonic".to_string(),
            message: "Unknown word".to_string(),
        };
        assert_eq!(
            err.violations(),
            vec![FieldViolation::new("mnemonic", "Unknown word")]
        );
    }

    #[test]
    fn test_violation_fields_use_wire_names() {
        assert_eq!(camel_case("contract_address"), "contractAddress");
        assert_eq!(camel_case("from_private_key"), "fromPrivateKey");
        assert_eq!(camel_case("chain"), "chain");
    }
}
