//! Domain layer containing request types, traits, and error definitions.

pub mod algo;
pub mod chain;
pub mod error;
pub mod multitoken;
pub mod traits;
pub mod types;

pub use chain::{AlgoNodeType, Chain, Currency, OperationKind, PreparationKey, Variant};
pub use error::{
    AppError, BlockchainError, ConfigError, DatabaseError, DomainError, FieldViolation,
    KeyError, UpstreamError, ValidationError,
};
pub use traits::{
    AlgoNodeTransport, Broadcaster, EvmRpcProvider, KmsStore, NodeProvider, PreparationRequest,
    RpcConnector, TransactionPreparer,
};
pub use types::{
    DispatchResult, ErrorResponse, Fee, HealthResponse, HealthStatus, RateLimitResponse,
    SignableRequest, SignatureId, SigningOptions, TransactionHash,
};
