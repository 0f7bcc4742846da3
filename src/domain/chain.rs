//! Chain identifiers and the keys of the preparation table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The `chain` discriminator exactly as received on the wire.
///
/// Unknown values are kept so that dispatch can reject them with an
/// `UnsupportedChain` error naming the offending chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Currency {
    Eth,
    Bsc,
    Celo,
    Algo,
    Other(String),
}

impl Currency {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Eth => "ETH",
            Self::Bsc => "BSC",
            Self::Celo => "CELO",
            Self::Algo => "ALGO",
            Self::Other(other) => other,
        }
    }

    /// The chain this currency runs on, if the connector knows it.
    #[must_use]
    pub fn chain(&self) -> Option<Chain> {
        match self {
            Self::Eth => Some(Chain::Eth),
            Self::Bsc => Some(Chain::Bsc),
            Self::Celo => Some(Chain::Celo),
            Self::Algo => Some(Chain::Algo),
            Self::Other(_) => None,
        }
    }
}

impl From<String> for Currency {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ETH" => Self::Eth,
            "BSC" => Self::Bsc,
            "CELO" => Self::Celo,
            "ALGO" => Self::Algo,
            _ => Self::Other(value),
        }
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.as_str().to_string()
    }
}

impl From<Chain> for Currency {
    fn from(chain: Chain) -> Self {
        match chain {
            Chain::Eth => Self::Eth,
            Chain::Bsc => Self::Bsc,
            Chain::Celo => Self::Celo,
            Chain::Algo => Self::Algo,
        }
    }
}

impl FromStr for Currency {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chains the connector has node endpoints for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Chain {
    Eth,
    Bsc,
    Celo,
    Algo,
}

impl Chain {
    pub const ALL: [Chain; 4] = [Chain::Eth, Chain::Bsc, Chain::Celo, Chain::Algo];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eth => "ETH",
            Self::Bsc => "BSC",
            Self::Celo => "CELO",
            Self::Algo => "ALGO",
        }
    }

    /// Lowercase form used in URLs and environment variable names.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Eth => "eth",
            Self::Bsc => "bsc",
            Self::Celo => "celo",
            Self::Algo => "algo",
        }
    }

    /// Celo preparations need the network flag before resolving contracts.
    #[must_use]
    pub fn requires_testnet_flag(&self) -> bool {
        matches!(self, Self::Celo)
    }

    #[must_use]
    pub fn is_evm(&self) -> bool {
        !matches!(self, Self::Algo)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Algorand node flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlgoNodeType {
    Indexer,
    Algod,
}

impl fmt::Display for AlgoNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Indexer => f.write_str("INDEXER"),
            Self::Algod => f.write_str("ALGOD"),
        }
    }
}

/// Mutating operations that go through transaction preparation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Transfer,
    TransferBatch,
    Mint,
    MintBatch,
    Burn,
    BurnBatch,
    Deploy,
    UpdateCashback,
    NativeTransfer,
}

impl OperationKind {
    pub const MULTI_TOKEN: [OperationKind; 8] = [
        OperationKind::Transfer,
        OperationKind::TransferBatch,
        OperationKind::Mint,
        OperationKind::MintBatch,
        OperationKind::Burn,
        OperationKind::BurnBatch,
        OperationKind::Deploy,
        OperationKind::UpdateCashback,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::TransferBatch => "transfer-batch",
            Self::Mint => "mint",
            Self::MintBatch => "mint-batch",
            Self::Burn => "burn",
            Self::BurnBatch => "burn-batch",
            Self::Deploy => "deploy",
            Self::UpdateCashback => "update-cashback",
            Self::NativeTransfer => "native-transfer",
        }
    }

    /// Operations with a cashback-bearing alternative.
    #[must_use]
    pub fn has_cashback_variant(&self) -> bool {
        matches!(self, Self::Mint | Self::MintBatch)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    #[default]
    Plain,
    Cashback,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => f.write_str("plain"),
            Self::Cashback => f.write_str("cashback"),
        }
    }
}

/// Key of the preparation table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreparationKey {
    pub chain: Chain,
    pub operation: OperationKind,
    pub variant: Variant,
}

impl PreparationKey {
    #[must_use]
    pub const fn new(chain: Chain, operation: OperationKind, variant: Variant) -> Self {
        Self {
            chain,
            operation,
            variant,
        }
    }
}

impl fmt::Display for PreparationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.chain.slug(),
            self.operation.slug(),
            self.variant
        )
    }
}
