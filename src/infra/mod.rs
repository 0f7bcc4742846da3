//! Infrastructure layer implementations.

pub mod algo;
pub mod broadcast;
pub mod database;
pub mod evm;
pub mod nodes;
pub mod sdk;

pub use algo::AlgoNodeClient;
pub use broadcast::NodeBroadcaster;
pub use database::{PostgresClient, PostgresConfig};
pub use evm::{EvmRpcClient, HttpRpcConnector, MultiTokenContract};
pub use nodes::{EnvNodeProvider, NodeConfig};
pub use sdk::HttpTransactionPreparer;
