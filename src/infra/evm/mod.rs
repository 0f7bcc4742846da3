//! EVM chain access: JSON-RPC transport and contract bindings.

pub mod contract;
pub mod rpc;

pub use contract::MultiTokenContract;
pub use rpc::{EvmRpcClient, HttpEvmRpcProvider, HttpRpcConnector};
