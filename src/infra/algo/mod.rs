//! Algorand node access and wallet helpers.

pub mod node;
pub mod wallet;

pub use node::AlgoNodeClient;
