//! Persistence adapters.

pub mod postgres;

pub use postgres::{KmsTransaction, PostgresClient, PostgresConfig};
