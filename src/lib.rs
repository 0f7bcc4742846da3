//! REST connector for Algorand nodes and ERC-1155 multi-token operations.
//!
//! Layers:
//! - [`api`]: axum handlers, routing and error translation
//! - [`app`]: chain dispatch and read-path services
//! - [`domain`]: request/response types, errors and collaborator traits
//! - [`infra`]: adapters for nodes, the preparation SDK, KMS storage and broadcasting

pub mod api;
pub mod app;
pub mod domain;
pub mod infra;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
