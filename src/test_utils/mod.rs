//! Test doubles for the collaborator traits.

pub mod mocks;

pub use mocks::{
    MockAlgoTransport, MockBroadcaster, MockConfig, MockKmsStore, MockNodeProvider,
    MockPreparer, MockRpcConnector, MockRpcProvider, StoredKmsTransaction, TransportCall,
};
