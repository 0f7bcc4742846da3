//! Read-only bindings of the ERC-1155 multi-token contract.

use alloy::primitives::{Address, U256};
use alloy::sol;
use alloy::sol_types::{SolCall, SolType, SolValue};

use super::rpc::EvmRpcClient;
use crate::domain::{AppError, BlockchainError};

sol! {
    interface IMultiToken {
        function tokenURI(uint256 tokenId) external view returns (string memory);
        function tokenCashbackRecipients(uint256 tokenId) external view returns (address[] memory);
        function tokenCashbackValues(uint256 tokenId) external view returns (uint256[] memory);
        function tokensOfOwner(address owner) external view returns (uint256[] memory);
    }
}

fn parse_address(value: &str) -> Result<Address, AppError> {
    value.parse().map_err(|e| {
        AppError::Blockchain(BlockchainError::Contract(format!(
            "Invalid address {value}: {e}"
        )))
    })
}

fn parse_token_id(value: &str) -> Result<U256, AppError> {
    U256::from_str_radix(value, 10).map_err(|e| {
        AppError::Blockchain(BlockchainError::Contract(format!(
            "Invalid token id {value}: {e}"
        )))
    })
}

fn decode<T>(data: &[u8]) -> Result<T, AppError>
where
    T: SolValue + From<<T::SolType as SolType>::RustType>,
{
    T::abi_decode(data).map_err(|e| AppError::Blockchain(BlockchainError::Contract(e.to_string())))
}

/// A deployed multi-token contract reached through one node
pub struct MultiTokenContract {
    client: EvmRpcClient,
    address: Address,
}

impl MultiTokenContract {
    pub fn new(client: EvmRpcClient, address: &str) -> Result<Self, AppError> {
        Ok(Self {
            client,
            address: parse_address(address)?,
        })
    }

    pub async fn token_uri(&self, token_id: &str) -> Result<String, AppError> {
        let call = IMultiToken::tokenURICall {
            tokenId: parse_token_id(token_id)?,
        };
        let data = self.client.call(self.address, call.abi_encode().into()).await?;
        decode::<String>(&data)
    }

    /// Checksummed royalty recipients of a token
    pub async fn cashback_recipients(&self, token_id: &str) -> Result<Vec<String>, AppError> {
        let call = IMultiToken::tokenCashbackRecipientsCall {
            tokenId: parse_token_id(token_id)?,
        };
        let data = self.client.call(self.address, call.abi_encode().into()).await?;
        let recipients = decode::<Vec<Address>>(&data)?;
        Ok(recipients.iter().map(|a| a.to_checksum(None)).collect())
    }

    /// Royalty values in wei, aligned with [`Self::cashback_recipients`]
    pub async fn cashback_values(&self, token_id: &str) -> Result<Vec<U256>, AppError> {
        let call = IMultiToken::tokenCashbackValuesCall {
            tokenId: parse_token_id(token_id)?,
        };
        let data = self.client.call(self.address, call.abi_encode().into()).await?;
        decode::<Vec<U256>>(&data)
    }

    pub async fn tokens_of_owner(&self, owner: &str) -> Result<Vec<String>, AppError> {
        let call = IMultiToken::tokensOfOwnerCall {
            owner: parse_address(owner)?,
        };
        let data = self.client.call(self.address, call.abi_encode().into()).await?;
        let ids = decode::<Vec<U256>>(&data)?;
        Ok(ids.iter().map(U256::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockRpcProvider;
    use serde_json::json;
    use std::sync::Arc;

    const CONTRACT: &str = "0x687422eEA2cB73B5d3e242bA5456b782919AFc85";

    fn hex(bytes: Vec<u8>) -> serde_json::Value {
        json!(format!("0x{}", alloy::hex::encode(bytes)))
    }

    #[tokio::test]
    async fn test_token_uri_round_trip() {
        let encoded = "ipfs://token/1".to_string().abi_encode();
        let provider = Arc::new(MockRpcProvider::new().with_response("eth_call", hex(encoded)));
        let contract =
            MultiTokenContract::new(EvmRpcClient::new(provider.clone()), CONTRACT).unwrap();

        assert_eq!(contract.token_uri("1").await.unwrap(), "ipfs://token/1");

        let params = &provider.calls()[0].1;
        let data = params[0]["data"].as_str().unwrap();
        let selector = alloy::hex::encode(IMultiToken::tokenURICall::SELECTOR);
        assert!(data.starts_with(&format!("0x{selector}")));
    }

    #[tokio::test]
    async fn test_tokens_of_owner_as_decimal_strings() {
        let encoded = vec![U256::from(1u64), U256::from(42u64)].abi_encode();
        let provider = Arc::new(MockRpcProvider::new().with_response("eth_call", hex(encoded)));
        let contract = MultiTokenContract::new(EvmRpcClient::new(provider), CONTRACT).unwrap();

        let ids = contract.tokens_of_owner(CONTRACT).await.unwrap();
        assert_eq!(ids, vec!["1".to_string(), "42".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_token_id_fails_before_rpc() {
        let provider = Arc::new(MockRpcProvider::new());
        let contract =
            MultiTokenContract::new(EvmRpcClient::new(provider.clone()), CONTRACT).unwrap();

        assert!(contract.token_uri("abc").await.is_err());
        assert!(provider.calls().is_empty());
    }

    #[test]
    fn test_invalid_contract_address() {
        let provider = Arc::new(MockRpcProvider::new());
        assert!(MultiTokenContract::new(EvmRpcClient::new(provider), "0x123").is_err());
    }
}
