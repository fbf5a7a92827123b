use ethers::{
    abi::parse_abi,
    contract::Contract,
    core::types::{Address, U256},
    providers::{Http, Middleware, Provider},
    utils::{format_units, to_checksum},
};
use log::warn;
use std::{str::FromStr, sync::Arc};

use crate::{
    errors::CustomError,
    models::{network_config::NetworkConfig, network_status::NetworkStatus, token::TokenBalance},
};

// Minimal ERC-20 surface: transfer, balance, decimals, symbol
const ERC20_ABI: &[&str] = &[
    "function transfer(address recipient, uint256 amount) returns (bool)",
    "function balanceOf(address account) view returns (uint256)",
    "function decimals() view returns (uint8)",
    "function symbol() view returns (string)",
];

/// Fallback precision when a token contract's `decimals()` call fails.
pub const DEFAULT_DECIMALS: u8 = 18;

#[derive(Clone, Debug)]
pub struct BlockchainClient {
    provider: Arc<Provider<Http>>,
    network: NetworkConfig,
}

impl BlockchainClient {
    /// Create a client for the configured network. Refuses to construct if the
    /// endpoint reports a different chain id than the descriptor.
    pub async fn new(network: &NetworkConfig) -> Result<Self, CustomError> {
        let provider = Provider::<Http>::try_from(network.rpc_url.as_str())
            .map_err(|e| CustomError::NetworkError(e.to_string()))?;

        let connected_chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| CustomError::StringifiedProviderError(e.to_string()))?;

        if connected_chain_id.as_u64() != network.chain_id {
            return Err(CustomError::NetworkMismatchError {
                expected: network.chain_id,
                actual: connected_chain_id.as_u64(),
            });
        }

        Ok(Self {
            provider: Arc::new(provider),
            network: network.clone(),
        })
    }

    pub fn provider(&self) -> &Arc<Provider<Http>> {
        &self.provider
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Re-read the live chain id and abort if it no longer matches the
    /// descriptor. Called before every submission.
    pub async fn ensure_chain(&self) -> Result<(), CustomError> {
        let chain_id = self
            .provider
            .get_chainid()
            .await
            .map_err(|e| CustomError::StringifiedProviderError(e.to_string()))?;

        if chain_id.as_u64() != self.network.chain_id {
            return Err(CustomError::NetworkMismatchError {
                expected: self.network.chain_id,
                actual: chain_id.as_u64(),
            });
        }
        Ok(())
    }

    /// Get native token balance for an address
    pub async fn get_native_balance(
        &self,
        wallet_address: &str,
    ) -> Result<TokenBalance, CustomError> {
        let address = Address::from_str(wallet_address)
            .map_err(|_| CustomError::InvalidAddressError(wallet_address.to_string()))?;

        let balance = self
            .provider
            .get_balance(address, None)
            .await
            .map_err(|e| CustomError::StringifiedProviderError(e.to_string()))?;

        Ok(TokenBalance {
            token_address: None,
            symbol: self.network.symbol.clone(),
            balance,
            decimals: self.network.decimals,
            formatted_balance: format_balance(balance, self.network.decimals)?,
        })
    }

    /// Get ERC-20 token balance, converting with the contract's declared
    /// precision. A failing `decimals()` falls back to 18 rather than aborting.
    pub async fn get_token_balance(
        &self,
        token_address: &str,
        wallet_address: &str,
    ) -> Result<TokenBalance, CustomError> {
        let token = Address::from_str(token_address)
            .map_err(|_| CustomError::InvalidAddressError(token_address.to_string()))?;
        let wallet = Address::from_str(wallet_address)
            .map_err(|_| CustomError::InvalidAddressError(wallet_address.to_string()))?;

        let contract = self.token_contract(token)?;

        let decimals = self.token_decimals(&contract, token).await;
        let symbol = self.token_symbol(&contract, token).await;

        let balance: U256 = contract
            .method::<_, U256>("balanceOf", wallet)
            .map_err(|e| CustomError::ContractError(e.to_string()))?
            .call()
            .await
            .map_err(|e| CustomError::ContractError(e.to_string()))?;

        Ok(TokenBalance {
            token_address: Some(to_checksum(&token, None)),
            symbol,
            balance,
            decimals,
            formatted_balance: format_balance(balance, decimals)?,
        })
    }

    /// Build a read-only contract handle for an ERC-20 token.
    pub fn token_contract(
        &self,
        token: Address,
    ) -> Result<Contract<Provider<Http>>, CustomError> {
        let abi = parse_abi(ERC20_ABI).map_err(|e| CustomError::ContractError(e.to_string()))?;
        Ok(Contract::new(token, abi, self.provider.clone()))
    }

    /// Token precision, falling back to [`DEFAULT_DECIMALS`] if the call fails.
    pub async fn token_decimals(
        &self,
        contract: &Contract<Provider<Http>>,
        token: Address,
    ) -> u8 {
        let call = match contract.method::<_, u8>("decimals", ()) {
            Ok(call) => call,
            Err(e) => {
                warn!("decimals() unavailable on {token:?}: {e}; assuming {DEFAULT_DECIMALS}");
                return DEFAULT_DECIMALS;
            }
        };
        match call.call().await {
            Ok(decimals) => decimals,
            Err(e) => {
                warn!("decimals() failed on {token:?}: {e}; assuming {DEFAULT_DECIMALS}");
                DEFAULT_DECIMALS
            }
        }
    }

    async fn token_symbol(&self, contract: &Contract<Provider<Http>>, token: Address) -> String {
        let call = match contract.method::<_, String>("symbol", ()) {
            Ok(call) => call,
            Err(e) => {
                warn!("symbol() unavailable on {token:?}: {e}");
                return "UNKNOWN".to_string();
            }
        };
        match call.call().await {
            Ok(symbol) => symbol,
            Err(e) => {
                warn!("symbol() failed on {token:?}: {e}");
                "UNKNOWN".to_string()
            }
        }
    }

    /// Get network status
    pub async fn get_network_status(&self) -> Result<NetworkStatus, CustomError> {
        let latest_block = self
            .provider
            .get_block_number()
            .await
            .map_err(CustomError::ProviderError)?;
        let gas_price = self
            .provider
            .get_gas_price()
            .await
            .map_err(CustomError::ProviderError)?;

        Ok(NetworkStatus {
            chain_id: self.network.chain_id,
            name: self.network.name.clone(),
            latest_block: latest_block.as_u64(),
            gas_price: gas_price.as_u64(),
            symbol: self.network.symbol.clone(),
            decimals: self.network.decimals,
            rpc_url: self.network.rpc_url.clone(),
            block_explorer: self.network.block_explorer.clone(),
        })
    }
}

/// Format a smallest-unit amount as a human-readable decimal string, without
/// trailing zeros.
pub fn format_balance(amount: U256, decimals: u8) -> Result<String, CustomError> {
    let formatted = format_units(amount, u32::from(decimals))
        .map_err(|e| CustomError::InvalidAmountError(e.to_string()))?;

    let trimmed = formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string();

    if trimmed.is_empty() {
        Ok("0".to_string())
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::utils::parse_units;

    #[test]
    fn formats_whole_amounts_without_trailing_zeros() {
        let one_pol = U256::from(10).pow(U256::from(18));
        assert_eq!(format_balance(one_pol, 18).unwrap(), "1");
        assert_eq!(format_balance(U256::zero(), 18).unwrap(), "0");
    }

    #[test]
    fn formats_fractional_amounts() {
        let amount: U256 = parse_units("1.5", 18).unwrap().into();
        assert_eq!(format_balance(amount, 18).unwrap(), "1.5");

        let amount: U256 = parse_units("0.25", 6).unwrap().into();
        assert_eq!(format_balance(amount, 6).unwrap(), "0.25");
    }

    #[test]
    fn conversion_round_trips_at_the_declared_precision() {
        for (value, decimals) in [("1.0", 18u8), ("0.000001", 18), ("42", 6), ("123.456", 8)] {
            let raw: U256 = parse_units(value, u32::from(decimals)).unwrap().into();
            let formatted = format_balance(raw, decimals).unwrap();
            let reparsed: U256 = parse_units(formatted.as_str(), u32::from(decimals))
                .unwrap()
                .into();
            assert_eq!(raw, reparsed, "{value} at {decimals} decimals");
        }
    }
}
