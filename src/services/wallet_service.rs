use std::str::FromStr;

use ethers::signers::{LocalWallet, Signer};
use ethers::utils::to_checksum;

use crate::config::Config;
use crate::errors::CustomError;
use crate::models::wallet::ConnectedWallet;
use crate::services::blockchain_service::BlockchainClient;

pub struct WalletService;

impl WalletService {
    /// Build the signing wallet from configuration. Fails before any network
    /// call when no key is configured, the backend equivalent of the wallet
    /// extension being absent.
    pub fn signing_wallet(config: &Config) -> Result<LocalWallet, CustomError> {
        let key = config.private_key.as_deref().ok_or_else(|| {
            CustomError::WalletUnavailableError(
                "no signing key configured, set PRIVATE_KEY".to_string(),
            )
        })?;

        let wallet = LocalWallet::from_str(key)
            .map_err(|e| CustomError::WalletUnavailableError(e.to_string()))?;
        Ok(wallet.with_chain_id(config.network.chain_id))
    }

    /// Connect: resolve the signing account and fetch its native balance.
    pub async fn connect(
        client: &BlockchainClient,
        config: &Config,
    ) -> Result<ConnectedWallet, CustomError> {
        let wallet = Self::signing_wallet(config)?;
        let address = to_checksum(&wallet.address(), None);
        let balance = client.get_native_balance(&address).await?;

        Ok(ConnectedWallet {
            address,
            balance: balance.formatted_balance,
            symbol: balance.symbol,
        })
    }
}
