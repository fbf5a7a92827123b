use ethers::types::U256;
use ethers::utils::parse_units;

use crate::models::network_config::NetworkConfig;
use crate::services::network_config::get_network_config;

/// How a transaction is priced. The native and token paths each get their own
/// strategy so the choice is configuration, not a hardcoded asymmetry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeeStrategy {
    /// Legacy transaction at the network-quoted gas price.
    GasPrice,
    /// EIP-1559 transaction with fixed fee caps.
    FeeCaps {
        max_fee_per_gas: U256,
        max_priority_fee_per_gas: U256,
    },
}

pub struct Config {
    pub port: u16,
    pub network: NetworkConfig,
    pub private_key: Option<String>,
    pub native_fee: FeeStrategy,
    pub token_fee: FeeStrategy,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .expect("Failed to parse PORT");

        let chain_id: u64 = std::env::var("CHAIN_ID")
            .unwrap_or_else(|_| "80002".to_string())
            .parse()
            .expect("Failed to parse CHAIN_ID");
        let mut network = get_network_config(chain_id).expect("Unsupported CHAIN_ID");
        if let Ok(rpc_url) = std::env::var("RPC_URL") {
            network.rpc_url = rpc_url;
        }

        let max_fee_gwei =
            std::env::var("MAX_FEE_GWEI").unwrap_or_else(|_| "100".to_string());
        let max_priority_gwei =
            std::env::var("MAX_PRIORITY_FEE_GWEI").unwrap_or_else(|_| "2".to_string());

        let native_fee = fee_strategy(
            &std::env::var("FEE_STRATEGY_NATIVE").unwrap_or_else(|_| "legacy".to_string()),
            &max_fee_gwei,
            &max_priority_gwei,
        )
        .expect("Failed to parse FEE_STRATEGY_NATIVE");
        let token_fee = fee_strategy(
            &std::env::var("FEE_STRATEGY_TOKEN").unwrap_or_else(|_| "eip1559".to_string()),
            &max_fee_gwei,
            &max_priority_gwei,
        )
        .expect("Failed to parse FEE_STRATEGY_TOKEN");

        Self {
            port,
            network,
            private_key: std::env::var("PRIVATE_KEY").ok(),
            native_fee,
            token_fee,
        }
    }
}

/// Resolve a fee strategy from its name and the configured caps (in gwei).
pub fn fee_strategy(
    kind: &str,
    max_fee_gwei: &str,
    max_priority_gwei: &str,
) -> Result<FeeStrategy, String> {
    match kind.trim().to_ascii_lowercase().as_str() {
        "legacy" => Ok(FeeStrategy::GasPrice),
        "eip1559" => Ok(FeeStrategy::FeeCaps {
            max_fee_per_gas: gwei(max_fee_gwei)?,
            max_priority_fee_per_gas: gwei(max_priority_gwei)?,
        }),
        other => Err(format!("unknown fee strategy '{other}'")),
    }
}

fn gwei(value: &str) -> Result<U256, String> {
    let parsed = parse_units(value, 9).map_err(|e| e.to_string())?;
    Ok(parsed.into())
}
