use crate::{errors::CustomError, models::network_config::NetworkConfig};

/// Get network configuration based on chain ID
pub fn get_network_config(chain_id: u64) -> Result<NetworkConfig, CustomError> {
    match chain_id {
        80002 => Ok(NetworkConfig {
            chain_id: 80002, // 0x13882
            name: "Polygon Amoy Testnet".to_string(),
            rpc_url: "https://rpc-amoy.polygon.technology/".to_string(),
            symbol: "POL".to_string(),
            decimals: 18,
            block_explorer: "https://www.oklink.com/amoy".to_string(),
        }),
        _ => Err(CustomError::UnsupportedChainError(chain_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amoy_descriptor() {
        let network = get_network_config(80002).unwrap();
        assert_eq!(network.chain_id, 80002);
        assert_eq!(network.symbol, "POL");
        assert_eq!(network.decimals, 18);
        assert_eq!(network.rpc_url, "https://rpc-amoy.polygon.technology/");
        assert_eq!(network.block_explorer, "https://www.oklink.com/amoy");
    }

    #[test]
    fn unknown_chain_is_rejected() {
        assert!(matches!(
            get_network_config(1),
            Err(CustomError::UnsupportedChainError(1))
        ));
    }
}
