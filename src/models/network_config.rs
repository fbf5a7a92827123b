use serde::{Deserialize, Serialize};

/// Descriptor of the network transfers are submitted against. Carries what a
/// wallet needs to register the chain: id, currency metadata, RPC and explorer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    pub symbol: String,
    pub decimals: u8,
    pub block_explorer: String,
}
