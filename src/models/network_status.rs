use serde::Serialize;

/// Live view of the target network: the static descriptor plus the latest
/// block and quoted gas price.
#[derive(Debug, Serialize)]
pub struct NetworkStatus {
    pub chain_id: u64,
    pub name: String,
    pub latest_block: u64,
    pub gas_price: u64,
    pub symbol: String,
    pub decimals: u8,
    pub rpc_url: String,
    pub block_explorer: String,
}
