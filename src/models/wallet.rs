use serde::{Deserialize, Serialize};

/// The connected signing account: address plus its native balance.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectedWallet {
    pub address: String,
    pub balance: String,
    pub symbol: String,
}
