use serde::{Deserialize, Serialize};

/// A user-submitted transfer. `amount` is the human-readable decimal string;
/// conversion to the smallest unit happens against the relevant decimals
/// (18 for native, the contract's `decimals()` for tokens).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TransferRequest {
    pub recipient: String,
    pub amount: String,
    /// ERC-20 contract address; `None` means a native transfer.
    pub token_address: Option<String>,
}
