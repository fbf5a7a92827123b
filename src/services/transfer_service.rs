use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use ethers::middleware::SignerMiddleware;
use ethers::providers::Middleware;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address, Bytes, Eip1559TransactionRequest, TransactionReceipt, TransactionRequest, U256, U64,
};
use ethers::utils::{parse_units, to_checksum};
use log::info;
use uuid::Uuid;

use crate::config::{Config, FeeStrategy};
use crate::errors::CustomError;
use crate::models::transaction::{Transaction, TransactionStatus};
use crate::models::transfer::TransferRequest;
use crate::services::blockchain_service::{format_balance, BlockchainClient};
use crate::services::wallet_service::WalletService;

/// Tracks senders with a submission currently in flight. Overlapping
/// submissions for the same sender are rejected rather than raced.
#[derive(Debug, Default)]
pub struct InFlightTransfers {
    senders: Mutex<HashSet<Address>>,
}

impl InFlightTransfers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the sender's slot. The slot is released when the returned guard
    /// is dropped, on every exit path.
    pub fn begin(&self, sender: Address) -> Result<InFlightSlot<'_>, CustomError> {
        let mut senders = lock(&self.senders);
        if !senders.insert(sender) {
            return Err(CustomError::TransferInFlightError(to_checksum(
                &sender, None,
            )));
        }
        Ok(InFlightSlot {
            senders: &self.senders,
            sender,
        })
    }
}

#[derive(Debug)]
pub struct InFlightSlot<'a> {
    senders: &'a Mutex<HashSet<Address>>,
    sender: Address,
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        lock(self.senders).remove(&self.sender);
    }
}

fn lock<'a>(senders: &'a Mutex<HashSet<Address>>) -> MutexGuard<'a, HashSet<Address>> {
    match senders.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// A transfer request with its addresses parsed and its fields checked,
/// produced before any network call is made.
#[derive(Debug, Clone)]
pub struct ValidatedTransfer {
    pub recipient: Address,
    pub amount: String,
    pub token: Option<Address>,
}

/// Validate a submission. Empty fields and malformed addresses fail here,
/// before the provider is touched.
pub fn validate_request(request: &TransferRequest) -> Result<ValidatedTransfer, CustomError> {
    let recipient = request.recipient.trim();
    if recipient.is_empty() {
        return Err(CustomError::ValidationError(
            "recipient is required".to_string(),
        ));
    }

    let amount = request.amount.trim();
    if amount.is_empty() {
        return Err(CustomError::ValidationError(
            "amount is required".to_string(),
        ));
    }
    if amount.starts_with('-') {
        return Err(CustomError::InvalidAmountError(
            "amount must be positive".to_string(),
        ));
    }
    if !is_decimal(amount) {
        return Err(CustomError::InvalidAmountError(format!(
            "'{amount}' is not a decimal number"
        )));
    }

    let recipient = Address::from_str(recipient)
        .map_err(|_| CustomError::InvalidAddressError(request.recipient.clone()))?;

    let token = match request.token_address.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(token) => Some(
            Address::from_str(token)
                .map_err(|_| CustomError::InvalidAddressError(token.to_string()))?,
        ),
    };

    Ok(ValidatedTransfer {
        recipient,
        amount: amount.to_string(),
        token,
    })
}

/// Syntactic check only. Precision-aware conversion happens later against the
/// relevant decimals, which may require a token contract call.
fn is_decimal(amount: &str) -> bool {
    let mut digits = false;
    let mut dots = 0;
    for c in amount.chars() {
        match c {
            '0'..='9' => digits = true,
            '.' => dots += 1,
            _ => return false,
        }
    }
    digits && dots <= 1 && !amount.starts_with('.') && !amount.ends_with('.')
}

/// Convert a human-entered decimal amount into the smallest unit.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, CustomError> {
    let parsed: U256 = parse_units(amount, u32::from(decimals))
        .map_err(|e| CustomError::InvalidAmountError(e.to_string()))?
        .into();

    if parsed.is_zero() {
        return Err(CustomError::InvalidAmountError(
            "amount must be greater than zero".to_string(),
        ));
    }
    Ok(parsed)
}

/// Gas limit actually submitted: the estimate plus a fixed 20% buffer.
pub fn buffered_gas_limit(estimate: U256) -> U256 {
    estimate * U256::from(120) / U256::from(100)
}

/// Abort with an error naming both quantities when the balance cannot cover
/// the required total.
pub fn check_affordability(
    balance: U256,
    required: U256,
    decimals: u8,
    symbol: &str,
) -> Result<(), CustomError> {
    if balance < required {
        return Err(CustomError::InsufficientFundsError {
            needed: format_balance(required, decimals)?,
            available: format_balance(balance, decimals)?,
            symbol: symbol.to_string(),
        });
    }
    Ok(())
}

pub struct TransferService<'a> {
    client: &'a BlockchainClient,
    config: &'a Config,
    in_flight: &'a InFlightTransfers,
}

impl<'a> TransferService<'a> {
    pub fn new(
        client: &'a BlockchainClient,
        config: &'a Config,
        in_flight: &'a InFlightTransfers,
    ) -> Self {
        Self {
            client,
            config,
            in_flight,
        }
    }

    /// Run one submission end to end: validate, claim the in-flight slot,
    /// re-check the chain, price and estimate the call, check affordability,
    /// then broadcast and wait for the confirmation receipt.
    pub async fn submit(&self, request: &TransferRequest) -> Result<Transaction, CustomError> {
        let validated = validate_request(request)?;
        let wallet = WalletService::signing_wallet(self.config)?;
        let sender = wallet.address();

        let _slot = self.in_flight.begin(sender)?;

        self.client.ensure_chain().await?;

        let native_balance = self
            .client
            .provider()
            .get_balance(sender, None)
            .await
            .map_err(|e| CustomError::StringifiedProviderError(e.to_string()))?;

        let receipt = match validated.token {
            None => {
                self.submit_native(wallet, sender, &validated, native_balance)
                    .await?
            }
            Some(token) => {
                self.submit_token(wallet, sender, token, &validated, native_balance)
                    .await?
            }
        };

        let status = if receipt.status == Some(U64::from(1)) {
            TransactionStatus::Completed
        } else {
            TransactionStatus::Failed
        };
        info!(
            "transfer confirmed: hash={:?} status={:?}",
            receipt.transaction_hash, status
        );

        Ok(Transaction {
            id: Uuid::new_v4(),
            transaction_hash: format!("{:?}", receipt.transaction_hash),
            from_address: to_checksum(&sender, None),
            to_address: to_checksum(&validated.recipient, None),
            amount: validated.amount.clone(),
            token_address: validated.token.map(|token| to_checksum(&token, None)),
            explorer_url: format!(
                "{}/tx/{:?}",
                self.config.network.block_explorer, receipt.transaction_hash
            ),
            timestamp: Utc::now(),
            status,
        })
    }

    async fn submit_native(
        &self,
        wallet: LocalWallet,
        sender: Address,
        validated: &ValidatedTransfer,
        native_balance: U256,
    ) -> Result<TransactionReceipt, CustomError> {
        let network = &self.config.network;
        let amount_wei = parse_amount(&validated.amount, network.decimals)?;

        let mut tx = build_transaction(
            sender,
            validated.recipient,
            Some(amount_wei),
            None,
            &self.config.native_fee,
        );

        let gas_estimate = self
            .client
            .provider()
            .estimate_gas(&tx, None)
            .await
            .map_err(|e| CustomError::GasEstimationError(e.to_string()))?;
        let fee_per_gas = self.price_transaction(&mut tx, &self.config.native_fee).await?;

        check_affordability(
            native_balance,
            amount_wei + gas_estimate * fee_per_gas,
            network.decimals,
            &network.symbol,
        )?;

        tx.set_gas(buffered_gas_limit(gas_estimate));
        info!(
            "submitting native transfer: {} {} to {:?} (gas estimate {})",
            validated.amount, network.symbol, validated.recipient, gas_estimate
        );
        self.send(wallet, tx).await
    }

    async fn submit_token(
        &self,
        wallet: LocalWallet,
        sender: Address,
        token: Address,
        validated: &ValidatedTransfer,
        native_balance: U256,
    ) -> Result<TransactionReceipt, CustomError> {
        let network = &self.config.network;
        let contract = self.client.token_contract(token)?;
        let decimals = self.client.token_decimals(&contract, token).await;
        let amount = parse_amount(&validated.amount, decimals)?;

        let token_balance: U256 = contract
            .method::<_, U256>("balanceOf", sender)
            .map_err(|e| CustomError::ContractError(e.to_string()))?
            .call()
            .await
            .map_err(|e| CustomError::ContractError(e.to_string()))?;
        check_affordability(token_balance, amount, decimals, "tokens")?;

        let calldata = contract
            .method::<_, bool>("transfer", (validated.recipient, amount))
            .map_err(|e| CustomError::ContractError(e.to_string()))?
            .calldata()
            .ok_or_else(|| CustomError::ContractError("missing transfer calldata".to_string()))?;

        let mut tx = build_transaction(sender, token, None, Some(calldata), &self.config.token_fee);

        let gas_estimate = self
            .client
            .provider()
            .estimate_gas(&tx, None)
            .await
            .map_err(|e| CustomError::GasEstimationError(e.to_string()))?;
        let fee_per_gas = self.price_transaction(&mut tx, &self.config.token_fee).await?;

        // Gas is still paid in the native currency
        check_affordability(
            native_balance,
            gas_estimate * fee_per_gas,
            network.decimals,
            &network.symbol,
        )?;

        tx.set_gas(buffered_gas_limit(gas_estimate));
        info!(
            "submitting token transfer: {} of {:?} to {:?} (gas estimate {})",
            validated.amount, token, validated.recipient, gas_estimate
        );
        self.send(wallet, tx).await
    }

    /// Apply fee parameters and return the per-gas price used for the
    /// affordability check.
    async fn price_transaction(
        &self,
        tx: &mut TypedTransaction,
        strategy: &FeeStrategy,
    ) -> Result<U256, CustomError> {
        match strategy {
            FeeStrategy::GasPrice => {
                let gas_price = self
                    .client
                    .provider()
                    .get_gas_price()
                    .await
                    .map_err(CustomError::ProviderError)?;
                tx.set_gas_price(gas_price);
                Ok(gas_price)
            }
            // Caps were set when the request was built
            FeeStrategy::FeeCaps {
                max_fee_per_gas, ..
            } => Ok(*max_fee_per_gas),
        }
    }

    async fn send(
        &self,
        wallet: LocalWallet,
        tx: TypedTransaction,
    ) -> Result<TransactionReceipt, CustomError> {
        let signer = SignerMiddleware::new(self.client.provider().as_ref().clone(), wallet);

        let pending = signer
            .send_transaction(tx, None)
            .await
            .map_err(|e| CustomError::StringifiedProviderError(e.to_string()))?;
        info!("transaction sent: {:?}", pending.tx_hash());

        pending
            .await?
            .ok_or(CustomError::TransactionReceiptFailedError)
    }
}

fn build_transaction(
    from: Address,
    to: Address,
    value: Option<U256>,
    data: Option<Bytes>,
    strategy: &FeeStrategy,
) -> TypedTransaction {
    match strategy {
        FeeStrategy::GasPrice => {
            let mut tx = TransactionRequest::new().from(from).to(to);
            if let Some(value) = value {
                tx = tx.value(value);
            }
            if let Some(data) = data {
                tx = tx.data(data);
            }
            tx.into()
        }
        FeeStrategy::FeeCaps {
            max_fee_per_gas,
            max_priority_fee_per_gas,
        } => {
            let mut tx = Eip1559TransactionRequest::new()
                .from(from)
                .to(to)
                .max_fee_per_gas(*max_fee_per_gas)
                .max_priority_fee_per_gas(*max_priority_fee_per_gas);
            if let Some(value) = value {
                tx = tx.value(value);
            }
            if let Some(data) = data {
                tx = tx.data(data);
            }
            tx.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::utils::format_units;

    const RECIPIENT: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";
    const TOKEN: &str = "0x9f7f0fA54F325C9959881FB9ECF95dc45fB5113E";

    fn request(recipient: &str, amount: &str, token: Option<&str>) -> TransferRequest {
        TransferRequest {
            recipient: recipient.to_string(),
            amount: amount.to_string(),
            token_address: token.map(str::to_string),
        }
    }

    #[test]
    fn empty_fields_are_rejected() {
        let err = validate_request(&request("", "1.0", None)).unwrap_err();
        assert!(matches!(err, CustomError::ValidationError(_)));

        let err = validate_request(&request(RECIPIENT, "  ", None)).unwrap_err();
        assert!(matches!(err, CustomError::ValidationError(_)));
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        for bad in ["0x123", "not-an-address", "742d35Cc6634C0532925a3b844Bc454e4438f44ezz"] {
            let err = validate_request(&request(bad, "1.0", None)).unwrap_err();
            assert!(matches!(err, CustomError::InvalidAddressError(_)), "{bad}");
        }

        let err = validate_request(&request(RECIPIENT, "1.0", Some("0xnope"))).unwrap_err();
        assert!(matches!(err, CustomError::InvalidAddressError(_)));
    }

    #[test]
    fn valid_request_parses_both_addresses() {
        let validated = validate_request(&request(RECIPIENT, " 1.0 ", Some(TOKEN))).unwrap();
        assert_eq!(to_checksum(&validated.recipient, None), RECIPIENT);
        assert_eq!(validated.amount, "1.0");
        assert_eq!(to_checksum(&validated.token.unwrap(), None), TOKEN);
    }

    #[test]
    fn empty_token_address_means_native() {
        let validated = validate_request(&request(RECIPIENT, "1.0", Some(""))).unwrap();
        assert!(validated.token.is_none());
    }

    #[test]
    fn negative_amount_is_rejected() {
        let err = validate_request(&request(RECIPIENT, "-1", None)).unwrap_err();
        assert!(matches!(err, CustomError::InvalidAmountError(_)));
    }

    #[test]
    fn non_numeric_amount_is_rejected_at_validation() {
        for bad in ["one", "1,5", "1.2.3", ".", "1e5", ".5", "5."] {
            let err = validate_request(&request(RECIPIENT, bad, None)).unwrap_err();
            assert!(matches!(err, CustomError::InvalidAmountError(_)), "{bad}");
        }
    }

    #[test]
    fn decimal_amounts_pass_validation() {
        for good in ["1", "1.0", "0.000001", "1000000"] {
            assert!(validate_request(&request(RECIPIENT, good, None)).is_ok(), "{good}");
        }
    }

    #[test]
    fn amount_conversion_round_trips() {
        let wei = parse_amount("1.0", 18).unwrap();
        assert_eq!(wei, U256::from(10).pow(U256::from(18)));
        assert_eq!(format_units(wei, 18u32).unwrap(), "1.000000000000000000");

        let units = parse_amount("2.5", 6).unwrap();
        assert_eq!(units, U256::from(2_500_000u64));
    }

    #[test]
    fn zero_and_garbage_amounts_are_rejected() {
        assert!(matches!(
            parse_amount("0", 18),
            Err(CustomError::InvalidAmountError(_))
        ));
        assert!(matches!(
            parse_amount("one", 18),
            Err(CustomError::InvalidAmountError(_))
        ));
    }

    #[test]
    fn gas_limit_gets_a_twenty_percent_buffer() {
        assert_eq!(buffered_gas_limit(U256::from(100_000)), U256::from(120_000));
        assert_eq!(buffered_gas_limit(U256::from(21_000)), U256::from(25_200));
    }

    #[test]
    fn insufficient_balance_names_both_quantities() {
        let balance: U256 = parse_amount("1.0", 18).unwrap();
        let required: U256 = parse_amount("1000000", 18).unwrap();

        let err = check_affordability(balance, required, 18, "POL").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Insufficient balance"));
        assert!(message.contains("1000000 POL"));
        assert!(message.contains("1 POL"));
    }

    #[test]
    fn sufficient_balance_passes() {
        let balance = parse_amount("2.0", 18).unwrap();
        let required = parse_amount("1.5", 18).unwrap();
        assert!(check_affordability(balance, required, 18, "POL").is_ok());
    }

    #[test]
    fn overlapping_submissions_for_one_sender_are_rejected() {
        let in_flight = InFlightTransfers::new();
        let sender = RECIPIENT.parse().unwrap();

        let slot = in_flight.begin(sender).unwrap();
        let err = in_flight.begin(sender).unwrap_err();
        assert!(matches!(err, CustomError::TransferInFlightError(_)));

        drop(slot);
        assert!(in_flight.begin(sender).is_ok());
    }

    #[test]
    fn distinct_senders_do_not_block_each_other() {
        let in_flight = InFlightTransfers::new();
        let first = RECIPIENT.parse().unwrap();
        let second = TOKEN.parse().unwrap();

        let _first_slot = in_flight.begin(first).unwrap();
        assert!(in_flight.begin(second).is_ok());
    }

    #[test]
    fn fee_caps_are_applied_at_build_time() {
        let strategy = FeeStrategy::FeeCaps {
            max_fee_per_gas: U256::from(100_000_000_000u64),
            max_priority_fee_per_gas: U256::from(2_000_000_000u64),
        };
        let tx = build_transaction(
            RECIPIENT.parse().unwrap(),
            TOKEN.parse().unwrap(),
            Some(U256::one()),
            None,
            &strategy,
        );
        match tx {
            TypedTransaction::Eip1559(inner) => {
                assert_eq!(inner.max_fee_per_gas, Some(U256::from(100_000_000_000u64)));
                assert_eq!(
                    inner.max_priority_fee_per_gas,
                    Some(U256::from(2_000_000_000u64))
                );
            }
            other => panic!("expected an EIP-1559 transaction, got {other:?}"),
        }
    }

    #[test]
    fn legacy_strategy_builds_a_legacy_transaction() {
        let tx = build_transaction(
            RECIPIENT.parse().unwrap(),
            TOKEN.parse().unwrap(),
            Some(U256::one()),
            None,
            &FeeStrategy::GasPrice,
        );
        assert!(matches!(tx, TypedTransaction::Legacy(_)));
    }
}
