use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use ethers::providers::ProviderError;
use serde::Serialize;
use thiserror::Error;

use crate::models::api_response::ApiResponse;

#[derive(Error, Debug)]
pub enum CustomError {
    #[error("Signing wallet is not available: {0}")]
    WalletUnavailableError(String),

    #[error("Invalid input: {0}")]
    ValidationError(String),

    #[error("Invalid address: {0}")]
    InvalidAddressError(String),

    #[error("Invalid amount: {0}")]
    InvalidAmountError(String),

    #[error("Wrong network: expected chain id {expected}, got {actual}")]
    NetworkMismatchError { expected: u64, actual: u64 },

    #[error("Insufficient balance: need {needed} {symbol} but have {available} {symbol}")]
    InsufficientFundsError {
        needed: String,
        available: String,
        symbol: String,
    },

    #[error("A transfer from {0} is already in flight")]
    TransferInFlightError(String),

    #[error("Gas estimation failed: {0}")]
    GasEstimationError(String),

    #[error("Unsupported chain: {0}")]
    UnsupportedChainError(u64),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Provider error: {0}")]
    ProviderError(#[from] ProviderError),

    #[error("Provider error: {0}")]
    StringifiedProviderError(String),

    #[error("Contract error: {0}")]
    ContractError(String),

    #[error("Failed to get transaction receipt")]
    TransactionReceiptFailedError,
}

// Wire shape of a failed response
#[derive(Debug, Serialize)]
pub struct ApiError {
    code: u16,
    message: String,
}

impl ResponseError for CustomError {
    fn status_code(&self) -> StatusCode {
        match self {
            CustomError::WalletUnavailableError(_) => StatusCode::SERVICE_UNAVAILABLE,
            CustomError::ValidationError(_) => StatusCode::BAD_REQUEST,
            CustomError::InvalidAddressError(_) => StatusCode::BAD_REQUEST,
            CustomError::InvalidAmountError(_) => StatusCode::BAD_REQUEST,
            CustomError::NetworkMismatchError { .. } => StatusCode::CONFLICT,
            CustomError::InsufficientFundsError { .. } => StatusCode::BAD_REQUEST,
            CustomError::TransferInFlightError(_) => StatusCode::CONFLICT,
            CustomError::GasEstimationError(_) => StatusCode::BAD_GATEWAY,
            CustomError::UnsupportedChainError(_) => StatusCode::BAD_REQUEST,
            CustomError::NetworkError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CustomError::ProviderError(_) => StatusCode::BAD_GATEWAY,
            CustomError::StringifiedProviderError(_) => StatusCode::BAD_GATEWAY,
            CustomError::ContractError(_) => StatusCode::BAD_GATEWAY,
            CustomError::TransactionReceiptFailedError => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let code = self.status_code();
        let response = ApiResponse {
            status: "FAILURE".to_string(),
            code: code.as_u16(),
            result: None::<()>,
            error: Some(ApiError {
                code: code.as_u16(),
                message: self.to_string(),
            }),
        };
        HttpResponse::build(code).json(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests() {
        let err = CustomError::InvalidAddressError("0xzz".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = CustomError::ValidationError("recipient is required".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn insufficient_funds_message_names_both_amounts() {
        let err = CustomError::InsufficientFundsError {
            needed: "2.5".to_string(),
            available: "1".to_string(),
            symbol: "POL".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("Insufficient balance"));
        assert!(message.contains("2.5 POL"));
        assert!(message.contains("1 POL"));
    }

    #[test]
    fn overlapping_transfers_conflict() {
        let err = CustomError::TransferInFlightError("0xabc".to_string());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
