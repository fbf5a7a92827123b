use actix_web::{get, post, web, HttpResponse};

use crate::api::AppState;
use crate::errors::CustomError;
use crate::models::api_response::success_response;
use crate::models::transfer::TransferRequest;
use crate::services::transfer_service::TransferService;
use crate::services::wallet_service::WalletService;

#[get("/wallet")]
async fn connect_wallet(state: web::Data<AppState>) -> Result<HttpResponse, CustomError> {
    let wallet = WalletService::connect(&state.client, &state.config).await?;
    Ok(success_response(wallet))
}

#[get("/balance/{address}")]
async fn native_balance(
    state: web::Data<AppState>,
    address: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let balance = state.client.get_native_balance(&address).await?;
    Ok(success_response(balance))
}

#[get("/balance/{address}/token/{token}")]
async fn token_balance(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, CustomError> {
    let (address, token) = path.into_inner();
    let balance = state.client.get_token_balance(&token, &address).await?;
    Ok(success_response(balance))
}

#[get("/network")]
async fn network_status(state: web::Data<AppState>) -> Result<HttpResponse, CustomError> {
    let status = state.client.get_network_status().await?;
    Ok(success_response(status))
}

#[post("/transfer")]
async fn submit_transfer(
    state: web::Data<AppState>,
    request: web::Json<TransferRequest>,
) -> Result<HttpResponse, CustomError> {
    let service = TransferService::new(&state.client, &state.config, &state.in_flight);
    let transaction = service.submit(&request).await?;
    Ok(success_response(transaction))
}
