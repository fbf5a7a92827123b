use actix_web::web;

use crate::config::Config;
use crate::services::blockchain_service::BlockchainClient;
use crate::services::transfer_service::InFlightTransfers;

mod handlers;

/// Shared across workers; read-only after construction apart from the
/// in-flight transfer set.
pub struct AppState {
    pub client: BlockchainClient,
    pub config: Config,
    pub in_flight: InFlightTransfers,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(handlers::connect_wallet)
            .service(handlers::native_balance)
            .service(handlers::token_balance)
            .service(handlers::network_status)
            .service(handlers::submit_transfer),
    );
}
