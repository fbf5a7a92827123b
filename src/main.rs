use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::info;

mod api;
mod config;
mod errors;
mod models;
mod services;

use api::AppState;
use services::blockchain_service::BlockchainClient;
use services::transfer_service::InFlightTransfers;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = config::Config::from_env();
    let port = config.port;

    let client = BlockchainClient::new(&config.network)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    info!(
        "connected to {} (chain id {})",
        config.network.name, config.network.chain_id
    );

    let state = web::Data::new(AppState {
        client,
        config,
        in_flight: InFlightTransfers::new(),
    });

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:8080")
            .allowed_origin("http://localhost:5173")
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
            ])
            .supports_credentials();
        App::new()
            .app_data(state.clone())
            .configure(api::config)
            .wrap(cors)
    })
    .bind(("127.0.0.1", port))?
    .run()
    .await
}
