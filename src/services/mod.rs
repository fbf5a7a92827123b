pub mod blockchain_service;
pub mod network_config;
pub mod transfer_service;
pub mod wallet_service;
