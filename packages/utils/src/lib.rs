pub mod config;
pub mod context;
pub mod error;
pub mod evm_client;
pub mod telemetry;
