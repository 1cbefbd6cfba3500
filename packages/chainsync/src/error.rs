use chainsync_types::CallError;
use thiserror::Error;
use utils::error::EvmClientError;

use crate::apis::chain::ChainClientError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("chain client: {0}")]
    Chain(#[from] ChainClientError),

    #[error("evm client: {0}")]
    Client(#[from] EvmClientError),

    #[error(transparent)]
    Call(#[from] CallError),

    #[error("aggregate envelope: {0}")]
    Aggregate(anyhow::Error),

    #[error("unable to canonicalize event filter: {0}")]
    FilterKey(serde_json::Error),

    #[error("engine is disposed")]
    Disposed,
}
