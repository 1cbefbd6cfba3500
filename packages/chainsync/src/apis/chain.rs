use alloy_primitives::{Address, Bytes};
use alloy_rpc_types_eth::{Filter, Log};
use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

/// The narrow chain capability the engine consumes.
///
/// Everything the engine needs from a node fits in these four operations;
/// timeout and retry policy belong to the implementation, not the engine.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Execute a read-only call against current state, returning the raw
    /// return bytes.
    async fn call(&self, target: Address, data: Bytes) -> Result<Bytes, ChainClientError>;

    /// Current chain head height.
    async fn block_number(&self) -> Result<u64, ChainClientError>;

    /// New-head notifications.
    async fn subscribe_blocks(&self) -> Result<BoxStream<'static, u64>, ChainClientError>;

    /// Logs matching `filter`.
    async fn subscribe_logs(
        &self,
        filter: &Filter,
    ) -> Result<BoxStream<'static, Log>, ChainClientError>;
}

#[derive(Debug, Error)]
pub enum ChainClientError {
    #[error("rpc: {0}")]
    Rpc(anyhow::Error),

    #[error("subscription: {0}")]
    Subscription(anyhow::Error),

    #[error("Unable to get block height")]
    BlockHeight,
}
