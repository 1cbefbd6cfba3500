use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, Bytes};
use alloy_provider::Provider;
use alloy_rpc_types_eth::{Filter, Log, TransactionRequest};
use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt};
use utils::evm_client::EvmQueryClient;

use crate::apis::chain::{ChainClient, ChainClientError};

#[async_trait]
impl ChainClient for EvmQueryClient {
    async fn call(&self, target: Address, data: Bytes) -> Result<Bytes, ChainClientError> {
        let tx = TransactionRequest::default()
            .with_to(target)
            .with_input(data);

        self.provider
            .call(tx)
            .await
            .map_err(|e| ChainClientError::Rpc(e.into()))
    }

    async fn block_number(&self) -> Result<u64, ChainClientError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|_| ChainClientError::BlockHeight)
    }

    async fn subscribe_blocks(&self) -> Result<BoxStream<'static, u64>, ChainClientError> {
        let stream = self
            .provider
            .subscribe_blocks()
            .await
            .map_err(|e| ChainClientError::Subscription(e.into()))?
            .into_stream()
            .map(|header| header.number);

        Ok(stream.boxed())
    }

    async fn subscribe_logs(
        &self,
        filter: &Filter,
    ) -> Result<BoxStream<'static, Log>, ChainClientError> {
        let stream = self
            .provider
            .subscribe_logs(filter)
            .await
            .map_err(|e| ChainClientError::Subscription(e.into()))?
            .into_stream();

        Ok(stream.boxed())
    }
}
