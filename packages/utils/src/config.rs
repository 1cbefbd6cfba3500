use std::path::Path;

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::EvmClientError,
    evm_client::{EvmEndpoint, EvmQueryClient},
};

/// Connection configuration for one EVM chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainConfig {
    pub ws_endpoint: Option<String>,
    pub http_endpoint: Option<String>,
    /// How often http providers poll for new blocks, in milliseconds.
    /// If unset, the provider default is used (which may differ across networks)
    pub poll_interval_ms: Option<u64>,
}

impl ChainConfig {
    /// Endpoint used for queries and subscriptions.
    /// Websocket is preferred since subscriptions need push notifications
    pub fn query_client_endpoint(&self) -> Result<EvmEndpoint, EvmClientError> {
        match (&self.ws_endpoint, &self.http_endpoint) {
            (Some(ws), _) => EvmEndpoint::new_ws(ws),
            (None, Some(http)) => EvmEndpoint::new_http(http),
            (None, None) => Err(EvmClientError::MissingEndpoint),
        }
    }

    pub async fn query_client(&self) -> Result<EvmQueryClient, EvmClientError> {
        let client = EvmQueryClient::new(self.query_client_endpoint()?).await?;
        if let Some(ms) = self.poll_interval_ms {
            client.set_poll_interval(std::time::Duration::from_millis(ms));
        }
        Ok(client)
    }

    /// Load from an optional TOML file, with `{env_prefix}_*` environment
    /// variables merged on top.
    pub fn load(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(&format!("{env_prefix}_")))
            .extract()
            .context("unable to load chain config")
    }
}
