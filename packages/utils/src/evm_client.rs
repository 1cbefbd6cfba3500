use std::{str::FromStr, time::Duration};

use alloy_provider::{DynProvider, Provider, ProviderBuilder, WsConnect};

use crate::error::EvmClientError;

/// Read-only client for one EVM chain.
#[derive(Clone)]
pub struct EvmQueryClient {
    pub endpoint: EvmEndpoint,
    pub provider: DynProvider,
}

#[derive(Debug, Clone)]
pub enum EvmEndpoint {
    WebSocket(reqwest::Url),
    Http(reqwest::Url),
}

impl FromStr for EvmEndpoint {
    type Err = EvmClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url =
            reqwest::Url::parse(s).map_err(|e| EvmClientError::ParseEndpoint(e.to_string()))?;
        match url.scheme() {
            "ws" | "wss" => Ok(EvmEndpoint::WebSocket(url)),
            "http" | "https" => Ok(EvmEndpoint::Http(url)),
            scheme => Err(EvmClientError::ParseEndpoint(format!(
                "could not determine endpoint from scheme {scheme} (full url: {s})"
            ))),
        }
    }
}

impl std::fmt::Display for EvmEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvmEndpoint::WebSocket(url) => write!(f, "{}", url),
            EvmEndpoint::Http(url) => write!(f, "{}", url),
        }
    }
}

impl EvmEndpoint {
    pub fn new_http(url: &str) -> Result<Self, EvmClientError> {
        url.parse::<Self>().and_then(|endpoint| {
            if matches!(endpoint, EvmEndpoint::Http(_)) {
                Ok(endpoint)
            } else {
                Err(EvmClientError::ParseEndpoint(
                    "url scheme is not http or https".to_string(),
                ))
            }
        })
    }

    pub fn new_ws(url: &str) -> Result<Self, EvmClientError> {
        url.parse::<Self>().and_then(|endpoint| {
            if matches!(endpoint, EvmEndpoint::WebSocket(_)) {
                Ok(endpoint)
            } else {
                Err(EvmClientError::ParseEndpoint(
                    "url scheme is not ws or wss".to_string(),
                ))
            }
        })
    }

    pub async fn to_provider(&self) -> Result<DynProvider, EvmClientError> {
        Ok(match self {
            EvmEndpoint::WebSocket(url) => {
                let ws = WsConnect::new(url.clone());
                DynProvider::new(
                    ProviderBuilder::new()
                        .connect_ws(ws)
                        .await
                        .map_err(|e| EvmClientError::WebSocketProvider(e.into()))?,
                )
            }
            EvmEndpoint::Http(url) => {
                DynProvider::new(ProviderBuilder::new().connect_http(url.clone()))
            }
        })
    }
}

impl EvmQueryClient {
    pub async fn new(endpoint: EvmEndpoint) -> Result<Self, EvmClientError> {
        Ok(EvmQueryClient {
            provider: endpoint.to_provider().await?,
            endpoint,
        })
    }

    /// How often http providers poll for new state; subscriptions over
    /// websocket are unaffected.
    pub fn set_poll_interval(&self, poll_interval: Duration) {
        self.provider.client().set_poll_interval(poll_interval);
    }
}

impl std::fmt::Debug for EvmQueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmQueryClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_endpoint() {
        let endpoint = EvmEndpoint::from_str("ws://localhost:8545").unwrap();
        assert!(matches!(endpoint, EvmEndpoint::WebSocket(_)));

        let endpoint = EvmEndpoint::from_str("http://localhost:8545").unwrap();
        assert!(matches!(endpoint, EvmEndpoint::Http(_)));

        let endpoint = EvmEndpoint::from_str("https://localhost:8545").unwrap();
        assert!(matches!(endpoint, EvmEndpoint::Http(_)));

        let endpoint = EvmEndpoint::from_str("wss://localhost:8545").unwrap();
        assert!(matches!(endpoint, EvmEndpoint::WebSocket(_)));

        let endpoint = EvmEndpoint::from_str("localhost:8545").unwrap_err();
        assert!(matches!(endpoint, EvmClientError::ParseEndpoint(_)));
    }

    #[test]
    fn endpoint_kind_is_enforced() {
        EvmEndpoint::new_ws("http://localhost:8545").unwrap_err();
        EvmEndpoint::new_http("ws://localhost:8545").unwrap_err();
        EvmEndpoint::new_ws("wss://localhost:8545").unwrap();
        EvmEndpoint::new_http("https://localhost:8545").unwrap();
    }
}
