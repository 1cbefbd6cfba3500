use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvmClientError {
    #[error("Unable to parse endpoint: {0}")]
    ParseEndpoint(String),

    #[error("Unable to create web socket provider: {0:#?}")]
    WebSocketProvider(anyhow::Error),

    #[error("Unable to create http provider: {0:#?}")]
    HttpProvider(anyhow::Error),

    #[error("No endpoint configured for chain")]
    MissingEndpoint,

    #[error("Unable to get block height")]
    BlockHeight,
}
