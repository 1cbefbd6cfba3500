use std::sync::Arc;

use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::{Address, Bytes};
use thiserror::Error;

/// The target resolver is a function rather than a constant so the
/// destination may depend on mutable external state (e.g. a lazily resolved
/// registry entry); it is re-evaluated on every firing.
pub type TargetResolver = Arc<dyn Fn() -> Address + Send + Sync>;

/// Describes one read-only contract call: where it goes and how its input
/// and output are shaped.
#[derive(Clone)]
pub struct ContractCall {
    target: TargetResolver,
    abi: Arc<JsonAbi>,
    function: String,
}

impl ContractCall {
    pub fn new(target: TargetResolver, abi: Arc<JsonAbi>, function: impl ToString) -> Self {
        Self {
            target,
            abi,
            function: function.to_string(),
        }
    }

    /// A call whose target never changes.
    pub fn fixed(address: Address, abi: Arc<JsonAbi>, function: impl ToString) -> Self {
        Self::new(Arc::new(move || address), abi, function)
    }

    pub fn target(&self) -> Address {
        (self.target)()
    }

    pub fn function_name(&self) -> &str {
        &self.function
    }

    fn function(&self) -> Result<&Function, CallError> {
        self.abi
            .function(&self.function)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| CallError::UnknownFunction(self.function.clone()))
    }

    /// Selector-prefixed calldata for `args`.
    pub fn encode_input(&self, args: &[DynSolValue]) -> Result<Bytes, CallError> {
        let function = self.function()?;
        let data = function
            .abi_encode_input(args)
            .map_err(|source| CallError::Encode {
                function: self.function.clone(),
                source,
            })?;
        Ok(data.into())
    }

    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<DynSolValue>, CallError> {
        let function = self.function()?;
        function
            .abi_decode_output(data)
            .map_err(|source| CallError::Decode {
                function: self.function.clone(),
                source,
            })
    }
}

impl std::fmt::Debug for ContractCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // the resolver is not called here: Debug must stay side-effect free
        f.debug_struct("ContractCall")
            .field("function", &self.function)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum CallError {
    #[error("no function named {0} in ABI")]
    UnknownFunction(String),

    #[error("unable to encode input for {function}: {source}")]
    Encode {
        function: String,
        source: alloy_dyn_abi::Error,
    },

    #[error("unable to decode output for {function}: {source}")]
    Decode {
        function: String,
        source: alloy_dyn_abi::Error,
    },

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}
