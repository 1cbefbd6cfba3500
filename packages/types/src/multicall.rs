mod multicall2 {
    use alloy_sol_types::sol;

    sol!(
        #[allow(missing_docs)]
        #[derive(Debug, PartialEq, Eq)]
        struct Call {
            address target;
            bytes callData;
        }

        #[allow(missing_docs)]
        #[derive(Debug, PartialEq, Eq)]
        struct CallResult {
            bool success;
            bytes returnData;
        }

        #[allow(missing_docs)]
        function tryBlockAndAggregate(bool requireSuccess, Call[] calls) external payable returns (uint256 blockNumber, bytes32 blockHash, CallResult[] returnData);

        #[allow(missing_docs)]
        function getBlockNumber() external view returns (uint256 blockNumber);

        #[allow(missing_docs)]
        function getEthBalance(address addr) external view returns (uint256 balance);
    );
}

pub use multicall2::{
    getBlockNumberCall, getEthBalanceCall, tryBlockAndAggregateCall, Call, CallResult,
};

/// Canonical Multicall2 deployment, shared across mainnet and most testnets.
pub const MULTICALL2_ADDRESS: alloy_primitives::Address =
    alloy_primitives::address!("0x5ba1e12693dc8f9c48aad8770482f4739beed696");
