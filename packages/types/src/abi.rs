//! Static ABI tables for the token standards the built-in actions speak.
//!
//! Parsed once from human-readable signatures; callers share the parsed
//! [`JsonAbi`] through an `Arc` so every `ContractCall` built from a table
//! stays cheap to clone.

use std::sync::{Arc, LazyLock};

use alloy_json_abi::JsonAbi;
use alloy_primitives::B256;

static ERC20: LazyLock<Arc<JsonAbi>> = LazyLock::new(|| {
    Arc::new(
        JsonAbi::parse([
            "function totalSupply() external view returns (uint256)",
            "function balanceOf(address account) external view returns (uint256)",
            "function allowance(address owner, address spender) external view returns (uint256)",
            "function decimals() external view returns (uint8)",
            "function symbol() external view returns (string)",
            "event Transfer(address indexed from, address indexed to, uint256 value)",
            "event Approval(address indexed owner, address indexed spender, uint256 value)",
        ])
        .expect("ERC20 ABI parses"),
    )
});

pub fn erc20() -> Arc<JsonAbi> {
    ERC20.clone()
}

/// Topic0 of the ERC-20 `Transfer` event.
pub fn erc20_transfer_topic() -> B256 {
    ERC20
        .event("Transfer")
        .and_then(|overloads| overloads.first())
        .expect("ERC20 ABI has a Transfer event")
        .selector()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn erc20_table_has_views() {
        let abi = erc20();
        for name in ["totalSupply", "balanceOf", "allowance", "decimals", "symbol"] {
            assert!(abi.function(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn transfer_topic_is_canonical() {
        // keccak256("Transfer(address,address,uint256)")
        assert_eq!(
            erc20_transfer_topic(),
            alloy_primitives::keccak256("Transfer(address,address,uint256)")
        );
    }
}
