//! Ready-made actions for common token use cases.

use std::str::FromStr;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};
use alloy_rpc_types_eth::Filter;
use chainsync_types::{abi, Action, CallError, ContractCall};

/// Which trigger keeps a built-in balance action fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceTrigger {
    /// Re-read on every new chain head.
    Block,
    /// Re-read whenever the token emits a Transfer.
    Event,
}

/// Builds an action that keeps an ERC-20 balance synchronized into `sink`.
///
/// Addresses are validated here, at construction, so a malformed target
/// never reaches call encoding.
pub fn erc20_balance_action(
    trigger: BalanceTrigger,
    token: &str,
    owner: &str,
    sink: impl Fn(U256) + Send + Sync + 'static,
) -> Result<Action, CallError> {
    let token = parse_address(token)?;
    let owner = parse_address(owner)?;

    let call = ContractCall::fixed(token, abi::erc20(), "balanceOf");
    let read_balance = move |values: Vec<DynSolValue>| {
        if let Some(DynSolValue::Uint(balance, _)) = values.into_iter().next() {
            sink(balance);
        }
    };

    Ok(match trigger {
        BalanceTrigger::Block => Action::on_block(
            call,
            move |_height| vec![DynSolValue::Address(owner)],
            move |values, _info| read_balance(values),
        ),
        BalanceTrigger::Event => {
            // any Transfer on the token may move this balance; the re-read
            // itself decides the new value
            let filter = Filter::new()
                .address(token)
                .event_signature(abi::erc20_transfer_topic());
            Action::on_event(
                filter,
                call,
                move |_log, _height| vec![DynSolValue::Address(owner)],
                move |values, _info, _log| read_balance(values),
            )
        }
    })
}

/// Builds an action that keeps an ERC-20 total supply synchronized into
/// `sink`, re-read on every new chain head.
pub fn erc20_total_supply_action(
    token: &str,
    sink: impl Fn(U256) + Send + Sync + 'static,
) -> Result<Action, CallError> {
    let token = parse_address(token)?;

    Ok(Action::on_block(
        ContractCall::fixed(token, abi::erc20(), "totalSupply"),
        |_height| vec![],
        move |values, _info| {
            if let Some(DynSolValue::Uint(supply, _)) = values.into_iter().next() {
                sink(supply);
            }
        },
    ))
}

fn parse_address(s: &str) -> Result<Address, CallError> {
    Address::from_str(s).map_err(|_| CallError::InvalidAddress(s.to_string()))
}
