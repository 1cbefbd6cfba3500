use std::{sync::Arc, time::Duration};

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::B256;
use alloy_rpc_types_eth::{Filter, Log};

use crate::{ContractCall, Timestamp};

/// Block metadata reported by the aggregated call that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub number: u64,
    pub hash: B256,
}

/// Maps a new chain head to the argument list of the member's call.
pub type BlockInput = Arc<dyn Fn(u64) -> Vec<DynSolValue> + Send + Sync>;

/// Maps the current time to the argument list of the member's call.
pub type TimeInput = Arc<dyn Fn(Timestamp) -> Vec<DynSolValue> + Send + Sync>;

/// Maps an observed log (and the block it landed in) to the argument list.
pub type EventInput = Arc<dyn Fn(&Log, u64) -> Vec<DynSolValue> + Send + Sync>;

/// Receives decoded return values; side-effecting by design, this is where
/// results land in caller-owned state.
pub type Output = Arc<dyn Fn(Vec<DynSolValue>, BlockInfo) + Send + Sync>;

/// Event-flavored output handler, additionally handed the raw log.
pub type EventOutput = Arc<dyn Fn(Vec<DynSolValue>, BlockInfo, &Log) + Send + Sync>;

#[derive(Clone)]
pub struct BlockAction {
    pub call: ContractCall,
    pub input: BlockInput,
    pub output: Output,
}

#[derive(Clone)]
pub struct TimeAction {
    /// Dedup key: actions with equal intervals share one timer.
    pub interval: Duration,
    pub call: ContractCall,
    pub input: TimeInput,
    pub output: Output,
}

#[derive(Clone)]
pub struct EventAction {
    /// Dedup key (by canonical serialization): actions with equal filters
    /// share one subscription.
    pub filter: Filter,
    pub call: ContractCall,
    pub input: EventInput,
    pub output: EventOutput,
}

/// One unit of synchronized state: a trigger condition, a contract call, an
/// input encoder and an output handler. Immutable once constructed.
#[derive(Clone)]
pub enum Action {
    Block(BlockAction),
    Time(TimeAction),
    Event(EventAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    Block,
    Time,
    Event,
}

impl Action {
    /// Re-evaluate on every new chain head.
    pub fn on_block<I, O>(call: ContractCall, input: I, output: O) -> Self
    where
        I: Fn(u64) -> Vec<DynSolValue> + Send + Sync + 'static,
        O: Fn(Vec<DynSolValue>, BlockInfo) + Send + Sync + 'static,
    {
        Action::Block(BlockAction {
            call,
            input: Arc::new(input),
            output: Arc::new(output),
        })
    }

    /// Re-evaluate on a fixed period.
    pub fn every<I, O>(interval: Duration, call: ContractCall, input: I, output: O) -> Self
    where
        I: Fn(Timestamp) -> Vec<DynSolValue> + Send + Sync + 'static,
        O: Fn(Vec<DynSolValue>, BlockInfo) + Send + Sync + 'static,
    {
        Action::Time(TimeAction {
            interval,
            call,
            input: Arc::new(input),
            output: Arc::new(output),
        })
    }

    /// Re-evaluate whenever a log matching `filter` is observed.
    pub fn on_event<I, O>(filter: Filter, call: ContractCall, input: I, output: O) -> Self
    where
        I: Fn(&Log, u64) -> Vec<DynSolValue> + Send + Sync + 'static,
        O: Fn(Vec<DynSolValue>, BlockInfo, &Log) + Send + Sync + 'static,
    {
        Action::Event(EventAction {
            filter,
            call,
            input: Arc::new(input),
            output: Arc::new(output),
        })
    }

    pub fn kind(&self) -> TriggerKind {
        match self {
            Action::Block(_) => TriggerKind::Block,
            Action::Time(_) => TriggerKind::Time,
            Action::Event(_) => TriggerKind::Event,
        }
    }

    pub fn call(&self) -> &ContractCall {
        match self {
            Action::Block(action) => &action.call,
            Action::Time(action) => &action.call,
            Action::Event(action) => &action.call,
        }
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("kind", &self.kind())
            .field("call", self.call())
            .finish()
    }
}
