use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::Address;
use alloy_rpc_types_eth::Log;
use alloy_sol_types::SolCall;
use chainsync_types::{
    tryBlockAndAggregateCall, BlockAction, BlockInfo, Call, CallResult, ContractCall, EventAction,
    TimeAction, Timestamp,
};

use crate::{apis::chain::ChainClient, error::SyncError};

/// Executes one firing of a group: encodes every member's call, submits a
/// single `tryBlockAndAggregate` round trip, and demultiplexes the per-call
/// results back to each member's output handler in position order.
pub struct Dispatcher {
    chain: Arc<dyn ChainClient>,
    aggregator: Address,
    /// Highest block number whose results have been applied.
    watermark: AtomicU64,
}

struct Batch {
    info: BlockInfo,
    results: Vec<CallResult>,
}

/// The per-kind members only differ in their input/output closure shapes;
/// everything after encoding goes through the same demux path.
trait GroupMember {
    fn contract_call(&self) -> &ContractCall;
}

impl GroupMember for BlockAction {
    fn contract_call(&self) -> &ContractCall {
        &self.call
    }
}

impl GroupMember for TimeAction {
    fn contract_call(&self) -> &ContractCall {
        &self.call
    }
}

impl GroupMember for EventAction {
    fn contract_call(&self) -> &ContractCall {
        &self.call
    }
}

impl Dispatcher {
    pub fn new(chain: Arc<dyn ChainClient>, aggregator: Address) -> Self {
        Self {
            chain,
            aggregator,
            watermark: AtomicU64::new(0),
        }
    }

    pub fn block_height(&self) -> u64 {
        self.watermark.load(Ordering::SeqCst)
    }

    /// Entry gate for the block path: raise the watermark to `height` and
    /// report whether it was strictly newer. `fetch_max` keeps the
    /// check-then-advance race free across overlapping callbacks.
    pub fn advance_height(&self, height: u64) -> bool {
        self.watermark.fetch_max(height, Ordering::SeqCst) < height
    }

    pub async fn fire_block(&self, members: &[BlockAction], height: u64) -> Result<(), SyncError> {
        let calls = encode_members(members, |member| (member.input)(height))?;
        self.dispatch(members, calls, |member: &BlockAction, values, info| {
            (member.output)(values, info)
        })
        .await
    }

    pub async fn fire_time(&self, members: &[TimeAction], now: Timestamp) -> Result<(), SyncError> {
        let calls = encode_members(members, |member| (member.input)(now))?;
        self.dispatch(members, calls, |member: &TimeAction, values, info| {
            (member.output)(values, info)
        })
        .await
    }

    pub async fn fire_event(&self, members: &[EventAction], log: &Log) -> Result<(), SyncError> {
        let Some(height) = log.block_number else {
            // a pending log carries no block context to evaluate against
            tracing::warn!("log without a block number, skipping firing");
            return Ok(());
        };

        let calls = encode_members(members, |member| (member.input)(log, height))?;
        self.dispatch(members, calls, |member: &EventAction, values, info| {
            (member.output)(values, info, log)
        })
        .await
    }

    async fn dispatch<M: GroupMember>(
        &self,
        members: &[M],
        calls: Vec<Call>,
        deliver: impl Fn(&M, Vec<DynSolValue>, BlockInfo),
    ) -> Result<(), SyncError> {
        if members.is_empty() {
            return Ok(());
        }

        let Some(batch) = self.aggregate(calls).await? else {
            return Ok(());
        };

        for (member, result) in members.iter().zip(batch.results) {
            if !result.success {
                tracing::debug!(
                    function = member.contract_call().function_name(),
                    "sub-call failed, skipping until next firing"
                );
                continue;
            }
            let values = member.contract_call().decode_output(&result.returnData)?;
            deliver(member, values, batch.info);
        }

        Ok(())
    }

    /// One aggregated round trip plus the staleness guard. `None` means the
    /// reported block was older than the watermark and the whole result set
    /// was discarded.
    async fn aggregate(&self, calls: Vec<Call>) -> Result<Option<Batch>, SyncError> {
        let data = tryBlockAndAggregateCall {
            requireSuccess: false,
            calls,
        }
        .abi_encode();

        let raw = self.chain.call(self.aggregator, data.into()).await?;

        let decoded = tryBlockAndAggregateCall::abi_decode_returns(&raw)
            .map_err(|e| SyncError::Aggregate(e.into()))?;
        let reported = u64::try_from(decoded.blockNumber)
            .map_err(|e| SyncError::Aggregate(anyhow::anyhow!("block number overflow: {e}")))?;

        // Don't update with old data: a concurrent evaluation may already
        // have applied results for a later block.
        if self.watermark.fetch_max(reported, Ordering::SeqCst) > reported {
            tracing::debug!(reported, "stale aggregate result discarded");
            return Ok(None);
        }

        Ok(Some(Batch {
            info: BlockInfo {
                number: reported,
                hash: decoded.blockHash,
            },
            results: decoded.returnData,
        }))
    }
}

fn encode_members<M: GroupMember>(
    members: &[M],
    input: impl Fn(&M) -> Vec<DynSolValue>,
) -> Result<Vec<Call>, SyncError> {
    members
        .iter()
        .map(|member| {
            Ok(Call {
                target: member.contract_call().target(),
                callData: member.contract_call().encode_input(&input(member))?,
            })
        })
        .collect()
}
