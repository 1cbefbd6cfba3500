//! Scripted chain client for tests: canned aggregate responses, recorded
//! batches, and pushable block heights / logs.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rpc_types_eth::{Filter, FilteredParams, Log};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use chainsync_types::{tryBlockAndAggregateCall, CallResult};
use futures::stream::BoxStream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::apis::chain::{ChainClient, ChainClientError};

/// One scripted response to an aggregated call.
#[derive(Debug, Clone)]
pub struct MockBatch {
    /// Block number the aggregator reports; defaults to the mock's head.
    pub block_number: Option<u64>,
    pub block_hash: B256,
    /// `(success, returnData)` per sub-call, in position order.
    pub results: Vec<(bool, Bytes)>,
}

impl MockBatch {
    pub fn new(results: Vec<(bool, Bytes)>) -> Self {
        Self {
            block_number: None,
            block_hash: B256::repeat_byte(0xbb),
            results,
        }
    }

    pub fn all_success(results: Vec<Bytes>) -> Self {
        Self::new(results.into_iter().map(|data| (true, data)).collect())
    }

    pub fn at_block(mut self, number: u64) -> Self {
        self.block_number = Some(number);
        self
    }
}

/// What the engine actually sent to the aggregator.
#[derive(Debug, Clone)]
pub struct RecordedBatch {
    /// Aggregator contract address the batch was submitted to.
    pub target: Address,
    /// `(target, callData)` per sub-call, in submission order.
    pub calls: Vec<(Address, Bytes)>,
}

#[derive(Clone)]
pub struct MockChainClient {
    inner: Arc<MockInner>,
}

struct MockInner {
    head: AtomicU64,
    fail_next_call: AtomicBool,
    batches: Mutex<VecDeque<MockBatch>>,
    recorded: Mutex<Vec<RecordedBatch>>,
    block_subs: Mutex<Vec<mpsc::UnboundedSender<u64>>>,
    log_subs: Mutex<Vec<(Filter, mpsc::UnboundedSender<Log>)>>,
}

impl MockChainClient {
    pub fn new(head: u64) -> Self {
        Self {
            inner: Arc::new(MockInner {
                head: AtomicU64::new(head),
                fail_next_call: AtomicBool::new(false),
                batches: Mutex::new(VecDeque::new()),
                recorded: Mutex::new(Vec::new()),
                block_subs: Mutex::new(Vec::new()),
                log_subs: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Queue the response for the next aggregated call. Unscripted calls
    /// answer all-success with zeroed 32-byte words at the current head.
    pub fn push_batch(&self, batch: MockBatch) {
        self.inner.batches.lock().unwrap().push_back(batch);
    }

    pub fn with_batch(self, batch: MockBatch) -> Self {
        self.push_batch(batch);
        self
    }

    /// The next `call` fails as if the transport dropped.
    pub fn fail_next_call(&self) {
        self.inner.fail_next_call.store(true, Ordering::SeqCst);
    }

    pub fn set_head(&self, height: u64) {
        self.inner.head.store(height, Ordering::SeqCst);
    }

    /// Advance the head and notify block subscribers.
    pub fn push_block(&self, height: u64) {
        self.set_head(height);
        self.inner
            .block_subs
            .lock()
            .unwrap()
            .retain(|sender| sender.send(height).is_ok());
    }

    /// Deliver a log to every subscription whose filter matches it.
    pub fn push_log(&self, log: Log) {
        self.inner
            .log_subs
            .lock()
            .unwrap()
            .retain(|(filter, sender)| {
                if filter_matches(filter, &log) {
                    sender.send(log.clone()).is_ok()
                } else {
                    !sender.is_closed()
                }
            });
    }

    pub fn recorded(&self) -> Vec<RecordedBatch> {
        self.inner.recorded.lock().unwrap().clone()
    }

    pub fn block_subscriber_count(&self) -> usize {
        self.inner.block_subs.lock().unwrap().len()
    }

    pub fn log_subscriber_count(&self) -> usize {
        self.inner.log_subs.lock().unwrap().len()
    }
}

fn filter_matches(filter: &Filter, log: &Log) -> bool {
    let params = FilteredParams::new(Some(filter.clone()));
    params.filter_address(&log.address()) && params.filter_topics(log.inner.topics())
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn call(&self, target: Address, data: Bytes) -> Result<Bytes, ChainClientError> {
        if self.inner.fail_next_call.swap(false, Ordering::SeqCst) {
            return Err(ChainClientError::Rpc(anyhow::anyhow!("mock rpc failure")));
        }

        let call = tryBlockAndAggregateCall::abi_decode(&data)
            .map_err(|e| ChainClientError::Rpc(e.into()))?;

        self.inner.recorded.lock().unwrap().push(RecordedBatch {
            target,
            calls: call
                .calls
                .iter()
                .map(|c| (c.target, c.callData.clone()))
                .collect(),
        });

        let batch = self
            .inner
            .batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                MockBatch::all_success(vec![Bytes::from(vec![0u8; 32]); call.calls.len()])
            });

        let number = batch
            .block_number
            .unwrap_or_else(|| self.inner.head.load(Ordering::SeqCst));
        let results: Vec<CallResult> = batch
            .results
            .into_iter()
            .map(|(success, return_data)| CallResult {
                success,
                returnData: return_data,
            })
            .collect();

        Ok(tryBlockAndAggregateCall::abi_encode_returns_tuple(&(
            U256::from(number),
            batch.block_hash,
            results,
        ))
        .into())
    }

    async fn block_number(&self) -> Result<u64, ChainClientError> {
        Ok(self.inner.head.load(Ordering::SeqCst))
    }

    async fn subscribe_blocks(&self) -> Result<BoxStream<'static, u64>, ChainClientError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.inner.block_subs.lock().unwrap().push(sender);
        Ok(Box::pin(UnboundedReceiverStream::new(receiver)))
    }

    async fn subscribe_logs(
        &self,
        filter: &Filter,
    ) -> Result<BoxStream<'static, Log>, ChainClientError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.inner
            .log_subs
            .lock()
            .unwrap()
            .push((filter.clone(), sender));
        Ok(Box::pin(UnboundedReceiverStream::new(receiver)))
    }
}
