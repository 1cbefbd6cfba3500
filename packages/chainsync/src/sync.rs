use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use alloy_primitives::Address;
use alloy_rpc_types_eth::Log;
use chainsync_types::{Action, Timestamp, MULTICALL2_ADDRESS};
use futures::{stream::BoxStream, StreamExt};
use tokio_stream::wrappers::IntervalStream;
use tracing::instrument;
use utils::{config::ChainConfig, context::AppContext};

use crate::{
    apis::chain::ChainClient, dispatcher::Dispatcher, error::SyncError, groups::ExecutionGroups,
};

/// Options accepted at engine construction.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Overrides the default aggregator contract address.
    pub aggregator_address: Option<Address>,
    /// Run one Block evaluation (with block context 0) and one Time
    /// evaluation immediately at startup instead of waiting for the first
    /// head notification / timer tick. Both pass through the same staleness
    /// guard as live firings, so a warm start can never regress a watermark
    /// already advanced by a real block; ordering against the first live
    /// block notification is not guaranteed.
    pub populate_on_start: bool,
}

/// Trigger kinds that can be re-evaluated on demand. Event actions are
/// intrinsically reactive to chain logs and are excluded at the type level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Block,
    Time,
}

// one firing-worthy occurrence from any trigger source
enum Firing {
    Block { height: u64 },
    Time { group: usize },
    Event { group: usize, log: Log },
}

/// The state-sync engine.
///
/// Owns the block-height watermark, one head subscription (if any Block
/// actions exist), one timer per distinct interval and one log subscription
/// per distinct filter, and drives the aggregation dispatcher on each firing.
///
/// The action set is fixed at construction; build a new instance (and dispose
/// of the old one) to change it.
pub struct StateSync {
    inner: Arc<Inner>,
    ctx: AppContext,
    disposed: AtomicBool,
}

struct Inner {
    chain: Arc<dyn ChainClient>,
    dispatcher: Dispatcher,
    groups: ExecutionGroups,
}

impl StateSync {
    #[instrument(level = "debug", skip_all, fields(subsys = "StateSync"))]
    pub async fn new(
        actions: Vec<Action>,
        chain: Arc<dyn ChainClient>,
        options: SyncOptions,
    ) -> Result<Self, SyncError> {
        let groups = ExecutionGroups::partition(actions)?;
        let aggregator = options.aggregator_address.unwrap_or(MULTICALL2_ADDRESS);

        let inner = Arc::new(Inner {
            dispatcher: Dispatcher::new(chain.clone(), aggregator),
            chain,
            groups,
        });

        // subscriptions are opened here, not in the watcher task, so that
        // setup failures surface to the constructor
        let mut streams: Vec<BoxStream<'static, Firing>> = Vec::new();

        if !inner.groups.block.is_empty() {
            let stream = inner.chain.subscribe_blocks().await?;
            streams.push(stream.map(|height| Firing::Block { height }).boxed());
        }

        for (index, group) in inner.groups.time.iter().enumerate() {
            // first tick lands one full period out; the immediate evaluation
            // case is covered by populate_on_start
            let timer = tokio::time::interval_at(
                tokio::time::Instant::now() + group.interval,
                group.interval,
            );
            streams.push(
                IntervalStream::new(timer)
                    .map(move |_| Firing::Time { group: index })
                    .boxed(),
            );
        }

        for (index, group) in inner.groups.event.iter().enumerate() {
            let stream = inner.chain.subscribe_logs(&group.filter).await?;
            streams.push(
                stream
                    .map(move |log| Firing::Event { group: index, log })
                    .boxed(),
            );
        }

        let ctx = AppContext::new();

        tokio::spawn({
            let inner = inner.clone();
            let mut kill_receiver = ctx.get_kill_receiver();
            let populate = options.populate_on_start;
            async move {
                tokio::select! {
                    // biased: once disposal is signalled, a firing that became
                    // ready in the same instant must not reach its handlers
                    biased;
                    _ = kill_receiver.recv() => {
                        tracing::debug!("state sync watcher shutting down");
                    },
                    _ = inner.watch(streams, populate) => {
                        tracing::debug!("state sync watcher finished");
                    }
                }
            }
        });

        Ok(Self {
            inner,
            ctx,
            disposed: AtomicBool::new(false),
        })
    }

    /// Connect to a chain from config and construct the engine on top of the
    /// resulting query client.
    pub async fn connect(
        actions: Vec<Action>,
        config: &ChainConfig,
        options: SyncOptions,
    ) -> Result<Self, SyncError> {
        let client = config.query_client().await?;
        Self::new(actions, Arc::new(client), options).await
    }

    /// Highest block number whose results have been applied.
    pub fn latest_block_height(&self) -> u64 {
        self.inner.dispatcher.block_height()
    }

    /// Re-evaluate a trigger kind on demand, outside its normal schedule.
    ///
    /// `Block` fetches the current chain head and runs the same gated path a
    /// head notification would; `Time` fires every interval group
    /// immediately without resetting any timer. A failed aggregated call
    /// propagates to the caller.
    #[instrument(level = "debug", skip(self), fields(subsys = "StateSync"))]
    pub async fn update(&self, kind: UpdateKind) -> Result<(), SyncError> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(SyncError::Disposed);
        }

        match kind {
            UpdateKind::Block => {
                let head = self.inner.chain.block_number().await?;
                self.inner.on_new_block(head).await
            }
            UpdateKind::Time => self.inner.fire_all_time().await,
        }
    }

    /// Tear down the block listener, all event subscriptions and all timers.
    /// Safe to call any number of times; no output handler fires afterwards.
    #[instrument(level = "debug", skip(self), fields(subsys = "StateSync"))]
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            self.ctx.kill();
        }
    }
}

impl Drop for StateSync {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Inner {
    async fn watch(self: Arc<Self>, streams: Vec<BoxStream<'static, Firing>>, populate: bool) {
        if populate {
            // warm start: one ungated block evaluation at height 0 plus one
            // time evaluation; the staleness guard arbitrates against
            // whatever live firing lands first
            if let Err(err) = self.dispatcher.fire_block(&self.groups.block, 0).await {
                tracing::error!("populate block evaluation failed: {:?}", err);
            }
            if let Err(err) = self.fire_all_time().await {
                tracing::error!("populate time evaluation failed: {:?}", err);
            }
        }

        let mut streams = futures::stream::select_all(streams);

        while let Some(firing) = streams.next().await {
            let res = match firing {
                Firing::Block { height } => self.on_new_block(height).await,
                Firing::Time { group } => {
                    let group = &self.groups.time[group];
                    self.dispatcher
                        .fire_time(&group.members, Timestamp::now())
                        .await
                }
                Firing::Event { group, log } => {
                    let group = &self.groups.event[group];
                    self.dispatcher.fire_event(&group.members, &log).await
                }
            };

            // the watcher is the initiator of stream firings: a failed
            // firing is reported and the next one proceeds as usual
            if let Err(err) = res {
                tracing::error!("firing failed: {:?}", err);
            }
        }

        tracing::debug!("all trigger streams ended");
    }

    async fn on_new_block(&self, height: u64) -> Result<(), SyncError> {
        // equal or lower heights are a no-op, not an error
        if !self.dispatcher.advance_height(height) {
            return Ok(());
        }
        self.dispatcher.fire_block(&self.groups.block, height).await
    }

    async fn fire_all_time(&self) -> Result<(), SyncError> {
        for group in &self.groups.time {
            self.dispatcher
                .fire_time(&group.members, Timestamp::now())
                .await?;
        }
        Ok(())
    }
}
