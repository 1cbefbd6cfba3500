use std::time::Duration;

use alloy_rpc_types_eth::Filter;
use chainsync_types::{Action, BlockAction, EventAction, FilterKey, TimeAction};
use ordermap::OrderMap;

use crate::error::SyncError;

/// One shared timer's worth of Time actions.
pub struct TimeGroup {
    pub interval: Duration,
    pub members: Vec<TimeAction>,
}

/// One shared subscription's worth of Event actions.
pub struct EventGroup {
    pub filter: Filter,
    pub key: FilterKey,
    pub members: Vec<EventAction>,
}

/// Actions partitioned by trigger kind, with shared triggers collapsed.
///
/// Member order inside a group is load-bearing: the N-th encoded call of a
/// batch maps back to the N-th member when results are demultiplexed.
pub struct ExecutionGroups {
    pub block: Vec<BlockAction>,
    pub time: Vec<TimeGroup>,
    pub event: Vec<EventGroup>,
}

impl ExecutionGroups {
    /// Pure, runs once at engine construction. Time actions with equal
    /// intervals collapse into one group, Event actions whose filters
    /// canonicalize identically collapse into one group, so shared triggers
    /// never register more than one timer or subscription. Kinds with no
    /// actions simply produce no groups.
    pub fn partition(actions: Vec<Action>) -> Result<Self, SyncError> {
        let mut block = Vec::new();
        let mut time: OrderMap<Duration, Vec<TimeAction>> = OrderMap::new();
        let mut event: OrderMap<FilterKey, (Filter, Vec<EventAction>)> = OrderMap::new();

        for action in actions {
            match action {
                Action::Block(action) => block.push(action),
                Action::Time(action) => {
                    time.entry(action.interval).or_default().push(action);
                }
                Action::Event(action) => {
                    let key = FilterKey::for_filter(&action.filter).map_err(SyncError::FilterKey)?;
                    event
                        .entry(key)
                        .or_insert_with(|| (action.filter.clone(), Vec::new()))
                        .1
                        .push(action);
                }
            }
        }

        Ok(Self {
            block,
            time: time
                .into_iter()
                .map(|(interval, members)| TimeGroup { interval, members })
                .collect(),
            event: event
                .into_iter()
                .map(|(key, (filter, members))| EventGroup {
                    filter,
                    key,
                    members,
                })
                .collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.block.is_empty() && self.time.is_empty() && self.event.is_empty()
    }
}
