use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rpc_types_eth::{Filter, Log};
use chainsync_types::{abi, Action, BlockInfo, ContractCall};
use tokio::time::sleep;

use crate::{
    init_tracing_tests,
    mock::{MockBatch, MockChainClient},
    StateSync, SyncError, SyncOptions, UpdateKind,
};

type Sink = Arc<Mutex<Vec<(U256, BlockInfo)>>>;

fn sink() -> Sink {
    Arc::new(Mutex::new(Vec::new()))
}

fn uint_bytes(value: u64) -> Bytes {
    DynSolValue::Uint(U256::from(value), 256)
        .abi_encode()
        .into()
}

fn record_first_uint(sink: &Sink, values: Vec<DynSolValue>, info: BlockInfo) {
    let (value, _) = values[0].as_uint().unwrap();
    sink.lock().unwrap().push((value, info));
}

fn balance_call(target_byte: u8) -> ContractCall {
    ContractCall::fixed(Address::repeat_byte(target_byte), abi::erc20(), "balanceOf")
}

fn block_action(target_byte: u8, sink: Sink) -> Action {
    let owner = Address::repeat_byte(0x77);
    Action::on_block(
        balance_call(target_byte),
        move |_height| vec![DynSolValue::Address(owner)],
        move |values, info| record_first_uint(&sink, values, info),
    )
}

fn time_action(interval: Duration, target_byte: u8, sink: Sink) -> Action {
    let owner = Address::repeat_byte(0x77);
    Action::every(
        interval,
        balance_call(target_byte),
        move |_now| vec![DynSolValue::Address(owner)],
        move |values, info| record_first_uint(&sink, values, info),
    )
}

fn event_action(filter: Filter, target_byte: u8, sink: Sink) -> Action {
    let owner = Address::repeat_byte(0x77);
    Action::on_event(
        filter,
        balance_call(target_byte),
        move |_log, _height| vec![DynSolValue::Address(owner)],
        move |values, info, _log| record_first_uint(&sink, values, info),
    )
}

fn log_at(address: Address, block_number: u64) -> Log {
    Log {
        inner: alloy_primitives::Log::new_unchecked(address, vec![], Bytes::new()),
        block_hash: Some(B256::repeat_byte(0x0b)),
        block_number: Some(block_number),
        ..Default::default()
    }
}

async fn settle() {
    sleep(Duration::from_millis(150)).await;
}

// one period nobody should reach within a test run
const NEVER: Duration = Duration::from_secs(600);

#[tokio::test]
async fn shared_interval_registers_one_timer() {
    init_tracing_tests();

    let mock = MockChainClient::new(5);
    let (sink_a, sink_b) = (sink(), sink());
    mock.push_batch(MockBatch::all_success(vec![uint_bytes(100), uint_bytes(200)]).at_block(5));

    let engine = StateSync::new(
        vec![
            time_action(Duration::from_millis(40), 0x01, sink_a.clone()),
            time_action(Duration::from_millis(40), 0x02, sink_b.clone()),
        ],
        Arc::new(mock.clone()),
        SyncOptions::default(),
    )
    .await
    .unwrap();

    settle().await;

    // a shared timer means every firing is one aggregate carrying both calls
    let recorded = mock.recorded();
    assert!(!recorded.is_empty());
    for batch in &recorded {
        assert_eq!(batch.calls.len(), 2);
        assert_eq!(batch.calls[0].0, Address::repeat_byte(0x01));
        assert_eq!(batch.calls[1].0, Address::repeat_byte(0x02));
    }

    // both handlers saw the scripted firing, with identical block metadata
    let a = sink_a.lock().unwrap()[0];
    let b = sink_b.lock().unwrap()[0];
    assert_eq!(a.0, U256::from(100u64));
    assert_eq!(b.0, U256::from(200u64));
    assert_eq!(a.1, b.1);
    assert_eq!(a.1.number, 5);

    engine.dispose();
}

#[tokio::test]
async fn block_notification_below_watermark_is_ignored() {
    init_tracing_tests();

    let mock = MockChainClient::new(100);
    let results = sink();

    let engine = StateSync::new(
        vec![block_action(0x01, results.clone())],
        Arc::new(mock.clone()),
        SyncOptions::default(),
    )
    .await
    .unwrap();

    mock.push_block(100);
    settle().await;
    assert_eq!(results.lock().unwrap().len(), 1);
    assert_eq!(engine.latest_block_height(), 100);

    // stale notification: no firing, watermark unchanged
    mock.push_block(99);
    settle().await;
    assert_eq!(results.lock().unwrap().len(), 1);
    assert_eq!(mock.recorded().len(), 1);
    assert_eq!(engine.latest_block_height(), 100);

    engine.dispose();
}

#[tokio::test]
async fn block_notification_advances_and_applies() {
    init_tracing_tests();

    let mock = MockChainClient::new(100);
    let results = sink();
    mock.push_batch(MockBatch::all_success(vec![uint_bytes(42)]).at_block(100));
    mock.push_batch(MockBatch::all_success(vec![uint_bytes(43)]).at_block(101));

    let engine = StateSync::new(
        vec![block_action(0x01, results.clone())],
        Arc::new(mock.clone()),
        SyncOptions::default(),
    )
    .await
    .unwrap();

    mock.push_block(100);
    settle().await;
    mock.push_block(101);
    settle().await;

    let results = results.lock().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[1].0, U256::from(43u64));
    assert_eq!(results[1].1.number, 101);
    assert_eq!(engine.latest_block_height(), 101);

    engine.dispose();
}

#[tokio::test]
async fn partial_failure_suppresses_only_that_member() {
    init_tracing_tests();

    let mock = MockChainClient::new(10);
    let sinks = [sink(), sink(), sink()];
    mock.push_batch(
        MockBatch::new(vec![
            (true, uint_bytes(1)),
            (false, Bytes::new()),
            (true, uint_bytes(3)),
        ])
        .at_block(10),
    );

    let engine = StateSync::new(
        vec![
            block_action(0x01, sinks[0].clone()),
            block_action(0x02, sinks[1].clone()),
            block_action(0x03, sinks[2].clone()),
        ],
        Arc::new(mock.clone()),
        SyncOptions::default(),
    )
    .await
    .unwrap();

    mock.push_block(10);
    settle().await;

    assert_eq!(sinks[0].lock().unwrap().len(), 1);
    assert_eq!(sinks[1].lock().unwrap().len(), 0);
    assert_eq!(sinks[2].lock().unwrap().len(), 1);

    engine.dispose();
}

#[tokio::test]
async fn update_time_fires_immediately_without_rescheduling() {
    init_tracing_tests();

    let mock = MockChainClient::new(50);
    let results = sink();
    mock.push_batch(MockBatch::all_success(vec![uint_bytes(9)]).at_block(50));

    let engine = StateSync::new(
        vec![time_action(NEVER, 0x01, results.clone())],
        Arc::new(mock.clone()),
        SyncOptions::default(),
    )
    .await
    .unwrap();

    // nothing fires on its own with a far-out period
    settle().await;
    assert!(results.lock().unwrap().is_empty());

    engine.update(UpdateKind::Time).await.unwrap();
    assert_eq!(results.lock().unwrap().len(), 1);
    assert_eq!(results.lock().unwrap()[0].0, U256::from(9u64));

    // the manual run did not perturb the timer
    settle().await;
    assert_eq!(results.lock().unwrap().len(), 1);
    assert_eq!(mock.recorded().len(), 1);

    engine.dispose();
}

#[tokio::test]
async fn update_block_fetches_the_chain_head() {
    init_tracing_tests();

    let mock = MockChainClient::new(7);
    let results = sink();

    let engine = StateSync::new(
        vec![block_action(0x01, results.clone())],
        Arc::new(mock.clone()),
        SyncOptions::default(),
    )
    .await
    .unwrap();

    engine.update(UpdateKind::Block).await.unwrap();
    assert_eq!(results.lock().unwrap().len(), 1);
    assert_eq!(engine.latest_block_height(), 7);

    // the head has not moved, so a second manual update is a gated no-op
    engine.update(UpdateKind::Block).await.unwrap();
    assert_eq!(results.lock().unwrap().len(), 1);
    assert_eq!(mock.recorded().len(), 1);

    engine.dispose();
}

#[tokio::test]
async fn rpc_failure_propagates_to_the_manual_caller() {
    init_tracing_tests();

    let mock = MockChainClient::new(50);
    let results = sink();

    let engine = StateSync::new(
        vec![time_action(NEVER, 0x01, results.clone())],
        Arc::new(mock.clone()),
        SyncOptions::default(),
    )
    .await
    .unwrap();

    mock.fail_next_call();
    let err = engine.update(UpdateKind::Time).await.unwrap_err();
    assert!(matches!(err, SyncError::Chain(_)));
    assert!(results.lock().unwrap().is_empty());
    assert_eq!(engine.latest_block_height(), 0);

    engine.dispose();
}

#[tokio::test]
async fn stale_aggregate_result_is_discarded() {
    init_tracing_tests();

    let mock = MockChainClient::new(100);
    let (block_results, time_results) = (sink(), sink());

    let engine = StateSync::new(
        vec![
            block_action(0x01, block_results.clone()),
            time_action(NEVER, 0x02, time_results.clone()),
        ],
        Arc::new(mock.clone()),
        SyncOptions::default(),
    )
    .await
    .unwrap();

    mock.push_block(100);
    settle().await;
    assert_eq!(engine.latest_block_height(), 100);

    // the aggregate answers from a node that lags behind the watermark
    mock.push_batch(MockBatch::all_success(vec![uint_bytes(1)]).at_block(90));
    engine.update(UpdateKind::Time).await.unwrap();

    assert!(time_results.lock().unwrap().is_empty());
    assert_eq!(engine.latest_block_height(), 100);

    engine.dispose();
}

#[tokio::test]
async fn populate_on_start_runs_block_and_time_once() {
    init_tracing_tests();

    let mock = MockChainClient::new(5);
    let (block_results, time_results) = (sink(), sink());

    let engine = StateSync::new(
        vec![
            block_action(0x01, block_results.clone()),
            time_action(NEVER, 0x02, time_results.clone()),
        ],
        Arc::new(mock.clone()),
        SyncOptions {
            populate_on_start: true,
            ..Default::default()
        },
    )
    .await
    .unwrap();

    settle().await;

    // both evaluations ran without any notification or tick, and the
    // aggregate's reported head became the watermark
    assert_eq!(block_results.lock().unwrap().len(), 1);
    assert_eq!(time_results.lock().unwrap().len(), 1);
    assert_eq!(engine.latest_block_height(), 5);

    engine.dispose();
}

#[tokio::test]
async fn equal_event_filters_share_one_subscription() {
    init_tracing_tests();

    let watched = Address::repeat_byte(0xaa);
    let other = Address::repeat_byte(0xcc);
    let mock = MockChainClient::new(12);
    let sinks = [sink(), sink(), sink()];

    let engine = StateSync::new(
        vec![
            event_action(Filter::new().address(watched), 0x01, sinks[0].clone()),
            event_action(Filter::new().address(other), 0x02, sinks[1].clone()),
            event_action(Filter::new().address(watched), 0x03, sinks[2].clone()),
        ],
        Arc::new(mock.clone()),
        SyncOptions::default(),
    )
    .await
    .unwrap();

    // three actions, two distinct filters, two subscriptions
    assert_eq!(mock.log_subscriber_count(), 2);
    assert_eq!(mock.block_subscriber_count(), 0);

    mock.push_batch(MockBatch::all_success(vec![uint_bytes(1), uint_bytes(3)]).at_block(12));
    mock.push_log(log_at(watched, 12));
    settle().await;

    // only the matching group fired, with one aggregate for both members
    assert_eq!(sinks[0].lock().unwrap().len(), 1);
    assert_eq!(sinks[1].lock().unwrap().len(), 0);
    assert_eq!(sinks[2].lock().unwrap().len(), 1);
    assert_eq!(mock.recorded().len(), 1);
    assert_eq!(engine.latest_block_height(), 12);

    engine.dispose();
}

#[tokio::test]
async fn empty_kinds_register_nothing() {
    init_tracing_tests();

    let mock = MockChainClient::new(1);

    let engine = StateSync::new(
        vec![time_action(NEVER, 0x01, sink())],
        Arc::new(mock.clone()),
        SyncOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(mock.block_subscriber_count(), 0);
    assert_eq!(mock.log_subscriber_count(), 0);

    engine.dispose();
}

#[tokio::test]
async fn dispose_is_idempotent_and_final() {
    init_tracing_tests();

    let mock = MockChainClient::new(10);
    let results = sink();

    let engine = StateSync::new(
        vec![block_action(0x01, results.clone())],
        Arc::new(mock.clone()),
        SyncOptions::default(),
    )
    .await
    .unwrap();

    mock.push_block(10);
    settle().await;
    assert_eq!(results.lock().unwrap().len(), 1);

    engine.dispose();
    engine.dispose();

    // nothing fires once disposed
    mock.push_block(11);
    settle().await;
    assert_eq!(results.lock().unwrap().len(), 1);
    assert_eq!(mock.recorded().len(), 1);

    let err = engine.update(UpdateKind::Block).await.unwrap_err();
    assert!(matches!(err, SyncError::Disposed));
}
