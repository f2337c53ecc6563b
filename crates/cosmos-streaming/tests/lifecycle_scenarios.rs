//! # Block Lifecycle Scenarios
//!
//! Drives full blocks through the public `BlockStreamingApi` and checks the
//! snapshots that reach the sink.
//!
//! ## Test Categories
//!
//! 1. **End-to-end** - one block in, one snapshot out
//! 2. **Ordering and counts** - transaction order, statistics
//! 3. **Call-frame correlation** - tracer ids, trace keys
//! 4. **Sink readiness** - disabled, catching up, absent
//! 5. **Encoding** - hex hashes, consensus parameter updates
//! 6. **Queued delivery** - background worker, overflow

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cosmos_streaming::adapters::InMemoryKvStore;
use cosmos_streaming::domain::abci::{
    BlockParams, ConsensusParams, EvidenceParams, Header, PublicKey, RequestBeginBlock,
    RequestDeliverTx, RequestEndBlock, ResponseBeginBlock, ResponseCommit, ResponseDeliverTx,
    ResponseEndBlock, ValidatorParams, ValidatorUpdate, VersionParams,
};
use cosmos_streaming::domain::{encode_call_frames, trace_key, CURRENT_TRACER_KEY};
use cosmos_streaming::replay::{replay_block, BlockFixture, TxFixture};
use cosmos_streaming::{
    BlockStreamingApi, CallFrame, CosmosSnapshot, Sniffer, SnifferClient, StaticConnector,
    StreamingConfig, StreamingConfigBuilder, StreamingContext, StreamingError, StreamingService,
    SyncStatus,
};
use parking_lot::Mutex;

// =============================================================================
// TEST HELPERS
// =============================================================================

#[derive(Default)]
struct RecordingClient {
    snapshots: Mutex<Vec<CosmosSnapshot>>,
}

impl RecordingClient {
    fn observed(&self) -> Vec<CosmosSnapshot> {
        self.snapshots.lock().clone()
    }
}

impl SnifferClient for RecordingClient {
    fn observe_cosmos_data(&self, snapshot: &CosmosSnapshot) {
        self.snapshots.lock().push(snapshot.clone());
    }
}

struct CatchingUp(AtomicBool);

impl SyncStatus for CatchingUp {
    fn is_catching_up(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

fn inline_config() -> StreamingConfig {
    StreamingConfigBuilder::new()
        .enabled(true)
        .inline_delivery()
        .build()
        .unwrap()
}

fn make_service() -> (StreamingService, Arc<RecordingClient>) {
    let client = Arc::new(RecordingClient::default());
    let sniffer = Sniffer::with_client(client.clone());
    (
        StreamingService::new(inline_config(), Some(Arc::new(sniffer))),
        client,
    )
}

fn begin_request(height: i64) -> RequestBeginBlock {
    RequestBeginBlock {
        hash: vec![0xAB, 0x12, 0x00, 0xFE],
        header: Header {
            chain_id: "cosmoshub-4".to_string(),
            height,
            last_commit_hash: vec![0x01, 0x02],
            data_hash: vec![0xDE, 0xAD, 0xBE, 0xEF],
            validators_hash: vec![0x0F; 32],
            app_hash: vec![0x00, 0xA0],
            proposer_address: vec![0x7E; 20],
            ..Default::default()
        },
        ..Default::default()
    }
}

fn tx(id: u8, code: u32) -> TxFixture {
    TxFixture {
        request: RequestDeliverTx {
            tx: vec![id; 16],
        },
        response: ResponseDeliverTx {
            code,
            gas_wanted: 200_000,
            gas_used: 120_000 + id as i64,
            ..Default::default()
        },
        call_frames: Vec::new(),
    }
}

fn block(height: i64, txs: Vec<TxFixture>) -> BlockFixture {
    BlockFixture {
        begin_request: begin_request(height),
        txs,
        end_request: RequestEndBlock { height },
        ..Default::default()
    }
}

fn frames(n: u32) -> Vec<CallFrame> {
    (0..n)
        .map(|depth| CallFrame {
            tx_index: 0,
            depth,
            call_type: "CALL".to_string(),
            from: "0x1111".to_string(),
            to: "0x2222".to_string(),
            value: "0".to_string(),
            gas: 21_000,
            ..Default::default()
        })
        .collect()
}

// =============================================================================
// END-TO-END
// =============================================================================

#[test]
fn test_two_tx_block_produces_one_snapshot() {
    let (mut service, client) = make_service();

    let mut fixture = block(100, vec![tx(1, 0), tx(2, 5)]);
    fixture.end_response.validator_updates = vec![ValidatorUpdate {
        pub_key: PublicKey::Ed25519(vec![9; 32]),
        power: 10,
    }];
    replay_block(&mut service, fixture, b"tracer").unwrap();

    let observed = client.observed();
    assert_eq!(observed.len(), 1);

    let snapshot = &observed[0];
    let stats = snapshot.statistics();
    assert_eq!(stats.blocks, 1);
    assert_eq!(stats.transactions, 2);
    assert_eq!(stats.call_traces, 0);

    let codes: Vec<u32> = snapshot.transactions().iter().map(|t| t.code).collect();
    assert_eq!(codes, vec![0, 5]);
    assert_eq!(snapshot.validator_updates().len(), 1);
    assert_eq!(snapshot.validator_updates()[0].pub_key, vec![9; 32]);
    assert_eq!(snapshot.block().height, 100);
}

#[test]
fn test_tx_hash_is_uppercase_sha256() {
    let (mut service, client) = make_service();
    replay_block(&mut service, block(3, vec![tx(1, 0)]), b"tracer").unwrap();

    let observed = client.observed();
    let hash = &observed[0].transactions()[0].tx_hash;
    assert_eq!(hash.len(), 64);
    assert_eq!(*hash, hash.to_uppercase());
    assert_eq!(*hash, cosmos_streaming::adapters::tx_hash(&[1; 16]));
}

// =============================================================================
// ORDERING AND COUNTS
// =============================================================================

#[test]
fn test_transaction_count_and_order_for_many_sizes() {
    for n in [0usize, 1, 7, 40] {
        let (mut service, client) = make_service();
        let txs = (0..n).map(|i| tx(i as u8, i as u32)).collect();
        replay_block(&mut service, block(50, txs), b"tracer").unwrap();

        let observed = client.observed();
        let snapshot = &observed[0];
        assert_eq!(snapshot.statistics().transactions, n as u64);

        let indexes: Vec<u32> = snapshot.transactions().iter().map(|t| t.tx_index).collect();
        let codes: Vec<u32> = snapshot.transactions().iter().map(|t| t.code).collect();
        let expected: Vec<u32> = (0..n as u32).collect();
        assert_eq!(indexes, expected);
        assert_eq!(codes, expected);
    }
}

#[test]
fn test_consecutive_blocks_do_not_leak() {
    let (mut service, client) = make_service();
    replay_block(&mut service, block(1, vec![tx(1, 0), tx(2, 0)]), b"tracer").unwrap();
    replay_block(&mut service, block(2, vec![tx(3, 0)]), b"tracer").unwrap();

    let observed = client.observed();
    assert_eq!(observed.len(), 2);
    assert_eq!(observed[1].statistics().transactions, 1);
    assert_eq!(observed[1].block().height, 2);
}

#[test]
fn test_repeated_begin_block_discards_partial_block() {
    let (mut service, client) = make_service();
    let ctx = StreamingContext::detached();

    service
        .listen_begin_block(&ctx, begin_request(8), ResponseBeginBlock::default())
        .unwrap();
    service
        .listen_deliver_tx(&ctx, RequestDeliverTx { tx: vec![1] }, ResponseDeliverTx::default())
        .unwrap();

    replay_block(&mut service, block(8, vec![]), b"tracer").unwrap();

    let observed = client.observed();
    assert_eq!(observed.len(), 1);
    assert!(observed[0].transactions().is_empty());
}

// =============================================================================
// CALL-FRAME CORRELATION
// =============================================================================

#[test]
fn test_frames_under_current_tracer_are_ingested() {
    let (mut service, _client) = make_service();
    let ctx = StreamingContext::detached();
    service
        .listen_begin_block(&ctx, begin_request(77), ResponseBeginBlock::default())
        .unwrap();

    let mut store = InMemoryKvStore::new();
    store.put(CURRENT_TRACER_KEY, b"evm-7");
    store.put(&trace_key(77, b"evm-7"), &encode_call_frames(&frames(4)).unwrap());

    let before = service.call_frame_count();
    service
        .listen_deliver_tx(
            &StreamingContext::new(&store),
            RequestDeliverTx { tx: vec![1] },
            ResponseDeliverTx::default(),
        )
        .unwrap();
    assert_eq!(service.call_frame_count(), before + 4);
}

#[test]
fn test_missing_tracer_id_leaves_frames_unchanged() {
    let (mut service, _client) = make_service();
    let ctx = StreamingContext::detached();
    service
        .listen_begin_block(&ctx, begin_request(77), ResponseBeginBlock::default())
        .unwrap();

    let mut store = InMemoryKvStore::new();
    store.put(&trace_key(77, b"evm-7"), &encode_call_frames(&frames(4)).unwrap());

    service
        .listen_deliver_tx(
            &StreamingContext::new(&store),
            RequestDeliverTx { tx: vec![1] },
            ResponseDeliverTx::default(),
        )
        .unwrap();
    assert_eq!(service.call_frame_count(), 0);
}

#[test]
fn test_frames_for_other_height_are_ignored() {
    let (mut service, _client) = make_service();
    let ctx = StreamingContext::detached();
    service
        .listen_begin_block(&ctx, begin_request(77), ResponseBeginBlock::default())
        .unwrap();

    let mut store = InMemoryKvStore::new();
    store.put(CURRENT_TRACER_KEY, b"evm-7");
    store.put(&trace_key(76, b"evm-7"), &encode_call_frames(&frames(4)).unwrap());

    service
        .listen_deliver_tx(
            &StreamingContext::new(&store),
            RequestDeliverTx { tx: vec![1] },
            ResponseDeliverTx::default(),
        )
        .unwrap();
    assert_eq!(service.call_frame_count(), 0);
}

#[test]
fn test_traced_block_emits_tagged_call_traces() {
    let (mut service, client) = make_service();
    let mut traced = tx(1, 0);
    traced.call_frames = frames(3);

    replay_block(&mut service, block(12, vec![traced]), b"tracer").unwrap();

    let observed = client.observed();
    let snapshot = &observed[0];
    assert_eq!(snapshot.statistics().call_traces, 3);
    let hash = &snapshot.transactions()[0].tx_hash;
    assert!(snapshot.call_traces().iter().all(|t| &t.tx_hash == hash));
    let depths: Vec<u32> = snapshot.call_traces().iter().map(|t| t.depth).collect();
    assert_eq!(depths, vec![0, 1, 2]);
}

// =============================================================================
// SINK READINESS
// =============================================================================

#[test]
fn test_catching_up_node_never_observes() {
    let client = Arc::new(RecordingClient::default());
    let status = Arc::new(CatchingUp(AtomicBool::new(true)));
    let sniffer = Sniffer::with_client(client.clone()).with_sync_status(status.clone());
    let mut service = StreamingService::new(inline_config(), Some(Arc::new(sniffer)));

    replay_block(&mut service, block(1, vec![tx(1, 0)]), b"tracer").unwrap();
    assert!(client.observed().is_empty());
    assert!(service.metadata().commit.is_none());

    status.0.store(false, Ordering::SeqCst);
    replay_block(&mut service, block(2, vec![tx(2, 0)]), b"tracer").unwrap();
    assert_eq!(client.observed().len(), 1);
    assert_eq!(client.observed()[0].block().height, 2);
}

#[test]
fn test_disabled_sniffer_never_observes() {
    let client = Arc::new(RecordingClient::default());
    let sniffer = Sniffer::new(false, Arc::new(StaticConnector::new(client.clone())));
    let mut service = StreamingService::new(inline_config(), Some(Arc::new(sniffer)));

    replay_block(&mut service, block(1, vec![tx(1, 0)]), b"tracer").unwrap();

    assert!(client.observed().is_empty());
    assert_eq!(service.metrics().blocks_observed, 0);
    assert_eq!(service.metrics().commits_skipped_not_ready, 1);
}

#[test]
fn test_hooks_succeed_without_sniffer() {
    let mut service = StreamingService::new(inline_config(), None);
    assert!(replay_block(&mut service, block(1, vec![tx(1, 0)]), b"tracer").is_ok());
    assert!(service.listeners().is_empty());
}

// =============================================================================
// ENCODING
// =============================================================================

#[test]
fn test_hash_fields_roundtrip_through_hex() {
    let (mut service, client) = make_service();
    replay_block(&mut service, block(9, vec![]), b"tracer").unwrap();

    let observed = client.observed();
    let b = observed[0].block();
    let original = begin_request(9);

    for (encoded, raw) in [
        (&b.hash, &original.hash),
        (&b.last_commit_hash, &original.header.last_commit_hash),
        (&b.data_hash, &original.header.data_hash),
        (&b.validators_hash, &original.header.validators_hash),
        (&b.app_hash, &original.header.app_hash),
        (&b.proposer_address, &original.header.proposer_address),
        (&b.evidence_hash, &original.header.evidence_hash),
    ] {
        assert_eq!(*encoded, encoded.to_lowercase());
        assert_eq!(&hex::decode(encoded).unwrap(), raw);
    }
    assert_eq!(observed[0].block_data().block_hash, "ab1200fe");
}

#[test]
fn test_consensus_param_updates_roundtrip() {
    let (mut service, client) = make_service();

    let mut fixture = block(20, vec![]);
    fixture.end_response.consensus_param_updates = Some(ConsensusParams {
        block: Some(BlockParams {
            max_bytes: 200_000,
            max_gas: -1,
        }),
        evidence: Some(EvidenceParams {
            max_age_num_blocks: 302_400,
            max_age_duration: Duration::from_millis(1_814_400_000),
            max_bytes: 50_000,
        }),
        validator: Some(ValidatorParams {
            pub_key_types: vec!["ed25519".to_string()],
        }),
        version: Some(VersionParams { app: 1 }),
    });
    replay_block(&mut service, fixture, b"tracer").unwrap();
    replay_block(&mut service, block(21, vec![]), b"tracer").unwrap();

    let observed = client.observed();
    let updated = observed[0].block();
    assert_eq!(updated.consensus_param_updates_block_max_bytes, 200_000);
    assert_eq!(updated.consensus_param_updates_block_max_gas, -1);
    assert_eq!(updated.consensus_param_updates_evidence_max_age_num_blocks, 302_400);
    assert_eq!(
        updated.consensus_param_updates_evidence_max_age_duration,
        1_814_400_000
    );
    assert_eq!(updated.consensus_param_updates_evidence_max_bytes, 50_000);
    assert_eq!(updated.consensus_param_updates_validator_pub_key_types, "ed25519");
    assert_eq!(updated.consensus_param_updates_version_app, 1);

    let plain = observed[1].block();
    assert_eq!(plain.consensus_param_updates_block_max_bytes, 0);
    assert_eq!(plain.consensus_param_updates_evidence_max_age_duration, 0);
    assert_eq!(plain.consensus_param_updates_validator_pub_key_types, "");
}

#[test]
fn test_commit_without_end_block_is_skipped() {
    let (mut service, client) = make_service();
    let ctx = StreamingContext::detached();

    service
        .listen_begin_block(&ctx, begin_request(4), ResponseBeginBlock::default())
        .unwrap();
    assert!(service.listen_commit(&ctx, ResponseCommit::default()).is_ok());

    assert!(client.observed().is_empty());
    assert_eq!(service.metrics().commits_skipped_incomplete, 1);
}

// =============================================================================
// QUEUED DELIVERY
// =============================================================================

fn queued_service(capacity: usize) -> (StreamingService, Arc<RecordingClient>) {
    let client = Arc::new(RecordingClient::default());
    let config = StreamingConfigBuilder::new()
        .enabled(true)
        .queued_delivery(capacity)
        .build()
        .unwrap();
    let sniffer = Sniffer::with_client(client.clone());
    (StreamingService::new(config, Some(Arc::new(sniffer))), client)
}

#[tokio::test]
async fn test_queued_delivery_reaches_sink_after_close() {
    let (mut service, client) = queued_service(8);
    service.stream().unwrap();

    for height in 1..=3 {
        replay_block(&mut service, block(height, vec![tx(height as u8, 0)]), b"tracer").unwrap();
    }
    service.close().unwrap();
    service.take_worker().unwrap().await.unwrap();

    let heights: Vec<i64> = client.observed().iter().map(|s| s.block().height).collect();
    assert_eq!(heights, vec![1, 2, 3]);
    assert_eq!(service.metrics().snapshots_delivered, 3);
}

#[tokio::test]
async fn test_queue_overflow_drops_oldest_blocks() {
    let (mut service, client) = queued_service(2);

    for height in 1..=5 {
        replay_block(&mut service, block(height, vec![]), b"tracer").unwrap();
    }
    service.stream().unwrap();
    service.close().unwrap();
    service.take_worker().unwrap().await.unwrap();

    let heights: Vec<i64> = client.observed().iter().map(|s| s.block().height).collect();
    assert_eq!(heights, vec![4, 5]);
    let metrics = service.metrics();
    assert_eq!(metrics.snapshots_dropped, 3);
    assert_eq!(metrics.blocks_observed, 5);
}

#[test]
fn test_stream_requires_runtime_for_queued_delivery() {
    let (mut service, _client) = queued_service(4);
    assert!(matches!(service.stream(), Err(StreamingError::NoRuntime)));
}
