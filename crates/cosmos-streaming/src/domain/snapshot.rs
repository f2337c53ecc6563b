//! # Snapshot Records
//!
//! Normalized records handed to the analysis sink, one `CosmosSnapshot` per
//! block. Field values are already in their wire form: hashes are hex
//! strings, timestamps are Unix seconds, durations are milliseconds.
//!
//! Every record carries `seq` equal to the block height. Events and their
//! attributes are correlated by that height, not by a per-event id, unless
//! per-event sequencing is enabled in the streaming config.

use serde::{Deserialize, Serialize};

/// Block header and consensus metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub seq: u64,
    pub height: i64,
    pub hash: String,
    pub version_block: u64,
    pub version_app: u64,
    pub chain_id: String,
    pub time: i64,
    pub last_block_id_hash: String,
    pub last_block_id_part_set_header_total: u32,
    pub last_block_id_part_set_header_hash: String,
    pub last_commit_hash: String,
    pub data_hash: String,
    pub validators_hash: String,
    pub next_validators_hash: String,
    pub consensus_hash: String,
    pub app_hash: String,
    pub last_results_hash: String,
    pub evidence_hash: String,
    pub proposer_address: String,
    pub last_commit_info_round: i32,
    pub consensus_param_updates_block_max_bytes: i64,
    pub consensus_param_updates_block_max_gas: i64,
    pub consensus_param_updates_evidence_max_age_num_blocks: i64,
    /// Milliseconds.
    pub consensus_param_updates_evidence_max_age_duration: i64,
    pub consensus_param_updates_evidence_max_bytes: i64,
    /// Comma-joined pubkey type names.
    pub consensus_param_updates_validator_pub_key_types: String,
    pub consensus_param_updates_version_app: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub seq: u64,
    pub event_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    pub seq: u64,
    pub event_seq: u64,
    pub key: String,
    pub value: String,
    pub index: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    pub seq: u64,
    /// Ed25519 key bytes, empty for other key types.
    pub pub_key: Vec<u8>,
    pub power: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteInfo {
    pub seq: u64,
    pub block_seq: u64,
    pub validator_address: String,
    pub validator_power: i64,
    pub signed_last_block: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Misbehavior {
    pub seq: u64,
    pub block_seq: u64,
    pub typ: String,
    pub validator_power: i64,
    pub validator_address: String,
    pub height: i64,
    pub time: i64,
    pub total_voting_power: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub seq: u64,
    pub tx: Vec<u8>,
    pub tx_hash: String,
    pub tx_index: u32,
    pub code: u32,
    pub data: Vec<u8>,
    pub log: String,
    pub info: String,
    pub gas_wanted: i64,
    pub gas_used: i64,
    pub codespace: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmCallTrace {
    pub tx_hash: String,
    pub tx_index: u32,
    pub block_index: i64,
    pub depth: u32,
    #[serde(rename = "type")]
    pub call_type: String,
    pub from: String,
    pub to: String,
    pub value: String,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub input: Vec<u8>,
    pub output: Vec<u8>,
    pub error: String,
    pub revert_reason: String,
}

/// Block reference pair the sink keys snapshots by.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockData {
    pub block_id: String,
    pub block_hash: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub blocks: u64,
    pub transactions: u64,
    pub events: u64,
    pub call_traces: u64,
}

/// Immutable per-block snapshot.
///
/// Only `CosmosCtxBuilder::finish` produces one; the fields are read-only
/// from outside the crate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosmosSnapshot {
    pub(crate) block: Block,
    pub(crate) events: Vec<Event>,
    pub(crate) event_attributes: Vec<EventAttribute>,
    pub(crate) validator_updates: Vec<ValidatorUpdate>,
    pub(crate) vote_infos: Vec<VoteInfo>,
    pub(crate) misbehaviors: Vec<Misbehavior>,
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) call_traces: Vec<EvmCallTrace>,
    pub(crate) block_data: BlockData,
    pub(crate) statistics: Statistics,
}

impl CosmosSnapshot {
    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn event_attributes(&self) -> &[EventAttribute] {
        &self.event_attributes
    }

    pub fn validator_updates(&self) -> &[ValidatorUpdate] {
        &self.validator_updates
    }

    pub fn vote_infos(&self) -> &[VoteInfo] {
        &self.vote_infos
    }

    pub fn misbehaviors(&self) -> &[Misbehavior] {
        &self.misbehaviors
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn call_traces(&self) -> &[EvmCallTrace] {
        &self.call_traces
    }

    pub fn block_data(&self) -> &BlockData {
        &self.block_data
    }

    pub fn statistics(&self) -> Statistics {
        self.statistics
    }
}
